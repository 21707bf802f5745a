pub mod accept;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod events;
pub mod potential;
pub mod step;
pub mod trace;
pub mod walker;

// Re-export wire/config types so downstream crates need only one import path.
pub use nestforge_protocol as protocol;
pub use nestforge_protocol::{EngineParams, Replica, RunSpec, WalkJob, WalkResult};

pub use error::{NsError, NsResult, PotentialError};

pub mod config;
pub mod job;
pub mod protocol;
pub mod replica;

pub use config::EngineParams;
pub use job::{AcceptTestSpec, BatchId, PotentialSpec, RunSpec, WalkJob, WalkResult};
pub use replica::Replica;

pub mod local;
pub mod remote;

pub use local::LocalPool;
pub use remote::RemotePool;

use crate::error::NsResult;
use nestforge_protocol::{WalkJob, WalkResult};

/// Runs a batch of independent constrained walks.
///
/// Result ordering is identical to job ordering. The call is synchronous:
/// it returns only once every job has a result or one of them has failed,
/// in which case partial results are discarded.
pub trait WalkDispatcher {
    fn run_batch(&self, jobs: &[WalkJob]) -> NsResult<Vec<WalkResult>>;
}

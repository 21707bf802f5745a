use crate::job::{RunSpec, WalkJob, WalkResult};
use serde::{Deserialize, Serialize};

/// Synchronous batch submission. The hive answers once every job in the
/// batch has a result, in input order, or the batch has failed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitBatchRequest {
    pub batch_id: String,
    pub spec: RunSpec,
    pub jobs: Vec<WalkJob>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitBatchResponse {
    pub results: Vec<WalkResult>,
}

/// Error body returned by the hive on any non-success status. `kind`
/// tells the client which fatal error to map the response to: `walk`,
/// `timeout`, `validation`, `conflict`, `not_found` or `internal`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub kind: String,
    /// Offending configuration for `walk` faults.
    #[serde(default)]
    pub x: Vec<f64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterWorkerRequest {
    /// Opaque address string for diagnostics (workers pull, so the hive
    /// never dials back).
    pub addr: String,
    pub cores: u32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterWorkerResponse {
    pub worker_id: String,
    pub status: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HeartbeatRequest {
    pub worker_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UnregisterRequest {
    pub worker_id: String,
}

/// One unit of work handed to a worker: a single job plus the batch's
/// run spec, tagged with its position so the hive can reassemble order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shard {
    pub batch_id: String,
    pub index: usize,
    pub spec: RunSpec,
    pub job: WalkJob,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct NextShardResponse {
    pub shard: Option<Shard>,
}

/// A failed walk, relayed field-by-field so the offending configuration
/// survives the round trip instead of being flattened into a string.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalkFault {
    pub message: String,
    #[serde(default)]
    pub x: Vec<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ShardOutcome {
    Ok { result: WalkResult },
    Err { fault: WalkFault },
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ShardResultRequest {
    pub worker_id: String,
    pub batch_id: String,
    pub index: usize,
    pub outcome: ShardOutcome,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct WorkerInfo {
    pub worker_id: String,
    pub addr: String,
    pub cores: u32,
    pub status: String,
    pub assigned: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct WorkerListResponse {
    pub workers: Vec<WorkerInfo>,
}

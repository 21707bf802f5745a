use axum::{extract::State, Json};
use nestforge_protocol::protocol::{SubmitBatchRequest, SubmitBatchResponse};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::info;

use crate::error::{AppError, AppResult};
use crate::state::{AppState, BatchPoll};

/// Synchronous batch submission: the request completes once every job has
/// a result (in input order), the batch fails, or the wall-clock budget
/// runs out. Partial results are never returned.
pub async fn submit(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<SubmitBatchRequest>,
) -> AppResult<Json<SubmitBatchResponse>> {
    if payload.jobs.is_empty() {
        return Err(AppError::Validation("batch has no jobs".to_string()));
    }

    let batch_id = payload.batch_id.clone();
    let n_jobs = payload.jobs.len();
    state
        .submit_batch(&batch_id, payload.spec, payload.jobs)
        .map_err(AppError::Conflict)?;

    info!("📋 batch {} queued ({} jobs)", &batch_id[..8.min(batch_id.len())], n_jobs);

    let start = Instant::now();
    loop {
        match state.poll_batch(&batch_id) {
            BatchPoll::Done(results) => {
                info!(
                    "✅ batch {} complete ({} results)",
                    &batch_id[..8.min(batch_id.len())],
                    results.len()
                );
                return Ok(Json(SubmitBatchResponse { results }));
            }
            BatchPoll::Failed(fault) => return Err(AppError::WalkFailed(fault)),
            BatchPoll::Pending => {}
        }

        if start.elapsed() > state.batch_timeout {
            state.fail_batch(&batch_id);
            return Err(AppError::BatchTimeout);
        }
        sleep(Duration::from_millis(100)).await;
    }
}

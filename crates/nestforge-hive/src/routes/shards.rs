use axum::extract::{Query, State};
use axum::Json;
use nestforge_protocol::protocol::{NextShardResponse, ShardOutcome, ShardResultRequest};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::warn;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct NextShardQuery {
    pub worker_id: String,
}

/// Long-poll for work: holds the connection up to 20 seconds so idle
/// workers don't hammer the queue.
pub async fn next(
    State(state): State<Arc<AppState>>,
    Query(query): Query<NextShardQuery>,
) -> AppResult<Json<NextShardResponse>> {
    let start = Instant::now();
    let window = Duration::from_secs(20);

    loop {
        match state.try_next_shard(&query.worker_id) {
            Ok(Some(shard)) => return Ok(Json(NextShardResponse { shard: Some(shard) })),
            Ok(None) => {}
            Err(msg) => return Err(AppError::Validation(msg)),
        }

        if start.elapsed() > window {
            return Ok(Json(NextShardResponse { shard: None }));
        }
        sleep(Duration::from_millis(250)).await;
    }
}

pub async fn result(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ShardResultRequest>,
) -> AppResult<&'static str> {
    let outcome = match payload.outcome {
        ShardOutcome::Ok { result } => Ok(result),
        ShardOutcome::Err { fault } => {
            warn!(
                "❌ walk failed on {} (batch {} #{}): {}",
                payload.worker_id, payload.batch_id, payload.index, fault.message
            );
            Err(fault)
        }
    };
    state.submit_shard_result(&payload.worker_id, &payload.batch_id, payload.index, outcome);
    Ok("ok")
}

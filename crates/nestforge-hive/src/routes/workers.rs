use axum::{extract::State, Json};
use nestforge_protocol::protocol::{
    HeartbeatRequest, RegisterWorkerRequest, RegisterWorkerResponse, UnregisterRequest,
    WorkerListResponse,
};
use std::sync::Arc;
use tracing::info;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RegisterWorkerRequest>,
) -> AppResult<Json<RegisterWorkerResponse>> {
    let worker_id = state.register_worker(&payload.addr, payload.cores);
    info!(
        "🖥️ worker registered: {} ({}, {} cores)",
        worker_id, payload.addr, payload.cores
    );
    Ok(Json(RegisterWorkerResponse {
        worker_id,
        status: "registering".to_string(),
    }))
}

pub async fn heartbeat(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<HeartbeatRequest>,
) -> AppResult<&'static str> {
    if !state.heartbeat(&payload.worker_id) {
        return Err(AppError::NotFound);
    }
    Ok("ok")
}

pub async fn unregister(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<UnregisterRequest>,
) -> AppResult<&'static str> {
    if !state.unregister(&payload.worker_id) {
        return Err(AppError::NotFound);
    }
    info!("👋 worker unregistered: {}", payload.worker_id);
    Ok("ok")
}

pub async fn list(State(state): State<Arc<AppState>>) -> Json<WorkerListResponse> {
    Json(WorkerListResponse {
        workers: state.worker_list(),
    })
}

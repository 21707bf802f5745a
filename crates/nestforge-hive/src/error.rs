use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use nestforge_protocol::protocol::WalkFault;
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("not found")]
    NotFound,

    /// A worker reported a failed walk; the whole batch is discarded.
    #[error("walk failed: {}", .0.message)]
    WalkFailed(WalkFault),

    /// The batch outlived its wall-clock budget.
    #[error("batch timed out")]
    BatchTimeout,

    // Catch-all for faults that have no dedicated mapping yet.
    #[allow(dead_code)]
    #[error("internal server error: {0}")]
    Any(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, kind, msg, x) = match self {
            AppError::Validation(s) => (StatusCode::BAD_REQUEST, "validation", s, Vec::new()),
            AppError::Conflict(s) => (StatusCode::CONFLICT, "conflict", s, Vec::new()),
            AppError::NotFound => (
                StatusCode::NOT_FOUND,
                "not_found",
                "resource not found".to_string(),
                Vec::new(),
            ),
            AppError::WalkFailed(fault) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "walk",
                fault.message,
                fault.x,
            ),
            AppError::BatchTimeout => (
                StatusCode::GATEWAY_TIMEOUT,
                "timeout",
                "batch timed out".to_string(),
                Vec::new(),
            ),
            AppError::Any(e) => {
                tracing::error!("internal error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal",
                    "internal server error".to_string(),
                    Vec::new(),
                )
            }
        };

        (status, Json(json!({ "error": msg, "kind": kind, "x": x }))).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

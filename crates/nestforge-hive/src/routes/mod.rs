pub mod batches;
pub mod shards;
pub mod system;
pub mod workers;

use crate::state::AppState;
use axum::Router;
use std::sync::Arc;

pub fn system_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", axum::routing::get(system::root))
        .route("/health", axum::routing::get(system::health))
}

pub fn worker_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/workers/register", axum::routing::post(workers::register))
        .route("/workers/heartbeat", axum::routing::post(workers::heartbeat))
        .route(
            "/workers/unregister",
            axum::routing::post(workers::unregister),
        )
        .route("/workers", axum::routing::get(workers::list))
}

pub fn batch_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/batches", axum::routing::post(batches::submit))
        .route("/shards/next", axum::routing::get(shards::next))
        .route("/shards/result", axum::routing::post(shards::result))
}

use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

mod error;
mod routes;
mod state;

use crate::state::AppState;

#[derive(Parser)]
#[command(author, version, about = "nestforge walk dispatcher service")]
struct Args {
    #[arg(long, default_value_t = 3000)]
    port: u16,

    /// File the dispatcher endpoint string is persisted to on startup.
    #[arg(long, default_value = "dispatcher_uri.dat")]
    uri_file: PathBuf,

    /// Endpoint string to advertise; defaults to the loopback address.
    #[arg(long)]
    advertise: Option<String>,

    #[arg(long, default_value_t = 15)]
    heartbeat_timeout_secs: u64,

    #[arg(long, default_value_t = 300)]
    batch_timeout_secs: u64,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    info!("🐝 nestforge hive initializing...");

    let endpoint = args
        .advertise
        .clone()
        .unwrap_or_else(|| format!("http://127.0.0.1:{}", args.port));

    // Persist the endpoint so drivers can pick it up from disk.
    if let Err(e) = std::fs::write(&args.uri_file, format!("{}\n", endpoint)) {
        warn!("failed to write {:?}: {}", args.uri_file, e);
    } else {
        info!("📝 endpoint {} written to {:?}", endpoint, args.uri_file);
    }

    let state = Arc::new(AppState::new(
        Duration::from_secs(args.heartbeat_timeout_secs),
        Duration::from_secs(args.batch_timeout_secs),
    ));

    // Reaper: disconnect workers with lapsed heartbeats and reissue
    // their in-flight shards.
    let reaper_state = state.clone();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(5));
        loop {
            ticker.tick().await;
            for worker_id in reaper_state.reap() {
                warn!("💀 worker {} disconnected, shard reissued", worker_id);
            }
        }
    });

    let app = routes::system_routes()
        .merge(routes::worker_routes())
        .merge(routes::batch_routes())
        .layer(TraceLayer::new_for_http())
        .layer(RequestBodyLimitLayer::new(16 * 1024 * 1024))
        .with_state(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
    info!("🚀 hive listening on {}", addr);

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!("failed to bind {}: {}", addr, e);
            std::process::exit(1);
        }
    };

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!("server error: {}", e);
        std::process::exit(1);
    }
}

/// Resolves on SIGTERM or Ctrl+C.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("🛑 signal received, shutting down...");
}

//! Reservoir - bounded resource primitives behind a small HTTP API
//!
//! Serves an LRU/TTL cache, rate-limits every data endpoint, and offloads
//! JSON parse/stringify work to a worker pool.

mod api;
mod cache;
mod config;
mod error;
mod limiter;
mod models;
mod pool;
mod tasks;

use std::net::SocketAddr;

use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api::{create_router, AppState};
use config::Config;
use tasks::spawn_sweep_task;

/// Main entry point.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Build cache, rate limiter, and worker pool
/// 4. Start the background expiry sweep
/// 5. Create the axum router with all endpoints
/// 6. Serve HTTP on the configured port
/// 7. Handle graceful shutdown on SIGINT/SIGTERM
#[tokio::main]
async fn main() {
    // Defaults to "info" level, can be overridden with RUST_LOG
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "reservoir=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting reservoir");

    let config = Config::from_env();
    info!(
        "Configuration loaded: max_entries={}, default_ttl={}s, port={}, workers={}, rate_limit={}/{}s",
        config.max_entries,
        config.default_ttl_secs,
        config.server_port,
        config.pool_workers,
        config.rate_limit_max_requests,
        config.rate_limit_window_secs
    );

    let state = AppState::from_config(&config).expect("invalid service configuration");
    info!("Cache, rate limiter, and worker pool initialized");

    let sweep_handle = spawn_sweep_task(
        state.cache.clone(),
        state.limiter.clone(),
        config.sweep_interval_secs,
    );
    info!("Background expiry sweep started");

    let app = create_router(state.clone());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    info!("Server listening on http://{}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal(sweep_handle))
    .await
    .unwrap();

    // Reject anything still pending and stop the workers before exiting
    state.pool.destroy().await;
    info!("Server shutdown complete");
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
///
/// On shutdown signal, aborts the sweep task and allows graceful shutdown.
async fn shutdown_signal(sweep_handle: tokio::task::JoinHandle<()>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }

    sweep_handle.abort();
    warn!("Expiry sweep task aborted");
}

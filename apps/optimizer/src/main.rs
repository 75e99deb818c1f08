mod config;
mod errors;
mod models;
mod optimizer_client;
mod reconcile;
mod routes;
mod session;
mod state;
mod stream;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::optimizer_client::OptimizerClient;
use crate::routes::build_router;
use crate::session::controller::OptimizationController;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting resume optimizer v{}", env!("CARGO_PKG_VERSION"));

    // Initialize optimization backend client
    let backend = OptimizerClient::new(
        &config.optimizer_api_url,
        Duration::from_secs(config.save_timeout_secs),
    )?;
    info!("Optimizer client initialized ({})", config.optimizer_api_url);

    let controller = OptimizationController::new(Arc::new(backend), config.max_event_line_bytes);

    let state = AppState {
        controller: Arc::new(controller),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins once the web client's host is fixed

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

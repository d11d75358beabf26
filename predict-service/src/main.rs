use anyhow::Context;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};

use predict_service::{build_router, metrics, telemetry, AppState, ServiceConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServiceConfig::from_env().context("Invalid configuration")?;

    telemetry::init_tracing(config.log_format);

    if let Err(e) = metrics::init_metrics() {
        warn!(error = %e, "Prometheus recorder not installed, /metrics will be empty");
    }

    if config.allowed_origins.is_empty() {
        warn!("No CORS origins configured, browser clients on other origins will be rejected");
    }

    let state = Arc::new(AppState::new(config.clone()));

    if state.store.is_enabled() {
        state
            .store
            .ensure_dir()
            .await
            .with_context(|| {
                format!("Cannot create upload directory {}", state.store.dir().display())
            })?;
    }

    let app = build_router(state.clone()).context("Failed to build router")?;

    let listener = TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind_addr))?;

    info!(
        bind_addr = %config.bind_addr,
        predictor = %config.prediction_mode,
        upload_dir = %state.store.dir().display(),
        persist_uploads = config.persist_uploads,
        allowed_origins = ?config.allowed_origins,
        "Prediction service starting"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server failed")?;

    info!("Prediction service stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

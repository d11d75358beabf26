//! CloudCast prediction service
//!
//! Accepts three consecutive satellite frames over `POST /predict` and
//! returns one predicted frame as PNG. The prediction step is a stand-in
//! (see [`predictor`]); the upload/response exchange is the stable contract.

pub mod config;
pub mod error;
pub mod handlers;
pub mod imaging;
pub mod metrics;
pub mod predictor;
pub mod state;
pub mod storage;
pub mod telemetry;
pub mod upload;

use axum::{
    extract::DefaultBodyLimit,
    http::StatusCode,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

pub use config::ServiceConfig;
pub use error::{ConfigError, PredictError};
pub use state::AppState;

/// CORS layer for the configured allow-list.
///
/// Credentials are allowed, so methods and headers are mirrored from the
/// request instead of using a wildcard.
pub fn cors_layer(config: &ServiceConfig) -> Result<CorsLayer, ConfigError> {
    let origins = config.origin_header_values()?;

    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .expose_headers([handlers::REQUEST_ID_HEADER]))
}

/// Build the service router.
pub fn build_router(state: Arc<AppState>) -> Result<Router, ConfigError> {
    let cors = cors_layer(&state.config)?;
    let body_limit = state.config.max_upload_bytes;
    let timeout = state.config.request_timeout;

    Ok(Router::new()
        .route("/predict", post(handlers::predict_handler))
        .route("/health", get(handlers::health_handler))
        .route("/ready", get(handlers::ready_handler))
        .route("/metrics", get(crate::metrics::metrics_handler))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            timeout,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(cors))
}

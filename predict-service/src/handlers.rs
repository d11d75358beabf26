//! HTTP handlers
//!
//! Endpoints:
//! - POST /predict - three frames in (`file1`..`file3`), one PNG out
//! - GET /health - Liveness check
//! - GET /ready - Readiness check (includes upload directory status)

use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    http::{header, HeaderName, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

use crate::error::{ErrorKind, PredictError, RequestError};
use crate::imaging::Frames;
use crate::metrics::{self, Outcome};
use crate::state::AppState;
use crate::upload::UploadSet;

/// Response header carrying the per-request identifier.
pub const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

/// Predict the next frame from three uploaded frames.
///
/// Validation and decoding finish before anything is written to disk, so a
/// rejected request leaves no files behind.
pub async fn predict_handler(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, RequestError> {
    let request_id = uuid::Uuid::new_v4().to_string();
    let started = Instant::now();

    let result = run_prediction(&state, &request_id, multipart).await;
    let elapsed = started.elapsed();

    match result {
        Ok(png) => {
            metrics::record_prediction(Outcome::Ok, elapsed);
            info!(
                request_id = %request_id,
                predictor = state.predictor.name(),
                bytes = png.len(),
                elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
                "Prediction served"
            );

            Ok((
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, "image/png".to_string()),
                    (REQUEST_ID_HEADER, request_id),
                ],
                png,
            )
                .into_response())
        }
        Err(err) => {
            match err.kind() {
                ErrorKind::ClientInput => {
                    metrics::record_prediction(Outcome::ClientError, elapsed);
                    warn!(request_id = %request_id, code = err.code(), error = %err, "Rejected prediction request");
                }
                ErrorKind::ServerIo => {
                    metrics::record_prediction(Outcome::ServerError, elapsed);
                    error!(request_id = %request_id, code = err.code(), error = %err, "Prediction failed");
                }
            }
            Err(err.with_request_id(request_id))
        }
    }
}

async fn run_prediction(
    state: &AppState,
    request_id: &str,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Vec<u8>, PredictError> {
    let multipart = multipart.map_err(|rej| PredictError::MalformedMultipart(rej.body_text()))?;

    let uploads = Arc::new(UploadSet::from_multipart(multipart).await?);
    for upload in uploads.iter() {
        metrics::record_upload_size(upload.data.len());
    }
    debug!(request_id = %request_id, total_bytes = uploads.total_bytes(), "Upload set complete");

    let frames = {
        let uploads = Arc::clone(&uploads);
        tokio::task::spawn_blocking(move || Frames::decode(&uploads))
            .await
            .map_err(|e| PredictError::Internal(format!("decode task failed: {e}")))??
    };

    state.store.persist(request_id, &uploads).await?;

    let predictor = Arc::clone(&state.predictor);
    tokio::task::spawn_blocking(move || predictor.predict(&uploads, &frames)?.into_png())
        .await
        .map_err(|e| PredictError::Internal(format!("prediction task failed: {e}")))?
}

/// Health check
pub async fn health_handler() -> &'static str {
    "OK"
}

/// Readiness check (includes upload directory status)
pub async fn ready_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let writable = state.store.is_writable().await;
    let status = if writable {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(serde_json::json!({
            "ok": writable,
            "instance_id": state.config.instance_id,
            "predictor": state.predictor.name(),
            "persist_uploads": state.store.is_enabled(),
            "upload_dir_writable": writable,
            "uptime_secs": state.uptime_secs(),
        })),
    )
}

//! Prometheus metrics for the prediction service
//!
//! Exposed at /metrics. When no recorder is installed (tests, embedding in
//! another binary) the macros are no-ops and /metrics renders empty.

use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;
use std::time::Duration;

/// Global Prometheus handle
static METRICS_HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

/// Metric names
pub const PREDICTIONS_TOTAL: &str = "cloudcast_predictions_total";
pub const PREDICTION_LATENCY: &str = "cloudcast_prediction_latency_seconds";
pub const UPLOAD_BYTES: &str = "cloudcast_upload_bytes";
pub const UPLOADS_PERSISTED: &str = "cloudcast_uploads_persisted_total";

/// Install the Prometheus recorder. Calling this twice is a no-op.
pub fn init_metrics() -> Result<(), BuildError> {
    if METRICS_HANDLE.get().is_some() {
        return Ok(());
    }

    let handle = PrometheusBuilder::new().install_recorder()?;
    let _ = METRICS_HANDLE.set(handle);

    describe_counter!(PREDICTIONS_TOTAL, "Prediction requests by outcome");
    describe_histogram!(PREDICTION_LATENCY, "End-to-end prediction latency in seconds");
    describe_histogram!(UPLOAD_BYTES, "Size of each uploaded frame in bytes");
    describe_counter!(UPLOADS_PERSISTED, "Uploaded frames written to disk");

    tracing::info!("Metrics system initialized");
    Ok(())
}

/// Handler for /metrics endpoint
pub async fn metrics_handler() -> String {
    METRICS_HANDLE
        .get()
        .map(PrometheusHandle::render)
        .unwrap_or_default()
}

/// Outcome label for a finished prediction request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Ok,
    ClientError,
    ServerError,
}

impl Outcome {
    pub fn as_label(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::ClientError => "client_error",
            Self::ServerError => "server_error",
        }
    }
}

/// Record a finished prediction request
pub fn record_prediction(outcome: Outcome, elapsed: Duration) {
    counter!(PREDICTIONS_TOTAL, "outcome" => outcome.as_label()).increment(1);
    histogram!(PREDICTION_LATENCY).record(elapsed.as_secs_f64());
}

/// Record the size of one uploaded frame
#[allow(clippy::cast_precision_loss)]
pub fn record_upload_size(bytes: usize) {
    histogram!(UPLOAD_BYTES).record(bytes as f64);
}

pub fn record_upload_persisted() {
    counter!(UPLOADS_PERSISTED).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_labels() {
        assert_eq!(Outcome::Ok.as_label(), "ok");
        assert_eq!(Outcome::ClientError.as_label(), "client_error");
        assert_eq!(Outcome::ServerError.as_label(), "server_error");
    }

    #[test]
    fn test_recording_without_recorder_is_noop() {
        record_prediction(Outcome::Ok, Duration::from_millis(5));
        record_upload_size(1024);
        record_upload_persisted();
    }
}

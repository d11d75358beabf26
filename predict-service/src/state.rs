//! Shared application state for the prediction service.

use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::config::ServiceConfig;
use crate::predictor::FramePredictor;
use crate::storage::UploadStore;

/// Immutable per-process state handed to every request.
#[derive(Clone)]
pub struct AppState {
    pub config: ServiceConfig,

    /// Active prediction stand-in (or, eventually, a real model).
    pub predictor: Arc<dyn FramePredictor>,

    pub store: UploadStore,

    /// Service start time for uptime calculations
    pub started_at: DateTime<Utc>,
}

impl AppState {
    /// Creates state with the predictor selected by `config.prediction_mode`.
    pub fn new(config: ServiceConfig) -> Self {
        let predictor = config.prediction_mode.build();
        Self::with_predictor(config, predictor)
    }

    /// Creates state with an explicit predictor.
    pub fn with_predictor(config: ServiceConfig, predictor: Arc<dyn FramePredictor>) -> Self {
        let store = UploadStore::new(config.upload_dir.clone(), config.persist_uploads);
        Self {
            config,
            predictor,
            store,
            started_at: Utc::now(),
        }
    }

    /// Get service uptime in seconds.
    pub fn uptime_secs(&self) -> i64 {
        (Utc::now() - self.started_at).num_seconds()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predictor::{PassThroughPredictor, PredictionMode};

    #[test]
    fn test_predictor_follows_mode() {
        let mut config = ServiceConfig::for_upload_dir("uploads");
        assert_eq!(AppState::new(config.clone()).predictor.name(), "placeholder");

        config.prediction_mode = PredictionMode::PassThrough;
        assert_eq!(AppState::new(config).predictor.name(), "pass-through");
    }

    #[test]
    fn test_store_follows_config() {
        let mut config = ServiceConfig::for_upload_dir("/tmp/cloudcast-test");
        config.persist_uploads = false;

        let state = AppState::with_predictor(config, Arc::new(PassThroughPredictor));
        assert!(!state.store.is_enabled());
        assert_eq!(state.store.dir(), std::path::Path::new("/tmp/cloudcast-test"));
        assert!(state.uptime_secs() >= 0);
    }
}

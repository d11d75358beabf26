//! Optional on-disk persistence of uploaded frames
//!
//! Files land directly in the configured upload directory as
//! `<request_id>_<slot>[_<sanitised client name>]`. The request id is unique
//! per request, so concurrent requests never share a path.

use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::PredictError;
use crate::upload::{Upload, UploadSet};

/// Writes raw upload bytes under request-scoped names.
#[derive(Debug, Clone)]
pub struct UploadStore {
    dir: PathBuf,
    enabled: bool,
}

impl UploadStore {
    pub fn new(dir: impl Into<PathBuf>, enabled: bool) -> Self {
        Self {
            dir: dir.into(),
            enabled,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Path an upload is stored at for the given request.
    pub fn path_for(&self, request_id: &str, upload: &Upload) -> PathBuf {
        let name = match upload.sanitized_file_name() {
            Some(suffix) => format!("{request_id}_{}_{suffix}", upload.slot),
            None => format!("{request_id}_{}", upload.slot),
        };
        self.dir.join(name)
    }

    /// Persist every upload in the set. Returns the written paths, or an
    /// empty list when persistence is disabled.
    pub async fn persist(
        &self,
        request_id: &str,
        uploads: &UploadSet,
    ) -> Result<Vec<PathBuf>, PredictError> {
        if !self.enabled {
            return Ok(Vec::new());
        }

        self.ensure_dir().await?;

        let mut written = Vec::with_capacity(3);
        for upload in uploads.iter() {
            let path = self.path_for(request_id, upload);
            tokio::fs::write(&path, &upload.data)
                .await
                .map_err(|source| PredictError::Storage {
                    path: path.clone(),
                    source,
                })?;

            debug!(
                request_id = %request_id,
                slot = %upload.slot,
                bytes = upload.data.len(),
                path = %path.display(),
                "Upload persisted"
            );
            crate::metrics::record_upload_persisted();
            written.push(path);
        }

        info!(request_id = %request_id, files = written.len(), "Uploads persisted");
        Ok(written)
    }

    /// Create the upload directory if it does not exist.
    pub async fn ensure_dir(&self) -> Result<(), PredictError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|source| PredictError::Storage {
                path: self.dir.clone(),
                source,
            })
    }

    /// Readiness check: true when persistence is disabled or the directory
    /// can be created.
    pub async fn is_writable(&self) -> bool {
        !self.enabled || self.ensure_dir().await.is_ok()
    }
}

//! Error taxonomy for the prediction endpoint
//!
//! Every failure is either a client input problem (4xx, detected before any
//! side effect) or a server I/O problem (5xx). Both render as a small JSON
//! payload so callers can tell them apart without parsing prose.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

use crate::upload::UploadSlot;

/// Errors produced while handling `POST /predict`.
#[derive(Error, Debug)]
pub enum PredictError {
    #[error("Malformed multipart body: {0}")]
    MalformedMultipart(String),

    #[error("Upload exceeds the configured size limit")]
    PayloadTooLarge,

    #[error("Missing required upload field '{0}'")]
    MissingField(UploadSlot),

    #[error("Upload field '{0}' was sent more than once")]
    DuplicateField(UploadSlot),

    #[error("Upload field '{0}' is empty")]
    EmptyField(UploadSlot),

    #[error("Upload field '{slot}' is not a decodable image: {reason}")]
    UndecodableImage { slot: UploadSlot, reason: String },

    #[error("Failed to persist upload to {path}: {source}")]
    Storage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to encode output image: {0}")]
    Encode(#[from] image::ImageError),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Coarse classification exposed to clients as `kind`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    ClientInput,
    ServerIo,
}

impl PredictError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MalformedMultipart(_)
            | Self::PayloadTooLarge
            | Self::MissingField(_)
            | Self::DuplicateField(_)
            | Self::EmptyField(_)
            | Self::UndecodableImage { .. } => ErrorKind::ClientInput,
            Self::Storage { .. } | Self::Encode(_) | Self::Internal(_) => ErrorKind::ServerIo,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::MalformedMultipart(_)
            | Self::MissingField(_)
            | Self::DuplicateField(_)
            | Self::EmptyField(_) => StatusCode::BAD_REQUEST,
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::UndecodableImage { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Storage { .. } | Self::Encode(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::MalformedMultipart(_) => "malformed_multipart",
            Self::PayloadTooLarge => "payload_too_large",
            Self::MissingField(_) => "missing_field",
            Self::DuplicateField(_) => "duplicate_field",
            Self::EmptyField(_) => "empty_field",
            Self::UndecodableImage { .. } => "undecodable_image",
            Self::Storage { .. } => "storage_failed",
            Self::Encode(_) => "encode_failed",
            Self::Internal(_) => "internal_error",
        }
    }

    /// Message safe to show to the client. Server-side causes (paths, io
    /// errors) stay in the logs.
    pub fn public_message(&self) -> String {
        match self.kind() {
            ErrorKind::ClientInput => self.to_string(),
            ErrorKind::ServerIo => match self {
                Self::Storage { .. } => "Failed to store uploaded frames".to_string(),
                Self::Encode(_) => "Failed to encode predicted frame".to_string(),
                _ => "Internal server error".to_string(),
            },
        }
    }

    /// Attach the request id so the rendered body can be correlated with logs.
    pub fn with_request_id(self, request_id: impl Into<String>) -> RequestError {
        RequestError {
            error: self,
            request_id: Some(request_id.into()),
        }
    }
}

/// JSON error body
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub ok: bool,
    pub kind: ErrorKind,
    pub code: &'static str,
    pub error: String,
    pub request_id: Option<String>,
}

/// A [`PredictError`] bound to the request it happened in.
#[derive(Debug)]
pub struct RequestError {
    pub error: PredictError,
    pub request_id: Option<String>,
}

impl From<PredictError> for RequestError {
    fn from(error: PredictError) -> Self {
        Self {
            error,
            request_id: None,
        }
    }
}

impl IntoResponse for RequestError {
    fn into_response(self) -> Response {
        let status = self.error.status();
        let body = ErrorBody {
            ok: false,
            kind: self.error.kind(),
            code: self.error.code(),
            error: self.error.public_message(),
            request_id: self.request_id,
        };
        (status, Json(body)).into_response()
    }
}

impl IntoResponse for PredictError {
    fn into_response(self) -> Response {
        RequestError::from(self).into_response()
    }
}

/// Configuration errors raised at startup.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for {var}: {value:?} ({reason})")]
    InvalidValue {
        var: &'static str,
        value: String,
        reason: String,
    },

    #[error("Invalid CORS origin {0:?}")]
    InvalidOrigin(String),
}

//! Multipart upload parsing
//!
//! A prediction request carries exactly three frames in the fixed slots
//! `file1`, `file2` and `file3`. Parsing reads every field fully into memory
//! and validates the set before anything touches the disk.

use axum::body::Bytes;
use axum::extract::multipart::{Multipart, MultipartError};
use axum::http::StatusCode;
use std::fmt;
use tracing::debug;

use crate::error::PredictError;

/// Longest sanitised file name kept as a storage suffix.
const MAX_SANITIZED_NAME_LEN: usize = 64;

/// One of the three fixed upload positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UploadSlot {
    File1,
    File2,
    File3,
}

impl UploadSlot {
    /// All slots in request order.
    pub const ALL: [UploadSlot; 3] = [UploadSlot::File1, UploadSlot::File2, UploadSlot::File3];

    /// Multipart field name for this slot.
    pub fn field_name(self) -> &'static str {
        match self {
            Self::File1 => "file1",
            Self::File2 => "file2",
            Self::File3 => "file3",
        }
    }

    pub fn from_field_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|slot| slot.field_name() == name)
    }

    pub fn index(self) -> usize {
        match self {
            Self::File1 => 0,
            Self::File2 => 1,
            Self::File3 => 2,
        }
    }
}

impl fmt::Display for UploadSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.field_name())
    }
}

/// A single uploaded frame, still encoded.
#[derive(Debug, Clone)]
pub struct Upload {
    pub slot: UploadSlot,
    pub data: Bytes,
    /// Client-supplied file name, verbatim. Only used for logging and,
    /// after [`sanitize_file_name`], as a storage suffix.
    pub file_name: Option<String>,
    pub content_type: Option<String>,
}

impl Upload {
    pub fn new(slot: UploadSlot, data: impl Into<Bytes>) -> Self {
        Self {
            slot,
            data: data.into(),
            file_name: None,
            content_type: None,
        }
    }

    pub fn sanitized_file_name(&self) -> Option<String> {
        self.file_name.as_deref().and_then(sanitize_file_name)
    }
}

/// Exactly one non-empty upload per slot.
#[derive(Debug, Clone)]
pub struct UploadSet {
    uploads: [Upload; 3],
}

impl UploadSet {
    pub fn get(&self, slot: UploadSlot) -> &Upload {
        &self.uploads[slot.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Upload> {
        self.uploads.iter()
    }

    pub fn total_bytes(&self) -> usize {
        self.uploads.iter().map(|u| u.data.len()).sum()
    }

    /// Read every field of a multipart body into an [`UploadSet`].
    ///
    /// Unknown fields are skipped. Fails on a repeated slot, a missing slot
    /// or an empty payload.
    pub async fn from_multipart(mut multipart: Multipart) -> Result<Self, PredictError> {
        let mut builder = UploadSetBuilder::default();

        while let Some(field) = multipart.next_field().await.map_err(map_multipart_error)? {
            let Some(slot) = field.name().and_then(UploadSlot::from_field_name) else {
                debug!(field = ?field.name(), "Skipping unknown multipart field");
                continue;
            };

            let file_name = field.file_name().map(str::to_string);
            let content_type = field.content_type().map(str::to_string);
            let data = field.bytes().await.map_err(map_multipart_error)?;

            debug!(
                slot = %slot,
                bytes = data.len(),
                file_name = ?file_name,
                content_type = ?content_type,
                "Received upload"
            );

            builder.insert(Upload {
                slot,
                data,
                file_name,
                content_type,
            })?;
        }

        builder.finish()
    }
}

/// Collects uploads slot by slot.
#[derive(Debug, Default)]
pub struct UploadSetBuilder {
    slots: [Option<Upload>; 3],
}

impl UploadSetBuilder {
    pub fn insert(&mut self, upload: Upload) -> Result<(), PredictError> {
        let entry = &mut self.slots[upload.slot.index()];
        if entry.is_some() {
            return Err(PredictError::DuplicateField(upload.slot));
        }
        *entry = Some(upload);
        Ok(())
    }

    pub fn finish(self) -> Result<UploadSet, PredictError> {
        let [a, b, c] = self.slots;
        let a = a.ok_or(PredictError::MissingField(UploadSlot::File1))?;
        let b = b.ok_or(PredictError::MissingField(UploadSlot::File2))?;
        let c = c.ok_or(PredictError::MissingField(UploadSlot::File3))?;

        let uploads = [a, b, c];
        if let Some(empty) = uploads.iter().find(|u| u.data.is_empty()) {
            return Err(PredictError::EmptyField(empty.slot));
        }

        Ok(UploadSet { uploads })
    }
}

fn map_multipart_error(err: MultipartError) -> PredictError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        PredictError::PayloadTooLarge
    } else {
        PredictError::MalformedMultipart(err.body_text())
    }
}

/// Reduce a client-supplied file name to something safe to embed in a
/// storage path.
///
/// Only the last path component survives, characters outside
/// `[A-Za-z0-9._-]` become `_`, leading dots are stripped and the result is
/// capped in length. Returns `None` when nothing usable remains.
pub fn sanitize_file_name(raw: &str) -> Option<String> {
    let base = raw.rsplit(['/', '\\']).next().unwrap_or_default();

    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();

    let trimmed: String = cleaned
        .trim_start_matches('.')
        .chars()
        .take(MAX_SANITIZED_NAME_LEN)
        .collect();

    if trimmed.is_empty() || trimmed.chars().all(|c| c == '_') {
        None
    } else {
        Some(trimmed)
    }
}

//! Service configuration
//!
//! Everything is read from environment variables at startup. Values that are
//! set but fail to parse are reported instead of silently replaced by
//! defaults.

use axum::http::HeaderValue;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;
use crate::predictor::PredictionMode;

/// Port the CloudCast frontend calls.
pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_UPLOAD_DIR: &str = "uploads";
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 32 * 1024 * 1024;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Frontend origin allowed in development when no allow-list is given.
pub const DEV_FRONTEND_ORIGIN: &str = "http://localhost:8080";

/// Deployment environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    Development,
    #[default]
    Production,
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" | "local" => Ok(Self::Development),
            "production" | "prod" => Ok(Self::Production),
            other => Err(format!("unknown environment '{other}'")),
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "pretty" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown log format '{other}'")),
        }
    }
}

/// Prediction service configuration
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub bind_addr: SocketAddr,
    pub environment: Environment,

    /// Directory uploads are persisted to
    pub upload_dir: PathBuf,

    /// Whether uploads are written to `upload_dir` at all
    pub persist_uploads: bool,

    /// CORS allow-list. Empty means no cross-origin access.
    pub allowed_origins: Vec<String>,

    pub max_upload_bytes: usize,
    pub request_timeout: Duration,
    pub prediction_mode: PredictionMode,
    pub log_format: LogFormat,
    pub instance_id: String,
}

impl ServiceConfig {
    /// Configuration with defaults and the given upload directory. No
    /// cross-origin access is allowed.
    pub fn for_upload_dir(upload_dir: impl Into<PathBuf>) -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)),
            environment: Environment::Production,
            upload_dir: upload_dir.into(),
            persist_uploads: true,
            allowed_origins: Vec::new(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            prediction_mode: PredictionMode::default(),
            log_format: LogFormat::default(),
            instance_id: short_instance_id(),
        }
    }

    /// Build configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment: Environment = parse_var(&lookup, "CLOUDCAST_ENV")?.unwrap_or_default();

        let allowed_origins = match lookup("CLOUDCAST_ALLOWED_ORIGINS") {
            Some(raw) => parse_origins(&raw),
            None if environment == Environment::Development => {
                vec![DEV_FRONTEND_ORIGIN.to_string()]
            }
            None => Vec::new(),
        };

        let bind_addr = parse_var(&lookup, "CLOUDCAST_BIND_ADDR")?
            .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)));

        let persist_uploads = match lookup("CLOUDCAST_PERSIST_UPLOADS") {
            Some(raw) => parse_bool("CLOUDCAST_PERSIST_UPLOADS", &raw)?,
            None => true,
        };

        let config = Self {
            bind_addr,
            environment,
            upload_dir: lookup("CLOUDCAST_UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_UPLOAD_DIR)),
            persist_uploads,
            allowed_origins,
            max_upload_bytes: parse_var(&lookup, "CLOUDCAST_MAX_UPLOAD_BYTES")?
                .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES),
            request_timeout: Duration::from_secs(
                parse_var(&lookup, "CLOUDCAST_REQUEST_TIMEOUT_SECS")?
                    .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
            ),
            prediction_mode: parse_var(&lookup, "CLOUDCAST_PREDICTION_MODE")?.unwrap_or_default(),
            log_format: parse_var(&lookup, "CLOUDCAST_LOG_FORMAT")?.unwrap_or_default(),
            instance_id: lookup("INSTANCE_ID").unwrap_or_else(short_instance_id),
        };

        // Fail at startup rather than when building the CORS layer
        config.origin_header_values()?;

        Ok(config)
    }

    /// Allowed origins as header values. A wildcard is rejected: it cannot be
    /// combined with credentialed requests.
    pub fn origin_header_values(&self) -> Result<Vec<HeaderValue>, ConfigError> {
        self.allowed_origins
            .iter()
            .map(|origin| {
                if origin == "*" {
                    return Err(ConfigError::InvalidOrigin(origin.clone()));
                }
                HeaderValue::from_str(origin).map_err(|_| ConfigError::InvalidOrigin(origin.clone()))
            })
            .collect()
    }
}

fn short_instance_id() -> String {
    uuid::Uuid::new_v4().to_string()[..8].to_string()
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|o| o.trim().trim_end_matches('/'))
        .filter(|o| !o.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_bool(var: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            var,
            value: raw.to_string(),
            reason: "expected a boolean".to_string(),
        }),
    }
}

fn parse_var<F, T>(lookup: &F, var: &'static str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(var) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e: T::Err| ConfigError::InvalidValue {
                var,
                value: raw.clone(),
                reason: e.to_string(),
            }),
    }
}

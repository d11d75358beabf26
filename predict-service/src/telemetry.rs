//! Tracing setup

use tracing_subscriber::EnvFilter;

use crate::config::LogFormat;

fn default_filter() -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("predict_service=info,tower_http=debug"))
}

/// Initialize tracing. `RUST_LOG` overrides the default filter.
pub fn init_tracing(format: LogFormat) {
    let builder = tracing_subscriber::fmt().with_env_filter(default_filter());

    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

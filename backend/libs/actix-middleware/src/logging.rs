//! Tracing subscriber setup shared by the service binaries.
//!
//! Request spans come from `tracing_actix_web::TracingLogger`; this module only
//! installs the global subscriber. `LOG_FORMAT=json` switches to one JSON
//! object per line for log aggregation, anything else gives human readable
//! output. Filtering follows `RUST_LOG`, defaulting to `info` plus `debug` for
//! the calling service.

use serde::Deserialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Default filter when `RUST_LOG` is unset.
pub fn default_filter(service_crate: &str) -> String {
    format!("info,{service_crate}=debug,actix_middleware=info,crypto_core=info")
}

/// Install the global subscriber. Calling it twice is harmless; the second
/// call is ignored.
pub fn init_tracing(service_crate: &str, format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(service_crate)));

    let registry = tracing_subscriber::registry().with(filter);

    let result = match format {
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_target(true),
            )
            .try_init(),
        LogFormat::Text => registry
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .try_init(),
    };

    if result.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}

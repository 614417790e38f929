//! Structured logging setup.
//!
//! Uses the tracing crate. The level comes from configuration, with
//! `RUST_LOG` taking precedence when set.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the global tracing subscriber.
///
/// Safe to call once per process; later calls are ignored (matters for
/// tests that spin several service instances).
pub fn init(log_level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("preset_sync={log_level},tower_http=warn").into());

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}

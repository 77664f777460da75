//! # Logging
//!
//! `tracing` subscriber initialisation.
//!
//! Logs always go to stderr; stdout is reserved for the provisioning report
//! so it can be piped (e.g. `--output json | jq`).
//!
//! `RUST_LOG` wins when set. Otherwise the configured level applies to this
//! crate only.

use crate::config::LogFormat;
use crate::constants::LOG_TARGET;
use tracing_subscriber::EnvFilter;

/// Build the env filter for a configured level such as `INFO` or `debug`
#[must_use]
pub fn env_filter(log_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("{LOG_TARGET}={}", log_level.to_lowercase()))
    })
}

/// Install the global subscriber
///
/// Returns `false` if a subscriber was already installed (e.g. in tests).
pub fn init(log_level: &str, format: LogFormat, enable_color: bool) -> bool {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter(log_level))
        .with_writer(std::io::stderr)
        .with_target(false);

    let result = match format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Text => builder.with_ansi(enable_color).try_init(),
    };
    result.is_ok()
}

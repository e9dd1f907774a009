//! Logging infrastructure for GraphGuard.
//!
//! Structured logging controlled by the `GRAPHGUARD_DEBUG` environment
//! variable, in the same idiom as the host crate's own logging module.
//!
//! # Environment Variables
//!
//! - `GRAPHGUARD_DEBUG=true|1|yes` - Enable debug logging
//! - `GRAPHGUARD_LOG_LEVEL=trace|debug|info|warn|error` - Set a specific level
//! - `GRAPHGUARD_LOG_FORMAT=json|pretty|compact` - Set output format (default: pretty)

use std::env;
use std::sync::Once;

static INIT: Once = Once::new();

/// `true` if `GRAPHGUARD_DEBUG` is set to "true", "1", or "yes" (case-insensitive).
#[inline]
pub fn is_debug_enabled() -> bool {
    env::var("GRAPHGUARD_DEBUG")
        .map(|v| matches!(v.to_lowercase().as_str(), "true" | "1" | "yes"))
        .unwrap_or(false)
}

/// The configured log level, defaulting to "debug" when debug is enabled,
/// "warn" otherwise.
pub fn get_log_level() -> &'static str {
    if let Ok(level) = env::var("GRAPHGUARD_LOG_LEVEL") {
        match level.to_lowercase().as_str() {
            "trace" => "trace",
            "debug" => "debug",
            "info" => "info",
            "warn" => "warn",
            "error" => "error",
            _ if is_debug_enabled() => "debug",
            _ => "warn",
        }
    } else if is_debug_enabled() {
        "debug"
    } else {
        "warn"
    }
}

/// The configured log output format. Defaults to "pretty" (the CLI's
/// diagnostic transcript is meant to be read by a human).
pub fn get_log_format() -> &'static str {
    env::var("GRAPHGUARD_LOG_FORMAT")
        .map(|f| match f.to_lowercase().as_str() {
            "json" => "json",
            "compact" => "compact",
            _ => "pretty",
        })
        .unwrap_or("pretty")
}

/// Initialize the `tracing` subscriber once. A no-op on repeated calls.
pub fn init() {
    INIT.call_once(|| {
        if !is_debug_enabled() && env::var("GRAPHGUARD_LOG_LEVEL").is_err() {
            return;
        }

        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        let level = get_log_level();
        let filter = EnvFilter::try_new(format!(
            "graphguard_core={level},graphguard_rdf={level},graphguard_cli={level}"
        ))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

        match get_log_format() {
            "json" => {
                tracing_subscriber::registry()
                    .with(filter)
                    .with(fmt::layer().json())
                    .init();
            }
            "compact" => {
                tracing_subscriber::registry()
                    .with(filter)
                    .with(fmt::layer().compact())
                    .init();
            }
            _ => {
                tracing_subscriber::registry()
                    .with(filter)
                    .with(fmt::layer().pretty())
                    .init();
            }
        }

        tracing::info!(level, format = get_log_format(), "graphguard logging initialized");
    });
}

/// Conditional debug logging, only emitted when `GRAPHGUARD_DEBUG` is set.
#[macro_export]
macro_rules! gg_debug {
    ($($arg:tt)*) => {
        if $crate::logging::is_debug_enabled() {
            tracing::debug!($($arg)*);
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_level_defaults_to_warn() {
        // SAFETY: test runs single-threaded under the default test harness.
        unsafe {
            env::remove_var("GRAPHGUARD_DEBUG");
            env::remove_var("GRAPHGUARD_LOG_LEVEL");
        }
        assert_eq!(get_log_level(), "warn");
    }
}

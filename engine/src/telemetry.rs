//! Telemetry and Observability
//!
//! Handles setting up `tracing-subscriber` for structured logging.
//! Supports config-driven log levels, environment variable overrides,
//! and format switching between pretty (debug) and JSON (release).
//!
//! Logs go to stderr so plans and results printed on stdout stay
//! machine-readable.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Pick the effective log level: the `--log` flag wins over the config file
pub fn resolve_log_level(cli_level: Option<&str>, config_level: &str) -> String {
    cli_level
        .map(str::trim)
        .filter(|level| !level.is_empty())
        .unwrap_or(config_level)
        .to_lowercase()
}

fn default_filter(log_level: &str) -> String {
    format!("warn,datapilot_engine={},sdk={}", log_level, log_level)
}

/// Initialize the tracing subscriber with the given log level.
///
/// Priority: `RUST_LOG` env var > `log_level` parameter.
///
/// In debug builds: pretty-printed terminal output.
/// In release builds: JSON structured output with spans.
pub fn init_telemetry_with_level(log_level: &str) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(log_level)));

    #[cfg(debug_assertions)]
    {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .pretty()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .try_init()
            .ok();
    }

    #[cfg(not(debug_assertions))]
    {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_writer(std::io::stderr),
            )
            .try_init()
            .ok();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_level_wins() {
        assert_eq!(resolve_log_level(Some("DEBUG"), "info"), "debug");
        assert_eq!(resolve_log_level(None, "warn"), "warn");
        assert_eq!(resolve_log_level(Some("  "), "info"), "info");
    }

    #[test]
    fn test_default_filter_scopes_crates() {
        let filter = default_filter("trace");
        assert!(filter.starts_with("warn,"));
        assert!(filter.contains("datapilot_engine=trace"));
        assert!(EnvFilter::try_new(&filter).is_ok());
    }

    #[test]
    fn test_init_is_idempotent() {
        init_telemetry_with_level("info");
        init_telemetry_with_level("debug");
    }
}

//! Tracing subscriber setup for the CLI.
//!
//! Library code only emits `tracing` events; the subscriber is installed
//! here, once, at the binary boundary.

use tracing_subscriber::EnvFilter;

/// Environment variable controlling the log filter (e.g. `debug`,
/// `opscan=trace`).
pub const LOG_ENV: &str = "OPSCAN_LOG";

/// Environment variable selecting the log format.
pub const LOG_FORMAT_ENV: &str = "OPSCAN_LOG_FORMAT";

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable logs.
    #[default]
    Human,
    /// JSON logs (one event per line).
    Json,
}

impl LogFormat {
    /// Parse from string (case-insensitive).
    #[must_use]
    pub fn from_arg(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "human" => Some(Self::Human),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Parse log format from the `OPSCAN_LOG_FORMAT` env var.
#[must_use]
pub fn parse_log_format_from_env() -> Option<LogFormat> {
    std::env::var(LOG_FORMAT_ENV)
        .ok()
        .and_then(|value| LogFormat::from_arg(value.trim()))
}

/// Initialize logging. `verbose` raises the default filter to `debug`;
/// `OPSCAN_LOG` overrides it entirely.
pub fn init(format: LogFormat, verbose: bool) {
    let default_filter = if verbose { "opscan=debug" } else { "opscan=warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(default_filter));

    match format {
        LogFormat::Json => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .json()
                .with_writer(std::io::stderr)
                .try_init()
                .ok();
        }
        LogFormat::Human => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .with_target(false)
                .without_time()
                .try_init()
                .ok();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_parsing_is_case_insensitive() {
        assert_eq!(LogFormat::from_arg("JSON"), Some(LogFormat::Json));
        assert_eq!(LogFormat::from_arg("human"), Some(LogFormat::Human));
        assert_eq!(LogFormat::from_arg("yaml"), None);
    }
}

//! Logging initialization for the admin gate.
//!
//! Every binary calls [`init_logging`] once at startup and then uses the
//! standard `tracing` macros. `RUST_LOG` always wins over the configured
//! default level.

use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Selects JSON log lines when set to `json`.
pub const ENV_LOG_FORMAT: &str = "ADMIN_GATE_LOG_FORMAT";

/// Output format for log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

impl LogFormat {
    /// Read the format from [`ENV_LOG_FORMAT`].
    pub fn from_env() -> Self {
        Self::parse(&std::env::var(ENV_LOG_FORMAT).unwrap_or_default())
    }

    /// `json` (any case) selects JSON; anything else is compact.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "json" => LogFormat::Json,
            _ => LogFormat::Compact,
        }
    }
}

/// Initialize logging with the default service name.
///
/// ```ignore
/// init_logging("info");
/// tracing::info!("gate ready");
/// ```
pub fn init_logging(level: &str) {
    init_logging_for_service("admin-gate", level, LogFormat::from_env());
}

/// Initialize logging for a named service.
///
/// Safe to call more than once; later calls are no-ops.
pub fn init_logging_for_service(service_name: &str, level: &str, format: LogFormat) {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(parse_level(level)).into())
        .from_env_lossy();

    let result = match format {
        LogFormat::Json => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .json()
            .finish()
            .try_init(),
        LogFormat::Compact => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .compact()
            .finish()
            .try_init(),
    };

    if result.is_ok() {
        tracing::debug!(service = %service_name, "Logging initialized");
    }
}

/// Parse a log level string into a tracing Level.
pub fn parse_level(level: &str) -> tracing::Level {
    match level.trim().to_lowercase().as_str() {
        "trace" => tracing::Level::TRACE,
        "debug" => tracing::Level::DEBUG,
        "info" => tracing::Level::INFO,
        "warn" | "warning" => tracing::Level::WARN,
        "error" => tracing::Level::ERROR,
        _ => tracing::Level::INFO,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_level_all_variants() {
        assert_eq!(parse_level("trace"), tracing::Level::TRACE);
        assert_eq!(parse_level("debug"), tracing::Level::DEBUG);
        assert_eq!(parse_level("info"), tracing::Level::INFO);
        assert_eq!(parse_level("warn"), tracing::Level::WARN);
        assert_eq!(parse_level("warning"), tracing::Level::WARN);
        assert_eq!(parse_level("error"), tracing::Level::ERROR);
    }

    #[test]
    fn parse_level_case_insensitive() {
        assert_eq!(parse_level("TRACE"), tracing::Level::TRACE);
        assert_eq!(parse_level("Debug"), tracing::Level::DEBUG);
        assert_eq!(parse_level(" WARN "), tracing::Level::WARN);
    }

    #[test]
    fn parse_level_unknown_defaults_to_info() {
        assert_eq!(parse_level(""), tracing::Level::INFO);
        assert_eq!(parse_level("verbose"), tracing::Level::INFO);
    }

    #[test]
    fn log_format_parse() {
        assert_eq!(ENV_LOG_FORMAT, "ADMIN_GATE_LOG_FORMAT");
        assert_eq!(LogFormat::parse(" JSON "), LogFormat::Json);
        assert_eq!(LogFormat::parse("pretty"), LogFormat::Compact);
        assert_eq!(LogFormat::parse(""), LogFormat::Compact);
    }

    #[test]
    fn init_twice_does_not_panic() {
        init_logging_for_service("test", "debug", LogFormat::Compact);
        init_logging_for_service("test", "info", LogFormat::Json);
    }
}

//! Logging initialization.
//!
//! Thin wrapper over the observability crate so that every binary in the
//! workspace sets up tracing the same way: JSONL to `~/.catalog/logs/dev.jsonl`
//! plus a compact stderr layer, filtered by `RUST_LOG` or the given level.

use observability::LogConfig;

/// Initialize logging for `catalogd`.
///
/// ```ignore
/// init_logging("info");
/// tracing::info!("catalogd started");
/// ```
pub fn init_logging(level: &str) {
    init_logging_for_service("catalogd", level);
}

/// Initialize logging with a custom service name.
///
/// Use this to tell components apart in the central log stream, e.g. a
/// relay-only deployment.
pub fn init_logging_for_service(service_name: &str, level: &str) {
    observability::init_with_config(LogConfig {
        service_name: service_name.into(),
        default_level: parse_level(level).to_string().to_lowercase(),
        also_stderr: true,
        ..Default::default()
    });
}

/// Parse a log level string into a tracing Level.
pub fn parse_level(level: &str) -> tracing::Level {
    match level.to_lowercase().as_str() {
        "trace" => tracing::Level::TRACE,
        "debug" => tracing::Level::DEBUG,
        "info" => tracing::Level::INFO,
        "warn" | "warning" => tracing::Level::WARN,
        "error" => tracing::Level::ERROR,
        _ => tracing::Level::INFO,
    }
}

use tracing_subscriber::EnvFilter;

/// Maps the configured `log_level` (e.g. `INFO`, `warning`) to a filter
/// directive. Unknown values fall back to `info`.
pub fn level_directive(log_level: &str) -> &'static str {
    match log_level.trim().to_ascii_lowercase().as_str() {
        "trace" => "trace",
        "debug" => "debug",
        "warn" | "warning" => "warn",
        "error" | "critical" => "error",
        _ => "info",
    }
}

/// Installs the global fmt subscriber.
///
/// `RUST_LOG` takes precedence over the configured level. Calling this
/// more than once keeps the first subscriber.
pub fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level_directive(log_level)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

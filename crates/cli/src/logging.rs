use crate::error::CliError;
use tracing_subscriber::EnvFilter;

/// Maps a `--loglevel` value onto a tracing level name. Syslog-style names
/// are folded into the nearest tracing level.
pub fn level_directive(level: &str) -> Result<&'static str, CliError> {
    let directive = match level.trim().to_ascii_lowercase().as_str() {
        "trace" => "trace",
        "debug" => "debug",
        "info" | "notice" => "info",
        "warn" | "warning" => "warn",
        "error" | "critical" | "alert" | "emergency" | "fatal" => "error",
        "off" => "off",
        _ => return Err(CliError::LogLevel(level.to_string())),
    };
    Ok(directive)
}

/// Installs the global fmt subscriber. `RUST_LOG`, when set, wins over
/// `--loglevel`.
pub fn init(level: &str) -> Result<(), CliError> {
    let directive = level_directive(level)?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_thread_names(true)
        .init();
    Ok(())
}

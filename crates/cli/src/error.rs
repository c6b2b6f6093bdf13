use connectors::error::SourceError;
use engine_config::settings::error::SettingsError;
use engine_runtime::error::TransferError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Invalid settings: {0}")]
    Settings(#[from] SettingsError),

    #[error("Transfer could not start: {0}")]
    Transfer(#[from] TransferError),

    #[error("MySQL source error: {0}")]
    Source(#[from] SourceError),

    #[error("Failed to start async runtime: {0}")]
    Runtime(#[from] std::io::Error),

    #[error("Invalid log level: {0}")]
    LogLevel(String),
}

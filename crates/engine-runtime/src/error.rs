use engine_config::settings::error::SettingsError;
use engine_processing::error::ConsumerError;
use thiserror::Error;

/// Errors that prevent a transfer from starting at all.
///
/// Failures once the pipeline is running are not errors here; they end up in
/// the verdict of the returned report.
#[derive(Debug, Error)]
pub enum TransferError {
    #[error("Settings error: {0}")]
    Settings(#[from] SettingsError),

    #[error("Failed to start upload workers: {0}")]
    Workers(#[from] ConsumerError),
}

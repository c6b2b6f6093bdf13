use thiserror::Error;

/// Errors raised when validating transfer settings.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SettingsError {
    /// A required option was not provided or is blank.
    #[error("Missing required setting: {0}")]
    Missing(&'static str),

    /// An option is present but outside its accepted range.
    #[error("Invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

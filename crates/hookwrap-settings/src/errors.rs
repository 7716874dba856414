//! Settings error types.

use thiserror::Error;

/// Errors raised while loading, validating, or installing settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// The settings file exists but could not be read.
    #[error("failed to read settings file: {0}")]
    Io(#[from] std::io::Error),
    /// The settings file is not valid JSON, or a field has the wrong type.
    #[error("failed to parse settings JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// A value parsed but is outside its allowed set or range.
    #[error("invalid settings value: {0}")]
    InvalidValue(String),
    /// [`init_settings`](crate::init_settings) ran after the global was set.
    #[error("settings already initialized")]
    AlreadyInitialized,
}

/// Result type for settings operations.
pub type Result<T> = std::result::Result<T, SettingsError>;

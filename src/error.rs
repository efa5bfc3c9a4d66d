//! Error types for Ironsight

use thiserror::Error;

/// Errors that can occur while loading a snapshot or computing analytics.
///
/// Missing or null numeric fields inside a snapshot are never errors; they are
/// treated as absent data. Only a snapshot that cannot be read or parsed at all
/// is fatal.
#[derive(Debug, Error)]
pub enum AnalyticsError {
    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Failed to read snapshot: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Date parse error: {0}")]
    DateParseError(String),

    #[error("Invalid engine configuration: {0}")]
    InvalidConfig(String),

    #[error("Unknown exercise: {0}")]
    UnknownExercise(String),

    #[error("Unknown lift category: {0}")]
    UnknownCategory(String),

    #[error("Encoding error: {0}")]
    EncodingError(String),

    #[error("No snapshot loaded")]
    NotLoaded,
}

impl AnalyticsError {
    /// Stable machine-readable code, used by the CLI and FFI error surfaces.
    pub fn code(&self) -> &'static str {
        match self {
            AnalyticsError::JsonError(_) => "JSON_ERROR",
            AnalyticsError::IoError(_) => "IO_ERROR",
            AnalyticsError::DateParseError(_) => "DATE_ERROR",
            AnalyticsError::InvalidConfig(_) => "CONFIG_ERROR",
            AnalyticsError::UnknownExercise(_) => "UNKNOWN_EXERCISE",
            AnalyticsError::UnknownCategory(_) => "UNKNOWN_CATEGORY",
            AnalyticsError::EncodingError(_) => "ENCODING_ERROR",
            AnalyticsError::NotLoaded => "NOT_LOADED",
        }
    }
}

//! Error types for Ratebook

use thiserror::Error;

/// Main error type for Ratebook
#[derive(Error, Debug)]
pub enum RatebookError {
    #[error("Store error: {0}")]
    StoreError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Calendar error: {0}")]
    CalendarError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Bulk operations not supported for table: {0}")]
    UnsupportedModel(&'static str),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),
}

/// Result type alias for Ratebook operations
pub type Result<T> = std::result::Result<T, RatebookError>;

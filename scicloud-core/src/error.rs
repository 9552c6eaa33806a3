//! Error types for the scicloud calendar.

use thiserror::Error;

use crate::store::StoreError;
use crate::validation::FieldError;

/// Errors that can occur in calendar operations.
#[derive(Error, Debug)]
pub enum SciCloudError {
    #[error("Not authenticated: no signed-in user")]
    NotAuthenticated,

    #[error("Invalid time range: start {start} must be before end {end}")]
    InvalidTimeRange { start: String, end: String },

    #[error("Event not found: {0}")]
    NotFound(String),

    #[error("Validation failed: {}", summarize(.0))]
    ValidationFailed(Vec<FieldError>),

    #[error("{0}")]
    Unknown(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl SciCloudError {
    /// Field errors carried by a validation failure (empty for other kinds).
    pub fn field_errors(&self) -> &[FieldError] {
        match self {
            SciCloudError::ValidationFailed(errors) => errors,
            _ => &[],
        }
    }
}

impl From<StoreError> for SciCloudError {
    fn from(err: StoreError) -> Self {
        SciCloudError::Unknown(err.to_string())
    }
}

fn summarize(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Result type alias for calendar operations.
pub type SciCloudResult<T> = Result<T, SciCloudError>;

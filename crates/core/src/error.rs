//! Core error type shared across the workspace.

/// Errors produced by core validation and type construction.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// Input failed validation (bad request payload, out-of-range field).
    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<validator::ValidationErrors> for CoreError {
    fn from(errors: validator::ValidationErrors) -> Self {
        CoreError::Validation(errors.to_string())
    }
}

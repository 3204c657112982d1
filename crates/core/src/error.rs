//! Core Error Types
//!
//! Dependency-light error types used across the Yoga GPT workspace. The
//! application crate wraps these in its own `AppError` together with the
//! LLM, embedding and index failures.

use thiserror::Error;

/// Core error type for the Yoga GPT workspace.
#[derive(Error, Debug)]
pub enum CoreError {
    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Unknown role label in a conversation record
    #[error("Unknown role: {0}")]
    UnknownRole(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Result type alias for core errors
pub type CoreResult<T> = Result<T, CoreError>;

impl CoreError {
    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}

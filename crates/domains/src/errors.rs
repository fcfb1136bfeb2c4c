//! # DomainError
//!
//! Centralized error handling for the blog. Every port and service returns
//! this type; the API layer maps the variants onto HTTP status codes.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Resource not found (e.g., Post, Comment, User)
    #[error("{0} not found with ID {1}")]
    NotFound(String, String),

    /// Malformed input that cannot be reported as a field error
    /// (e.g., unparsable date, comment reply to a foreign post)
    #[error("validation error: {0}")]
    Validation(String),

    /// No authenticated session
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Authenticated, but not allowed (e.g., non-moderator changing settings)
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Resource already exists
    #[error("conflict: {0}")]
    Conflict(String),

    /// Infrastructure failure (e.g., DB down, disk full, SMTP unreachable)
    #[error("internal service error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn not_found(kind: &str, id: impl ToString) -> Self {
        DomainError::NotFound(kind.to_string(), id.to_string())
    }

    pub fn internal(err: impl std::fmt::Display) -> Self {
        DomainError::Internal(err.to_string())
    }
}

/// A specialized Result type for blog logic.
pub type Result<T> = std::result::Result<T, DomainError>;

//! # AppError
//!
//! Centralized error handling for the image-hoster ecosystem.
//! Maps domain-specific failures to actionable error types.
//!
//! Note that an ownership denial is NOT an `AppError`: the workflows hand
//! those back as ordinary values so the caller can keep rendering the page
//! (see `ih-services`). This enum covers the failures that actually abort
//! an operation.

use thiserror::Error;

/// The primary error type for all ih-core operations.
#[derive(Error, Debug)]
pub enum AppError {
    /// Resource not found (e.g., Image, Tag, User)
    #[error("{0} not found with ID {1}")]
    NotFound(String, String),

    /// Validation failure (e.g., blank username at registration)
    #[error("validation error: {0}")]
    Validation(String),

    /// Security/Auth failure (e.g., bad login, missing session)
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Unique-constraint collision (e.g., duplicate tag name, taken username)
    #[error("conflict: {0}")]
    Conflict(String),

    /// Infrastructure failure (e.g., DB down)
    #[error("internal service error: {0}")]
    Internal(String),
}

/// A specialized Result type for image-hoster logic.
pub type Result<T> = std::result::Result<T, AppError>;

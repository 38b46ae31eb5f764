//! # DomainError
//!
//! Centralized error handling for Storytime.
//! Maps domain-specific failures to actionable error types.

use std::fmt::Display;

use thiserror::Error;

/// The primary error type for all domain and service operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Resource not found (e.g., Story, User)
    #[error("{0} not found with ID {1}")]
    NotFound(String, String),

    /// Validation failure (e.g., missing title, invalid file type)
    #[error("validation error: {0}")]
    Validation(String),

    /// No usable identity (anonymous caller, bad credentials, revoked session)
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Identity is known but lacks the capability
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Resource already exists (e.g., duplicate email)
    #[error("conflict: {0}")]
    Conflict(String),

    /// Upload exceeds the configured ceiling
    #[error("payload too large: {0}")]
    PayloadTooLarge(String),

    /// Infrastructure failure (e.g., DB down, disk full)
    #[error("internal service error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn not_found(entity: &str, id: impl Display) -> Self {
        Self::NotFound(entity.to_string(), id.to_string())
    }

    pub fn internal(err: impl Display) -> Self {
        Self::Internal(err.to_string())
    }
}

/// A specialized Result type for Storytime logic.
pub type DomainResult<T> = std::result::Result<T, DomainError>;

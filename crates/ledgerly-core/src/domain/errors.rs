//! Domain error types
//!
//! This module defines error types specific to domain operations,
//! including validation failures and invalid value construction.

use thiserror::Error;

/// Errors that can occur in domain operations
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    /// Amount is negative or not a finite number
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// Category string is not part of the closed category set
    #[error("Unknown category: {0}")]
    UnknownCategory(String),

    /// Local identifier is empty or malformed
    #[error("Invalid local id: {0}")]
    InvalidLocalId(String),

    /// Remote row identifier is not a positive integer
    #[error("Invalid remote id: {0}")]
    InvalidRemoteId(i64),

    /// Calendar date could not be parsed (expected YYYY-MM-DD)
    #[error("Invalid date: {0}")]
    InvalidDate(String),

    /// ID parsing error
    #[error("Invalid ID format: {0}")]
    InvalidId(String),

    /// Generic validation failure
    #[error("Validation failed: {0}")]
    ValidationFailed(String),
}

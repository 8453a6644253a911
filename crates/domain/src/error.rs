//! Unified error types for the domain layer
//!
//! `DomainError` covers construction and configuration failures (a queue with
//! zero capacity, rules that break cost ordering). Rejected queue operations are
//! not errors in this sense: they are reported as data through
//! [`QueueViolation`](crate::queue_rules::QueueViolation).

use thiserror::Error;

/// Unified error type for domain operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Validation failed (e.g., invalid field values)
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Business rule violation
    #[error("Constraint violation: {0}")]
    Constraint(String),

    /// Parse error (for value objects)
    #[error("Parse error: {0}")]
    Parse(String),
}

impl DomainError {
    /// Creates a validation error for invalid values.
    ///
    /// # Example
    /// ```ignore
    /// if capacity == 0 {
    ///     return Err(DomainError::validation("Queue capacity must be at least 1"));
    /// }
    /// ```
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a constraint violation error
    pub fn constraint(msg: impl Into<String>) -> Self {
        Self::Constraint(msg.into())
    }

    /// Creates a parse error for string-to-type conversion failures.
    ///
    /// Used by `FromStr` implementations when the input doesn't match any
    /// known variant, e.g. an unknown currency name in configuration.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }
}

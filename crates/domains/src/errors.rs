//! # DomainError
//!
//! Centralized error handling for the Inkwell ecosystem.
//! Maps domain-specific failures to actionable error types.

use thiserror::Error;

/// The primary error type for all domain and service operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Malformed or missing input fields (e.g., blank title)
    #[error("validation error: {0}")]
    Validation(String),

    /// Referenced entity absent (e.g., Post, User, Category)
    #[error("{entity} not found with ID {id}")]
    NotFound { entity: &'static str, id: String },

    /// Authenticated, but not allowed to touch this entity
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// No session, an expired session, or bad credentials
    #[error("unauthenticated")]
    Unauthenticated,

    /// Resource already exists (e.g., duplicate username or category name)
    #[error("conflict: {0}")]
    Conflict(String),

    /// Infrastructure failure (e.g., DB down)
    #[error("persistence failure: {0}")]
    Persistence(String),

    /// Hashing or token signing failed
    #[error("internal error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}

/// A specialized Result type for Inkwell domain logic.
pub type DomainResult<T> = std::result::Result<T, DomainError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_message_names_entity_and_id() {
        let err = DomainError::not_found("Post", 42);
        assert_eq!(err.to_string(), "Post not found with ID 42");
    }
}

//! Shared error types for riskmap operations.
//!
//! Only two failures are part of the engine's contract:
//!
//! - [`RiskmapError::Validation`] is raised by the record normalizer when a
//!   create/update payload cannot become a valid risk. It blocks only that one
//!   mutation and names the offending field.
//! - [`RiskmapError::Fetch`] is raised when raw records cannot be retrieved from
//!   the store. The pipeline keeps the previous snapshot visible and the fetch
//!   can simply be retried.
//!
//! Scoring, classification, filtering, sorting and aggregation are total and
//! never produce an error.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for riskmap operations
#[derive(Debug, Error)]
pub enum RiskmapError {
    /// A create/update payload failed validation
    #[error("Validation error on `{field}`: {message}")]
    Validation { field: String, message: String },

    /// Raw records could not be retrieved from the store
    #[error("Fetch error: {0}")]
    Fetch(String),

    /// A store mutation could not be applied
    #[error("Store error: {0}")]
    Store(String),

    /// The referenced risk does not exist
    #[error("Risk not found: {0}")]
    NotFound(String),

    /// Configuration errors
    #[error("Configuration error in {path}: {message}")]
    Config { path: PathBuf, message: String },

    /// IO errors
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON errors
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl RiskmapError {
    /// Create a validation error for a single field
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a fetch error
    pub fn fetch(message: impl Into<String>) -> Self {
        Self::Fetch(message.into())
    }

    /// Create a store error
    pub fn store(message: impl Into<String>) -> Self {
        Self::Store(message.into())
    }

    /// Name of the offending field for validation errors.
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::Validation { field, .. } => Some(field),
            _ => None,
        }
    }

    /// Whether re-invoking the same operation may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Fetch(_) | Self::Io(_))
    }

    /// Whether the caller can fix the problem by changing its input.
    pub fn is_user_fixable(&self) -> bool {
        matches!(
            self,
            Self::Validation { .. } | Self::NotFound(_) | Self::Config { .. }
        )
    }
}

/// Result type alias using our error type
pub type Result<T> = std::result::Result<T, RiskmapError>;

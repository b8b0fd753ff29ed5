//! Error types for modelset collections.

use thiserror::Error;

/// Result type for collection operations.
pub type CollectionResult<T> = Result<T, CollectionError>;

/// Errors that can occur in collection operations.
///
/// Element-level validation failures are deliberately not in this enum's
/// fatal path: a rejected candidate in a bulk `set` is reported through an
/// `Invalid` event and skipped, never aborting the batch. Lookup misses are
/// `Option` sentinels, not errors.
#[derive(Debug, Error)]
pub enum CollectionError {
    /// `sort` was invoked on a collection with no ordering rule.
    #[error("cannot sort a collection without a comparator")]
    MissingComparator,

    /// A model was rejected by the factory's validation.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),
}

/// A factory's reason for rejecting a candidate model.
///
/// Carried by `Invalid` events and by the `Err` result of `create`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ValidationError {
    /// Description of why the candidate was rejected.
    pub message: String,
}

impl ValidationError {
    /// Creates a validation error.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_comparator_message() {
        let err = CollectionError::MissingComparator;
        assert_eq!(
            err.to_string(),
            "cannot sort a collection without a comparator"
        );
    }

    #[test]
    fn validation_error_converts() {
        let err: CollectionError = ValidationError::new("age must be positive").into();
        assert_eq!(err.to_string(), "validation failed: age must be positive");
    }
}

//! Error types for the validation core.

use thiserror::Error;

/// Errors surfaced by the validation core.
///
/// All failures are considered caller or dataset bugs, not transient
/// conditions: the core performs no retries and no silent fallback.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// A named variable is absent from every backing dataset.
    #[error("variable not found: {0}")]
    NotFound(String),

    /// A slice request's rank disagrees with the variable's declared rank.
    #[error("shape mismatch for '{name}': requested rank {requested}, variable rank {actual}")]
    ShapeMismatch {
        name: String,
        requested: usize,
        actual: usize,
    },

    /// Statistics input sequences have unequal lengths.
    #[error("length mismatch: reference has {reference} values, model has {model}")]
    LengthMismatch { reference: usize, model: usize },

    /// Neither matchups nor explicit value pairs were supplied.
    #[error("no statistics input: supply matchups or value pairs")]
    MissingInput,

    /// The backing dataset collaborator failed to open or read.
    #[error("backing dataset error ({path}): {message}")]
    BackingDataset { path: String, message: String },
}

impl ValidationError {
    /// Create a NotFound error.
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound(name.into())
    }

    /// Create a ShapeMismatch error.
    pub fn shape_mismatch(name: impl Into<String>, requested: usize, actual: usize) -> Self {
        Self::ShapeMismatch {
            name: name.into(),
            requested,
            actual,
        }
    }

    /// Create a LengthMismatch error.
    pub fn length_mismatch(reference: usize, model: usize) -> Self {
        Self::LengthMismatch { reference, model }
    }

    /// Create a BackingDataset error, wrapping the offending dataset path.
    pub fn backing_dataset(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::BackingDataset {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Result type for validation operations.
pub type Result<T> = std::result::Result<T, ValidationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ValidationError::not_found("chlorophyll");
        assert_eq!(err.to_string(), "variable not found: chlorophyll");

        let err = ValidationError::shape_mismatch("sst", 2, 3);
        assert_eq!(
            err.to_string(),
            "shape mismatch for 'sst': requested rank 2, variable rank 3"
        );

        let err = ValidationError::length_mismatch(4, 8);
        assert_eq!(
            err.to_string(),
            "length mismatch: reference has 4 values, model has 8"
        );
    }

    #[test]
    fn test_backing_dataset_carries_path() {
        let err = ValidationError::backing_dataset("/data/model.nc", "read failed");
        assert!(err.to_string().contains("/data/model.nc"));
    }
}

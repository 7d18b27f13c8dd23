//! # Error Types
//!
//! Validation error types for alta-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  alta-core errors (this file)                                          │
//! │  ├── ValidationError   - One field-level problem                       │
//! │  └── ValidationErrors  - Every problem found in a submission           │
//! │                                                                         │
//! │  alta-db errors                                                        │
//! │  └── DbError           - Buffer operation failures                     │
//! │                                                                         │
//! │  alta-sync errors                                                      │
//! │  ├── ReplicationError  - Remote store failures (never fatal)           │
//! │  └── SyncError         - Service-level taxonomy                        │
//! │                                                                         │
//! │  Flow: ValidationErrors → DbError → SyncError → ApiError → HTTP 400    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;
use thiserror::Error;

// =============================================================================
// Validation Error
// =============================================================================

/// A single input validation failure.
///
/// Field names use the wire (camelCase) spelling so callers can map the
/// error straight back onto the form field that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ValidationError {
    /// A required field is missing or empty after trimming.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too short.
    #[error("{field} must be at least {min} characters")]
    TooShort { field: String, min: usize },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Amount is below zero (or not a number at all).
    #[error("{field} must not be negative")]
    Negative { field: String },

    /// Invalid format (e.g., non-alphanumeric RUT, unparsable date).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Duplicate value (e.g., two address lines with the same ordinal).
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },
}

impl ValidationError {
    /// Creates a Required error for a field.
    pub fn required(field: impl Into<String>) -> Self {
        ValidationError::Required {
            field: field.into(),
        }
    }

    /// Returns the field this error refers to.
    pub fn field(&self) -> &str {
        match self {
            ValidationError::Required { field }
            | ValidationError::TooShort { field, .. }
            | ValidationError::TooLong { field, .. }
            | ValidationError::OutOfRange { field, .. }
            | ValidationError::MustBePositive { field }
            | ValidationError::Negative { field }
            | ValidationError::InvalidFormat { field, .. }
            | ValidationError::Duplicate { field, .. } => field,
        }
    }
}

// =============================================================================
// Validation Errors (collection)
// =============================================================================

/// All validation failures found in one submission.
///
/// Never empty: the validator only builds one when something is wrong.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("{} validation error(s): {}", .0.len(), summary(.0))]
pub struct ValidationErrors(Vec<ValidationError>);

fn summary(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl ValidationErrors {
    /// Wraps a list of errors. Returns `None` when the list is empty.
    pub fn from_vec(errors: Vec<ValidationError>) -> Option<Self> {
        if errors.is_empty() {
            None
        } else {
            Some(ValidationErrors(errors))
        }
    }

    /// Returns the individual errors.
    pub fn errors(&self) -> &[ValidationError] {
        &self.0
    }

    /// Returns true if any error refers to `field`.
    pub fn has_field(&self, field: &str) -> bool {
        self.0.iter().any(|e| e.field() == field)
    }
}

impl From<ValidationError> for ValidationErrors {
    fn from(err: ValidationError) -> Self {
        ValidationErrors(vec![err])
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::required("clientId");
        assert_eq!(err.to_string(), "clientId is required");

        let err = ValidationError::TooShort {
            field: "clientId".to_string(),
            min: 8,
        };
        assert_eq!(err.to_string(), "clientId must be at least 8 characters");

        let err = ValidationError::Negative {
            field: "rentAmount".to_string(),
        };
        assert_eq!(err.to_string(), "rentAmount must not be negative");
        assert_eq!(err.field(), "rentAmount");
    }

    #[test]
    fn test_collection_summary() {
        let errors = ValidationErrors::from_vec(vec![
            ValidationError::required("project"),
            ValidationError::required("addressLines"),
        ])
        .unwrap();

        assert_eq!(
            errors.to_string(),
            "2 validation error(s): project is required; addressLines is required"
        );
        assert!(errors.has_field("addressLines"));
        assert!(!errors.has_field("provider"));
    }

    #[test]
    fn test_empty_collection_is_none() {
        assert!(ValidationErrors::from_vec(Vec::new()).is_none());
    }

    #[test]
    fn test_serializes_with_kind_tag() {
        let json = serde_json::to_value(ValidationError::required("project")).unwrap();
        assert_eq!(json["kind"], "required");
        assert_eq!(json["field"], "project");
    }
}

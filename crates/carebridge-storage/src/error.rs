//! Storage error types for the storage abstraction layer.

use std::fmt;

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The requested record was not found.
    #[error("{resource} not found: {id}")]
    NotFound {
        /// Human-readable name of the record kind.
        resource: String,
        /// The id that was looked up.
        id: String,
    },

    /// The record exists but belongs to a different caregiver.
    #[error("Permission denied: {message}")]
    PermissionDenied {
        /// Description of the denied operation.
        message: String,
    },

    /// Attempted to create a record that already exists.
    #[error("{resource} already exists: {id}")]
    AlreadyExists {
        /// Human-readable name of the record kind.
        resource: String,
        /// The conflicting id.
        id: String,
    },

    /// An internal storage error occurred.
    #[error("Internal storage error: {message}")]
    Internal {
        /// Description of the internal error.
        message: String,
    },
}

impl StorageError {
    /// Creates a new `NotFound` error.
    #[must_use]
    pub fn not_found(resource: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
            id: id.into(),
        }
    }

    /// Creates a new `PermissionDenied` error.
    #[must_use]
    pub fn permission_denied(message: impl Into<String>) -> Self {
        Self::PermissionDenied {
            message: message.into(),
        }
    }

    /// Creates a new `AlreadyExists` error.
    #[must_use]
    pub fn already_exists(resource: impl Into<String>, id: impl Into<String>) -> Self {
        Self::AlreadyExists {
            resource: resource.into(),
            id: id.into(),
        }
    }

    /// Creates a new `Internal` error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns `true` if this is a not found error.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns `true` if this is a permission denied error.
    #[must_use]
    pub fn is_permission_denied(&self) -> bool {
        matches!(self, Self::PermissionDenied { .. })
    }

    /// Returns `true` if this is an already exists error.
    #[must_use]
    pub fn is_already_exists(&self) -> bool {
        matches!(self, Self::AlreadyExists { .. })
    }

    /// Returns the error category for logging/monitoring purposes.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::NotFound { .. } => ErrorCategory::NotFound,
            Self::PermissionDenied { .. } => ErrorCategory::Forbidden,
            Self::AlreadyExists { .. } => ErrorCategory::Conflict,
            Self::Internal { .. } => ErrorCategory::Internal,
        }
    }
}

/// Categories of storage errors for logging and monitoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Record not found.
    NotFound,
    /// Caller does not own the record.
    Forbidden,
    /// Existence conflict.
    Conflict,
    /// Internal error.
    Internal,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "not_found"),
            Self::Forbidden => write!(f, "forbidden"),
            Self::Conflict => write!(f, "conflict"),
            Self::Internal => write!(f, "internal"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = StorageError::not_found("Protected member", "m-123");
        assert_eq!(err.to_string(), "Protected member not found: m-123");

        let err = StorageError::permission_denied("You do not have permission to update this member");
        assert_eq!(
            err.to_string(),
            "Permission denied: You do not have permission to update this member"
        );

        let err = StorageError::already_exists("Caregiver", "cg-456");
        assert_eq!(err.to_string(), "Caregiver already exists: cg-456");
    }

    #[test]
    fn test_error_predicates() {
        let err = StorageError::not_found("Protected member", "m-123");
        assert!(err.is_not_found());
        assert!(!err.is_permission_denied());
        assert!(!err.is_already_exists());

        let err = StorageError::permission_denied("nope");
        assert!(err.is_permission_denied());
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_error_category() {
        assert_eq!(
            StorageError::not_found("Protected member", "m-1").category(),
            ErrorCategory::NotFound
        );
        assert_eq!(
            StorageError::permission_denied("nope").category(),
            ErrorCategory::Forbidden
        );
        assert_eq!(
            StorageError::already_exists("Caregiver", "cg-1").category(),
            ErrorCategory::Conflict
        );
        assert_eq!(
            StorageError::internal("boom").category(),
            ErrorCategory::Internal
        );
    }

    #[test]
    fn test_category_display() {
        assert_eq!(ErrorCategory::NotFound.to_string(), "not_found");
        assert_eq!(ErrorCategory::Forbidden.to_string(), "forbidden");
        assert_eq!(ErrorCategory::Conflict.to_string(), "conflict");
        assert_eq!(ErrorCategory::Internal.to_string(), "internal");
    }
}

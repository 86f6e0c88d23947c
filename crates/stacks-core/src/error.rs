//! Unified error handling for Stacks Core.
//!
//! Every gateway operation returns [`StacksResult`]. "Nothing matched" is
//! never an error: it is `Ok(None)` or an empty `Vec`. Every variant here
//! describes a request that was rejected or an invariant that broke.

use thiserror::Error;

use crate::application::ApplicationError;
use crate::domain::DomainError;

/// Root error type for Stacks Core operations.
#[derive(Debug, Error, Clone)]
pub enum StacksError {
    /// Errors from the domain layer (request validation).
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    /// Errors from the application layer (storage and lifecycle).
    #[error("Application error: {0}")]
    Application(#[from] ApplicationError),

    /// Configuration or setup errors.
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Unexpected internal errors (bugs).
    #[error("Internal error: {message}. This is a bug, please report it.")]
    Internal { message: String },
}

impl StacksError {
    /// Get user-actionable suggestions for fixing this error.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::Domain(e) => e.suggestions(),
            Self::Application(e) => e.suggestions(),
            Self::Configuration { message } => vec![
                format!("Configuration issue: {}", message),
                "Try: buddy config list to inspect the resolved settings".into(),
            ],
            Self::Internal { .. } => vec![
                "This appears to be a bug in Stacks".into(),
                "Run again with -vvv and include the log when reporting it".into(),
            ],
        }
    }

    /// Get error category for display/styling purposes.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Domain(e) => match e.category() {
                crate::domain::ErrorCategory::Validation => ErrorCategory::Validation,
                crate::domain::ErrorCategory::Schema => ErrorCategory::Configuration,
            },
            Self::Application(e) => e.category(),
            Self::Configuration { .. } => ErrorCategory::Configuration,
            Self::Internal { .. } => ErrorCategory::Internal,
        }
    }

    /// Check if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Application(ApplicationError::StoreLockError | ApplicationError::Storage { .. })
        )
    }

    /// `true` for a mutation aimed at a row that no longer exists.
    pub fn is_record_not_found(&self) -> bool {
        matches!(
            self,
            Self::Application(ApplicationError::RecordNotFound { .. })
        )
    }
}

/// Error categories for UI display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    Conflict,
    NotFound,
    State,
    Configuration,
    Internal,
}

/// Convenient result type alias.
pub type StacksResult<T> = Result<T, StacksError>;

/// Extension trait for adding context to errors.
pub trait Context<T> {
    /// Add context to an error.
    fn context(self, msg: impl Into<String>) -> StacksResult<T>;
}

impl<T, E> Context<T> for Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn context(self, msg: impl Into<String>) -> StacksResult<T> {
        self.map_err(|e| StacksError::Internal {
            message: format!("{}: {}", msg.into(), e),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::error::ConstraintKind;
    use crate::domain::RecordState;

    #[test]
    fn categories_follow_the_layer_that_failed() {
        let err: StacksError = DomainError::ConflictingPagination.into();
        assert_eq!(err.category(), ErrorCategory::Validation);

        let err: StacksError = ApplicationError::ConstraintViolation {
            table: "users".into(),
            column: "email".into(),
            kind: ConstraintKind::Unique,
        }
        .into();
        assert_eq!(err.category(), ErrorCategory::Conflict);

        let err: StacksError = ApplicationError::RecordState {
            state: RecordState::Transient,
            operation: "update",
        }
        .into();
        assert_eq!(err.category(), ErrorCategory::State);
    }

    #[test]
    fn only_storage_failures_are_retryable() {
        let lock: StacksError = ApplicationError::StoreLockError.into();
        assert!(lock.is_retryable());

        let missing: StacksError = ApplicationError::RecordNotFound {
            table: "users".into(),
            id: 1,
        }
        .into();
        assert!(!missing.is_retryable());
        assert!(missing.is_record_not_found());
    }

    #[test]
    fn context_wraps_foreign_errors_as_internal() {
        let result: Result<(), std::io::Error> =
            Err(std::io::Error::other("disk on fire"));
        let err = result.context("writing snapshot").unwrap_err();

        assert!(matches!(err, StacksError::Internal { .. }));
        assert!(err.to_string().contains("writing snapshot: disk on fire"));
    }
}

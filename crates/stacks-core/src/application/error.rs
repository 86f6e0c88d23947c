//! Application layer errors.
//!
//! These errors represent failures in storage and record lifecycle, not
//! request validation. Validation errors are `DomainError` from
//! `crate::domain`.

use std::fmt;

use thiserror::Error;

use crate::domain::RecordState;
use crate::error::ErrorCategory;

/// Which schema constraint a write violated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintKind {
    Unique,
    NotNull,
}

impl fmt::Display for ConstraintKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unique => f.write_str("unique"),
            Self::NotNull => f.write_str("not-null"),
        }
    }
}

/// Errors that occur while executing plans or driving a record lifecycle.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ApplicationError {
    /// An insert or update broke a schema constraint.
    #[error("{kind} constraint violated on {table}.{column}")]
    ConstraintViolation {
        table: String,
        column: String,
        kind: ConstraintKind,
    },

    /// The instance is in a state that does not allow the operation.
    #[error("Cannot {operation} a {state} record")]
    RecordState {
        state: RecordState,
        operation: &'static str,
    },

    /// An identity-bound mutation matched no row.
    #[error("No row with id {id} in '{table}'")]
    RecordNotFound { table: String, id: i64 },

    /// The storage engine failed.
    #[error("Storage error: {reason}")]
    Storage { reason: String },

    /// Store access failed (lock poisoned).
    #[error("Record store is unavailable")]
    StoreLockError,

    /// The executor has no table of that name.
    #[error("Table '{table}' is not registered with the driver")]
    TableNotRegistered { table: String },
}

impl ApplicationError {
    /// Get user-actionable suggestions.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::ConstraintViolation {
                column,
                kind: ConstraintKind::Unique,
                ..
            } => vec![
                format!("Another record already uses this '{}'", column),
                "Look it up first with: buddy query --where".into(),
            ],
            Self::ConstraintViolation {
                column,
                kind: ConstraintKind::NotNull,
                ..
            } => vec![format!("Provide a value for '{}'", column)],
            Self::RecordState {
                state: RecordState::Transient,
                ..
            } => vec!["Save the record first so it gets an identity".into()],
            Self::RecordState {
                state: RecordState::Deleted,
                ..
            } => vec!["The record was deleted; load a fresh one".into()],
            Self::RecordNotFound { .. } => vec![
                "The record was removed after it was loaded".into(),
                "Try: buddy find <id> to check whether it still exists".into(),
            ],
            Self::StoreLockError => vec![
                "The record store is locked".into(),
                "Try again in a moment".into(),
            ],
            Self::TableNotRegistered { table } => vec![
                format!("No model is registered for '{}'", table),
                "Try: buddy models to list the known models".into(),
            ],
            _ => vec!["Check the error details above".into()],
        }
    }

    /// Get error category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::ConstraintViolation { .. } => ErrorCategory::Conflict,
            Self::RecordState { .. } => ErrorCategory::State,
            Self::RecordNotFound { .. } => ErrorCategory::NotFound,
            Self::Storage { .. } | Self::StoreLockError => ErrorCategory::Internal,
            Self::TableNotRegistered { .. } => ErrorCategory::Configuration,
        }
    }
}

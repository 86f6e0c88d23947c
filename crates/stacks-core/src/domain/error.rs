// ============================================================================
// domain/error.rs - VALIDATION ERROR DOMAIN
// ============================================================================

use thiserror::Error;

/// Root domain error type.
///
/// Raised before any storage round trip: every variant describes a request
/// that could never be planned, regardless of what the table holds.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    // ========================================================================
    // Column / Value Errors (400-level equivalent)
    // ========================================================================
    #[error("Unknown column '{column}' on table '{table}'")]
    UnknownColumn { table: String, column: String },

    #[error("Invalid value for '{column}': expected {expected}, got {found}")]
    InvalidValue {
        column: String,
        expected: String,
        found: String,
    },

    #[error("Column '{column}' is managed by the framework and cannot be written")]
    ReadOnlyColumn { column: String },

    // ========================================================================
    // Pagination Errors
    // ========================================================================
    #[error("Pagination accepts either a page or an offset, not both")]
    ConflictingPagination,

    #[error("Invalid page {page}: pages are numbered from 1")]
    InvalidPage { page: u64 },

    #[error("Invalid sort direction '{0}': expected 'asc' or 'desc'")]
    InvalidSortDirection(String),

    // ========================================================================
    // Schema Errors
    // ========================================================================
    #[error("Invalid schema for '{table}': {reason}")]
    InvalidSchema { table: String, reason: String },

    #[error("Invalid model definition: {0}")]
    InvalidModelDefinition(String),
}

impl DomainError {
    /// Get user-actionable suggestions for fixing this error.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::UnknownColumn { table, column } => vec![
                format!("'{}' has no column named '{}'", table, column),
                "Column names are case-sensitive".into(),
                "Try: buddy models to see the columns of every model".into(),
            ],
            Self::InvalidValue {
                column, expected, ..
            } => vec![
                format!("'{}' stores values of type {}", column, expected),
                "Timestamps use RFC 3339, e.g. 2024-06-22T10:00:00Z".into(),
            ],
            Self::ReadOnlyColumn { column } => vec![
                format!("'{}' is assigned automatically", column),
                "Remove it from the values you are writing".into(),
            ],
            Self::ConflictingPagination => vec![
                "Use --page with --limit for page-style pagination".into(),
                "Or use --offset with --limit for raw offsets".into(),
            ],
            Self::InvalidPage { .. } => vec!["The first page is page 1".into()],
            Self::InvalidSortDirection(_) => vec!["Use 'asc' or 'desc'".into()],
            Self::InvalidModelDefinition(msg) => vec![
                "Check the model definition file".into(),
                format!("Details: {}", msg),
            ],
            Self::InvalidSchema { .. } => {
                vec!["See documentation for more details".into()]
            }
        }
    }

    /// Error category for CLI display styling.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidSchema { .. } | Self::InvalidModelDefinition(_) => {
                ErrorCategory::Schema
            }
            _ => ErrorCategory::Validation,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    Schema,
}

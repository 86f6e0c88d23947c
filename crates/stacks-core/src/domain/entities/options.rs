//! Sort and pagination options for list queries.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::{error::DomainError, value_objects::SortDirection};

/// Page size used when a page is requested without a limit.
pub const DEFAULT_PAGE_SIZE: u64 = 10;

// ── Sort ──────────────────────────────────────────────────────────────────────

/// Single-column sort.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Sort {
    pub column: String,
    pub direction: SortDirection,
}

impl Sort {
    pub fn new(column: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            column: column.into(),
            direction,
        }
    }

    pub fn asc(column: impl Into<String>) -> Self {
        Self::new(column, SortDirection::Asc)
    }

    pub fn desc(column: impl Into<String>) -> Self {
        Self::new(column, SortDirection::Desc)
    }
}

impl fmt::Display for Sort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.column, self.direction)
    }
}

/// Parses `column` or `column:asc|desc`.
impl FromStr for Sort {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(':') {
            Some((column, direction)) => Ok(Self::new(column.trim(), direction.trim().parse()?)),
            None => Ok(Self::asc(s.trim())),
        }
    }
}

// ── QueryOptions ──────────────────────────────────────────────────────────────

/// Optional sort and pagination for a list query.
///
/// `page` is 1-indexed and mutually exclusive with `offset`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryOptions {
    pub sort: Option<Sort>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
    pub page: Option<u64>,
}

/// Resolved `LIMIT`/`OFFSET` pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Window {
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

impl QueryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sort(mut self, sort: Sort) -> Self {
        self.sort = Some(sort);
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn page(mut self, page: u64) -> Self {
        self.page = Some(page);
        self
    }

    /// Resolve page-style or offset-style pagination into a window.
    ///
    /// # Errors
    ///
    /// - [`DomainError::ConflictingPagination`] when both `page` and `offset`
    ///   are set.
    /// - [`DomainError::InvalidPage`] for page 0.
    pub fn window(&self) -> Result<Window, DomainError> {
        match (self.page, self.offset) {
            (Some(_), Some(_)) => Err(DomainError::ConflictingPagination),
            (Some(0), None) => Err(DomainError::InvalidPage { page: 0 }),
            (Some(page), None) => {
                let limit = self.limit.unwrap_or(DEFAULT_PAGE_SIZE);
                Ok(Window {
                    limit: Some(limit),
                    offset: Some((page - 1).saturating_mul(limit)),
                })
            }
            (None, offset) => Ok(Window {
                limit: self.limit,
                offset,
            }),
        }
    }
}

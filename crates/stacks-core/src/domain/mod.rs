// ============================================================================
//  CLEAN MODULE BOUNDARIES
// ============================================================================

//! Core domain layer for Stacks.
//!
//! This module contains pure record-model logic with no I/O. Storage,
//! clocks and rendering are reached through ports defined in the
//! application layer.
//!
//! ## Hexagonal Architecture Compliance
//!
//! - **No async**: Domain logic is synchronous
//! - **No I/O**: Plans are data; drivers execute them
//! - **No logging**: Only the application layer emits spans
//! - **Schema-bound records**: Hidden columns are enforced by `Record` itself
//!
// Public API - what the world sees
pub mod entities;
pub mod error;
pub mod value_objects;

// Private implementation details - not visible outside domain
mod validation;

// Re-exports for convenience
pub use entities::{
    criteria::Criteria,
    lifecycle::RecordState,
    options::{DEFAULT_PAGE_SIZE, QueryOptions, Sort, Window},
    pagination::{Paginated, Paging},
    plan::{
        CountPlan, DeletePlan, InsertPlan, OrderBy, Predicate, Projection, SelectPlan, UpdatePlan,
        matches_all,
    },
    record::{Record, Row},
    schema::{
        CREATED_AT, ColumnDef, DELETED_AT, ID_COLUMN, TableSchema, TableSchemaBuilder, UPDATED_AT,
    },
};

pub use error::{DomainError, ErrorCategory};

pub use value_objects::{ColumnType, SortDirection, Value};

pub use validation::DomainValidator;

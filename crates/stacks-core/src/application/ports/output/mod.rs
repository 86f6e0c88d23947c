//! Driven (output) ports - implemented by infrastructure.
//!
//! These traits define what the gateway needs from a storage engine.
//! The `stacks-adapters` crate provides implementations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{CountPlan, DeletePlan, InsertPlan, Row, SelectPlan, UpdatePlan};
use crate::error::StacksResult;

/// Port for plan execution.
///
/// Implemented by:
/// - `stacks_adapters::driver::MemoryDriver` (in-process tables)
/// - `stacks_adapters::driver::JsonFileDriver` (memory tables persisted to disk)
///
/// ## Contract
///
/// - Predicates follow SQL semantics: `Eq` never matches a `NULL` cell
/// - Write operations return full rows, identity included
/// - Constraint breaks surface as `ApplicationError::ConstraintViolation`
/// - Zero affected rows is not an error: `update`/`delete` return an empty `Vec`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    /// Every row the plan selects, in plan order.
    async fn fetch_all(&self, plan: &SelectPlan) -> StacksResult<Vec<Row>>;

    /// The first row the plan selects, if any.
    async fn fetch_optional(&self, plan: &SelectPlan) -> StacksResult<Option<Row>>;

    async fn count(&self, plan: &CountPlan) -> StacksResult<u64>;

    /// Insert one row and return it with its assigned identity.
    async fn insert(&self, plan: &InsertPlan) -> StacksResult<Row>;

    /// Update matching rows and return them after the change.
    async fn update(&self, plan: &UpdatePlan) -> StacksResult<Vec<Row>>;

    /// Delete matching rows and return their prior state.
    async fn delete(&self, plan: &DeletePlan) -> StacksResult<Vec<Row>>;
}

/// Port for the wall clock.
#[cfg_attr(test, mockall::automock)]
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

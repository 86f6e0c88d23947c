//! Application layer for Stacks.
//!
//! This layer contains:
//! - **Services**: the static [`Gateway`] and the instance-bound [`Model`]
//! - **Ports**: traits for the storage engine and the clock
//! - **Errors**: storage and lifecycle error types
//!
//! The application layer turns requests into plans and rows into records.
//! Request validation lives in `crate::domain`.

pub mod error;
pub mod ports;
pub mod services;

// Re-export main services
pub use services::{Gateway, Model, Scope};

// Re-export port traits (for adapter implementation)
pub use ports::{Clock, QueryExecutor};

pub use error::{ApplicationError, ConstraintKind};

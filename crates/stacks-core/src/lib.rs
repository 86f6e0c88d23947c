//! Stacks Core - record gateway over a pluggable query executor
//!
//! This crate provides the domain and application layers of the Stacks
//! record gateway, following hexagonal (ports and adapters) architecture.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │           stacks-cli (buddy)            │
//! │     (Translates input into criteria)    │
//! └──────────────────┬──────────────────────┘
//!                    │ calls
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │         Application Services            │
//! │      (Gateway: static, table-wide)      │
//! │      (Model: instance, identity-bound)  │
//! └──────────────────┬──────────────────────┘
//!                    │ uses
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │      Application Ports (Traits)         │
//! │        (QueryExecutor, Clock)           │
//! └──────────────────┬──────────────────────┘
//!                    │ implemented by
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │      stacks-adapters (Infrastructure)   │
//! │  (MemoryDriver, JsonFileDriver, Clocks) │
//! └─────────────────────────────────────────┘
//!                    │
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │         Domain Layer (Pure Logic)       │
//! │ (TableSchema, Record, Criteria, Plans)  │
//! │         No I/O, no logging              │
//! └─────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use stacks_core::prelude::*;
//!
//! let users = Gateway::new(executor, schema, clock);
//!
//! let ada = users
//!     .create(Criteria::new().eq("name", "Ada").eq("email", "ada@example.com").into())
//!     .await?;
//!
//! let unnamed = users
//!     .get(&Criteria::new().is_null("name"), &QueryOptions::new().limit(5))
//!     .await?;
//! ```

// Domain layer (pure record model)
pub mod domain;

// Application layer (gateways and ports)
pub mod application;

// Unified error type
pub mod error;

// Public API - what external crates should use
pub mod prelude {
    pub use crate::application::{
        Gateway, Model, Scope,
        ports::{Clock, QueryExecutor},
    };
    pub use crate::domain::{
        ColumnDef, ColumnType, Criteria, Paginated, Paging, QueryOptions, Record, RecordState,
        Row, Sort, SortDirection, TableSchema, Value,
    };
    pub use crate::error::{Context, StacksError, StacksResult};
}

// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//! Application ports (traits) for external dependencies.
//!
//! In hexagonal architecture, ports define interfaces that the application
//! needs from the outside world. Adapters in `stacks-adapters` implement these.
//!
//! ## Port Types
//!
//! - **Driven (Output) Ports**: Called by application, implemented by infrastructure
//!   - `QueryExecutor`: runs plans against a storage engine
//!   - `Clock`: source of managed timestamps
//!
//! - **Driving (Input) Ports**: Called by external world, implemented by application
//!   - (`Gateway` and `Model` are used directly by callers)

pub mod output;

pub use output::{Clock, QueryExecutor};

#[cfg(test)]
pub use output::{MockClock, MockQueryExecutor};

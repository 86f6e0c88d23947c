//! Infrastructure adapters for Stacks.
//!
//! This crate implements the ports defined in `stacks-core::application::ports`.
//! It contains all storage engines, clocks and file I/O.

pub mod builtin_models;
pub mod clock;
pub mod driver;
pub mod model_loader;
pub mod registry;
pub mod sql;

// Re-export commonly used adapters
pub use clock::{FixedClock, SystemClock};
pub use driver::{JsonFileDriver, MemoryDriver};
pub use model_loader::ModelLoader;
pub use registry::ModelRegistry;
pub use sql::{Dialect, SqlRenderer, SqlStatement};

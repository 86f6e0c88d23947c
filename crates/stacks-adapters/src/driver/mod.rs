//! Storage drivers implementing `QueryExecutor`.

mod file;
mod memory;

pub use file::JsonFileDriver;
pub use memory::MemoryDriver;

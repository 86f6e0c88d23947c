//! Plan-to-SQL rendering.

mod renderer;

pub use renderer::{Dialect, SqlRenderer, SqlStatement};

//! Application services - the record gateways.
//!
//! [`Gateway`] runs table-wide operations; [`Model`] runs operations bound
//! to one loaded record. Both build plans through the same code path,
//! distinguished by a [`Scope`].

pub mod gateway;
pub mod model;

pub use gateway::{Gateway, Scope};
pub use model::Model;

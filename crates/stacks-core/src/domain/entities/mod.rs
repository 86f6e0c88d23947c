pub mod criteria;
pub mod lifecycle;
pub mod options;
pub mod pagination;
pub mod plan;
pub mod record;
pub mod schema;

pub use crate::domain::DomainError;
pub use criteria::Criteria;
pub use lifecycle::RecordState;
pub use record::{Record, Row};
pub use schema::TableSchema;

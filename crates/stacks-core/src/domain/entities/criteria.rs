//! Partial-record filters.
//!
//! A [`Criteria`] constrains only the columns it names. A column set to
//! `Value::Null` means "IS NULL"; the translation is uniform for every
//! column so that a nullable field can always be searched for its absence.

use std::collections::BTreeMap;

use crate::domain::{
    entities::{plan::Predicate, record::Row, schema::TableSchema},
    error::DomainError,
    value_objects::Value,
};

/// Column → value constraints, joined with `AND`.
///
/// Columns are kept sorted so the planned predicate order is deterministic.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Criteria {
    fields: BTreeMap<String, Value>,
}

impl Criteria {
    pub fn new() -> Self {
        Self::default()
    }

    /// Constrain `column` to `value` (`Value::Null` means IS NULL).
    pub fn eq(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(column.into(), value.into());
        self
    }

    /// Constrain `column` to be NULL.
    pub fn is_null(mut self, column: impl Into<String>) -> Self {
        self.fields.insert(column.into(), Value::Null);
        self
    }

    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(column.into(), value.into());
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.fields.get(column)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.fields.iter()
    }

    /// Translate into `WHERE` terms for `schema`.
    ///
    /// # Errors
    ///
    /// - [`DomainError::UnknownColumn`] for a column the table does not have.
    /// - [`DomainError::InvalidValue`] when a value cannot be coerced to the
    ///   column type.
    pub fn to_predicates(&self, schema: &TableSchema) -> Result<Vec<Predicate>, DomainError> {
        self.fields
            .iter()
            .map(|(column, value)| {
                let def = schema.require_column(column)?;
                match value.clone().coerce(column, def.ty)? {
                    Value::Null => Ok(Predicate::is_null(column.as_str())),
                    coerced => Ok(Predicate::eq(column.as_str(), coerced)),
                }
            })
            .collect()
    }
}

impl From<Row> for Criteria {
    fn from(row: Row) -> Self {
        Self { fields: row }
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Criteria {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

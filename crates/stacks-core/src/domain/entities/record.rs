//! In-memory representation of one row.
//!
//! A [`Record`] always travels with its schema so that every serialization
//! boundary (JSON, `Debug`, logs) can enforce hidden columns without the
//! caller having to remember to filter.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::domain::{entities::schema::TableSchema, value_objects::Value};

/// Raw storage representation: column name to value.
pub type Row = BTreeMap<String, Value>;

const REDACTED: &str = "<hidden>";

/// One row bound to its table schema.
#[derive(Clone)]
pub struct Record {
    schema: Arc<TableSchema>,
    attributes: Row,
}

impl Record {
    pub fn new(schema: Arc<TableSchema>, attributes: Row) -> Self {
        Self { schema, attributes }
    }

    pub fn empty(schema: Arc<TableSchema>) -> Self {
        Self::new(schema, Row::new())
    }

    pub fn schema(&self) -> &Arc<TableSchema> {
        &self.schema
    }

    /// Identity of the row, if it has been assigned one.
    pub fn id(&self) -> Option<i64> {
        self.attributes
            .get(self.schema.primary_key())
            .and_then(Value::as_i64)
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.attributes.get(column)
    }

    /// All attributes, hidden ones included. In-process use only; use
    /// [`Record::to_json`] or `Serialize` when the data leaves the process.
    pub fn attributes(&self) -> &Row {
        &self.attributes
    }

    pub fn into_attributes(self) -> Row {
        self.attributes
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    /// Attributes a caller may write back: managed columns are dropped.
    pub fn writable_attributes(&self) -> Row {
        self.attributes
            .iter()
            .filter(|(column, _)| self.schema.column(column).is_some_and(|c| !c.managed))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Attributes that may cross a serialization boundary.
    pub fn visible(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.attributes
            .iter()
            .filter(|(column, _)| !self.schema.is_hidden(column))
    }

    /// JSON view with hidden columns removed.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.visible()
                .map(|(k, v)| {
                    let json = serde_json::to_value(v).unwrap_or(serde_json::Value::Null);
                    (k.clone(), json)
                })
                .collect(),
        )
    }

    pub(crate) fn replace(&mut self, attributes: Row) {
        self.attributes = attributes;
    }

    pub(crate) fn merge(&mut self, patch: Row) {
        self.attributes.extend(patch);
    }

    pub(crate) fn clear(&mut self) {
        self.attributes.clear();
    }
}

impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        self.schema.table() == other.schema.table() && self.attributes == other.attributes
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let visible: Vec<_> = self.visible().collect();
        let mut map = serializer.serialize_map(Some(visible.len()))?;
        for (column, value) in visible {
            map.serialize_entry(column, value)?;
        }
        map.end()
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        struct Redacted<'a>(&'a Record);

        impl fmt::Debug for Redacted<'_> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                let mut map = f.debug_map();
                for (column, value) in &self.0.attributes {
                    if self.0.schema.is_hidden(column) {
                        map.entry(column, &REDACTED);
                    } else {
                        map.entry(column, value);
                    }
                }
                map.finish()
            }
        }

        f.debug_struct("Record")
            .field("table", &self.schema.table())
            .field("attributes", &Redacted(self))
            .finish()
    }
}

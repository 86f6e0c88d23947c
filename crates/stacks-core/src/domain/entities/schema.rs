//! Table schemas: the declarative description of one model's table.
//!
//! A `TableSchema` is the single source of truth for column types,
//! nullability, uniqueness and visibility. The hidden-column annotation
//! lives here and nowhere else; every serialization path consults it.
//!
//! # Domain purity
//!
//! This module must not import `tracing`. Observability is the responsibility
//! of the application and CLI layers, not the domain.

use std::collections::HashSet;

use serde::Serialize;

use crate::domain::{error::DomainError, value_objects::ColumnType};

/// Default identity column.
pub const ID_COLUMN: &str = "id";
/// Reserved timestamp columns maintained by the gateway.
pub const CREATED_AT: &str = "created_at";
pub const UPDATED_AT: &str = "updated_at";
pub const DELETED_AT: &str = "deleted_at";

// ── Column ────────────────────────────────────────────────────────────────────

/// One column of a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnDef {
    pub name: String,
    pub ty: ColumnType,
    pub nullable: bool,
    pub unique: bool,
    /// Never emitted by any serialization of a record.
    pub hidden: bool,
    /// Assigned by the framework (identity, timestamps); callers cannot write it.
    pub managed: bool,
}

impl ColumnDef {
    /// A required, visible, caller-writable column.
    pub fn new(name: impl Into<String>, ty: ColumnType) -> Self {
        Self {
            name: name.into(),
            ty,
            nullable: false,
            unique: false,
            hidden: false,
            managed: false,
        }
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    pub fn managed(mut self) -> Self {
        self.managed = true;
        self
    }
}

// ── Aggregate root ────────────────────────────────────────────────────────────

/// A validated table schema.
///
/// Guarantees on construction:
/// - the primary key exists, is an `Integer`, unique, not-null and managed
/// - column names are unique
/// - with `timestamps`, the three reserved timestamp columns exist and are managed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableSchema {
    model: String,
    table: String,
    primary_key: String,
    columns: Vec<ColumnDef>,
    timestamps: bool,
}

impl TableSchema {
    /// Start building a schema for `model` stored in `table`.
    pub fn builder(model: impl Into<String>, table: impl Into<String>) -> TableSchemaBuilder {
        TableSchemaBuilder::new(model, table)
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn primary_key(&self) -> &str {
        &self.primary_key
    }

    pub fn has_timestamps(&self) -> bool {
        self.timestamps
    }

    pub fn columns(&self) -> &[ColumnDef] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Look up a column or fail with [`DomainError::UnknownColumn`].
    pub fn require_column(&self, name: &str) -> Result<&ColumnDef, DomainError> {
        self.column(name).ok_or_else(|| DomainError::UnknownColumn {
            table: self.table.clone(),
            column: name.to_string(),
        })
    }

    pub fn is_hidden(&self, name: &str) -> bool {
        self.column(name).is_some_and(|c| c.hidden)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    pub fn hidden_columns(&self) -> impl Iterator<Item = &str> {
        self.columns
            .iter()
            .filter(|c| c.hidden)
            .map(|c| c.name.as_str())
    }

    /// Validate internal consistency.
    ///
    /// Called automatically by the builder. Available for re-validation of
    /// schemas assembled by loaders.
    pub fn validate(&self) -> Result<(), DomainError> {
        let invalid = |reason: String| DomainError::InvalidSchema {
            table: self.table.clone(),
            reason,
        };

        if self.table.trim().is_empty() {
            return Err(invalid("table name cannot be empty".into()));
        }
        if self.model.trim().is_empty() {
            return Err(invalid("model name cannot be empty".into()));
        }

        let mut seen = HashSet::new();
        for column in &self.columns {
            if column.name.trim().is_empty() {
                return Err(invalid("column names cannot be empty".into()));
            }
            if !seen.insert(column.name.as_str()) {
                return Err(invalid(format!("duplicate column '{}'", column.name)));
            }
        }

        let pk = self
            .column(&self.primary_key)
            .ok_or_else(|| invalid(format!("primary key '{}' is missing", self.primary_key)))?;
        if pk.ty != ColumnType::Integer {
            return Err(invalid(format!(
                "primary key '{}' must be an integer",
                self.primary_key
            )));
        }
        if pk.nullable || !pk.managed {
            return Err(invalid(format!(
                "primary key '{}' must be generated and not null",
                self.primary_key
            )));
        }

        if self.timestamps {
            for reserved in [CREATED_AT, UPDATED_AT, DELETED_AT] {
                match self.column(reserved) {
                    Some(c) if c.managed && c.ty == ColumnType::Timestamp => {}
                    _ => return Err(invalid(format!("reserved column '{reserved}' is invalid"))),
                }
            }
        }

        Ok(())
    }
}

// ── Builder ───────────────────────────────────────────────────────────────────

/// Builder for [`TableSchema`].
///
/// The identity column is prepended and the reserved timestamp columns are
/// appended at `build()`; callers only declare their own attributes.
#[derive(Debug, Clone)]
pub struct TableSchemaBuilder {
    model: String,
    table: String,
    primary_key: String,
    columns: Vec<ColumnDef>,
    timestamps: bool,
}

impl TableSchemaBuilder {
    fn new(model: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            table: table.into(),
            primary_key: ID_COLUMN.to_string(),
            columns: Vec::new(),
            timestamps: true,
        }
    }

    pub fn primary_key(mut self, name: impl Into<String>) -> Self {
        self.primary_key = name.into();
        self
    }

    pub fn column(mut self, column: ColumnDef) -> Self {
        self.columns.push(column);
        self
    }

    pub fn timestamps(mut self, enabled: bool) -> Self {
        self.timestamps = enabled;
        self
    }

    pub fn build(self) -> Result<TableSchema, DomainError> {
        let reserved = [CREATED_AT, UPDATED_AT, DELETED_AT];

        let mut columns = Vec::with_capacity(self.columns.len() + 4);
        columns.push(
            ColumnDef::new(self.primary_key.clone(), ColumnType::Integer)
                .unique()
                .managed(),
        );

        for column in self.columns {
            if column.name == self.primary_key {
                return Err(DomainError::InvalidSchema {
                    table: self.table,
                    reason: format!("'{}' is the generated primary key", column.name),
                });
            }
            if self.timestamps && reserved.contains(&column.name.as_str()) {
                return Err(DomainError::InvalidSchema {
                    table: self.table,
                    reason: format!("'{}' is a reserved timestamp column", column.name),
                });
            }
            columns.push(column);
        }

        if self.timestamps {
            for name in reserved {
                columns.push(ColumnDef::new(name, ColumnType::Timestamp).nullable().managed());
            }
        }

        let schema = TableSchema {
            model: self.model,
            table: self.table,
            primary_key: self.primary_key,
            columns,
            timestamps: self.timestamps,
        };
        schema.validate()?;
        Ok(schema)
    }
}

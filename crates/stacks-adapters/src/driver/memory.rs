//! In-memory storage engine.
//!
//! Tables live behind one `RwLock`. Plans are evaluated with SQL semantics:
//! equality never matches `NULL`, `NULL` values never collide on unique
//! columns, and identities are never reused even after deletes.

use std::{
    cmp::Ordering,
    collections::{BTreeMap, HashMap},
    sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use stacks_core::{
    application::{ApplicationError, ConstraintKind, ports::QueryExecutor},
    domain::{
        CountPlan, DeletePlan, DomainError, InsertPlan, OrderBy, Projection, Row, SelectPlan,
        TableSchema, UpdatePlan, Value, matches_all,
    },
    error::{StacksError, StacksResult},
};

/// Rows of one table plus its identity sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct TableData {
    pub(crate) next_id: i64,
    pub(crate) rows: Vec<Row>,
}

impl Default for TableData {
    fn default() -> Self {
        Self {
            next_id: 1,
            rows: Vec::new(),
        }
    }
}

#[derive(Debug)]
struct Table {
    schema: Arc<TableSchema>,
    data: TableData,
}

/// Thread-safe in-memory storage engine.
#[derive(Debug, Clone, Default)]
pub struct MemoryDriver {
    tables: Arc<RwLock<HashMap<String, Table>>>,
}

impl MemoryDriver {
    /// Create a driver with no tables.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`MemoryDriver::register`].
    pub fn with_table(self, schema: Arc<TableSchema>) -> StacksResult<Self> {
        self.register(schema)?;
        Ok(self)
    }

    /// Create the table for `schema`. Registering an existing table keeps
    /// its rows and replaces its schema.
    pub fn register(&self, schema: Arc<TableSchema>) -> StacksResult<()> {
        let mut tables = self.write()?;
        match tables.get_mut(schema.table()) {
            Some(table) => table.schema = schema,
            None => {
                debug!(table = schema.table(), "Registered table");
                tables.insert(
                    schema.table().to_string(),
                    Table {
                        schema,
                        data: TableData::default(),
                    },
                );
            }
        }
        Ok(())
    }

    /// Names of every registered table, sorted.
    pub fn tables(&self) -> StacksResult<Vec<String>> {
        let mut names: Vec<_> = self.read()?.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    /// Number of rows currently stored in `table`.
    pub fn len(&self, table: &str) -> StacksResult<usize> {
        let tables = self.read()?;
        Ok(lookup(&tables, table)?.data.rows.len())
    }

    pub fn is_empty(&self, table: &str) -> StacksResult<bool> {
        Ok(self.len(table)? == 0)
    }

    /// Copy of every table's rows and sequence.
    pub(crate) fn snapshot(&self) -> StacksResult<BTreeMap<String, TableData>> {
        Ok(self
            .read()?
            .iter()
            .map(|(name, table)| (name.clone(), table.data.clone()))
            .collect())
    }

    /// Load stored tables into registered ones.
    ///
    /// Stored values are coerced back to the column types of the registered
    /// schema and every row must satisfy its constraints; tables without a
    /// schema are skipped. Nothing is replaced unless every table is valid.
    pub(crate) fn restore(&self, snapshot: BTreeMap<String, TableData>) -> StacksResult<()> {
        let mut tables = self.write()?;

        let mut loaded = Vec::with_capacity(snapshot.len());
        for (name, data) in snapshot {
            let Some(table) = tables.get(&name) else {
                warn!(table = %name, "Skipping stored table without a registered model");
                continue;
            };
            let data = validate_stored(&table.schema, data)
                .map_err(|reason| stored_table_error(&name, reason))?;
            loaded.push((name, data));
        }

        for (name, data) in loaded {
            if let Some(table) = tables.get_mut(&name) {
                table.data = data;
            }
        }
        Ok(())
    }

    /// Put back a [`MemoryDriver::snapshot`] taken earlier, without checks.
    pub(crate) fn rollback(&self, snapshot: BTreeMap<String, TableData>) -> StacksResult<()> {
        let mut tables = self.write()?;
        for (name, data) in snapshot {
            if let Some(table) = tables.get_mut(&name) {
                table.data = data;
            }
        }
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Plan evaluation
    // -------------------------------------------------------------------------

    fn select(&self, plan: &SelectPlan) -> StacksResult<Vec<Row>> {
        let tables = self.read()?;
        let table = lookup(&tables, &plan.table)?;
        check_columns(&table.schema, plan.predicates.iter().map(|p| p.column()))?;
        check_columns(&table.schema, plan.order.iter().map(|o| o.column.as_str()))?;

        let mut rows: Vec<&Row> = table
            .data
            .rows
            .iter()
            .filter(|row| matches_all(&plan.predicates, row))
            .collect();

        let pk = table.schema.primary_key();
        rows.sort_by(|a, b| compare(a, b, &plan.order, pk));

        let offset = plan.offset.unwrap_or(0) as usize;
        let limit = plan.limit.map_or(usize::MAX, |l| l as usize);

        Ok(rows
            .into_iter()
            .skip(offset)
            .take(limit)
            .map(|row| project(row, &plan.projection))
            .collect())
    }

    fn count_rows(&self, plan: &CountPlan) -> StacksResult<u64> {
        let tables = self.read()?;
        let table = lookup(&tables, &plan.table)?;
        check_columns(&table.schema, plan.predicates.iter().map(|p| p.column()))?;

        Ok(table
            .data
            .rows
            .iter()
            .filter(|row| matches_all(&plan.predicates, row))
            .count() as u64)
    }

    pub(crate) fn insert_row(&self, plan: &InsertPlan) -> StacksResult<Row> {
        let mut tables = self.write()?;
        let table = lookup_mut(&mut tables, &plan.table)?;
        let schema = Arc::clone(&table.schema);
        check_columns(&schema, plan.values.keys().map(String::as_str))?;

        let id = table.data.next_id;
        let next_id = id.checked_add(1).ok_or_else(|| ApplicationError::Storage {
            reason: format!("identity sequence of table '{}' is exhausted", plan.table),
        })?;
        let mut row: Row = schema
            .column_names()
            .map(|name| (name.to_string(), Value::Null))
            .collect();
        row.extend(plan.values.clone());
        row.insert(schema.primary_key().to_string(), Value::Integer(id));

        check_constraints(&schema, &row, table.data.rows.iter())?;

        table.data.next_id = next_id;
        table.data.rows.push(row.clone());
        Ok(row)
    }

    pub(crate) fn update_rows(&self, plan: &UpdatePlan) -> StacksResult<Vec<Row>> {
        let mut tables = self.write()?;
        let table = lookup_mut(&mut tables, &plan.table)?;
        let schema = Arc::clone(&table.schema);
        check_columns(&schema, plan.predicates.iter().map(|p| p.column()))?;
        check_columns(&schema, plan.set.keys().map(String::as_str))?;
        if plan.set.contains_key(schema.primary_key()) {
            return Err(DomainError::ReadOnlyColumn {
                column: schema.primary_key().to_string(),
            }
            .into());
        }

        let targets: Vec<usize> = table
            .data
            .rows
            .iter()
            .enumerate()
            .filter(|(_, row)| matches_all(&plan.predicates, row))
            .map(|(index, _)| index)
            .collect();

        // Validate every change before applying any of them.
        let mut staged = table.data.rows.clone();
        for &index in &targets {
            staged[index].extend(plan.set.clone());
        }
        for &index in &targets {
            let others = staged
                .iter()
                .enumerate()
                .filter(|(other, _)| *other != index)
                .map(|(_, row)| row);
            check_constraints(&schema, &staged[index], others)?;
        }

        let updated = targets.iter().map(|&index| staged[index].clone()).collect();
        table.data.rows = staged;
        Ok(updated)
    }

    pub(crate) fn delete_rows(&self, plan: &DeletePlan) -> StacksResult<Vec<Row>> {
        let mut tables = self.write()?;
        let table = lookup_mut(&mut tables, &plan.table)?;
        check_columns(&table.schema, plan.predicates.iter().map(|p| p.column()))?;

        let (deleted, kept): (Vec<Row>, Vec<Row>) = std::mem::take(&mut table.data.rows)
            .into_iter()
            .partition(|row| matches_all(&plan.predicates, row));
        table.data.rows = kept;
        Ok(deleted)
    }

    // -------------------------------------------------------------------------
    // Internal Helpers
    // -------------------------------------------------------------------------

    fn read(&self) -> StacksResult<RwLockReadGuard<'_, HashMap<String, Table>>> {
        self.tables
            .read()
            .map_err(|_| ApplicationError::StoreLockError.into())
    }

    fn write(&self) -> StacksResult<RwLockWriteGuard<'_, HashMap<String, Table>>> {
        self.tables
            .write()
            .map_err(|_| ApplicationError::StoreLockError.into())
    }
}

#[async_trait]
impl QueryExecutor for MemoryDriver {
    #[instrument(skip_all, fields(table = %plan.table))]
    async fn fetch_all(&self, plan: &SelectPlan) -> StacksResult<Vec<Row>> {
        self.select(plan)
    }

    #[instrument(skip_all, fields(table = %plan.table))]
    async fn fetch_optional(&self, plan: &SelectPlan) -> StacksResult<Option<Row>> {
        let first = plan.clone().limit(Some(plan.limit.map_or(1, |l| l.min(1))));
        Ok(self.select(&first)?.into_iter().next())
    }

    #[instrument(skip_all, fields(table = %plan.table))]
    async fn count(&self, plan: &CountPlan) -> StacksResult<u64> {
        self.count_rows(plan)
    }

    #[instrument(skip_all, fields(table = %plan.table))]
    async fn insert(&self, plan: &InsertPlan) -> StacksResult<Row> {
        self.insert_row(plan)
    }

    #[instrument(skip_all, fields(table = %plan.table))]
    async fn update(&self, plan: &UpdatePlan) -> StacksResult<Vec<Row>> {
        self.update_rows(plan)
    }

    #[instrument(skip_all, fields(table = %plan.table))]
    async fn delete(&self, plan: &DeletePlan) -> StacksResult<Vec<Row>> {
        self.delete_rows(plan)
    }
}

fn lookup<'a>(tables: &'a HashMap<String, Table>, name: &str) -> StacksResult<&'a Table> {
    tables.get(name).ok_or_else(|| {
        ApplicationError::TableNotRegistered {
            table: name.to_string(),
        }
        .into()
    })
}

fn lookup_mut<'a>(
    tables: &'a mut HashMap<String, Table>,
    name: &str,
) -> StacksResult<&'a mut Table> {
    tables.get_mut(name).ok_or_else(|| {
        ApplicationError::TableNotRegistered {
            table: name.to_string(),
        }
        .into()
    })
}

fn check_columns<'a>(
    schema: &TableSchema,
    mut columns: impl Iterator<Item = &'a str>,
) -> StacksResult<()> {
    match columns.find(|column| schema.column(column).is_none()) {
        Some(column) => Err(DomainError::UnknownColumn {
            table: schema.table().to_string(),
            column: column.to_string(),
        }
        .into()),
        None => Ok(()),
    }
}

/// Not-null and uniqueness checks of `row` against `others`.
fn check_constraints<'a>(
    schema: &TableSchema,
    row: &Row,
    others: impl Iterator<Item = &'a Row> + Clone,
) -> StacksResult<()> {
    let violation = |column: &str, kind| ApplicationError::ConstraintViolation {
        table: schema.table().to_string(),
        column: column.to_string(),
        kind,
    };

    for column in schema.columns() {
        let value = row.get(&column.name).unwrap_or(&Value::Null);

        if !column.nullable && value.is_null() {
            return Err(violation(&column.name, ConstraintKind::NotNull).into());
        }

        // JSON cannot hold NaN or infinity; they would come back as null.
        if matches!(value, Value::Float(f) if !f.is_finite()) {
            return Err(DomainError::InvalidValue {
                column: column.name.clone(),
                expected: column.ty.to_string(),
                found: format!("float {value}"),
            }
            .into());
        }

        if column.unique && !value.is_null() {
            let taken = others
                .clone()
                .any(|other| other.get(&column.name).is_some_and(|v| v.sql_eq(value)));
            if taken {
                return Err(violation(&column.name, ConstraintKind::Unique).into());
            }
        }
    }

    Ok(())
}

fn compare(a: &Row, b: &Row, order: &[OrderBy], pk: &str) -> Ordering {
    let cell = |row: &Row, column: &str| row.get(column).cloned().unwrap_or_default();

    order
        .iter()
        .map(|o| o.direction.apply(cell(a, &o.column).sort_cmp(&cell(b, &o.column))))
        .find(|ordering| ordering.is_ne())
        .unwrap_or_else(|| cell(a, pk).sort_cmp(&cell(b, pk)))
}

fn project(row: &Row, projection: &Projection) -> Row {
    match projection {
        Projection::All => row.clone(),
        Projection::Columns(columns) => columns
            .iter()
            .filter_map(|column| row.get(column).map(|v| (column.clone(), v.clone())))
            .collect(),
    }
}

/// Coerce and check a stored table against `schema`, and move its sequence
/// past every stored identity.
fn validate_stored(schema: &TableSchema, data: TableData) -> StacksResult<TableData> {
    let mut rows = Vec::with_capacity(data.rows.len());
    for row in data.rows {
        let mut full: Row = schema
            .column_names()
            .map(|name| (name.to_string(), Value::Null))
            .collect();
        full.extend(coerce_row(schema, row)?);
        rows.push(full);
    }

    for (index, row) in rows.iter().enumerate() {
        let others = rows
            .iter()
            .enumerate()
            .filter(move |(other, _)| *other != index)
            .map(|(_, row)| row);
        check_constraints(schema, row, others)?;
    }

    let highest = rows
        .iter()
        .filter_map(|row| row.get(schema.primary_key()).and_then(Value::as_i64))
        .max()
        .unwrap_or(0);
    let after_highest = highest.checked_add(1).ok_or_else(|| ApplicationError::Storage {
        reason: format!("stored identity {highest} leaves no room for new rows"),
    })?;

    Ok(TableData {
        next_id: data.next_id.max(after_highest),
        rows,
    })
}

fn stored_table_error(table: &str, cause: StacksError) -> StacksError {
    ApplicationError::Storage {
        reason: format!("stored table '{table}' does not match its model: {cause}"),
    }
    .into()
}

fn coerce_row(schema: &TableSchema, row: Row) -> StacksResult<Row> {
    row.into_iter()
        .map(|(column, value)| {
            let ty = schema.require_column(&column)?.ty;
            let value = value.coerce(&column, ty)?;
            Ok((column, value))
        })
        .collect()
}

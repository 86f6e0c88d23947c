//! Static query gateway - table-wide operations.
//!
//! Every operation follows the same flow:
//! 1. Validate the request against the table schema
//! 2. Build a plan
//! 3. Hand the plan to the `QueryExecutor`
//! 4. Bind returned rows to the schema
//!
//! "Nothing matched" comes back as `Ok(None)` or an empty `Vec`.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, info, instrument};

use crate::{
    application::{
        ports::{Clock, QueryExecutor},
        services::model::Model,
    },
    domain::{
        CREATED_AT, CountPlan, Criteria, DEFAULT_PAGE_SIZE, DeletePlan, DomainValidator as validator,
        InsertPlan, OrderBy, Paginated, Paging, Predicate, QueryOptions, Record, Row, SelectPlan,
        Sort, SortDirection, TableSchema, UPDATED_AT, UpdatePlan, Value,
    },
    error::StacksResult,
};

/// What a query is bound to.
///
/// Static gateway calls run against the whole table; instance calls pin the
/// plan to one identity on top of whatever else the caller asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Table,
    Identity(i64),
}

impl Scope {
    fn predicates(self, schema: &TableSchema) -> Vec<Predicate> {
        match self {
            Self::Table => Vec::new(),
            Self::Identity(id) => vec![Predicate::eq(schema.primary_key(), id)],
        }
    }
}

/// Gateway to one table.
///
/// Cheap to clone: every field is shared.
#[derive(Clone)]
pub struct Gateway {
    executor: Arc<dyn QueryExecutor>,
    schema: Arc<TableSchema>,
    clock: Arc<dyn Clock>,
}

impl fmt::Debug for Gateway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Gateway")
            .field("model", &self.schema.model())
            .field("table", &self.schema.table())
            .finish_non_exhaustive()
    }
}

impl Gateway {
    /// Create a gateway for `schema` over the given adapters.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// use std::sync::Arc;
    /// use stacks_core::application::Gateway;
    ///
    /// let users = Gateway::new(
    ///     Arc::new(driver),     // impl QueryExecutor
    ///     Arc::new(schema),     // TableSchema
    ///     Arc::new(SystemClock),// impl Clock
    /// );
    /// ```
    pub fn new(
        executor: Arc<dyn QueryExecutor>,
        schema: Arc<TableSchema>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            executor,
            schema,
            clock,
        }
    }

    pub fn schema(&self) -> &Arc<TableSchema> {
        &self.schema
    }

    pub fn table(&self) -> &str {
        self.schema.table()
    }

    // -------------------------------------------------------------------------
    // Lookups
    // -------------------------------------------------------------------------

    /// Fetch one record by identity, optionally projecting `fields`.
    #[instrument(skip_all, fields(table = %self.schema.table(), id = id))]
    pub async fn find(&self, id: i64, fields: Option<&[&str]>) -> StacksResult<Option<Model>> {
        let plan = SelectPlan::new(self.table())
            .project(validator::validate_projection(&self.schema, fields)?)
            .filters(Scope::Identity(id).predicates(&self.schema))
            .limit(Some(1));
        debug!(?plan, "Planned find");

        let row = self.executor.fetch_optional(&plan).await?;
        Ok(row.map(|row| self.model(row)))
    }

    /// Fetch every record whose identity is in `ids`, ordered by identity.
    #[instrument(skip_all, fields(table = %self.schema.table(), ids = ids.len()))]
    pub async fn find_many(&self, ids: &[i64], fields: Option<&[&str]>) -> StacksResult<Vec<Model>> {
        let projection = validator::validate_projection(&self.schema, fields)?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let values = ids.iter().copied().map(Value::Integer).collect();
        let plan = SelectPlan::new(self.table())
            .project(projection)
            .filter(Predicate::is_in(self.schema.primary_key(), values))
            .order_by(OrderBy::new(self.schema.primary_key(), SortDirection::Asc));
        debug!(?plan, "Planned find_many");

        let rows = self.executor.fetch_all(&plan).await?;
        Ok(self.models(rows))
    }

    /// First record whose `column` equals `value` (`Value::Null` means IS NULL).
    #[instrument(skip_all, fields(table = %self.schema.table(), column = column))]
    pub async fn find_by(&self, column: &str, value: impl Into<Value>) -> StacksResult<Option<Model>> {
        let predicates = Criteria::new().eq(column, value).to_predicates(&self.schema)?;
        let plan = SelectPlan::new(self.table())
            .filters(predicates)
            .order_by(OrderBy::new(self.schema.primary_key(), SortDirection::Asc))
            .limit(Some(1));
        debug!(?plan, "Planned find_by");

        let row = self.executor.fetch_optional(&plan).await?;
        Ok(row.map(|row| self.model(row)))
    }

    /// Case-sensitive exact lookup on the `email` column.
    pub async fn find_by_email(&self, email: &str) -> StacksResult<Option<Model>> {
        self.find_by("email", email).await
    }

    /// Record with the lowest identity.
    pub async fn first(&self) -> StacksResult<Option<Model>> {
        self.edge(SortDirection::Asc).await
    }

    /// Record with the highest identity.
    pub async fn last(&self) -> StacksResult<Option<Model>> {
        self.edge(SortDirection::Desc).await
    }

    // -------------------------------------------------------------------------
    // Filtered fetches
    // -------------------------------------------------------------------------

    /// Records matching `criteria`.
    ///
    /// Without an explicit sort, tables with timestamps come back newest
    /// first.
    #[instrument(skip_all, fields(table = %self.schema.table()))]
    pub async fn get(&self, criteria: &Criteria, options: &QueryOptions) -> StacksResult<Vec<Model>> {
        let predicates = criteria.to_predicates(&self.schema)?;
        let default_order = self
            .schema
            .has_timestamps()
            .then(|| OrderBy::new(CREATED_AT, SortDirection::Desc));

        self.select(Scope::Table, predicates, options, default_order)
            .await
    }

    /// Records matching `criteria`, in storage order unless sorted.
    #[instrument(skip_all, fields(table = %self.schema.table()))]
    pub async fn filter(&self, criteria: &Criteria, options: &QueryOptions) -> StacksResult<Vec<Model>> {
        let predicates = criteria.to_predicates(&self.schema)?;
        self.select(Scope::Table, predicates, options, None).await
    }

    /// The plan [`Gateway::filter`] would run, without running it.
    pub fn plan_filter(&self, criteria: &Criteria, options: &QueryOptions) -> StacksResult<SelectPlan> {
        let predicates = criteria.to_predicates(&self.schema)?;
        self.plan_select(Scope::Table, predicates, options, None)
    }

    /// Records whose `column` is one of `values`. An empty list matches nothing.
    #[instrument(skip_all, fields(table = %self.schema.table(), column = column))]
    pub async fn where_in(
        &self,
        column: &str,
        values: Vec<Value>,
        options: &QueryOptions,
    ) -> StacksResult<Vec<Model>> {
        let predicate = self.in_predicate(column, values)?;
        self.select(Scope::Table, vec![predicate], options, None)
            .await
    }

    /// Every record sorted by `column`.
    pub async fn order_by(&self, column: &str, direction: SortDirection) -> StacksResult<Vec<Model>> {
        let options = QueryOptions::new().sort(Sort::new(column, direction));
        self.select(Scope::Table, Vec::new(), &options, None).await
    }

    pub async fn order_by_asc(&self, column: &str) -> StacksResult<Vec<Model>> {
        self.order_by(column, SortDirection::Asc).await
    }

    pub async fn order_by_desc(&self, column: &str) -> StacksResult<Vec<Model>> {
        self.order_by(column, SortDirection::Desc).await
    }

    /// Number of records matching `criteria`.
    #[instrument(skip_all, fields(table = %self.schema.table()))]
    pub async fn count(&self, criteria: &Criteria) -> StacksResult<u64> {
        let plan = CountPlan {
            table: self.table().to_string(),
            predicates: criteria.to_predicates(&self.schema)?,
        };
        self.executor.count(&plan).await
    }

    /// One page of the whole table, ordered by identity.
    ///
    /// Runs a count query and then a data query; the two are not atomic, so
    /// `total_records` may lag behind a concurrently written page. The data
    /// query over-fetches one row whose identity becomes `next_cursor`.
    /// `page` defaults to 1 and `limit` to [`DEFAULT_PAGE_SIZE`].
    #[instrument(skip_all, fields(table = %self.schema.table()))]
    pub async fn all(&self, options: &QueryOptions) -> StacksResult<Paginated<Record>> {
        let limit = options.limit.unwrap_or(DEFAULT_PAGE_SIZE);
        let mut resolved = options.clone();
        resolved.limit = Some(limit);
        if resolved.offset.is_none() {
            resolved.page.get_or_insert(1);
        }
        let window = resolved.window()?;
        let offset = window.offset.unwrap_or(0);
        let page = resolved
            .page
            .unwrap_or_else(|| offset.checked_div(limit).unwrap_or(0) + 1);

        let order = match &options.sort {
            Some(sort) => validator::validate_sort(&self.schema, sort)?,
            None => OrderBy::new(self.schema.primary_key(), SortDirection::Asc),
        };

        let count = CountPlan {
            table: self.table().to_string(),
            predicates: Vec::new(),
        };
        let total_records = self.executor.count(&count).await?;

        let plan = SelectPlan::new(self.table())
            .order_by(order)
            .limit(Some(limit.saturating_add(1)))
            .offset(window.offset);
        debug!(?plan, total_records, "Planned page");

        let mut rows = self.executor.fetch_all(&plan).await?;
        let next_cursor = if rows.len() as u64 > limit {
            rows.truncate(limit as usize + 1);
            rows.pop()
                .and_then(|row| row.get(self.schema.primary_key()).and_then(Value::as_i64))
        } else {
            None
        };

        Ok(Paginated {
            data: rows.into_iter().map(|row| self.record(row)).collect(),
            paging: Paging::new(total_records, page, limit),
            next_cursor,
        })
    }

    // -------------------------------------------------------------------------
    // Writes
    // -------------------------------------------------------------------------

    /// Insert a new record.
    ///
    /// Constraint violations are returned as errors, never recovered here.
    #[instrument(skip_all, fields(table = %self.schema.table()))]
    pub async fn create(&self, values: Row) -> StacksResult<Model> {
        let values = validator::validate_write(&self.schema, values)?;
        let row = self.insert_row(values).await?;
        Ok(self.model(row))
    }

    /// Patch the record with identity `id`. Zero matched rows is `Ok(None)`.
    #[instrument(skip_all, fields(table = %self.schema.table(), id = id))]
    pub async fn update(&self, id: i64, patch: Row) -> StacksResult<Option<Model>> {
        let patch = validator::validate_write(&self.schema, patch)?;
        let rows = self.update_scoped(Scope::Identity(id), patch).await?;
        Ok(rows.into_iter().next().map(|row| self.model(row)))
    }

    /// Delete the record with identity `id`, returning its prior state.
    #[instrument(skip_all, fields(table = %self.schema.table(), id = id))]
    pub async fn remove(&self, id: i64) -> StacksResult<Option<Record>> {
        let rows = self.delete_scoped(Scope::Identity(id)).await?;
        if rows.is_empty() {
            debug!("Nothing to remove");
        }
        Ok(rows.into_iter().next().map(|row| self.record(row)))
    }

    // -------------------------------------------------------------------------
    // Shared with Model
    // -------------------------------------------------------------------------

    pub(crate) async fn select(
        &self,
        scope: Scope,
        predicates: Vec<Predicate>,
        options: &QueryOptions,
        default_order: Option<OrderBy>,
    ) -> StacksResult<Vec<Model>> {
        let plan = self.plan_select(scope, predicates, options, default_order)?;
        debug!(?plan, ?scope, "Planned select");

        let rows = self.executor.fetch_all(&plan).await?;
        Ok(self.models(rows))
    }

    fn plan_select(
        &self,
        scope: Scope,
        predicates: Vec<Predicate>,
        options: &QueryOptions,
        default_order: Option<OrderBy>,
    ) -> StacksResult<SelectPlan> {
        let window = options.window()?;
        let order = match &options.sort {
            Some(sort) => Some(validator::validate_sort(&self.schema, sort)?),
            None => default_order,
        };

        let mut plan = SelectPlan::new(self.table())
            .filters(scope.predicates(&self.schema))
            .filters(predicates)
            .limit(window.limit)
            .offset(window.offset);
        if let Some(order) = order {
            plan = plan.order_by(order);
        }
        Ok(plan)
    }

    pub(crate) fn in_predicate(&self, column: &str, values: Vec<Value>) -> StacksResult<Predicate> {
        let ty = self.schema.require_column(column)?.ty;
        let values = values
            .into_iter()
            .map(|value| value.coerce(column, ty))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Predicate::is_in(column, values))
    }

    pub(crate) async fn fetch_scoped(&self, scope: Scope) -> StacksResult<Option<Row>> {
        let plan = SelectPlan::new(self.table())
            .filters(scope.predicates(&self.schema))
            .limit(Some(1));
        self.executor.fetch_optional(&plan).await
    }

    /// Stamps managed timestamps and inserts already-validated values.
    pub(crate) async fn insert_row(&self, mut values: Row) -> StacksResult<Row> {
        if self.schema.has_timestamps() {
            let now = Value::Timestamp(self.clock.now());
            values.insert(CREATED_AT.to_string(), now.clone());
            values.insert(UPDATED_AT.to_string(), now);
        }

        let plan = InsertPlan {
            table: self.table().to_string(),
            values,
        };
        let row = self.executor.insert(&plan).await?;
        info!(
            id = ?row.get(self.schema.primary_key()),
            "Record created"
        );
        Ok(row)
    }

    /// Stamps `updated_at` and updates already-validated values.
    ///
    /// An empty patch on a table without timestamps writes nothing and
    /// returns the rows as they are.
    pub(crate) async fn update_scoped(&self, scope: Scope, mut set: Row) -> StacksResult<Vec<Row>> {
        if self.schema.has_timestamps() {
            set.insert(UPDATED_AT.to_string(), Value::Timestamp(self.clock.now()));
        }

        if set.is_empty() {
            return Ok(self.fetch_scoped(scope).await?.into_iter().collect());
        }

        let plan = UpdatePlan {
            table: self.table().to_string(),
            set,
            predicates: scope.predicates(&self.schema),
        };
        debug!(?plan, "Planned update");

        let rows = self.executor.update(&plan).await?;
        info!(affected = rows.len(), ?scope, "Records updated");
        Ok(rows)
    }

    pub(crate) async fn delete_scoped(&self, scope: Scope) -> StacksResult<Vec<Row>> {
        let plan = DeletePlan {
            table: self.table().to_string(),
            predicates: scope.predicates(&self.schema),
        };
        let rows = self.executor.delete(&plan).await?;
        info!(affected = rows.len(), ?scope, "Records deleted");
        Ok(rows)
    }

    // -------------------------------------------------------------------------
    // Internal Helpers
    // -------------------------------------------------------------------------

    async fn edge(&self, direction: SortDirection) -> StacksResult<Option<Model>> {
        let plan = SelectPlan::new(self.table())
            .order_by(OrderBy::new(self.schema.primary_key(), direction))
            .limit(Some(1));
        let row = self.executor.fetch_optional(&plan).await?;
        Ok(row.map(|row| self.model(row)))
    }

    fn record(&self, row: Row) -> Record {
        Record::new(Arc::clone(&self.schema), row)
    }

    fn model(&self, row: Row) -> Model {
        Model::persisted(self.clone(), self.record(row))
    }

    fn models(&self, rows: Vec<Row>) -> Vec<Model> {
        rows.into_iter().map(|row| self.model(row)).collect()
    }
}

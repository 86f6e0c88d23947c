//! Instance gateway - operations bound to one loaded record.
//!
//! A [`Model`] owns a [`Record`] and tracks its [`RecordState`]:
//!
//! | State       | `update` | `save`        | `delete` | `refresh` |
//! |-------------|----------|---------------|----------|-----------|
//! | `Transient` | error    | insert        | error    | error     |
//! | `Persisted` | write    | no write      | delete   | reload    |
//! | `Dirty`     | write    | write staged  | delete   | reload    |
//! | `Deleted`   | error    | error         | error    | error     |
//!
//! Attributes change only through these operations and [`Model::fill`].

use serde::ser::{Serialize, Serializer};
use tracing::{debug, instrument};

use crate::{
    application::{
        ApplicationError,
        services::gateway::{Gateway, Scope},
    },
    domain::{
        Criteria, DomainValidator as validator, QueryOptions, Record, RecordState, Row, Value,
    },
    error::{StacksError, StacksResult},
};

/// One record plus the gateway it came from.
#[derive(Debug, Clone)]
pub struct Model {
    gateway: Gateway,
    record: Record,
    state: RecordState,
}

impl Model {
    /// A new, never persisted record. Call [`Model::save`] to insert it.
    ///
    /// # Errors
    ///
    /// Unknown columns, managed columns and uncoercible values are rejected.
    pub fn new(gateway: Gateway, attributes: Row) -> StacksResult<Self> {
        let attributes = validator::validate_write(gateway.schema(), attributes)?;
        Ok(Self {
            record: Record::new(gateway.schema().clone(), attributes),
            gateway,
            state: RecordState::Transient,
        })
    }

    pub(crate) fn persisted(gateway: Gateway, record: Record) -> Self {
        Self {
            gateway,
            record,
            state: RecordState::Persisted,
        }
    }

    pub fn state(&self) -> RecordState {
        self.state
    }

    pub fn id(&self) -> Option<i64> {
        self.record.id()
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.record.get(column)
    }

    pub fn record(&self) -> &Record {
        &self.record
    }

    pub fn into_record(self) -> Record {
        self.record
    }

    pub fn gateway(&self) -> &Gateway {
        &self.gateway
    }

    /// JSON view with hidden columns removed.
    pub fn to_json(&self) -> serde_json::Value {
        self.record.to_json()
    }

    /// Stage local changes without writing them.
    ///
    /// A record with identity becomes `Dirty`; a transient one stays
    /// transient until saved.
    pub fn fill(&mut self, patch: Row) -> StacksResult<()> {
        if self.state.is_terminal() {
            return Err(self.state_error("fill"));
        }

        let patch = validator::validate_write(self.gateway.schema(), patch)?;
        if patch.is_empty() {
            return Ok(());
        }

        self.record.merge(patch);
        if self.state.has_identity() {
            self.state = RecordState::Dirty;
        }
        Ok(())
    }

    /// Write `patch` to this record's row and adopt the stored result.
    ///
    /// # Errors
    ///
    /// - `RecordState` when the record has no identity or was deleted
    /// - `RecordNotFound` when the row is gone; local state is untouched
    #[instrument(skip_all, fields(table = %self.gateway.table(), id = ?self.record.id()))]
    pub async fn update(&mut self, patch: Row) -> StacksResult<()> {
        let id = self.identity("update")?;
        let patch = validator::validate_write(self.gateway.schema(), patch)?;

        let rows = self
            .gateway
            .update_scoped(Scope::Identity(id), patch)
            .await?;
        let Some(row) = rows.into_iter().next() else {
            return Err(self.not_found(id));
        };

        self.record.replace(row);
        self.state = RecordState::Persisted;
        Ok(())
    }

    /// Insert a transient record or write staged changes of a dirty one.
    #[instrument(skip_all, fields(table = %self.gateway.table(), state = %self.state))]
    pub async fn save(&mut self) -> StacksResult<()> {
        match self.state {
            RecordState::Transient => {
                let row = self
                    .gateway
                    .insert_row(self.record.writable_attributes())
                    .await?;
                self.record.replace(row);
                self.state = RecordState::Persisted;
                Ok(())
            }
            RecordState::Dirty => {
                let staged = self.record.writable_attributes();
                self.update(staged).await
            }
            RecordState::Persisted => {
                debug!("Nothing to save");
                Ok(())
            }
            RecordState::Deleted => Err(self.state_error("save")),
        }
    }

    /// Delete this record's row and clear the in-memory state.
    #[instrument(skip_all, fields(table = %self.gateway.table(), id = ?self.record.id()))]
    pub async fn delete(&mut self) -> StacksResult<()> {
        let id = self.identity("delete")?;

        let rows = self.gateway.delete_scoped(Scope::Identity(id)).await?;
        if rows.is_empty() {
            return Err(self.not_found(id));
        }

        self.record.clear();
        self.state = RecordState::Deleted;
        Ok(())
    }

    /// Reload from storage, discarding staged changes.
    #[instrument(skip_all, fields(table = %self.gateway.table(), id = ?self.record.id()))]
    pub async fn refresh(&mut self) -> StacksResult<()> {
        let id = self.identity("refresh")?;

        match self.gateway.fetch_scoped(Scope::Identity(id)).await? {
            Some(row) => {
                self.record.replace(row);
                self.state = RecordState::Persisted;
                Ok(())
            }
            None => Err(self.not_found(id)),
        }
    }

    /// `criteria` evaluated against this record's row only.
    pub async fn filter(&self, criteria: &Criteria, options: &QueryOptions) -> StacksResult<Vec<Model>> {
        let id = self.identity("query")?;
        let predicates = criteria.to_predicates(self.gateway.schema())?;
        self.gateway
            .select(Scope::Identity(id), predicates, options, None)
            .await
    }

    /// `column IN values` evaluated against this record's row only.
    pub async fn where_in(
        &self,
        column: &str,
        values: Vec<Value>,
        options: &QueryOptions,
    ) -> StacksResult<Vec<Model>> {
        let id = self.identity("query")?;
        let predicate = self.gateway.in_predicate(column, values)?;
        self.gateway
            .select(Scope::Identity(id), vec![predicate], options, None)
            .await
    }

    // -------------------------------------------------------------------------
    // Internal Helpers
    // -------------------------------------------------------------------------

    fn identity(&self, operation: &'static str) -> StacksResult<i64> {
        if !self.state.has_identity() {
            return Err(self.state_error(operation));
        }
        self.record.id().ok_or_else(|| StacksError::Internal {
            message: format!("{} record without identity", self.state),
        })
    }

    fn state_error(&self, operation: &'static str) -> StacksError {
        ApplicationError::RecordState {
            state: self.state,
            operation,
        }
        .into()
    }

    fn not_found(&self, id: i64) -> StacksError {
        ApplicationError::RecordNotFound {
            table: self.gateway.table().to_string(),
            id,
        }
        .into()
    }
}

impl Serialize for Model {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.record.serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::application::ports::{MockClock, MockQueryExecutor};
    use crate::domain::{ColumnDef, ColumnType, Predicate, TableSchema};

    fn gateway(executor: MockQueryExecutor) -> Gateway {
        let schema = TableSchema::builder("User", "users")
            .column(ColumnDef::new("name", ColumnType::Text).nullable())
            .column(ColumnDef::new("email", ColumnType::Text).unique())
            .column(ColumnDef::new("password", ColumnType::Text).hidden())
            .timestamps(false)
            .build()
            .unwrap();

        let mut clock = MockClock::new();
        clock
            .expect_now()
            .return_const(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
        Gateway::new(Arc::new(executor), Arc::new(schema), Arc::new(clock))
    }

    fn stored(id: i64, name: &str) -> Row {
        Row::from([
            ("id".to_string(), Value::from(id)),
            ("name".to_string(), Value::from(name)),
            ("email".to_string(), Value::from("ada@example.com")),
            ("password".to_string(), Value::from("secret")),
        ])
    }

    fn patch(name: &str) -> Row {
        Row::from([("name".to_string(), Value::from(name))])
    }

    fn loaded(executor: MockQueryExecutor) -> Model {
        let gateway = gateway(executor);
        let record = Record::new(gateway.schema().clone(), stored(1, "Ada"));
        Model::persisted(gateway, record)
    }

    fn is_state_error(err: &StacksError) -> bool {
        matches!(
            err,
            StacksError::Application(ApplicationError::RecordState { .. })
        )
    }

    #[tokio::test]
    async fn transient_update_is_a_state_error() {
        let mut model = Model::new(gateway(MockQueryExecutor::new()), patch("Ada")).unwrap();

        let err = model.update(patch("Ada L.")).await.unwrap_err();

        assert!(is_state_error(&err));
        assert_eq!(model.state(), RecordState::Transient);
    }

    #[tokio::test]
    async fn update_of_vanished_row_keeps_local_state() {
        let mut executor = MockQueryExecutor::new();
        executor
            .expect_update()
            .withf(|plan| plan.predicates == vec![Predicate::eq("id", 1)])
            .returning(|_| Ok(Vec::new()));
        let mut model = loaded(executor);
        let before = model.record().clone();

        let err = model.update(patch("Ada L.")).await.unwrap_err();

        assert!(err.is_record_not_found());
        assert_eq!(model.record(), &before);
        assert_eq!(model.state(), RecordState::Persisted);
    }

    #[tokio::test]
    async fn update_adopts_stored_row() {
        let mut executor = MockQueryExecutor::new();
        executor
            .expect_update()
            .returning(|_| Ok(vec![stored(1, "Ada L.")]));
        let mut model = loaded(executor);

        model.update(patch("Ada L.")).await.unwrap();

        assert_eq!(model.get("name"), Some(&Value::from("Ada L.")));
        assert_eq!(model.state(), RecordState::Persisted);
    }

    #[tokio::test]
    async fn save_inserts_transient_and_adopts_identity() {
        let mut executor = MockQueryExecutor::new();
        executor
            .expect_insert()
            .withf(|plan| !plan.values.contains_key("id"))
            .times(1)
            .returning(|plan| {
                let mut row = plan.values.clone();
                row.insert("id".into(), Value::from(9));
                Ok(row)
            });
        let mut model = Model::new(gateway(executor), patch("Ada")).unwrap();

        model.save().await.unwrap();

        assert_eq!(model.id(), Some(9));
        assert_eq!(model.state(), RecordState::Persisted);
    }

    #[tokio::test]
    async fn save_without_changes_writes_nothing() {
        let mut model = loaded(MockQueryExecutor::new());
        model.save().await.unwrap();
        assert_eq!(model.state(), RecordState::Persisted);
    }

    #[tokio::test]
    async fn fill_marks_dirty_and_save_writes_staged_state() {
        let mut executor = MockQueryExecutor::new();
        executor
            .expect_update()
            .withf(|plan| {
                plan.set.get("name") == Some(&Value::from("Ada L."))
                    && !plan.set.contains_key("id")
            })
            .times(1)
            .returning(|_| Ok(vec![stored(1, "Ada L.")]));
        let mut model = loaded(executor);

        model.fill(patch("Ada L.")).unwrap();
        assert_eq!(model.state(), RecordState::Dirty);

        model.save().await.unwrap();
        assert_eq!(model.state(), RecordState::Persisted);
    }

    #[tokio::test]
    async fn delete_clears_state_and_refresh_then_fails() {
        let mut executor = MockQueryExecutor::new();
        executor
            .expect_delete()
            .times(1)
            .returning(|_| Ok(vec![stored(1, "Ada")]));
        let mut model = loaded(executor);

        model.delete().await.unwrap();

        assert!(model.record().is_empty());
        assert_eq!(model.state(), RecordState::Deleted);
        assert!(is_state_error(&model.refresh().await.unwrap_err()));
        assert!(is_state_error(&model.save().await.unwrap_err()));
        assert!(is_state_error(&model.delete().await.unwrap_err()));
    }

    #[tokio::test]
    async fn delete_of_vanished_row_fails() {
        let mut executor = MockQueryExecutor::new();
        executor.expect_delete().returning(|_| Ok(Vec::new()));
        let mut model = loaded(executor);

        assert!(model.delete().await.unwrap_err().is_record_not_found());
        assert_eq!(model.state(), RecordState::Persisted);
    }

    #[tokio::test]
    async fn refresh_discards_staged_changes() {
        let mut executor = MockQueryExecutor::new();
        executor
            .expect_fetch_optional()
            .returning(|_| Ok(Some(stored(1, "Stored"))));
        let mut model = loaded(executor);
        model.fill(patch("Local")).unwrap();

        model.refresh().await.unwrap();

        assert_eq!(model.get("name"), Some(&Value::from("Stored")));
        assert_eq!(model.state(), RecordState::Persisted);
    }

    #[tokio::test]
    async fn instance_filter_is_bound_to_identity() {
        let mut executor = MockQueryExecutor::new();
        executor
            .expect_fetch_all()
            .withf(|plan| {
                plan.predicates
                    == vec![Predicate::eq("id", 1), Predicate::is_null("name")]
            })
            .returning(|_| Ok(Vec::new()));
        let model = loaded(executor);

        let found = model
            .filter(&Criteria::new().is_null("name"), &QueryOptions::new())
            .await
            .unwrap();
        assert!(found.is_empty());
    }

    #[test]
    fn serialization_omits_hidden_columns() {
        let model = loaded(MockQueryExecutor::new());
        let json = serde_json::to_string(&model).unwrap();
        assert!(!json.contains("secret"));
        assert!(json.contains("ada@example.com"));
    }

    #[test]
    fn new_rejects_managed_columns() {
        let err = Model::new(gateway(MockQueryExecutor::new()), stored(1, "Ada")).unwrap_err();
        assert!(matches!(err, StacksError::Domain(_)));
    }
}

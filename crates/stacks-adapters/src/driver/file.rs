//! JSON file storage engine.
//!
//! A [`MemoryDriver`] whose tables are loaded from one JSON document on open
//! and rewritten after every successful write. The document is written to a
//! sibling temporary file first and renamed into place, so a crash mid-write
//! leaves the previous document intact. If the document cannot be written,
//! the in-memory tables are rolled back to match it.
//!
//! ```json
//! {
//!   "tables": {
//!     "users": { "next_id": 3, "rows": [ { "id": 1, "email": "ada@example.com" } ] }
//!   }
//! }
//! ```

use std::{
    collections::BTreeMap,
    io,
    path::{Path, PathBuf},
    sync::Arc,
};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use stacks_core::{
    application::{ApplicationError, ports::QueryExecutor},
    domain::{CountPlan, DeletePlan, InsertPlan, Row, SelectPlan, TableSchema, UpdatePlan},
    error::{StacksError, StacksResult},
};

use super::memory::{MemoryDriver, TableData};

#[derive(Debug, Default, Serialize, Deserialize)]
struct Document {
    #[serde(default)]
    tables: BTreeMap<String, TableData>,
}

/// Memory tables persisted to a JSON file.
#[derive(Debug, Clone)]
pub struct JsonFileDriver {
    path: PathBuf,
    memory: MemoryDriver,
    write_lock: Arc<Mutex<()>>,
}

impl JsonFileDriver {
    /// Open (or prepare to create) the document at `path` for `schemas`.
    ///
    /// A missing file is an empty database; it is created on first write.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub async fn open(
        path: impl AsRef<Path>,
        schemas: impl IntoIterator<Item = Arc<TableSchema>>,
    ) -> StacksResult<Self> {
        let path = path.as_ref().to_path_buf();
        let memory = MemoryDriver::new();
        for schema in schemas {
            memory.register(schema)?;
        }

        match tokio::fs::read(&path).await {
            Ok(bytes) => {
                let document: Document = serde_json::from_slice(&bytes).map_err(|e| {
                    storage_error(&path, format!("invalid database document: {e}"))
                })?;
                memory.restore(document.tables)?;
                debug!("Loaded database document");
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("No database document yet");
            }
            Err(e) => return Err(io_error(&path, e, "read")),
        }

        Ok(Self {
            path,
            memory,
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The in-memory view of the document.
    pub fn memory(&self) -> &MemoryDriver {
        &self.memory
    }

    /// Apply a write to memory and persist it, or undo it if persisting fails.
    async fn commit<T>(
        &self,
        write: impl FnOnce(&MemoryDriver) -> StacksResult<T>,
        changed: impl FnOnce(&T) -> bool,
    ) -> StacksResult<T> {
        let _guard = self.write_lock.lock().await;

        let before = self.memory.snapshot()?;
        let result = write(&self.memory)?;
        if !changed(&result) {
            return Ok(result);
        }

        if let Err(e) = self.persist().await {
            warn!(path = %self.path.display(), error = %e, "Rolling back unpersisted write");
            self.memory.rollback(before)?;
            return Err(e);
        }
        Ok(result)
    }

    /// Rewrite the document from the current tables. Callers hold `write_lock`.
    async fn persist(&self) -> StacksResult<()> {
        let document = Document {
            tables: self.memory.snapshot()?,
        };
        let bytes = serde_json::to_vec_pretty(&document)
            .map_err(|e| storage_error(&self.path, format!("cannot encode document: {e}")))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| io_error(parent, e, "create directory"))?;
        }

        let temp = self
            .path
            .with_extension(format!("{}.tmp", Uuid::new_v4().simple()));
        tokio::fs::write(&temp, &bytes)
            .await
            .map_err(|e| io_error(&temp, e, "write"))?;
        if let Err(e) = tokio::fs::rename(&temp, &self.path).await {
            let _ = tokio::fs::remove_file(&temp).await;
            return Err(io_error(&self.path, e, "replace"));
        }

        info!(path = %self.path.display(), bytes = bytes.len(), "Database document written");
        Ok(())
    }
}

#[async_trait]
impl QueryExecutor for JsonFileDriver {
    async fn fetch_all(&self, plan: &SelectPlan) -> StacksResult<Vec<Row>> {
        self.memory.fetch_all(plan).await
    }

    async fn fetch_optional(&self, plan: &SelectPlan) -> StacksResult<Option<Row>> {
        self.memory.fetch_optional(plan).await
    }

    async fn count(&self, plan: &CountPlan) -> StacksResult<u64> {
        self.memory.count(plan).await
    }

    #[instrument(skip_all, fields(table = %plan.table))]
    async fn insert(&self, plan: &InsertPlan) -> StacksResult<Row> {
        self.commit(|memory| memory.insert_row(plan), |_| true).await
    }

    #[instrument(skip_all, fields(table = %plan.table))]
    async fn update(&self, plan: &UpdatePlan) -> StacksResult<Vec<Row>> {
        self.commit(|memory| memory.update_rows(plan), |rows| !rows.is_empty())
            .await
    }

    #[instrument(skip_all, fields(table = %plan.table))]
    async fn delete(&self, plan: &DeletePlan) -> StacksResult<Vec<Row>> {
        self.commit(|memory| memory.delete_rows(plan), |rows| !rows.is_empty())
            .await
    }
}

fn storage_error(path: &Path, reason: String) -> StacksError {
    ApplicationError::Storage {
        reason: format!("{}: {}", path.display(), reason),
    }
    .into()
}

fn io_error(path: &Path, e: io::Error, operation: &str) -> StacksError {
    storage_error(path, format!("failed to {operation}: {e}"))
}

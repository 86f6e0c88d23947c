//! Filesystem-based model loader.
//!
//! Discovers `*.toml` model definitions under a directory tree and turns
//! them into [`TableSchema`]s.
//!
//! # Model file format
//!
//! ```toml
//! name        = "Post"          # model name (required)
//! table       = "posts"         # table name (required)
//! primary_key = "id"            # optional, default "id"
//! timestamps  = true            # optional, default true
//!
//! [attributes.title]
//! type     = "text"             # integer | float | text | timestamp
//! nullable = false              # optional, default false
//! unique   = false              # optional, default false
//! hidden   = false              # optional, default false
//! ```
//!
//! Attributes are declared in alphabetical column order.

use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use serde::Deserialize;
use tracing::{debug, instrument, warn};
use walkdir::WalkDir;

use stacks_core::domain::{ColumnDef, ColumnType, DomainError, TableSchema};

// ── Definition types ──────────────────────────────────────────────────────────

/// Deserialised representation of one model file.
#[derive(Debug, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct ModelDefinition {
    pub name: String,
    pub table: String,
    pub primary_key: Option<String>,
    pub timestamps: Option<bool>,
    #[serde(default)]
    pub attributes: BTreeMap<String, AttributeDefinition>,
}

/// One `[attributes.<column>]` section.
#[derive(Debug, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct AttributeDefinition {
    #[serde(rename = "type")]
    pub ty: String,
    #[serde(default)]
    pub nullable: bool,
    #[serde(default)]
    pub unique: bool,
    #[serde(default)]
    pub hidden: bool,
}

impl ModelDefinition {
    /// Parse a model file's contents.
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        toml::from_str(raw).map_err(|e| DomainError::InvalidModelDefinition(e.to_string()))
    }

    /// Validate and convert into a schema.
    pub fn into_schema(self) -> Result<TableSchema, DomainError> {
        let mut builder = TableSchema::builder(self.name, self.table)
            .timestamps(self.timestamps.unwrap_or(true));
        if let Some(pk) = self.primary_key {
            builder = builder.primary_key(pk);
        }

        for (name, attribute) in self.attributes {
            let ty: ColumnType = attribute.ty.parse()?;
            let mut column = ColumnDef::new(name, ty);
            if attribute.nullable {
                column = column.nullable();
            }
            if attribute.unique {
                column = column.unique();
            }
            if attribute.hidden {
                column = column.hidden();
            }
            builder = builder.column(column);
        }

        builder.build()
    }
}

// ── Loader ────────────────────────────────────────────────────────────────────

/// Loads [`TableSchema`]s from a directory of model files.
///
/// Files that cannot be read or parsed emit a `WARN` log and are skipped;
/// they do not prevent other models from loading.
pub struct ModelLoader {
    models_dir: PathBuf,
}

impl ModelLoader {
    /// Create a loader pointed at `models_dir`.
    pub fn new(models_dir: impl Into<PathBuf>) -> Self {
        Self {
            models_dir: models_dir.into(),
        }
    }

    pub fn models_dir(&self) -> &Path {
        &self.models_dir
    }

    /// Load every valid model found under the directory, sorted by path.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::InvalidModelDefinition`] if the directory does
    /// not exist or cannot be walked.
    #[instrument(skip(self), fields(dir = %self.models_dir.display()))]
    pub fn load_all(&self) -> Result<Vec<TableSchema>, DomainError> {
        if !self.models_dir.is_dir() {
            return Err(DomainError::InvalidModelDefinition(format!(
                "models directory not found: {}",
                self.models_dir.display()
            )));
        }

        let mut schemas = Vec::new();

        for entry in WalkDir::new(&self.models_dir).min_depth(1).sort_by_file_name() {
            let entry = entry
                .map_err(|e| DomainError::InvalidModelDefinition(format!("directory walk error: {e}")))?;
            let path = entry.path();

            if !entry.file_type().is_file() || path.extension().is_none_or(|ext| ext != "toml") {
                continue;
            }

            match Self::load_file(path) {
                Ok(schema) => {
                    debug!(model = schema.model(), table = schema.table(), "loaded model");
                    schemas.push(schema);
                }
                Err(e) => {
                    warn!(
                        file  = %path.display(),
                        error = %e,
                        "skipping model file due to load error"
                    );
                }
            }
        }

        debug!(count = schemas.len(), "finished loading models");
        Ok(schemas)
    }

    /// Load a single model file.
    pub fn load_file(path: &Path) -> Result<TableSchema, DomainError> {
        let raw = fs::read_to_string(path).map_err(|e| {
            DomainError::InvalidModelDefinition(format!("failed to read '{}': {e}", path.display()))
        })?;

        ModelDefinition::parse(&raw)
            .and_then(ModelDefinition::into_schema)
            .map_err(|e| match e {
                DomainError::InvalidModelDefinition(reason) => DomainError::InvalidModelDefinition(
                    format!("'{}': {reason}", path.display()),
                ),
                other => other,
            })
    }
}

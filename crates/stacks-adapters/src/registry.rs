//! Named model schemas available to callers.

use std::collections::BTreeMap;
use std::sync::Arc;

use stacks_core::domain::{DomainError, TableSchema};
use tracing::debug;

use crate::builtin_models;

/// Model schemas keyed by lowercase model name.
#[derive(Debug, Clone, Default)]
pub struct ModelRegistry {
    models: BTreeMap<String, Arc<TableSchema>>,
}

impl ModelRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with the built-in models loaded.
    pub fn with_builtin() -> Result<Self, DomainError> {
        let mut registry = Self::new();
        for schema in builtin_models::all_models()? {
            registry.register(schema);
        }
        Ok(registry)
    }

    /// Add `schema`, replacing a model of the same name.
    pub fn register(&mut self, schema: TableSchema) {
        let key = schema.model().to_ascii_lowercase();
        if self.models.contains_key(&key) {
            debug!(model = schema.model(), "Overriding model definition");
        }
        self.models.insert(key, Arc::new(schema));
    }

    /// Look up a model by model name or table name, case-insensitively.
    pub fn get(&self, name: &str) -> Option<Arc<TableSchema>> {
        let key = name.to_ascii_lowercase();
        self.models.get(&key).cloned().or_else(|| {
            self.models
                .values()
                .find(|schema| schema.table().eq_ignore_ascii_case(name))
                .cloned()
        })
    }

    /// Like [`ModelRegistry::get`], failing with the known model names.
    pub fn require(&self, name: &str) -> Result<Arc<TableSchema>, DomainError> {
        self.get(name).ok_or_else(|| {
            let known: Vec<_> = self.models.values().map(|s| s.model()).collect();
            DomainError::InvalidModelDefinition(format!(
                "unknown model '{}' (known: {})",
                name,
                known.join(", ")
            ))
        })
    }

    pub fn schemas(&self) -> impl Iterator<Item = &Arc<TableSchema>> {
        self.models.values()
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

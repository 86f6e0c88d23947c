//! Command handlers, one module per subcommand.
//!
//! Data commands share [`open_gateway`]: it resolves `--model` against the
//! registry and opens the JSON database configured in `database.path`.

use std::sync::Arc;

use tracing::{debug, instrument};

use stacks_adapters::{JsonFileDriver, ModelLoader, ModelRegistry, SystemClock};
use stacks_core::application::Gateway;
use stacks_core::domain::{Criteria, QueryOptions, Row, TableSchema, Value};

use crate::{
    cli::{FilterArgs, GlobalArgs},
    config::AppConfig,
    error::{CliError, CliResult},
};

pub mod all;
pub mod completions;
pub mod config;
pub mod create;
pub mod explain;
pub mod find;
pub mod init;
pub mod models;
pub mod query;
pub mod remove;
pub mod update;

/// Built-in models plus any definitions under `models.path`.
pub fn registry(config: &AppConfig) -> CliResult<ModelRegistry> {
    let mut registry = ModelRegistry::with_builtin()?;

    if let Some(dir) = &config.models.path {
        let schemas = ModelLoader::new(dir)
            .load_all()
            .map_err(|e| CliError::ConfigError {
                message: format!("cannot load models from '{}'", dir.display()),
                source: Some(Box::new(e)),
            })?;
        for schema in schemas {
            registry.register(schema);
        }
    }

    Ok(registry)
}

/// Schema of the `--model` model.
pub fn model_schema(registry: &ModelRegistry, global: &GlobalArgs) -> CliResult<Arc<TableSchema>> {
    registry
        .require(&global.model)
        .map_err(|e| CliError::InvalidInput {
            message: e.to_string(),
            source: None,
        })
}

/// Gateway for `--model` over the configured database.
#[instrument(skip_all, fields(model = %global.model))]
pub async fn open_gateway(global: &GlobalArgs, config: &AppConfig) -> CliResult<Gateway> {
    let registry = registry(config)?;
    let schema = model_schema(&registry, global)?;

    let driver = JsonFileDriver::open(&config.database.path, registry.schemas().cloned()).await?;
    debug!(path = %driver.path().display(), table = schema.table(), "Database opened");

    Ok(Gateway::new(Arc::new(driver), schema, Arc::new(SystemClock)))
}

/// `COLUMN=VALUE` pairs as a row of text values; the gateway coerces them.
pub fn assignments(pairs: Vec<(String, String)>) -> Row {
    pairs
        .into_iter()
        .map(|(column, value)| (column, Value::Text(value)))
        .collect()
}

impl FilterArgs {
    /// Equality filters and `--null` columns as one criteria.
    pub fn criteria(&self) -> Criteria {
        let mut criteria = Criteria::new();
        for (column, value) in &self.conditions {
            criteria.insert(column.as_str(), value.as_str());
        }
        for column in &self.null {
            criteria.insert(column.as_str(), Value::Null);
        }
        criteria
    }

    pub fn options(&self) -> QueryOptions {
        QueryOptions {
            sort: self.sort.clone(),
            limit: self.limit,
            offset: self.offset,
            page: self.page,
        }
    }
}

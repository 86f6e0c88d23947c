//! `buddy explain` - print the SQL a `query` would run.
//!
//! Planning needs only the schema, so the database file is never opened.

use std::sync::Arc;

use tracing::instrument;

use stacks_adapters::{MemoryDriver, SqlRenderer, SystemClock};
use stacks_core::application::Gateway;

use crate::{
    cli::{ExplainArgs, GlobalArgs},
    commands::{model_schema, registry},
    config::AppConfig,
    error::CliResult,
    output::OutputManager,
};

#[instrument(skip_all)]
pub fn execute(
    args: ExplainArgs,
    global: GlobalArgs,
    config: AppConfig,
    output: OutputManager,
) -> CliResult<()> {
    let registry = registry(&config)?;
    let schema = model_schema(&registry, &global)?;
    let gateway = Gateway::new(Arc::new(MemoryDriver::new()), schema, Arc::new(SystemClock));

    let plan = gateway.plan_filter(&args.filter.criteria(), &args.filter.options())?;
    let dialect = args.dialect.unwrap_or(config.database.dialect);
    let statement = SqlRenderer::new(dialect).select(&plan);

    if output.is_json() {
        return output.json(&serde_json::json!({
            "dialect": dialect,
            "sql": statement.sql,
            "params": statement.params,
        }));
    }

    output.line(&statement.sql)?;
    for (index, param) in statement.params.iter().enumerate() {
        output.line(&format!("  [{}] {}", index + 1, param))?;
    }
    Ok(())
}

//! `buddy models` - list registered models and their columns.

use serde::Serialize;

use stacks_core::domain::TableSchema;

use crate::{
    commands::registry,
    config::AppConfig,
    error::CliResult,
    output::OutputManager,
};

#[derive(Serialize)]
struct ModelView<'a> {
    model: &'a str,
    table: &'a str,
    primary_key: &'a str,
    timestamps: bool,
    columns: Vec<&'a str>,
    hidden: Vec<&'a str>,
}

impl<'a> From<&'a TableSchema> for ModelView<'a> {
    fn from(schema: &'a TableSchema) -> Self {
        Self {
            model: schema.model(),
            table: schema.table(),
            primary_key: schema.primary_key(),
            timestamps: schema.has_timestamps(),
            columns: schema.column_names().collect(),
            hidden: schema.hidden_columns().collect(),
        }
    }
}

pub fn execute(config: AppConfig, output: OutputManager) -> CliResult<()> {
    let registry = registry(&config)?;
    let views: Vec<ModelView<'_>> = registry
        .schemas()
        .map(|schema| ModelView::from(&**schema))
        .collect();

    if output.is_json() {
        return output.json(&views);
    }

    output.header("Registered models:")?;
    for view in &views {
        output.line(&format!(
            "  {} ({}): {}",
            view.model,
            view.table,
            view.columns.join(", ")
        ))?;
    }
    Ok(())
}

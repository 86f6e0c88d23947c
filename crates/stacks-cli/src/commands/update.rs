//! `buddy update` - patch a record by identity.

use tracing::instrument;

use stacks_core::domain::Value;

use crate::{
    cli::{GlobalArgs, UpdateArgs},
    commands::{assignments, open_gateway},
    config::AppConfig,
    error::{CliError, CliResult},
    output::OutputManager,
};

#[instrument(skip_all, fields(id = args.id))]
pub async fn execute(
    args: UpdateArgs,
    global: GlobalArgs,
    config: AppConfig,
    output: OutputManager,
) -> CliResult<()> {
    let gateway = open_gateway(&global, &config).await?;

    let mut patch = assignments(args.set);
    for column in args.unset {
        patch.insert(column, Value::Null);
    }

    let model = gateway
        .update(args.id, patch)
        .await?
        .ok_or_else(|| CliError::RecordNotFound {
            model: gateway.schema().model().to_string(),
            id: args.id,
        })?;

    output.success(&format!("Updated {} #{}", gateway.schema().model(), args.id))?;
    output.record(Some(model.record()))
}

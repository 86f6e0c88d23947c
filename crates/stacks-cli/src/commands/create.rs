//! `buddy create` - insert a new record.

use tracing::instrument;

use crate::{
    cli::{CreateArgs, GlobalArgs},
    commands::{assignments, open_gateway},
    config::AppConfig,
    error::CliResult,
    output::OutputManager,
};

#[instrument(skip_all)]
pub async fn execute(
    args: CreateArgs,
    global: GlobalArgs,
    config: AppConfig,
    output: OutputManager,
) -> CliResult<()> {
    let gateway = open_gateway(&global, &config).await?;

    let model = gateway.create(assignments(args.set)).await?;

    if let Some(id) = model.id() {
        output.success(&format!("Created {} #{}", gateway.schema().model(), id))?;
    }
    output.record(Some(model.record()))
}

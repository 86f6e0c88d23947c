//! `buddy remove` - delete a record by identity.

use tracing::instrument;

use crate::{
    cli::{GlobalArgs, RemoveArgs},
    commands::open_gateway,
    config::AppConfig,
    error::{CliError, CliResult},
    output::OutputManager,
};

/// Prints the removed record as it was before deletion.
#[instrument(skip_all, fields(id = args.id))]
pub async fn execute(
    args: RemoveArgs,
    global: GlobalArgs,
    config: AppConfig,
    output: OutputManager,
) -> CliResult<()> {
    let gateway = open_gateway(&global, &config).await?;

    let removed = gateway
        .remove(args.id)
        .await?
        .ok_or_else(|| CliError::RecordNotFound {
            model: gateway.schema().model().to_string(),
            id: args.id,
        })?;

    output.success(&format!("Removed {} #{}", gateway.schema().model(), args.id))?;
    output.record(Some(&removed))
}

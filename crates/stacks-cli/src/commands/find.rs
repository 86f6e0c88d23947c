//! `buddy find` - fetch one record by identity.

use tracing::instrument;

use crate::{
    cli::{FindArgs, GlobalArgs},
    commands::open_gateway,
    config::AppConfig,
    error::{CliError, CliResult},
    output::OutputManager,
};

#[instrument(skip_all, fields(id = args.id))]
pub async fn execute(
    args: FindArgs,
    global: GlobalArgs,
    config: AppConfig,
    output: OutputManager,
) -> CliResult<()> {
    let gateway = open_gateway(&global, &config).await?;

    let fields: Option<Vec<&str>> = args
        .fields
        .as_ref()
        .map(|fields| fields.iter().map(String::as_str).collect());

    let model = gateway
        .find(args.id, fields.as_deref())
        .await?
        .ok_or_else(|| CliError::RecordNotFound {
            model: gateway.schema().model().to_string(),
            id: args.id,
        })?;

    output.record(Some(model.record()))
}

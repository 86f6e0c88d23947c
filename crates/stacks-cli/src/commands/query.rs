//! `buddy query` - records matching column filters.

use tracing::instrument;

use crate::{
    cli::{GlobalArgs, QueryArgs},
    commands::open_gateway,
    config::AppConfig,
    error::CliResult,
    output::OutputManager,
};

#[instrument(skip_all)]
pub async fn execute(
    args: QueryArgs,
    global: GlobalArgs,
    config: AppConfig,
    output: OutputManager,
) -> CliResult<()> {
    let gateway = open_gateway(&global, &config).await?;
    let criteria = args.filter.criteria();

    if args.count {
        let count = gateway.count(&criteria).await?;
        if output.is_json() {
            return output.json(&serde_json::json!({ "count": count }));
        }
        output.line(&count.to_string())?;
        return Ok(());
    }

    let models = gateway.filter(&criteria, &args.filter.options()).await?;
    if models.is_empty() {
        output.info("No matching records")?;
    }

    let records: Vec<_> = models.iter().map(|model| model.record()).collect();
    output.records(&records)
}

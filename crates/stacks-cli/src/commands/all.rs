//! `buddy all` - one page of the whole table.

use serde::Serialize;
use tracing::instrument;

use stacks_core::domain::{Paging, QueryOptions, Record};

use crate::{
    cli::{AllArgs, GlobalArgs},
    commands::open_gateway,
    config::AppConfig,
    error::CliResult,
    output::OutputManager,
};

/// JSON shape of a page.
#[derive(Serialize)]
struct PageView<'a> {
    data: Vec<&'a Record>,
    paging: &'a Paging,
    next_cursor: Option<i64>,
}

#[instrument(skip_all, fields(page = args.page))]
pub async fn execute(
    args: AllArgs,
    global: GlobalArgs,
    config: AppConfig,
    output: OutputManager,
) -> CliResult<()> {
    let gateway = open_gateway(&global, &config).await?;

    let options = QueryOptions::new()
        .page(args.page)
        .limit(args.limit.unwrap_or(config.pagination.default_limit));
    let page = gateway.all(&options).await?;

    if output.is_json() {
        return output.json(&PageView {
            data: page.data.iter().collect(),
            paging: &page.paging,
            next_cursor: page.next_cursor,
        });
    }

    let records: Vec<_> = page.data.iter().collect();
    output.records(&records)?;
    output.paging(&page.paging, page.next_cursor)?;
    Ok(())
}

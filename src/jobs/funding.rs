use super::{node_row, JobContext, JobSummary};
use crate::api::TransferQuery;
use crate::error::Result;
use crate::models::QueryWindow;
use crate::sheets::{Cell, CellValue};
use chrono::{Datelike, NaiveDate};
use log::{debug, info};

/// Native coin received by each node on `day`.
///
/// Explorers cap how many transactions a listing returns, so for busy nodes
/// this is best effort.
pub async fn run(ctx: &JobContext<'_>, day: NaiveDate) -> Result<JobSummary> {
    let config = ctx.config;
    let window = QueryWindow::utc_day(day);
    let row = node_row(day);
    let column = config.layout.funding_column;
    let sheet = ctx.sheets.open(&config.sheet_title(day.year())).await?;
    let pause = ctx.pause();
    let mut summary = JobSummary::default();

    for (i, (name, node)) in config.nodes.iter().enumerate() {
        if i > 0 {
            pause.pause(config.pacing.query_pause()).await;
        }
        let chain = config.chain(&node.chain)?;
        if !chain.chain_type.lists_transfers() || chain.explorer_url().is_none() {
            debug!("Node {} has no transfer listing, skipping funding", name);
            summary.skipped += 1;
            continue;
        }

        let source = ctx.providers.transfers(chain)?;
        let query = TransferQuery {
            address: node.address.clone(),
            contract: None,
            window,
            bounds: config.policy.funding_window,
            increase: config.policy.sol_increase,
        };
        match source.incoming(&query).await {
            Ok(Some(total)) if total > 0.0 => {
                info!("{} funding: {}", node.worksheet_title, total);
                sheet
                    .update_value(&node.worksheet_title, Cell::new(row, column), CellValue::Number(total))
                    .await?;
                summary.written += 1;
            }
            Ok(_) => summary.skipped += 1,
            Err(e) => summary.record_failure(&format!("Funding of {}", node.worksheet_title), e)?,
        }
    }

    summary.log("Funding");
    Ok(summary)
}

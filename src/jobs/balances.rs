use super::{node_row, JobContext, JobSummary};
use crate::error::Result;
use crate::sheets::{Cell, CellValue};
use chrono::{DateTime, Datelike, Utc};
use log::{info, warn};

/// Writes each node's native balance into today's row of its worksheet.
pub async fn run(ctx: &JobContext<'_>, now: DateTime<Utc>) -> Result<JobSummary> {
    let config = ctx.config;
    let layout = &config.layout;
    let today = now.date_naive();
    let row = node_row(today);
    let time = now.format("%H:%M").to_string();
    let sheet = ctx.sheets.open(&config.sheet_title(now.year())).await?;
    let mut summary = JobSummary::default();

    for (name, node) in &config.nodes {
        let chain = config.chain(&node.chain)?;
        if chain.rpc().is_none() {
            warn!("Node {} is on {} which has no rpc_url, skipping", name, node.chain);
            summary.skipped += 1;
            continue;
        }
        let client = ctx.providers.balances(chain)?;
        let balance = match client.balance(&node.address).await {
            Ok(balance) => balance,
            Err(e) => {
                summary.record_failure(&format!("Balance of {}", node.worksheet_title), e)?;
                continue;
            }
        };

        info!("{} balance: {}", node.worksheet_title, balance);
        if layout.record_time {
            sheet
                .update_value(
                    &node.worksheet_title,
                    Cell::new(row, layout.time_column),
                    CellValue::Text(time.clone()),
                )
                .await?;
        }
        sheet
            .update_value(
                &node.worksheet_title,
                Cell::new(row, layout.balance_column),
                CellValue::Number(balance),
            )
            .await?;
        summary.written += 1;
    }

    summary.log("Balances");
    Ok(summary)
}

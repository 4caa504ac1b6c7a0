use super::{daily_row, JobContext, JobSummary};
use crate::api::TransferQuery;
use crate::error::Result;
use crate::models::QueryWindow;
use crate::sheets::{Cell, CellValue};
use chrono::{Datelike, NaiveDate};
use log::{debug, info};

/// Sums the token payments each wallet received on `day` and writes the
/// positive totals into the payment worksheet.
pub async fn run(ctx: &JobContext<'_>, day: NaiveDate) -> Result<JobSummary> {
    let config = ctx.config;
    let window = QueryWindow::utc_day(day);
    let row = daily_row(day);
    let worksheet = &config.worksheets.payment;
    let sheet = ctx.sheets.open(&config.sheet_title(day.year())).await?;
    let pause = ctx.pause();
    let mut summary = JobSummary::default();

    info!("Collecting payments for {} ({}..{})", day, window.start, window.end);
    for (i, (name, wallet)) in config.wallets.iter().enumerate() {
        if i > 0 {
            pause.pause(config.pacing.query_pause()).await;
        }
        let chain = config.chain(&wallet.chain)?;
        if chain.explorer_url().is_none() {
            debug!("Wallet {} is on {} which has no explorer url, skipping", name, wallet.chain);
            summary.skipped += 1;
            continue;
        }

        let source = ctx.providers.transfers(chain)?;
        let query = TransferQuery {
            address: wallet.address.clone(),
            contract: chain.token_contract.clone(),
            window,
            bounds: config.policy.payment_window,
            increase: config.policy.spl_increase,
        };
        match source.incoming(&query).await {
            Ok(Some(total)) if total > 0.0 => {
                info!("{} payment: {}", name, total);
                sheet
                    .update_value(worksheet, Cell::new(row, wallet.column), CellValue::Number(total))
                    .await?;
                summary.written += 1;
            }
            Ok(Some(_)) => {
                debug!("{} received nothing on {}", name, day);
                summary.skipped += 1;
            }
            Ok(None) => {
                debug!("{} has no transfer listing", wallet.chain);
                summary.skipped += 1;
            }
            Err(e) => summary.record_failure(&format!("Payments to {}", name), e)?,
        }
    }

    summary.log("Payments");
    Ok(summary)
}

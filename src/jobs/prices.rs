use super::{daily_row, JobContext, JobSummary};
use crate::error::Result;
use crate::sheets::{Cell, CellValue};
use chrono::{Datelike, NaiveDate};
use log::info;

/// Closing price of every configured coin on `day`.
pub async fn run(ctx: &JobContext<'_>, day: NaiveDate) -> Result<JobSummary> {
    let config = ctx.config;
    let row = daily_row(day);
    let worksheet = &config.worksheets.prices;
    let sheet = ctx.sheets.open(&config.sheet_title(day.year())).await?;
    let mut summary = JobSummary::default();

    for coin in &config.coins {
        let source = ctx
            .providers
            .prices(coin, &config.prices, config.pacing.coingecko_pause())?;
        match source.closing_price(&coin.ticker, day).await {
            Ok(price) => {
                info!("{} close on {}: {}", coin.ticker, day, price.close);
                sheet
                    .update_value(worksheet, Cell::new(row, coin.column), CellValue::Number(price.close))
                    .await?;
                summary.written += 1;
            }
            Err(e) => summary.record_failure(&format!("Price of {}", coin.ticker), e)?,
        }
    }

    summary.log("Prices");
    Ok(summary)
}

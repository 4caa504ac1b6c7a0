use super::{balances, funding, payments, previous_day, JobContext, JobSummary};
use crate::error::Result;
use chrono::{DateTime, Duration as ChronoDuration, NaiveDate, Utc};
use log::info;

/// Day whose payments are collected after the rollover pause: the day that
/// has ended by the time the pause is over.
pub fn settled_day(started: DateTime<Utc>, rollover: std::time::Duration) -> NaiveDate {
    let rollover = ChronoDuration::from_std(rollover).unwrap_or_else(|_| ChronoDuration::zero());
    previous_day(started + rollover)
}

/// Meant to start a minute before UTC midnight: balances for the closing
/// day, then the day's payments and funding once it has rolled over.
pub async fn run(ctx: &JobContext<'_>, started: DateTime<Utc>) -> Result<JobSummary> {
    let balances = balances::run(ctx, started).await?;

    let rollover = ctx.config.pacing.rollover_pause();
    info!("Waiting {}s for the day to roll over", rollover.as_secs());
    ctx.pause().pause(rollover).await;

    let day = settled_day(started, rollover);
    let payments = payments::run(ctx, day).await?;
    let funding = funding::run(ctx, day).await?;

    let summary = balances.merge(payments).merge(funding);
    summary.log("Activity");
    Ok(summary)
}

//! The batch jobs the binary runs. Each job reads configuration, queries the
//! providers one at a time and writes into fixed spreadsheet cells.
//!
//! Node worksheets have a header row followed by Dec 31 of the previous
//! year, so a day's row is `ordinal + 2`. The payment and price worksheets
//! start at Jan 1, so theirs is `ordinal + 1`.

use crate::api::Providers;
use crate::config::Config;
use crate::error::Error;
use crate::fetch::Pause;
use crate::sheets::SheetClient;
use chrono::{DateTime, Datelike, Duration as ChronoDuration, NaiveDate, Utc};
use log::{error, info};
use std::fmt;
use std::sync::Arc;

pub mod activity;
pub mod balances;
pub mod funding;
pub mod payments;
pub mod prices;

/// Everything a job needs, built once by the binary.
pub struct JobContext<'a> {
    pub config: &'a Config,
    pub providers: &'a Providers,
    pub sheets: &'a dyn SheetClient,
}

impl<'a> JobContext<'a> {
    pub fn new(config: &'a Config, providers: &'a Providers, sheets: &'a dyn SheetClient) -> Self {
        Self {
            config,
            providers,
            sheets,
        }
    }

    pub fn pause(&self) -> Arc<dyn Pause> {
        self.providers.pause()
    }
}

pub fn node_row(day: NaiveDate) -> u32 {
    day.ordinal() + 2
}

pub fn daily_row(day: NaiveDate) -> u32 {
    day.ordinal() + 1
}

/// The UTC day before `now`, the day daily jobs report on by default.
pub fn previous_day(now: DateTime<Utc>) -> NaiveDate {
    (now - ChronoDuration::days(1)).date_naive()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JobSummary {
    pub written: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl JobSummary {
    pub fn merge(self, other: JobSummary) -> JobSummary {
        JobSummary {
            written: self.written + other.written,
            skipped: self.skipped + other.skipped,
            failed: self.failed + other.failed,
        }
    }

    /// Counts a per-item failure, or hands it back when the whole job has
    /// to stop.
    pub(crate) fn record_failure(&mut self, item: &str, err: Error) -> Result<(), Error> {
        if err.is_fatal() {
            return Err(err);
        }
        error!("{}: {}", item, err);
        self.failed += 1;
        Ok(())
    }

    pub(crate) fn log(&self, job: &str) {
        info!(
            "{} done: {} written, {} skipped, {} failed",
            job, self.written, self.skipped, self.failed
        );
    }
}

impl fmt::Display for JobSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} written, {} skipped, {} failed",
            self.written, self.skipped, self.failed
        )
    }
}

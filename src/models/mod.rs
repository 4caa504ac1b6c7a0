use serde::{Deserialize, Serialize};
use chrono::{NaiveDate, NaiveTime};
use crate::error::{Error, Result};

pub mod market;

/// Which ends of a [`QueryWindow`] count as inside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowBounds {
    Inclusive,
    Exclusive,
}

/// Closed range of Unix seconds a query is interested in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryWindow {
    pub start: i64,
    pub end: i64,
}

impl QueryWindow {
    pub fn new(start: i64, end: i64) -> Result<Self> {
        if start > end {
            return Err(Error::ValidationError(format!(
                "window start {} is after window end {}",
                start, end
            )));
        }
        Ok(Self { start, end })
    }

    /// 00:00:00 to 23:59:59 UTC of `day`.
    pub fn utc_day(day: NaiveDate) -> Self {
        let start = day.and_time(NaiveTime::default()).and_utc().timestamp();
        Self { start, end: start + 86_399 }
    }

    pub fn contains(&self, timestamp: i64, bounds: WindowBounds) -> bool {
        match bounds {
            WindowBounds::Inclusive => timestamp >= self.start && timestamp <= self.end,
            WindowBounds::Exclusive => timestamp > self.start && timestamp < self.end,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Increase,
    Decrease,
}

/// One observed token movement, normalised from whatever shape the provider
/// returned it in.
#[derive(Debug, Clone, PartialEq)]
pub struct Transfer {
    /// Sender on EVM chains, account owner on Solana.
    pub owner: String,
    pub recipient: Option<String>,
    pub token: Option<String>,
    /// Signed base units.
    pub amount: i128,
    pub decimals: u32,
    pub timestamp: Option<i64>,
    pub direction: Option<Direction>,
}

impl Transfer {
    pub fn ui_amount(&self) -> f64 {
        self.amount as f64 / 10f64.powi(self.decimals as i32)
    }
}

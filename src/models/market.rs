use serde::{Deserialize, Serialize};
use chrono::NaiveDate;

/// A coin's daily close in USD as reported by one price provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClosingPrice {
    pub ticker: String,
    pub date: NaiveDate,
    pub close: f64,
}

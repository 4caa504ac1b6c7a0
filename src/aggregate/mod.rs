//! Turning provider transfer lists into a single incoming total.
//!
//! Each provider family answers with its own JSON shape; the parsers in
//! [`evm`] and [`solana`] normalise records into [`Transfer`]s and the
//! functions here filter and sum them.

use crate::error::Result;
use crate::models::{Direction, QueryWindow, Transfer, WindowBounds};
use serde::{Deserialize, Serialize};

pub mod evm;
pub mod solana;

pub use solana::SolanaPage;

/// What counts as an incoming Solana balance change. Provider data has been
/// seen tagging increases as `"dec"` while the amount is positive, so both
/// readings are kept selectable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncreasePolicy {
    /// `changeType == "inc"`.
    ChangeType,
    /// `changeAmount > 0`.
    PositiveAmount,
}

impl IncreasePolicy {
    pub fn is_increase(&self, transfer: &Transfer) -> bool {
        match self {
            IncreasePolicy::ChangeType => transfer.direction == Some(Direction::Increase),
            IncreasePolicy::PositiveAmount => transfer.amount > 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// Etherscan-style `{"result": [...]}`.
    EvmList { bounds: WindowBounds },
    /// Solscan-style `{"data": [...]}`; the provider already applied the
    /// time window.
    SolanaList { increase: IncreasePolicy },
}

/// Total amount received by `address` in one raw provider response.
///
/// For Solana lists `contract` selects token mode (records must also carry
/// that token address); `None` sums native balance changes.
pub fn sum_incoming(
    shape: Shape,
    address: &str,
    contract: Option<&str>,
    window: &QueryWindow,
    raw: &str,
) -> Result<f64> {
    match shape {
        Shape::EvmList { bounds } => {
            let transfers = evm::parse_transfers(raw)?;
            Ok(sum_evm_incoming(&transfers, address, contract, window, bounds))
        }
        Shape::SolanaList { increase } => {
            let page = SolanaPage::parse(raw)?;
            Ok(page.sum_incoming(address, contract, increase))
        }
    }
}

/// With a `contract`, records naming a different token contract are
/// dropped; records without one (native `txlist` rows) are kept.
pub fn sum_evm_incoming(
    transfers: &[Transfer],
    address: &str,
    contract: Option<&str>,
    window: &QueryWindow,
    bounds: WindowBounds,
) -> f64 {
    transfers
        .iter()
        .filter(|t| {
            t.recipient
                .as_deref()
                .map_or(false, |to| to.eq_ignore_ascii_case(address))
        })
        .filter(|t| match (contract, t.token.as_deref()) {
            (Some(contract), Some(token)) => token.eq_ignore_ascii_case(contract),
            _ => true,
        })
        .filter(|t| t.timestamp.map_or(false, |ts| window.contains(ts, bounds)))
        .map(Transfer::ui_amount)
        .sum()
}

pub fn sum_solana_incoming(
    transfers: &[Transfer],
    address: &str,
    contract: Option<&str>,
    increase: IncreasePolicy,
) -> f64 {
    transfers
        .iter()
        .filter(|t| t.owner.eq_ignore_ascii_case(address))
        .filter(|t| match contract {
            Some(contract) => t
                .token
                .as_deref()
                .map_or(false, |token| token.eq_ignore_ascii_case(contract)),
            None => true,
        })
        .filter(|t| increase.is_increase(t))
        .map(Transfer::ui_amount)
        .sum()
}

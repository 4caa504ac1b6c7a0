use super::{sum_solana_incoming, IncreasePolicy};
use crate::error::{Error, Result};
use crate::models::{Direction, Transfer};
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Deserialize)]
struct BalanceChange {
    owner: String,
    #[serde(rename = "tokenAddress", default)]
    token_address: Option<String>,
    #[serde(rename = "changeAmount")]
    change_amount: Value,
    decimals: Value,
    #[serde(rename = "changeType", default)]
    change_type: Option<String>,
}

// Solscan has returned both JSON numbers and numeric strings here.
fn integer(field: &str, value: &Value) -> Result<i128> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .map(i128::from)
            .or_else(|| n.as_u64().map(i128::from))
            .ok_or_else(|| Error::ApiInvalidData(format!("{} is not an integer: {}", field, n))),
        Value::String(s) => s
            .parse::<i128>()
            .map_err(|e| Error::ParseError(format!("{} {:?}: {}", field, s, e))),
        other => Err(Error::ApiInvalidFormat(format!("{} has unexpected type: {}", field, other))),
    }
}

impl BalanceChange {
    fn into_transfer(self) -> Result<Transfer> {
        let amount = integer("changeAmount", &self.change_amount)?;
        let decimals = u32::try_from(integer("decimals", &self.decimals)?)
            .map_err(|_| Error::ApiInvalidData(format!("decimals out of range: {}", self.decimals)))?;
        let direction = match self.change_type.as_deref() {
            Some("inc") => Some(Direction::Increase),
            Some("dec") => Some(Direction::Decrease),
            _ => None,
        };
        Ok(Transfer {
            owner: self.owner,
            recipient: None,
            token: self.token_address,
            amount,
            decimals,
            timestamp: None,
            direction,
        })
    }
}

/// One page of a paginated balance-change listing.
#[derive(Debug, Clone, PartialEq)]
pub struct SolanaPage {
    pub transfers: Vec<Transfer>,
}

impl SolanaPage {
    /// A missing `data` key is an error; `null` or `[]` is the empty page
    /// that ends pagination.
    pub fn parse(raw: &str) -> Result<Self> {
        let body: Value = serde_json::from_str(raw)?;
        let transfers = match body.get("data") {
            None => {
                return Err(Error::ApiInvalidFormat(
                    "transfer listing without `data`".to_string(),
                ))
            }
            Some(Value::Null) => Vec::new(),
            Some(list) => {
                let changes: Vec<BalanceChange> = serde_json::from_value(list.clone())?;
                changes
                    .into_iter()
                    .map(BalanceChange::into_transfer)
                    .collect::<Result<Vec<_>>>()?
            }
        };
        Ok(Self { transfers })
    }

    pub fn is_empty(&self) -> bool {
        self.transfers.is_empty()
    }

    pub fn sum_incoming(&self, address: &str, contract: Option<&str>, increase: IncreasePolicy) -> f64 {
        sum_solana_incoming(&self.transfers, address, contract, increase)
    }
}

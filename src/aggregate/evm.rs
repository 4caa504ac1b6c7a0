use crate::error::{Error, Result};
use crate::models::Transfer;
use serde::Deserialize;
use serde_json::Value;

const DEFAULT_DECIMALS: u32 = 18;

#[derive(Debug, Deserialize)]
struct EvmTx {
    #[serde(default)]
    from: String,
    to: String,
    value: String,
    #[serde(rename = "timeStamp")]
    time_stamp: String,
    #[serde(rename = "contractAddress", default)]
    contract_address: Option<String>,
    #[serde(rename = "tokenDecimal", default)]
    token_decimal: Option<String>,
}

impl EvmTx {
    fn into_transfer(self) -> Result<Transfer> {
        let amount = self
            .value
            .parse::<i128>()
            .map_err(|e| Error::ParseError(format!("tx value {:?}: {}", self.value, e)))?;
        let timestamp = self
            .time_stamp
            .parse::<i64>()
            .map_err(|e| Error::ParseError(format!("tx timeStamp {:?}: {}", self.time_stamp, e)))?;
        let decimals = match self.token_decimal.as_deref() {
            Some(d) if !d.is_empty() => d.parse::<u32>()?,
            _ => DEFAULT_DECIMALS,
        };
        Ok(Transfer {
            owner: self.from,
            recipient: Some(self.to),
            token: self.contract_address.filter(|c| !c.is_empty()),
            amount,
            decimals,
            timestamp: Some(timestamp),
            direction: None,
        })
    }
}

/// Parses an explorer `{"result": [...]}` list. An absent, null or empty
/// result means no transactions; a non-empty string result is the
/// provider's error message.
pub fn parse_transfers(raw: &str) -> Result<Vec<Transfer>> {
    let body: Value = serde_json::from_str(raw)?;
    match body.get("result") {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::String(s)) if s.is_empty() => Ok(Vec::new()),
        Some(Value::String(s)) => {
            let message = body.get("message").and_then(Value::as_str).unwrap_or("");
            Err(Error::ApiError(format!("explorer returned {:?} ({})", s, message)))
        }
        Some(list @ Value::Array(_)) => {
            let txs: Vec<EvmTx> = serde_json::from_value(list.clone())?;
            txs.into_iter().map(EvmTx::into_transfer).collect()
        }
        Some(other) => Err(Error::ApiInvalidFormat(format!(
            "unexpected explorer result: {}",
            other
        ))),
    }
}

/// Block number from a `getblocknobytime` response.
pub fn parse_block_number(raw: &str) -> Result<u64> {
    let body: Value = serde_json::from_str(raw)?;
    match body.get("result") {
        Some(Value::String(s)) => s.parse::<u64>().map_err(|_| {
            Error::ApiError(format!("block lookup returned {:?}", s))
        }),
        Some(Value::Number(n)) => n
            .as_u64()
            .ok_or_else(|| Error::ApiInvalidData(format!("block number {}", n))),
        _ => Err(Error::ApiInvalidFormat(format!(
            "block lookup response without result: {}",
            raw
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_decimals_override_default() {
        let raw = r#"{"result":[{"from":"0x1","to":"0x2","value":"2500000","timeStamp":"10",
            "contractAddress":"0xa0b8","tokenDecimal":"6"}]}"#;
        let transfers = parse_transfers(raw).unwrap();
        assert_eq!(transfers.len(), 1);
        assert_eq!(transfers[0].decimals, 6);
        assert_eq!(transfers[0].ui_amount(), 2.5);
        assert_eq!(transfers[0].token.as_deref(), Some("0xa0b8"));
    }

    #[test]
    fn test_missing_field_is_error() {
        let raw = r#"{"result":[{"to":"0x2","timeStamp":"10"}]}"#;
        assert!(parse_transfers(raw).is_err());
    }

    #[test]
    fn test_block_number() {
        assert_eq!(parse_block_number(r#"{"status":"1","result":"17034870"}"#).unwrap(), 17_034_870);
        assert!(parse_block_number(r#"{"status":"0","result":"Error! No closest block found"}"#).is_err());
    }
}

use serde::{Deserialize, Serialize};
use serde_json::Value;
use crate::error::{Error, Result};

#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcRequest<'a> {
    pub jsonrpc: &'a str,
    pub method: &'a str,
    pub params: Value,
    pub id: u64,
}

impl<'a> JsonRpcRequest<'a> {
    pub fn new(method: &'a str, params: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            method,
            params,
            id: 1,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcResponse<T> {
    pub result: Option<T>,
    pub error: Option<JsonRpcError>,
}

impl<T> JsonRpcResponse<T> {
    /// A node can answer 200 with an error object instead of a result.
    pub fn into_result(self) -> Result<T> {
        if let Some(err) = self.error {
            return Err(Error::ApiError(format!("RPC error {}: {}", err.code, err.message)));
        }
        self.result
            .ok_or_else(|| Error::ApiInvalidFormat("RPC response without result".to_string()))
    }
}

/// Solana `getBalance` wraps the lamports in a context object.
#[derive(Debug, Clone, Deserialize)]
pub struct SolanaBalanceValue {
    pub value: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CosmosCoin {
    pub denom: String,
    pub amount: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CosmosBalanceResponse {
    pub balance: CosmosCoin,
}

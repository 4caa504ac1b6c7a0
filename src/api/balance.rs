use super::types::{CosmosBalanceResponse, JsonRpcRequest, JsonRpcResponse, SolanaBalanceValue};
use crate::config::ChainType;
use crate::error::{Error, Result};
use crate::fetch::{FetchRequest, Fetcher};
use log::debug;
use serde_json::json;

const WEI_PER_ETH: f64 = 1e18;
const LAMPORTS_PER_SOL: f64 = 1e9;
const ULUNA_PER_LUNA: f64 = 1e6;

/// Native coin balance of an address, read from the chain's node.
#[derive(Debug, Clone)]
pub struct BalanceClient {
    fetcher: Fetcher,
    chain_type: ChainType,
    url: String,
}

impl BalanceClient {
    pub fn new(fetcher: Fetcher, chain_type: ChainType, url: &str) -> Self {
        Self {
            fetcher,
            chain_type,
            url: url.trim_end_matches('/').to_string(),
        }
    }

    pub async fn balance(&self, address: &str) -> Result<f64> {
        let balance = match self.chain_type {
            ChainType::Solana => self.solana_balance(address).await?,
            ChainType::Terra => self.cosmos_balance(address).await?,
            _ => self.evm_balance(address).await?,
        };
        debug!("{:?} balance of {}: {}", self.chain_type, address, balance);
        Ok(balance)
    }

    async fn rpc<T: serde::de::DeserializeOwned>(&self, request: JsonRpcRequest<'_>) -> Result<T> {
        let payload = serde_json::to_string(&request)?;
        let http = FetchRequest::post(self.url.clone(), payload)
            .header("content-type", "application/json")
            .header("accept-charset", "UTF-8");
        let response = self.fetcher.fetch(&http).await?;
        response.json::<JsonRpcResponse<T>>()?.into_result()
    }

    async fn evm_balance(&self, address: &str) -> Result<f64> {
        let hex: String = self
            .rpc(JsonRpcRequest::new("eth_getBalance", json!([address, "latest"])))
            .await?;
        let wei = u128::from_str_radix(hex.trim_start_matches("0x"), 16)
            .map_err(|e| Error::ParseError(format!("balance {:?}: {}", hex, e)))?;
        Ok(wei as f64 / WEI_PER_ETH)
    }

    async fn solana_balance(&self, address: &str) -> Result<f64> {
        let value: SolanaBalanceValue = self
            .rpc(JsonRpcRequest::new("getBalance", json!([address])))
            .await?;
        Ok(value.value as f64 / LAMPORTS_PER_SOL)
    }

    async fn cosmos_balance(&self, address: &str) -> Result<f64> {
        let url = format!(
            "{}/cosmos/bank/v1beta1/balances/{}/by_denom?denom=uluna",
            self.url, address
        );
        let request = FetchRequest::get(url).header("accept", "application/json");
        let response: CosmosBalanceResponse = self.fetcher.fetch(&request).await?.json()?;
        let amount = response
            .balance
            .amount
            .parse::<u128>()
            .map_err(|e| Error::ParseError(format!("{} amount {:?}: {}", response.balance.denom, response.balance.amount, e)))?;
        Ok(amount as f64 / ULUNA_PER_LUNA)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::{MockTransport, RawResponse, RetryPolicy};
    use crate::tests::common::RecordingPause;
    use std::sync::Arc;

    fn client(chain_type: ChainType, transport: MockTransport) -> BalanceClient {
        let fetcher = Fetcher::new(
            Arc::new(transport),
            RetryPolicy::default(),
            Arc::new(RecordingPause::default()),
        );
        BalanceClient::new(fetcher, chain_type, "https://node.example.com/")
    }

    fn ok(body: &str) -> RawResponse {
        RawResponse {
            status: 200,
            body: body.to_string(),
        }
    }

    #[tokio::test]
    async fn test_evm_balance_from_hex_wei() {
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .withf(|request| {
                let payload = request.payload.as_deref().unwrap_or("");
                payload.contains("eth_getBalance") && payload.contains("latest")
            })
            .returning(|_| Ok(ok(r#"{"jsonrpc":"2.0","id":1,"result":"0x1bc16d674ec80000"}"#)));
        let balance = client(ChainType::Etherscan, transport)
            .balance("0x2222222222222222222222222222222222222222")
            .await
            .unwrap();
        assert_eq!(balance, 2.0);
    }

    #[tokio::test]
    async fn test_solana_balance_from_lamports() {
        let mut transport = MockTransport::new();
        transport.expect_send().returning(|_| {
            Ok(ok(r#"{"jsonrpc":"2.0","id":1,"result":{"context":{"slot":1},"value":1500000000}}"#))
        });
        let balance = client(ChainType::Solana, transport)
            .balance("AY2uKQZ21PGHoarsdnJ65xwJv1ojnM1Vn8UGMRpfZ2nX")
            .await
            .unwrap();
        assert_eq!(balance, 1.5);
    }

    #[tokio::test]
    async fn test_cosmos_balance_from_uluna() {
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .withf(|request| {
                request.url
                    == "https://node.example.com/cosmos/bank/v1beta1/balances/terra1abc/by_denom?denom=uluna"
            })
            .returning(|_| Ok(ok(r#"{"balance":{"denom":"uluna","amount":"2500000"}}"#)));
        let balance = client(ChainType::Terra, transport).balance("terra1abc").await.unwrap();
        assert_eq!(balance, 2.5);
    }

    #[tokio::test]
    async fn test_rpc_error_object_is_surfaced() {
        let mut transport = MockTransport::new();
        transport.expect_send().returning(|_| {
            Ok(ok(r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32602,"message":"invalid address"}}"#))
        });
        let err = client(ChainType::Klaytn, transport).balance("0x").await.unwrap_err();
        assert!(err.to_string().contains("invalid address"));
    }
}

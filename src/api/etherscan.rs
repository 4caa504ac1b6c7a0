use super::{sum_logged, IncomingTransfers, TransferQuery};
use crate::aggregate::{evm, Shape};
use crate::error::{Error, Result};
use crate::fetch::{FetchRequest, Fetcher};
use async_trait::async_trait;
use log::{debug, error};
use url::Url;

/// Block range used when the explorer cannot map timestamps to blocks.
pub const UNBOUNDED_BLOCKS: (u64, u64) = (0, 999_999_999);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Closest {
    After,
    Before,
}

impl Closest {
    fn as_str(&self) -> &'static str {
        match self {
            Closest::After => "after",
            Closest::Before => "before",
        }
    }
}

/// Thin client for an Etherscan-compatible `/api` endpoint.
#[derive(Debug, Clone)]
pub struct EtherscanClient {
    fetcher: Fetcher,
    base_url: String,
    apikey: String,
}

impl EtherscanClient {
    pub fn new(fetcher: Fetcher, base_url: &str, apikey: &str) -> Self {
        Self {
            fetcher,
            base_url: base_url.to_string(),
            apikey: apikey.to_string(),
        }
    }

    fn url(&self, params: &[(&str, String)]) -> Result<String> {
        let mut pairs: Vec<(&str, String)> = params.to_vec();
        if !self.apikey.is_empty() {
            pairs.push(("apikey", self.apikey.clone()));
        }
        Ok(Url::parse_with_params(&self.base_url, &pairs)?.to_string())
    }

    pub async fn resolve_block(&self, unixtime: i64, closest: Closest) -> Result<u64> {
        let url = self.url(&[
            ("module", "block".to_string()),
            ("action", "getblocknobytime".to_string()),
            ("timestamp", unixtime.to_string()),
            ("closest", closest.as_str().to_string()),
        ])?;
        let response = self.fetcher.fetch(&FetchRequest::get(url)).await?;
        evm::parse_block_number(&response.body).map_err(|e| {
            error!("Block lookup for {} failed: {}; response: {}", unixtime, e, response.body);
            e
        })
    }

    /// Raw `tokentx` listing when `contract` is set, `txlist` otherwise.
    pub async fn list_transactions(
        &self,
        address: &str,
        contract: Option<&str>,
        start_block: u64,
        end_block: u64,
    ) -> Result<String> {
        let mut params = vec![("module", "account".to_string())];
        match contract {
            Some(contract) => {
                params.push(("action", "tokentx".to_string()));
                params.push(("contractaddress", contract.to_string()));
            }
            None => params.push(("action", "txlist".to_string())),
        }
        params.push(("address", address.to_string()));
        params.push(("startblock", start_block.to_string()));
        params.push(("endblock", end_block.to_string()));

        let url = self.url(&params)?;
        let response = self.fetcher.fetch(&FetchRequest::get(url)).await?;
        Ok(response.body)
    }
}

/// Explorer that narrows the listing to the window's blocks first.
#[derive(Debug, Clone)]
pub struct EvmExplorer {
    client: EtherscanClient,
}

impl EvmExplorer {
    pub fn new(fetcher: Fetcher, base_url: &str, apikey: &str) -> Self {
        Self {
            client: EtherscanClient::new(fetcher, base_url, apikey),
        }
    }
}

#[async_trait]
impl IncomingTransfers for EvmExplorer {
    async fn incoming(&self, query: &TransferQuery) -> Result<Option<f64>> {
        let start_block = self.client.resolve_block(query.window.start, Closest::After).await?;
        let end_block = self.client.resolve_block(query.window.end, Closest::Before).await?;
        if start_block > end_block {
            return Err(Error::ApiInvalidData(format!(
                "block range {}..{} is inverted",
                start_block, end_block
            )));
        }
        debug!("{} window maps to blocks {}..{}", query.address, start_block, end_block);

        let raw = self
            .client
            .list_transactions(&query.address, query.contract.as_deref(), start_block, end_block)
            .await?;
        sum_logged(Shape::EvmList { bounds: query.bounds }, query, &raw).map(Some)
    }
}

/// Explorer without a block lookup; lists everything and relies on the
/// timestamp filter.
#[derive(Debug, Clone)]
pub struct EvmExplorerUnbounded {
    client: EtherscanClient,
}

impl EvmExplorerUnbounded {
    pub fn new(fetcher: Fetcher, base_url: &str, apikey: &str) -> Self {
        Self {
            client: EtherscanClient::new(fetcher, base_url, apikey),
        }
    }
}

#[async_trait]
impl IncomingTransfers for EvmExplorerUnbounded {
    async fn incoming(&self, query: &TransferQuery) -> Result<Option<f64>> {
        let (start_block, end_block) = UNBOUNDED_BLOCKS;
        let raw = self
            .client
            .list_transactions(&query.address, query.contract.as_deref(), start_block, end_block)
            .await?;
        sum_logged(Shape::EvmList { bounds: query.bounds }, query, &raw).map(Some)
    }
}

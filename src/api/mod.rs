use crate::aggregate::{sum_incoming, IncreasePolicy, Shape};
use crate::config::{ChainConfig, ChainType, CoinConfig, Config, PriceApiConfig, PriceProvider};
use crate::error::{Error, Result};
use crate::fetch::{Fetcher, HttpTransport, Pause, RetryPolicy};
use crate::models::market::ClosingPrice;
use crate::models::{QueryWindow, WindowBounds};
use async_trait::async_trait;
use chrono::NaiveDate;
use log::error;
use std::sync::Arc;
use std::time::Duration;

pub mod balance;
pub mod coingecko;
pub mod etherscan;
pub mod solscan;
pub mod tiingo;
pub mod types;

pub use balance::BalanceClient;
pub use coingecko::CoinGeckoClient;
pub use etherscan::{EvmExplorer, EvmExplorerUnbounded};
pub use solscan::SolanaPaginated;
pub use tiingo::TiingoClient;

/// Who received what, when. `contract` selects token transfers; `None`
/// asks for the chain's native coin.
#[derive(Debug, Clone, PartialEq)]
pub struct TransferQuery {
    pub address: String,
    pub contract: Option<String>,
    pub window: QueryWindow,
    /// Applied by providers that filter the window themselves.
    pub bounds: WindowBounds,
    /// Applied by providers that report signed balance changes.
    pub increase: IncreasePolicy,
}

#[async_trait]
pub trait IncomingTransfers: Send + Sync {
    /// Total received in the window, or `None` when the provider has no way
    /// of listing transfers.
    async fn incoming(&self, query: &TransferQuery) -> Result<Option<f64>>;
}

#[async_trait]
pub trait PriceSource: Send + Sync {
    /// USD close of `ticker` on `date`.
    async fn closing_price(&self, ticker: &str, date: NaiveDate) -> Result<ClosingPrice>;
}

/// Chains whose provider only answers balance queries.
#[derive(Debug, Clone, Copy)]
pub struct BalanceOnly {
    pub chain_type: ChainType,
}

#[async_trait]
impl IncomingTransfers for BalanceOnly {
    async fn incoming(&self, _query: &TransferQuery) -> Result<Option<f64>> {
        Ok(None)
    }
}

/// Sums one raw response, logging the payload when it cannot be read.
pub(crate) fn sum_logged(shape: Shape, query: &TransferQuery, raw: &str) -> Result<f64> {
    sum_incoming(
        shape,
        &query.address,
        query.contract.as_deref(),
        &query.window,
        raw,
    )
    .map_err(|e| {
        error!("Could not sum transfers for {}: {}; here's the tx blurb: {}", query.address, e, raw);
        e
    })
}

/// Builds provider clients that share one retry policy and pause source.
#[derive(Clone)]
pub struct Providers {
    policy: RetryPolicy,
    pause: Arc<dyn Pause>,
    page_pause: Duration,
    max_pages: Option<u32>,
}

impl Providers {
    pub fn new(policy: RetryPolicy, pause: Arc<dyn Pause>, page_pause: Duration, max_pages: Option<u32>) -> Self {
        Self {
            policy,
            pause,
            page_pause,
            max_pages,
        }
    }

    pub fn from_config(config: &Config, pause: Arc<dyn Pause>) -> Self {
        Self::new(
            config.retry.policy(),
            pause,
            config.pacing.page_pause(),
            config.pacing.max_solana_pages,
        )
    }

    pub fn pause(&self) -> Arc<dyn Pause> {
        self.pause.clone()
    }

    pub fn fetcher(&self, transport: HttpTransport) -> Fetcher {
        Fetcher::new(Arc::new(transport), self.policy, self.pause.clone())
    }

    pub fn transfers(&self, chain: &ChainConfig) -> Result<Box<dyn IncomingTransfers>> {
        if !chain.chain_type.lists_transfers() {
            return Ok(Box::new(BalanceOnly {
                chain_type: chain.chain_type,
            }));
        }
        let url = chain
            .explorer_url()
            .ok_or_else(|| Error::ConfigError(format!("{:?} chain has no explorer url", chain.chain_type)))?;

        let source: Box<dyn IncomingTransfers> = match chain.chain_type {
            ChainType::Etherscan => Box::new(EvmExplorer::new(
                self.fetcher(HttpTransport::new()?),
                url,
                &chain.apikey,
            )),
            ChainType::EtherscanCf => Box::new(EvmExplorerUnbounded::new(
                self.fetcher(HttpTransport::browser_session(url)?),
                url,
                &chain.apikey,
            )),
            ChainType::Solana => Box::new(SolanaPaginated::new(
                self.fetcher(solscan::session(&chain.apikey)?),
                url,
                self.page_pause,
                self.max_pages,
            )),
            other => {
                return Err(Error::InternalError(format!(
                    "{:?} has no transfer listing",
                    other
                )))
            }
        };
        Ok(source)
    }

    pub fn balances(&self, chain: &ChainConfig) -> Result<BalanceClient> {
        let url = chain
            .rpc()
            .ok_or_else(|| Error::ConfigError(format!("{:?} chain has no rpc_url", chain.chain_type)))?;
        Ok(BalanceClient::new(
            self.fetcher(HttpTransport::new()?),
            chain.chain_type,
            url,
        ))
    }

    pub fn prices(&self, coin: &CoinConfig, apis: &PriceApiConfig, coingecko_pause: Duration) -> Result<Box<dyn PriceSource>> {
        let source: Box<dyn PriceSource> = match coin.provider {
            PriceProvider::Tiingo => Box::new(TiingoClient::new(
                self.fetcher(HttpTransport::new()?),
                &apis.tiingo_url,
                &apis.tiingo_api_key,
            )),
            PriceProvider::Coingecko => Box::new(CoinGeckoClient::new(
                self.fetcher(HttpTransport::new()?),
                &apis.coingecko_url,
                apis.coingecko_api_key.clone(),
                coingecko_pause,
            )),
        };
        Ok(source)
    }
}

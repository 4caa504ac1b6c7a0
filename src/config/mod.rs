use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::fs;
use std::time::Duration;
use crate::aggregate::IncreasePolicy;
use crate::error::{Error, Result};
use crate::fetch::RetryPolicy;
use crate::models::WindowBounds;
use crate::validation;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Spreadsheet title without the year suffix.
    pub sheet: String,
    #[serde(default)]
    pub worksheets: WorksheetConfig,
    #[serde(default)]
    pub chains: BTreeMap<String, ChainConfig>,
    #[serde(default)]
    pub wallets: BTreeMap<String, WalletConfig>,
    #[serde(default)]
    pub nodes: BTreeMap<String, NodeConfig>,
    #[serde(default)]
    pub coins: Vec<CoinConfig>,
    #[serde(default)]
    pub prices: PriceApiConfig,
    #[serde(default)]
    pub policy: PolicyConfig,
    #[serde(default)]
    pub pacing: PacingConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub layout: LayoutConfig,
    #[serde(default)]
    pub google: GoogleConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct WorksheetConfig {
    pub payment: String,
    pub prices: String,
}

impl Default for WorksheetConfig {
    fn default() -> Self {
        Self {
            payment: "All payments".to_string(),
            prices: "Coin Daily Close".to_string(),
        }
    }
}

/// Provider family behind a chain entry. Selects both how balances are read
/// and how incoming transfers are listed.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum ChainType {
    /// Etherscan clone with a timestamp-to-block endpoint.
    Etherscan,
    /// Etherscan clone behind an edge proxy, no block lookup.
    EtherscanCf,
    Oklink,
    Klaytn,
    Solana,
    /// Cosmos SDK chain.
    Terra,
}

impl ChainType {
    /// Whether the provider exposes an incoming-transfer listing at all.
    pub fn lists_transfers(&self) -> bool {
        matches!(self, ChainType::Etherscan | ChainType::EtherscanCf | ChainType::Solana)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ChainConfig {
    #[serde(rename = "type")]
    pub chain_type: ChainType,
    /// Node RPC endpoint used for balances.
    #[serde(default)]
    pub rpc_url: Option<String>,
    /// Explorer API base URL used for transfers.
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub apikey: String,
    #[serde(default)]
    pub token_contract: Option<String>,
}

impl ChainConfig {
    pub fn explorer_url(&self) -> Option<&str> {
        self.url.as_deref().filter(|u| !u.trim().is_empty())
    }

    pub fn rpc(&self) -> Option<&str> {
        self.rpc_url.as_deref().filter(|u| !u.trim().is_empty())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct WalletConfig {
    pub chain: String,
    pub address: String,
    pub column: u32,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct NodeConfig {
    pub chain: String,
    pub address: String,
    pub worksheet_title: String,
    #[serde(default)]
    pub funded_by: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PriceProvider {
    Tiingo,
    Coingecko,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CoinConfig {
    /// Tiingo pair (`ethusd`) or CoinGecko coin id (`rocket-pool`).
    pub ticker: String,
    pub column: u32,
    pub provider: PriceProvider,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct PriceApiConfig {
    pub tiingo_api_key: String,
    pub coingecko_api_key: Option<String>,
    pub tiingo_url: String,
    pub coingecko_url: String,
}

impl Default for PriceApiConfig {
    fn default() -> Self {
        Self {
            tiingo_api_key: String::new(),
            coingecko_api_key: None,
            tiingo_url: "https://api.tiingo.com".to_string(),
            coingecko_url: "https://api.coingecko.com/api/v3".to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct PolicyConfig {
    pub payment_window: WindowBounds,
    pub funding_window: WindowBounds,
    /// Increase test for Solana token (payment) listings.
    pub spl_increase: IncreasePolicy,
    /// Increase test for native SOL (funding) listings.
    pub sol_increase: IncreasePolicy,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            payment_window: WindowBounds::Exclusive,
            funding_window: WindowBounds::Inclusive,
            spl_increase: IncreasePolicy::PositiveAmount,
            sol_increase: IncreasePolicy::ChangeType,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct PacingConfig {
    pub query_pause_secs: u64,
    pub page_pause_secs: u64,
    pub coingecko_pause_secs: u64,
    /// Wait between the balances phase and the payments phase so the data
    /// sources see the new UTC day.
    pub rollover_pause_secs: u64,
    pub max_solana_pages: Option<u32>,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            query_pause_secs: 3,
            page_pause_secs: 3,
            coingecko_pause_secs: 2,
            rollover_pause_secs: 70,
            max_solana_pages: None,
        }
    }
}

impl PacingConfig {
    pub fn query_pause(&self) -> Duration {
        Duration::from_secs(self.query_pause_secs)
    }

    pub fn page_pause(&self) -> Duration {
        Duration::from_secs(self.page_pause_secs)
    }

    pub fn coingecko_pause(&self) -> Duration {
        Duration::from_secs(self.coingecko_pause_secs)
    }

    pub fn rollover_pause(&self) -> Duration {
        Duration::from_secs(self.rollover_pause_secs)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub backoff_step_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        let policy = RetryPolicy::default();
        Self {
            max_attempts: policy.max_attempts,
            backoff_step_secs: policy.backoff_step.as_secs(),
        }
    }
}

impl RetryConfig {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy::linear(self.max_attempts, Duration::from_secs(self.backoff_step_secs))
    }
}

/// 1-based column positions in each node worksheet. Column 1 is the date.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct LayoutConfig {
    pub record_time: bool,
    pub time_column: u32,
    pub balance_column: u32,
    pub funding_column: u32,
    pub fee_column: u32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            record_time: true,
            time_column: 2,
            balance_column: 3,
            funding_column: 4,
            fee_column: 5,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct GoogleConfig {
    /// Environment variable holding an OAuth bearer token with Sheets and
    /// Drive read scope.
    pub token_env: String,
    pub sheets_url: String,
    pub drive_url: String,
}

impl Default for GoogleConfig {
    fn default() -> Self {
        Self {
            token_env: "GOOGLE_SHEETS_TOKEN".to_string(),
            sheets_url: "https://sheets.googleapis.com/v4".to_string(),
            drive_url: "https://www.googleapis.com/drive/v3".to_string(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let config_str = fs::read_to_string(path).map_err(|e| {
            Error::ConfigError(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_toml(&config_str)
    }

    pub fn from_toml(config_str: &str) -> Result<Self> {
        let config: Config = toml::from_str(config_str)?;
        config.validate()?;
        Ok(config)
    }

    pub fn chain(&self, name: &str) -> Result<&ChainConfig> {
        self.chains
            .get(name)
            .ok_or_else(|| Error::ConfigError(format!("unknown chain {:?}", name)))
    }

    /// Spreadsheet title for a given year, e.g. "Accounting 2024".
    pub fn sheet_title(&self, year: i32) -> String {
        format!("{} {}", self.sheet, year)
    }

    pub fn validate(&self) -> Result<()> {
        if self.sheet.trim().is_empty() {
            return Err(Error::ConfigError("sheet title cannot be empty".to_string()));
        }
        if self.retry.max_attempts == 0 {
            return Err(Error::ConfigError("retry.max_attempts must be at least 1".to_string()));
        }

        for (name, wallet) in &self.wallets {
            let chain = self.chain(&wallet.chain).map_err(|_| {
                Error::ConfigError(format!("wallet {} references unknown chain {:?}", name, wallet.chain))
            })?;
            validation::validate_column(wallet.column)
                .map_err(|e| Error::ConfigError(format!("wallet {}: {}", name, e)))?;
            validation::validate_address(chain.chain_type, &wallet.address)
                .map_err(|e| Error::ConfigError(format!("wallet {}: {}", name, e)))?;
            if chain.chain_type.lists_transfers()
                && chain.explorer_url().is_some()
                && chain.token_contract.is_none()
            {
                return Err(Error::ConfigError(format!(
                    "chain {} lists transfers for wallet {} but has no token_contract",
                    wallet.chain, name
                )));
            }
        }

        for (name, node) in &self.nodes {
            let chain = self.chain(&node.chain).map_err(|_| {
                Error::ConfigError(format!("node {} references unknown chain {:?}", name, node.chain))
            })?;
            validation::validate_address(chain.chain_type, &node.address)
                .map_err(|e| Error::ConfigError(format!("node {}: {}", name, e)))?;
            if node.worksheet_title.trim().is_empty() {
                return Err(Error::ConfigError(format!("node {} has no worksheet_title", name)));
            }
        }

        for coin in &self.coins {
            validation::validate_column(coin.column)
                .map_err(|e| Error::ConfigError(format!("coin {}: {}", coin.ticker, e)))?;
        }

        let layout = &self.layout;
        for column in [layout.time_column, layout.balance_column, layout.funding_column, layout.fee_column] {
            validation::validate_column(column)
                .map_err(|e| Error::ConfigError(format!("layout: {}", e)))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::common::TEST_CONFIG;

    #[test]
    fn test_parses_full_config() {
        let config = Config::from_toml(TEST_CONFIG).unwrap();
        assert_eq!(config.sheet_title(2024), "Node Accounting 2024");
        assert_eq!(config.chains["ethereum"].chain_type, ChainType::Etherscan);
        assert_eq!(config.chains["optimism"].chain_type, ChainType::EtherscanCf);
        assert_eq!(config.wallets["solana"].column, 14);
        assert_eq!(config.coins[1].provider, PriceProvider::Coingecko);
        assert_eq!(config.policy.payment_window, WindowBounds::Exclusive);
        assert_eq!(config.policy.sol_increase, IncreasePolicy::ChangeType);
        assert_eq!(config.retry.policy(), RetryPolicy::default());
    }

    #[test]
    fn test_unknown_chain_type_is_fatal() {
        let raw = r#"
            sheet = "Books"
            [chains.bsc]
            type = "bscscan"
        "#;
        let err = Config::from_toml(raw).unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_dangling_chain_reference_is_fatal() {
        let raw = r#"
            sheet = "Books"
            [wallets.eth]
            chain = "ethereum"
            address = "0x1111111111111111111111111111111111111111"
            column = 2
        "#;
        let err = Config::from_toml(raw).unwrap_err();
        assert!(err.is_fatal());
        assert!(err.to_string().contains("unknown chain"));
    }

    #[test]
    fn test_placeholder_address_rejected() {
        let raw = r#"
            sheet = "Books"
            [chains.ethereum]
            type = "etherscan"
            rpc_url = "https://eth.example.com"
            [nodes.ocr]
            chain = "ethereum"
            address = "0x"
            worksheet_title = "Mainnet OCR"
        "#;
        assert!(Config::from_toml(raw).unwrap_err().is_fatal());
    }

    #[test]
    fn test_policy_overrides() {
        let raw = r#"
            sheet = "Books"
            [policy]
            payment_window = "inclusive"
            spl_increase = "change_type"
            [pacing]
            max_solana_pages = 20
        "#;
        let config = Config::from_toml(raw).unwrap();
        assert_eq!(config.policy.payment_window, WindowBounds::Inclusive);
        assert_eq!(config.policy.spl_increase, IncreasePolicy::ChangeType);
        assert_eq!(config.policy.funding_window, WindowBounds::Inclusive);
        assert_eq!(config.pacing.max_solana_pages, Some(20));
        assert_eq!(config.pacing.query_pause_secs, 3);
    }
}

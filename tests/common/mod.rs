#![allow(dead_code)]

use async_trait::async_trait;
use node_accounting::api::Providers;
use node_accounting::config::Config;
use node_accounting::error::Result;
use node_accounting::fetch::Pause;
use node_accounting::sheets::{Cell, CellValue, Sheet, SheetClient};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const ETH_WALLET: &str = "0x1111111111111111111111111111111111111111";
pub const OPT_WALLET: &str = "0x3333333333333333333333333333333333333333";
pub const ETH_NODE: &str = "0x2222222222222222222222222222222222222222";
pub const LINK: &str = "0x514910771af9ca656af840dff83e8264ecf986ca";
pub const OPT_LINK: &str = "0x350a791bfc2c21f9ed5d10980dad2e2638ffa7f6";
pub const SOL_WALLET: &str = "AY2uKQZ21PGHoarsdnJ65xwJv1ojnM1Vn8UGMRpfZ2nX";
pub const SOL_NODE: &str = "9xQeWvG816bUx9EPjHmaT23yvVM2ZWbrrpZb9PusVFin";
pub const SOL_LINK: &str = "CWE8jPTUYhdCTZYWPTe1o5DFqfdjzWKc9WKz6rSjQUdG";
pub const TERRA_NODE: &str = "terra1fr7g6n0xue60sytq72zrlteul7xvz8tzl3tnv6";

// Every endpoint points at one mock server; paths keep the chains apart.
const CONFIG_TEMPLATE: &str = r#"
sheet = "Node Accounting"

[chains.ethereum]
type = "etherscan"
rpc_url = "{uri}/eth"
url = "{uri}/api"
apikey = "KEY"
token_contract = "0x514910771af9ca656af840dff83e8264ecf986ca"

[chains.optimism]
type = "etherscan-cf"
rpc_url = "{uri}/opt"
url = "{uri}/opt/api"
token_contract = "0x350a791bfc2c21f9ed5d10980dad2e2638ffa7f6"

[chains.solana]
type = "solana"
rpc_url = "{uri}/sol"
url = "{uri}/solscan"
apikey = "SOLKEY"
token_contract = "CWE8jPTUYhdCTZYWPTe1o5DFqfdjzWKc9WKz6rSjQUdG"

[chains.terra]
type = "terra"
rpc_url = "{uri}/terra"

[wallets.ethereum]
chain = "ethereum"
address = "0x1111111111111111111111111111111111111111"
column = 2

[wallets.optimism]
chain = "optimism"
address = "0x3333333333333333333333333333333333333333"
column = 6

[wallets.solana]
chain = "solana"
address = "AY2uKQZ21PGHoarsdnJ65xwJv1ojnM1Vn8UGMRpfZ2nX"
column = 14

[nodes.mainnet_ocr]
chain = "ethereum"
address = "0x2222222222222222222222222222222222222222"
worksheet_title = "Mainnet OCR"
funded_by = "Treasury"

[nodes.solana_ocr]
chain = "solana"
address = "9xQeWvG816bUx9EPjHmaT23yvVM2ZWbrrpZb9PusVFin"
worksheet_title = "Solana OCR"
funded_by = "Treasury"

[nodes.terra_ocr]
chain = "terra"
address = "terra1fr7g6n0xue60sytq72zrlteul7xvz8tzl3tnv6"
worksheet_title = "Terra OCR"

[[coins]]
ticker = "ethusd"
column = 2
provider = "tiingo"

[[coins]]
ticker = "rocket-pool"
column = 9
provider = "coingecko"

[prices]
tiingo_api_key = "TIINGO"
tiingo_url = "{uri}"
coingecko_url = "{uri}/api/v3"

[retry]
max_attempts = 3
backoff_step_secs = 5
"#;

pub fn config_for(uri: &str) -> Config {
    Config::from_toml(&CONFIG_TEMPLATE.replace("{uri}", uri)).unwrap()
}

/// Records pauses instead of sleeping.
#[derive(Debug, Default)]
pub struct RecordingPause {
    pauses: Mutex<Vec<Duration>>,
}

impl RecordingPause {
    pub fn recorded(&self) -> Vec<Duration> {
        self.pauses.lock().unwrap().clone()
    }
}

#[async_trait]
impl Pause for RecordingPause {
    async fn pause(&self, duration: Duration) {
        self.pauses.lock().unwrap().push(duration);
    }
}

pub fn providers_for(config: &Config) -> (Providers, Arc<RecordingPause>) {
    let pause = Arc::new(RecordingPause::default());
    (Providers::from_config(config, pause.clone()), pause)
}

#[derive(Debug, Clone, PartialEq)]
pub struct Written {
    pub title: String,
    pub worksheet: String,
    pub cell: Cell,
    pub value: CellValue,
}

#[derive(Default)]
struct Workbook {
    writes: Vec<Written>,
    rows: HashMap<(String, String), Vec<Vec<String>>>,
}

/// In-memory spreadsheets keyed by title.
#[derive(Clone, Default)]
pub struct MemorySheets {
    inner: Arc<Mutex<Workbook>>,
}

impl MemorySheets {
    pub fn with_rows(self, title: &str, worksheet: &str, rows: Vec<Vec<&str>>) -> Self {
        let rows = rows
            .into_iter()
            .map(|r| r.into_iter().map(str::to_string).collect())
            .collect();
        self.inner
            .lock()
            .unwrap()
            .rows
            .insert((title.to_string(), worksheet.to_string()), rows);
        self
    }

    pub fn writes(&self) -> Vec<Written> {
        self.inner.lock().unwrap().writes.clone()
    }

    pub fn value(&self, worksheet: &str, row: u32, column: u32) -> Option<CellValue> {
        self.writes()
            .into_iter()
            .rev()
            .find(|w| w.worksheet == worksheet && w.cell == Cell::new(row, column))
            .map(|w| w.value)
    }
}

struct MemorySheet {
    title: String,
    inner: Arc<Mutex<Workbook>>,
}

#[async_trait]
impl SheetClient for MemorySheets {
    async fn open(&self, title: &str) -> Result<Box<dyn Sheet>> {
        Ok(Box::new(MemorySheet {
            title: title.to_string(),
            inner: self.inner.clone(),
        }))
    }
}

#[async_trait]
impl Sheet for MemorySheet {
    async fn update_value(&self, worksheet: &str, cell: Cell, value: CellValue) -> Result<()> {
        self.inner.lock().unwrap().writes.push(Written {
            title: self.title.clone(),
            worksheet: worksheet.to_string(),
            cell,
            value,
        });
        Ok(())
    }

    async fn get_all_values(&self, worksheet: &str) -> Result<Vec<Vec<String>>> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .rows
            .get(&(self.title.clone(), worksheet.to_string()))
            .cloned()
            .unwrap_or_default())
    }
}

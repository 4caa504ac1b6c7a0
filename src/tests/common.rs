use crate::fetch::Pause;
use async_trait::async_trait;
use std::sync::Mutex;
use std::time::Duration;

// Helper config covering every section
pub const TEST_CONFIG: &str = r#"
sheet = "Node Accounting"

[worksheets]
payment = "All payments"
prices = "Coin Daily Close"

[chains.ethereum]
type = "etherscan"
rpc_url = "https://eth.example.com"
url = "https://api.etherscan.io/api"
apikey = "KEY"
token_contract = "0x514910771af9ca656af840dff83e8264ecf986ca"

[chains.optimism]
type = "etherscan-cf"
rpc_url = "https://mainnet.optimism.io"
url = "https://api-optimistic.etherscan.io/api"
token_contract = "0x350a791bfc2c21f9ed5d10980dad2e2638ffa7f6"

[chains.solana]
type = "solana"
rpc_url = "https://solana.example.com"
url = "https://public-api.solscan.io"
apikey = "SOLKEY"
token_contract = "CWE8jPTUYhdCTZYWPTe1o5DFqfdjzWKc9WKz6rSjQUdG"

[chains.terra]
type = "terra"
rpc_url = "https://terra.example.com"

[wallets.ethereum]
chain = "ethereum"
address = "0x1111111111111111111111111111111111111111"
column = 2

[wallets.solana]
chain = "solana"
address = "AY2uKQZ21PGHoarsdnJ65xwJv1ojnM1Vn8UGMRpfZ2nX"
column = 14

[nodes.mainnet_ocr]
chain = "ethereum"
address = "0x2222222222222222222222222222222222222222"
worksheet_title = "Mainnet OCR"
funded_by = "Treasury"

[[coins]]
ticker = "ethusd"
column = 2
provider = "tiingo"

[[coins]]
ticker = "rocket-pool"
column = 9
provider = "coingecko"
"#;

/// Pause that only remembers what it was asked to wait for.
#[derive(Debug, Default)]
pub struct RecordingPause {
    pauses: Mutex<Vec<Duration>>,
}

impl RecordingPause {
    pub fn recorded(&self) -> Vec<Duration> {
        self.pauses.lock().map(|p| p.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Pause for RecordingPause {
    async fn pause(&self, duration: Duration) {
        if let Ok(mut pauses) = self.pauses.lock() {
            pauses.push(duration);
        }
    }
}

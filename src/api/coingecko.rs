use super::PriceSource;
use crate::error::{Error, Result};
use crate::fetch::{FetchRequest, Fetcher};
use crate::models::market::ClosingPrice;
use async_trait::async_trait;
use chrono::NaiveDate;
use log::{error, info};
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use url::Url;

pub const API_BASE_URL: &str = "https://api.coingecko.com/api/v3";

#[derive(Debug, Deserialize)]
struct CoinGeckoHistory {
    id: String,
    #[serde(default)]
    market_data: Option<CoinGeckoMarketData>,
}

#[derive(Debug, Deserialize, Default)]
struct CoinGeckoMarketData {
    #[serde(default)]
    current_price: HashMap<String, f64>,
}

impl CoinGeckoHistory {
    fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(Error::ApiInvalidData("Empty coin ID".into()));
        }
        if let Some(market_data) = &self.market_data {
            if market_data.current_price.values().any(|p| *p < 0.0) {
                return Err(Error::ApiInvalidData("Negative token price".into()));
            }
        }
        Ok(())
    }

    fn into_closing_price(self, date: NaiveDate) -> Result<ClosingPrice> {
        self.validate()?;

        // No market data means the coin did not trade that day yet.
        let market_data = self
            .market_data
            .ok_or_else(|| Error::ApiInvalidData(format!("Missing market data for {} on {}", self.id, date)))?;
        let close = market_data
            .current_price
            .get("usd")
            .copied()
            .ok_or_else(|| Error::ApiInvalidData(format!("No USD price for {}", self.id)))?;

        Ok(ClosingPrice {
            ticker: self.id,
            date,
            close,
        })
    }
}

/// Daily snapshot prices from the `coins/{id}/history` endpoint.
#[derive(Debug, Clone)]
pub struct CoinGeckoClient {
    fetcher: Fetcher,
    base_url: String,
    api_key: Option<String>,
    /// Free tier answers 429 quickly, so every query is followed by a pause.
    courtesy_pause: Duration,
}

impl CoinGeckoClient {
    pub fn new(fetcher: Fetcher, base_url: &str, api_key: Option<String>, courtesy_pause: Duration) -> Self {
        Self {
            fetcher,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.filter(|k| !k.is_empty()),
            courtesy_pause,
        }
    }

    fn history_url(&self, coin_id: &str, date: NaiveDate) -> Result<String> {
        let url = Url::parse_with_params(
            &format!("{}/coins/{}/history", self.base_url, coin_id),
            &[
                ("date", date.format("%d-%m-%Y").to_string()),
                ("localization", "false".to_string()),
            ],
        )?;
        Ok(url.to_string())
    }
}

#[async_trait]
impl PriceSource for CoinGeckoClient {
    async fn closing_price(&self, ticker: &str, date: NaiveDate) -> Result<ClosingPrice> {
        let mut request = FetchRequest::get(self.history_url(ticker, date)?)
            .header("content-type", "application/json")
            .header("accept-charset", "UTF-8");
        if let Some(key) = &self.api_key {
            request = request.header("x-cg-pro-api-key", key);
        }

        let result = self.fetcher.fetch(&request).await;
        self.fetcher.pause_handle().pause(self.courtesy_pause).await;
        let response = result?;

        let history: CoinGeckoHistory = response.json().map_err(|e| {
            error!("Unreadable CoinGecko history for {}: {}; response: {}", ticker, e, response.body);
            e
        })?;
        let price = history.into_closing_price(date)?;
        info!("Fetched CoinGecko close for {} on {}: {}", ticker, date, price.close);
        Ok(price)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::{MockTransport, RawResponse, RetryPolicy};
    use crate::tests::common::RecordingPause;
    use std::sync::Arc;

    fn client(transport: MockTransport, pause: Arc<RecordingPause>, key: Option<&str>) -> CoinGeckoClient {
        let fetcher = Fetcher::new(Arc::new(transport), RetryPolicy::default(), pause);
        CoinGeckoClient::new(fetcher, API_BASE_URL, key.map(str::to_string), Duration::from_secs(2))
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, 3, 9).unwrap()
    }

    #[tokio::test]
    async fn test_history_close_and_pause() {
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .withf(|request| {
                request.url.ends_with("/coins/rocket-pool/history?date=09-03-2023&localization=false")
                    && !request.headers.is_empty()
                    && !request.headers.iter().any(|(name, _)| name == "x-cg-pro-api-key")
            })
            .times(1)
            .returning(|_| {
                Ok(RawResponse {
                    status: 200,
                    body: r#"{"id":"rocket-pool","symbol":"rpl","market_data":{"current_price":{"usd":41.25,"eur":38.9}}}"#.to_string(),
                })
            });
        let pause = Arc::new(RecordingPause::default());
        let price = client(transport, pause.clone(), None)
            .closing_price("rocket-pool", date())
            .await
            .unwrap();
        assert_eq!(price.close, 41.25);
        assert_eq!(price.date, date());
        assert_eq!(pause.recorded(), vec![Duration::from_secs(2)]);
    }

    #[tokio::test]
    async fn test_pro_key_header() {
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .withf(|request| request.headers.contains(&("x-cg-pro-api-key".to_string(), "CG-KEY".to_string())))
            .returning(|_| {
                Ok(RawResponse {
                    status: 200,
                    body: r#"{"id":"rocket-pool","market_data":{"current_price":{"usd":1.0}}}"#.to_string(),
                })
            });
        let price = client(transport, Arc::new(RecordingPause::default()), Some("CG-KEY"))
            .closing_price("rocket-pool", date())
            .await;
        assert!(price.is_ok());
    }

    #[test]
    fn test_missing_market_data_is_invalid() {
        let history: CoinGeckoHistory = serde_json::from_str(r#"{"id":"new-coin"}"#).unwrap();
        assert!(matches!(history.into_closing_price(date()), Err(Error::ApiInvalidData(_))));
    }

    #[test]
    fn test_negative_price_is_invalid() {
        let history: CoinGeckoHistory =
            serde_json::from_str(r#"{"id":"x","market_data":{"current_price":{"usd":-1.0}}}"#).unwrap();
        assert!(history.validate().is_err());
    }
}

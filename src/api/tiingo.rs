use super::PriceSource;
use crate::error::{Error, Result};
use crate::fetch::{FetchRequest, Fetcher};
use crate::models::market::ClosingPrice;
use async_trait::async_trait;
use chrono::NaiveDate;
use log::{error, info};
use serde::Deserialize;
use url::Url;

#[derive(Debug, Deserialize)]
struct TiingoDailyPrice {
    close: f64,
}

#[derive(Debug, Clone)]
pub struct TiingoClient {
    fetcher: Fetcher,
    base_url: String,
    token: String,
}

impl TiingoClient {
    pub fn new(fetcher: Fetcher, base_url: &str, token: &str) -> Self {
        Self {
            fetcher,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        }
    }

    fn prices_url(&self, ticker: &str, date: NaiveDate) -> Result<String> {
        let day = date.format("%Y-%m-%d").to_string();
        let url = Url::parse_with_params(
            &format!("{}/tiingo/daily/{}/prices", self.base_url, ticker),
            &[("startDate", day.as_str()), ("endDate", day.as_str()), ("token", self.token.as_str())],
        )?;
        Ok(url.to_string())
    }
}

#[async_trait]
impl PriceSource for TiingoClient {
    async fn closing_price(&self, ticker: &str, date: NaiveDate) -> Result<ClosingPrice> {
        let request = FetchRequest::get(self.prices_url(ticker, date)?)
            .header("content-type", "application/json")
            .header("accept-charset", "UTF-8");
        let response = self.fetcher.fetch(&request).await?;

        let prices: Vec<TiingoDailyPrice> = response.json().map_err(|e| {
            error!("Unreadable Tiingo prices for {}: {}; response: {}", ticker, e, response.body);
            e
        })?;
        let close = prices
            .first()
            .map(|p| p.close)
            .ok_or_else(|| Error::ApiInvalidData(format!("Tiingo has no {} price for {}", ticker, date)))?;
        if close < 0.0 {
            return Err(Error::ApiInvalidData(format!("Negative {} close: {}", ticker, close)));
        }

        info!("Fetched Tiingo close for {} on {}: {}", ticker, date, close);
        Ok(ClosingPrice {
            ticker: ticker.to_string(),
            date,
            close,
        })
    }
}

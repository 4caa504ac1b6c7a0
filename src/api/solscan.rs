use super::{IncomingTransfers, TransferQuery};
use crate::aggregate::SolanaPage;
use crate::error::Result;
use crate::fetch::{FetchRequest, Fetcher, HttpTransport};
use async_trait::async_trait;
use log::{error, info, warn};
use std::time::Duration;
use url::Url;

pub const PAGE_SIZE: u32 = 50;

/// Session carrying the headers Solscan expects on every call.
pub fn session(apikey: &str) -> Result<HttpTransport> {
    let mut headers = vec![("accept", "application/json")];
    if !apikey.is_empty() {
        headers.push(("token", apikey));
    }
    HttpTransport::with_headers(&headers)
}

/// Solscan-style balance-change listing, fetched `PAGE_SIZE` records at a
/// time until a page comes back empty.
#[derive(Debug, Clone)]
pub struct SolanaPaginated {
    fetcher: Fetcher,
    base_url: String,
    page_pause: Duration,
    max_pages: Option<u32>,
}

impl SolanaPaginated {
    pub fn new(fetcher: Fetcher, base_url: &str, page_pause: Duration, max_pages: Option<u32>) -> Self {
        Self {
            fetcher,
            base_url: base_url.trim_end_matches('/').to_string(),
            page_pause,
            max_pages,
        }
    }

    fn page_url(&self, query: &TransferQuery, offset: u32) -> Result<String> {
        let url = Url::parse_with_params(
            &format!("{}/account/splTransfers", self.base_url),
            &[
                ("account", query.address.clone()),
                ("fromTime", query.window.start.to_string()),
                ("toTime", query.window.end.to_string()),
                ("offset", offset.to_string()),
                ("limit", PAGE_SIZE.to_string()),
            ],
        )?;
        Ok(url.to_string())
    }

    async fn fetch_page(&self, query: &TransferQuery, offset: u32) -> Result<SolanaPage> {
        let url = self.page_url(query, offset)?;
        let response = self.fetcher.fetch(&FetchRequest::get(url)).await?;
        SolanaPage::parse(&response.body).map_err(|e| {
            error!(
                "Could not read transfers for {} at offset {}: {}; here's the tx blurb: {}",
                query.address, offset, e, response.body
            );
            e
        })
    }
}

#[async_trait]
impl IncomingTransfers for SolanaPaginated {
    async fn incoming(&self, query: &TransferQuery) -> Result<Option<f64>> {
        let pause = self.fetcher.pause_handle();
        let contract = query.contract.as_deref();
        let mut total = 0.0;
        let mut offset = 0;
        let mut pages = 0;

        loop {
            let page = self.fetch_page(query, offset).await?;
            if page.is_empty() {
                break;
            }
            total += page.sum_incoming(&query.address, contract, query.increase);
            pages += 1;
            offset += PAGE_SIZE;

            if let Some(max) = self.max_pages {
                if pages >= max {
                    warn!(
                        "Stopping after {} pages for {}, total so far may be short",
                        pages, query.address
                    );
                    break;
                }
            }
            pause.pause(self.page_pause).await;
        }

        info!("Read {} transfer pages for {}", pages, query.address);
        Ok(Some(total))
    }
}

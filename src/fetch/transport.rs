use super::{FetchRequest, Method, RawResponse, Transport, TransportError};
use crate::error::{Error, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Client;

// Some explorer APIs sit behind an edge proxy that serves a challenge page to
// anything that does not look like a browser.
const BROWSER_HEADERS: &[(&str, &str)] = &[
    ("user-agent", "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:77.0) Gecko/20100101 Firefox/77.0"),
    ("accept", "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8"),
    ("accept-language", "en-GB,en;q=0.5"),
    ("connection", "close"),
    ("upgrade-insecure-requests", "1"),
    ("dnt", "1"),
];

/// `reqwest`-backed transport. One instance is one session: its client keeps
/// connections and default headers between requests.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self> {
        Ok(Self {
            client: Client::builder().build()?,
        })
    }

    pub fn with_headers(headers: &[(&str, &str)]) -> Result<Self> {
        let mut map = HeaderMap::new();
        for (name, value) in headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| Error::ConfigError(format!("invalid header name {}: {}", name, e)))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| Error::ConfigError(format!("invalid header value for {}: {}", name, e)))?;
            map.insert(name, value);
        }
        Ok(Self {
            client: Client::builder().default_headers(map).build()?,
        })
    }

    /// Session that presents itself like a desktop browser to `base_url`'s host.
    pub fn browser_session(base_url: &str) -> Result<Self> {
        let parsed = url::Url::parse(base_url)?;
        let host = parsed
            .host_str()
            .ok_or_else(|| Error::ConfigError(format!("URL has no host: {}", base_url)))?;
        let host = match parsed.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        };
        let mut headers: Vec<(&str, &str)> = BROWSER_HEADERS.to_vec();
        headers.push(("host", host.as_str()));
        Self::with_headers(&headers)
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportError::Timeout(err.to_string())
        } else if err.is_connect() {
            TransportError::Connect(err.to_string())
        } else {
            TransportError::Other(err.to_string())
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: &FetchRequest) -> std::result::Result<RawResponse, TransportError> {
        let mut builder = match request.method {
            Method::Get => self.client.get(&request.url),
            Method::Post => self.client.post(&request.url),
            Method::Put => self.client.put(&request.url),
        };
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(payload) = &request.payload {
            builder = builder.body(payload.clone());
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(RawResponse { status, body })
    }
}

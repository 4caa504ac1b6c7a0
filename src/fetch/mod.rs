use crate::error::{Error, Result};
use async_trait::async_trait;
use log::{error, info, warn};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use thiserror::Error as ThisError;

#[cfg(test)]
use mockall::automock;

pub mod retry;
pub mod transport;

pub use retry::{Pause, RetryPolicy, TokioPause};
pub use transport::HttpTransport;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FetchRequest {
    pub method: Method,
    pub url: String,
    pub payload: Option<String>,
    pub headers: Vec<(String, String)>,
}

impl FetchRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            url: url.into(),
            payload: None,
            headers: Vec::new(),
        }
    }

    pub fn post(url: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            method: Method::Post,
            url: url.into(),
            payload: Some(payload.into()),
            headers: Vec::new(),
        }
    }

    pub fn put(url: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            method: Method::Put,
            ..Self::post(url, payload)
        }
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    /// URL with credential-bearing query values masked, for log lines.
    pub fn display_url(&self) -> String {
        match url::Url::parse(&self.url) {
            Ok(mut parsed) => {
                let pairs: Vec<(String, String)> = parsed
                    .query_pairs()
                    .map(|(k, v)| {
                        let masked = matches!(k.as_ref(), "apikey" | "token" | "api_key");
                        (k.into_owned(), if masked { "***".to_string() } else { v.into_owned() })
                    })
                    .collect();
                if !pairs.is_empty() {
                    parsed.query_pairs_mut().clear().extend_pairs(pairs);
                }
                parsed.to_string()
            }
            Err(_) => self.url.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_str(&self.body)?)
    }
}

/// A request that never produced an HTTP status.
#[derive(Debug, Clone, PartialEq, ThisError)]
pub enum TransportError {
    #[error("Connection error: {0}")]
    Connect(String),
    #[error("Timeout error: {0}")]
    Timeout(String),
    #[error("Unexpected exception: {0}")]
    Other(String),
}

/// One HTTP exchange, no retries. Implementations own any session state
/// such as default headers.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &FetchRequest) -> std::result::Result<RawResponse, TransportError>;
}

/// Sends requests through a [`Transport`], retrying failed attempts
/// according to a [`RetryPolicy`].
#[derive(Clone)]
pub struct Fetcher {
    transport: Arc<dyn Transport>,
    policy: RetryPolicy,
    pause: Arc<dyn Pause>,
}

impl std::fmt::Debug for Fetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Fetcher")
            .field("transport", &format_args!("<Transport>"))
            .field("policy", &self.policy)
            .finish()
    }
}

impl Fetcher {
    pub fn new(transport: Arc<dyn Transport>, policy: RetryPolicy, pause: Arc<dyn Pause>) -> Self {
        Self {
            transport,
            policy,
            pause,
        }
    }

    pub fn pause_handle(&self) -> Arc<dyn Pause> {
        self.pause.clone()
    }

    /// A non-2xx status counts as a failed attempt just like a dropped
    /// connection does.
    pub async fn fetch(&self, request: &FetchRequest) -> Result<RawResponse> {
        let url = request.display_url();
        let mut last_reason = String::from("no attempt made");

        for attempt in 1..=self.policy.max_attempts {
            match self.transport.send(request).await {
                Ok(response) if response.is_success() => {
                    if attempt > 1 {
                        info!("Querying {} succeeded on try #{}", url, attempt);
                    }
                    return Ok(response);
                }
                Ok(response) => {
                    last_reason = format!("HTTP status {}", response.status);
                    warn!("Querying {} returned status {}", url, response.status);
                }
                Err(e) => {
                    warn!("{} ({})", e, url);
                    last_reason = e.to_string();
                }
            }

            match self.policy.delay_after(attempt) {
                Some(delay) => {
                    info!(
                        "Retrying {}, attempt #{} in {}s",
                        url,
                        attempt + 1,
                        delay.as_secs()
                    );
                    self.pause.pause(delay).await;
                }
                None => error!("Failed on final try #{} for {}", attempt, url),
            }
        }

        Err(Error::FetchExhausted {
            url,
            attempts: self.policy.max_attempts,
            reason: last_reason,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::common::RecordingPause;
    use std::time::Duration;
    use tokio_test::{assert_err, assert_ok};

    fn ok_response() -> RawResponse {
        RawResponse {
            status: 200,
            body: r#"{"result":"0x1"}"#.to_string(),
        }
    }

    #[test_log::test(tokio::test)]
    async fn test_fetch_recovers_after_two_failures() {
        let mut transport = MockTransport::new();
        let mut calls = 0;
        transport.expect_send().times(3).returning(move |_| {
            calls += 1;
            if calls < 3 {
                Err(TransportError::Connect("connection refused".into()))
            } else {
                Ok(ok_response())
            }
        });
        let pause = Arc::new(RecordingPause::default());
        let fetcher = Fetcher::new(Arc::new(transport), RetryPolicy::default(), pause.clone());

        let response = assert_ok!(fetcher.fetch(&FetchRequest::get("https://rpc.example.com")).await);

        assert_eq!(response, ok_response());
        assert_eq!(
            pause.recorded(),
            vec![Duration::from_secs(5), Duration::from_secs(10)]
        );
    }

    #[tokio::test]
    async fn test_fetch_gives_up_after_three_attempts() {
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .times(3)
            .returning(|_| Err(TransportError::Timeout("timed out".into())));
        let pause = Arc::new(RecordingPause::default());
        let fetcher = Fetcher::new(Arc::new(transport), RetryPolicy::default(), pause.clone());

        let err = assert_err!(fetcher.fetch(&FetchRequest::get("https://rpc.example.com")).await);

        match err {
            Error::FetchExhausted { attempts, reason, .. } => {
                assert_eq!(attempts, 3);
                assert!(reason.contains("timed out"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
        // No pause after the final attempt.
        assert_eq!(pause.recorded().len(), 2);
    }

    #[tokio::test]
    async fn test_error_status_is_retried() {
        let mut transport = MockTransport::new();
        let mut calls = 0;
        transport.expect_send().times(2).returning(move |_| {
            calls += 1;
            if calls == 1 {
                Ok(RawResponse {
                    status: 502,
                    body: "<html>Bad gateway</html>".into(),
                })
            } else {
                Ok(ok_response())
            }
        });
        let pause = Arc::new(RecordingPause::default());
        let fetcher = Fetcher::new(Arc::new(transport), RetryPolicy::default(), pause.clone());

        assert_ok!(fetcher.fetch(&FetchRequest::get("https://rpc.example.com")).await);
        assert_eq!(pause.recorded(), vec![Duration::from_secs(5)]);
    }

    #[tokio::test]
    async fn test_success_on_first_try_never_pauses() {
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .withf(|req| req.method == Method::Post && req.payload.is_some())
            .times(1)
            .returning(|_| Ok(ok_response()));
        let pause = Arc::new(RecordingPause::default());
        let fetcher = Fetcher::new(Arc::new(transport), RetryPolicy::default(), pause.clone());

        assert_ok!(
            fetcher
                .fetch(&FetchRequest::post("https://rpc.example.com", "{}"))
                .await
        );
        assert!(pause.recorded().is_empty());
    }

    #[test]
    fn test_display_url_masks_keys() {
        let request = FetchRequest::get(
            "https://api.etherscan.io/api?module=block&timestamp=1&apikey=SECRET",
        );
        let shown = request.display_url();
        assert!(!shown.contains("SECRET"));
        assert!(shown.contains("module=block"));
    }
}

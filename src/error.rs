use std::result::Result as StdResult;
use thiserror::Error;
use reqwest;
use serde_json;
use anyhow;
use std::io;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Fetch failed after {attempts} attempts for {url}: {reason}")]
    FetchExhausted {
        url: String,
        attempts: u32,
        reason: String,
    },
    #[error("API error: {0}")]
    ApiError(String),
    #[error("API invalid data: {0}")]
    ApiInvalidData(String),
    #[error("API invalid format: {0}")]
    ApiInvalidFormat(String),
    #[error("Parse error: {0}")]
    ParseError(String),
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("Sheet error: {0}")]
    SheetError(String),
    #[error("Internal error: {0}")]
    InternalError(String),
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
}

impl Error {
    /// Configuration mistakes abort the whole run; everything else only
    /// costs the current item.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::ConfigError(_))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::ApiInvalidFormat(err.to_string())
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::ConfigError(err.to_string())
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Error::ConfigError(format!("invalid URL: {}", err))
    }
}

impl From<chrono::ParseError> for Error {
    fn from(err: chrono::ParseError) -> Self {
        Error::ParseError(err.to_string())
    }
}

impl From<std::num::ParseIntError> for Error {
    fn from(err: std::num::ParseIntError) -> Self {
        Error::ParseError(err.to_string())
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::InternalError(err.to_string())
    }
}

pub type Result<T> = StdResult<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_config_errors_are_fatal() {
        assert!(Error::ConfigError("unknown chain type".into()).is_fatal());
        assert!(!Error::ApiInvalidFormat("bad json".into()).is_fatal());
        assert!(!Error::FetchExhausted {
            url: "https://api.example.com".into(),
            attempts: 3,
            reason: "connection refused".into(),
        }
        .is_fatal());
    }

    #[test]
    fn test_toml_errors_become_config_errors() {
        let err: Error = toml::from_str::<toml::Value>("sheet = ").unwrap_err().into();
        assert!(err.is_fatal());
    }
}

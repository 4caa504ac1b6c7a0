use super::{Cell, CellValue, Sheet, SheetClient};
use crate::config::GoogleConfig;
use crate::error::{Error, Result};
use crate::fetch::{FetchRequest, Fetcher};
use async_trait::async_trait;
use log::{debug, info};
use serde::Deserialize;
use serde_json::json;
use url::Url;

const SPREADSHEET_MIME: &str = "application/vnd.google-apps.spreadsheet";

#[derive(Debug, Deserialize)]
struct DriveFile {
    id: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct DriveFileList {
    #[serde(default)]
    files: Vec<DriveFile>,
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<serde_json::Value>>,
}

fn display_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Sheets v4 and Drive v3 over REST with a bearer token.
#[derive(Clone)]
pub struct GoogleSheets {
    fetcher: Fetcher,
    token: String,
    sheets_url: String,
    drive_url: String,
}

impl std::fmt::Debug for GoogleSheets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleSheets")
            .field("sheets_url", &self.sheets_url)
            .field("drive_url", &self.drive_url)
            .finish_non_exhaustive()
    }
}

impl GoogleSheets {
    pub fn new(fetcher: Fetcher, token: &str, sheets_url: &str, drive_url: &str) -> Self {
        Self {
            fetcher,
            token: token.to_string(),
            sheets_url: sheets_url.trim_end_matches('/').to_string(),
            drive_url: drive_url.trim_end_matches('/').to_string(),
        }
    }

    /// Reads the bearer token from the variable named in `config`.
    pub fn from_env(fetcher: Fetcher, config: &GoogleConfig) -> Result<Self> {
        let token = std::env::var(&config.token_env).map_err(|_| {
            Error::ConfigError(format!("{} is not set; add it to the environment or .env", config.token_env))
        })?;
        if token.trim().is_empty() {
            return Err(Error::ConfigError(format!("{} is empty", config.token_env)));
        }
        Ok(Self::new(fetcher, token.trim(), &config.sheets_url, &config.drive_url))
    }

    fn authorized(&self, request: FetchRequest) -> FetchRequest {
        request.header("authorization", &format!("Bearer {}", self.token))
    }
}

#[async_trait]
impl SheetClient for GoogleSheets {
    async fn open(&self, title: &str) -> Result<Box<dyn Sheet>> {
        let query = format!(
            "name = '{}' and mimeType = '{}' and trashed = false",
            title.replace('\'', "\\'"),
            SPREADSHEET_MIME
        );
        let url = Url::parse_with_params(
            &format!("{}/files", self.drive_url),
            &[("q", query.as_str()), ("fields", "files(id,name)")],
        )?;
        let response = self.fetcher.fetch(&self.authorized(FetchRequest::get(url.to_string()))).await?;
        let list: DriveFileList = response.json()?;

        let file = list
            .files
            .into_iter()
            .find(|f| f.name == title)
            .ok_or_else(|| Error::SheetError(format!("Spreadsheet not found: {}", title)))?;
        info!("Opened spreadsheet {} ({})", file.name, file.id);

        Ok(Box::new(GoogleSheet {
            client: self.clone(),
            spreadsheet_id: file.id,
        }))
    }
}

#[derive(Debug, Clone)]
pub struct GoogleSheet {
    client: GoogleSheets,
    spreadsheet_id: String,
}

impl GoogleSheet {
    fn values_url(&self, range: &str) -> Result<Url> {
        let mut url = Url::parse(&self.client.sheets_url)?;
        url.path_segments_mut()
            .map_err(|_| Error::ConfigError(format!("Sheets URL cannot take a path: {}", self.client.sheets_url)))?
            .extend(&["spreadsheets", self.spreadsheet_id.as_str(), "values", range]);
        Ok(url)
    }
}

fn quoted(worksheet: &str) -> String {
    format!("'{}'", worksheet.replace('\'', "''"))
}

#[async_trait]
impl Sheet for GoogleSheet {
    async fn update_value(&self, worksheet: &str, cell: Cell, value: CellValue) -> Result<()> {
        let range = format!("{}!{}", quoted(worksheet), cell.to_a1()?);
        let mut url = self.values_url(&range)?;
        url.query_pairs_mut().append_pair("valueInputOption", "USER_ENTERED");

        let body = json!({
            "range": range,
            "majorDimension": "ROWS",
            "values": [[value.to_json()]],
        });
        let request = FetchRequest::put(url.to_string(), body.to_string())
            .header("content-type", "application/json");
        self.client.fetcher.fetch(&self.client.authorized(request)).await?;
        debug!("Wrote {} to {}", value, range);
        Ok(())
    }

    async fn get_all_values(&self, worksheet: &str) -> Result<Vec<Vec<String>>> {
        let url = self.values_url(&quoted(worksheet))?;
        let request = self.client.authorized(FetchRequest::get(url.to_string()));
        let range: ValueRange = self.client.fetcher.fetch(&request).await?.json()?;
        Ok(range
            .values
            .iter()
            .map(|row| row.iter().map(display_text).collect())
            .collect())
    }
}

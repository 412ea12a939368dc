//! Google Sheets values reader.
//!
//! One `values.get` call per tab, authenticated with a service-account key.
//! Cells come back as strings; trailing empty cells are omitted by the API,
//! so rows can be shorter than the tab is wide.

use async_trait::async_trait;
use capa_core::{config::SheetsConfig, error::CapaError, traits::SheetSource};
use google_cloud_auth::{
    credentials::CredentialsFile,
    project::{create_token_source_from_credentials, Config},
    token_source::TokenSource,
};
use reqwest::header::AUTHORIZATION;
use serde::Deserialize;
use tokio::sync::OnceCell;
use tracing::{debug, info};

const SHEETS_SCOPES: &[&str] = &["https://www.googleapis.com/auth/spreadsheets.readonly"];

/// Where the `Authorization` header comes from.
enum Auth {
    /// Service-account key; the token source is created on first use and
    /// refreshes itself afterwards.
    ServiceAccount {
        credentials: Box<CredentialsFile>,
        source: OnceCell<Box<dyn TokenSource>>,
    },
    /// Pre-issued bearer token.
    Static(String),
}

impl Auth {
    async fn header(&self) -> Result<String, CapaError> {
        match self {
            Auth::ServiceAccount {
                credentials,
                source,
            } => {
                let source = source
                    .get_or_try_init(|| async {
                        let config = Config::default().with_scopes(SHEETS_SCOPES);
                        let ts = create_token_source_from_credentials(credentials, &config)
                            .await
                            .map_err(|e| CapaError::Sheet(format!("sheets auth failed: {e}")))?;
                        info!("sheets: service account token acquired");
                        Ok::<_, CapaError>(ts)
                    })
                    .await?;
                let token = source
                    .token()
                    .await
                    .map_err(|e| CapaError::Sheet(format!("sheets token refresh failed: {e}")))?;
                Ok(token.value())
            }
            Auth::Static(token) => Ok(format!("Bearer {token}")),
        }
    }
}

#[derive(Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<serde_json::Value>>,
}

/// Reads the CAPA ledger and phone directory tabs of one spreadsheet.
pub struct GoogleSheetsClient {
    client: reqwest::Client,
    base_url: String,
    spreadsheet_id: String,
    capa_range: String,
    directory_range: String,
    auth: Auth,
}

impl GoogleSheetsClient {
    /// Build from config, loading the service-account key file.
    ///
    /// No network call happens here; the first read fetches the token.
    pub async fn from_config(config: &SheetsConfig) -> Result<Self, CapaError> {
        if config.spreadsheet_id.trim().is_empty() {
            return Err(CapaError::Config("sheets.spreadsheet_id is not set".to_string()));
        }

        let path = capa_core::config::shellexpand(&config.credentials_path);
        let key = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| CapaError::Config(format!("failed to read {path}: {e}")))?;
        let credentials = CredentialsFile::new_from_str(&key)
            .await
            .map_err(|e| CapaError::Config(format!("invalid service account key {path}: {e}")))?;

        let auth = Auth::ServiceAccount {
            credentials: Box::new(credentials),
            source: OnceCell::new(),
        };
        Ok(Self::with_auth(config, auth))
    }

    /// Build with a fixed bearer token instead of a key file.
    pub fn with_token(config: &SheetsConfig, token: impl Into<String>) -> Self {
        Self::with_auth(config, Auth::Static(token.into()))
    }

    fn with_auth(config: &SheetsConfig, auth: Auth) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            spreadsheet_id: config.spreadsheet_id.clone(),
            capa_range: config.capa_range.clone(),
            directory_range: config.directory_range.clone(),
            auth,
        }
    }

    /// Fetch one A1 range. A range with no data yields no rows.
    pub async fn read_range(&self, range: &str) -> Result<Vec<Vec<String>>, CapaError> {
        let url = format!(
            "{}/spreadsheets/{}/values/{}",
            self.base_url,
            urlencoding::encode(&self.spreadsheet_id),
            urlencoding::encode(range)
        );
        debug!("sheets: GET {range}");

        let resp = self
            .client
            .get(&url)
            .header(AUTHORIZATION, self.auth.header().await?)
            .send()
            .await
            .map_err(|e| CapaError::Sheet(format!("sheets request failed: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(CapaError::Sheet(format!(
                "sheets returned {status} for {range}: {text}"
            )));
        }

        let body: ValueRange = resp
            .json()
            .await
            .map_err(|e| CapaError::Sheet(format!("sheets: failed to parse response: {e}")))?;

        Ok(body.values.into_iter().map(to_strings).collect())
    }
}

fn to_strings(row: Vec<serde_json::Value>) -> Vec<String> {
    row.into_iter()
        .map(|cell| match cell {
            serde_json::Value::String(s) => s,
            serde_json::Value::Null => String::new(),
            other => other.to_string(),
        })
        .collect()
}

#[async_trait]
impl SheetSource for GoogleSheetsClient {
    async fn capa_rows(&self) -> Result<Vec<Vec<String>>, CapaError> {
        self.read_range(&self.capa_range).await
    }

    async fn directory_rows(&self) -> Result<Vec<Vec<String>>, CapaError> {
        self.read_range(&self.directory_range).await
    }
}

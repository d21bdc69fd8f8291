//! Google Sheets `values.get`.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Url;
use secrecy::ExposeSecret;
use serde::Deserialize;
use tracing::{error, info};

use super::{GoogleAuth, error_reason};
use crate::error::ProviderError;
use crate::providers::{Row, SecretProvider, SheetsRepository};

#[derive(Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Row>,
}

/// Read-only access to one spreadsheet whose id lives in the secret store.
pub struct GoogleSheetsRepository {
    http: reqwest::Client,
    auth: Arc<GoogleAuth>,
    secrets: Arc<dyn SecretProvider>,
    base_url: String,
    spreadsheet_id_key: String,
}

impl GoogleSheetsRepository {
    pub fn new(
        http: reqwest::Client,
        auth: Arc<GoogleAuth>,
        secrets: Arc<dyn SecretProvider>,
        base_url: &str,
        spreadsheet_id_key: String,
    ) -> Self {
        Self {
            http,
            auth,
            secrets,
            base_url: base_url.to_string(),
            spreadsheet_id_key,
        }
    }

    async fn try_fetch(&self, range: &str) -> Result<Vec<Row>, ProviderError> {
        let fetch = |reason: String| ProviderError::SheetFetch {
            range: range.to_string(),
            reason,
        };

        let spreadsheet_id = self.secrets.get_secret(&self.spreadsheet_id_key).await?;
        let token = self.auth.access_token().await?;

        let mut url = Url::parse(&self.base_url).map_err(|e| fetch(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| fetch(format!("{} cannot be a base URL", self.base_url)))?
            .pop_if_empty()
            .extend([
                "v4",
                "spreadsheets",
                spreadsheet_id.expose_secret(),
                "values",
                range,
            ]);

        let resp = self
            .http
            .get(url)
            .bearer_auth(token.expose_secret())
            .send()
            .await
            .map_err(|e| fetch(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(fetch(error_reason(resp).await));
        }

        let body: ValueRange = resp
            .json()
            .await
            .map_err(|e| fetch(format!("invalid response: {e}")))?;
        Ok(body.values)
    }
}

#[async_trait]
impl SheetsRepository for GoogleSheetsRepository {
    async fn fetch_sheet_data(&self, range: &str) -> Vec<Row> {
        match self.try_fetch(range).await {
            Ok(rows) => {
                if rows.is_empty() {
                    info!(range, "No data found in spreadsheet");
                }
                rows
            }
            Err(e) => {
                error!(range, error = %e, "Failed to fetch sheet data");
                Vec::new()
            }
        }
    }
}

//! Google Secret Manager.

use std::sync::Arc;

use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use super::{GoogleAuth, error_reason, trim_base};
use crate::error::ProviderError;
use crate::providers::SecretProvider;

#[derive(Deserialize)]
struct AccessResponse {
    payload: Payload,
}

#[derive(Deserialize)]
struct Payload {
    data: String,
}

/// Reads the `latest` version of each secret.
pub struct GoogleSecretProvider {
    http: reqwest::Client,
    auth: Arc<GoogleAuth>,
    base_url: String,
    project_id: String,
}

impl GoogleSecretProvider {
    pub fn new(
        http: reqwest::Client,
        auth: Arc<GoogleAuth>,
        base_url: &str,
        project_id: String,
    ) -> Self {
        Self {
            http,
            auth,
            base_url: trim_base(base_url),
            project_id,
        }
    }
}

#[async_trait]
impl SecretProvider for GoogleSecretProvider {
    async fn get_secret(&self, key: &str) -> Result<SecretString, ProviderError> {
        let access = |reason: String| ProviderError::SecretAccess {
            key: key.to_string(),
            reason,
        };

        let token = self.auth.access_token().await?;
        let url = format!(
            "{}/v1/projects/{}/secrets/{}/versions/latest:access",
            self.base_url, self.project_id, key
        );

        let resp = self
            .http
            .get(&url)
            .bearer_auth(token.expose_secret())
            .send()
            .await
            .map_err(|e| access(e.to_string()))?;

        match resp.status() {
            status if status.is_success() => {}
            StatusCode::NOT_FOUND => {
                return Err(ProviderError::SecretNotFound {
                    key: key.to_string(),
                });
            }
            _ => return Err(access(error_reason(resp).await)),
        }

        let body: AccessResponse = resp
            .json()
            .await
            .map_err(|e| access(format!("invalid response: {e}")))?;
        let bytes = BASE64
            .decode(body.payload.data.as_bytes())
            .map_err(|e| access(format!("payload is not base64: {e}")))?;
        let value =
            String::from_utf8(bytes).map_err(|e| access(format!("payload is not UTF-8: {e}")))?;

        tracing::debug!(key, "Secret resolved");
        Ok(SecretString::from(value))
    }
}

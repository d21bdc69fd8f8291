//! LINE Messaging API client (reply + push).

use std::sync::Arc;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use tokio::sync::OnceCell;
use tracing::{error, info};
use uuid::Uuid;

use super::{error_reason, trim_base};
use crate::error::ProviderError;
use crate::providers::{LineClient, SecretProvider};

/// Sends text messages with a channel access token read from the secret
/// store on first use.
pub struct LineMessagingClient {
    http: reqwest::Client,
    secrets: Arc<dyn SecretProvider>,
    base_url: String,
    access_token_key: String,
    access_token: OnceCell<SecretString>,
}

impl LineMessagingClient {
    pub fn new(
        http: reqwest::Client,
        secrets: Arc<dyn SecretProvider>,
        base_url: &str,
        access_token_key: String,
    ) -> Self {
        Self {
            http,
            secrets,
            base_url: trim_base(base_url),
            access_token_key,
            access_token: OnceCell::new(),
        }
    }

    async fn channel_access_token(&self) -> Result<&SecretString, ProviderError> {
        self.access_token
            .get_or_try_init(|| self.secrets.get_secret(&self.access_token_key))
            .await
    }

    async fn send(
        &self,
        operation: &str,
        path: &str,
        body: serde_json::Value,
        retry_key: Option<Uuid>,
    ) -> Result<(), ProviderError> {
        let failed = |reason: String| ProviderError::SendFailed {
            operation: operation.to_string(),
            reason,
        };

        let token = self.channel_access_token().await?;
        let mut request = self
            .http
            .post(format!("{}{path}", self.base_url))
            .bearer_auth(token.expose_secret())
            .json(&body);
        if let Some(key) = retry_key {
            request = request.header("X-Line-Retry-Key", key.to_string());
        }

        let resp = request.send().await.map_err(|e| failed(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(failed(error_reason(resp).await));
        }

        let request_id = resp
            .headers()
            .get("x-line-request-id")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("-")
            .to_string();
        info!(operation, request_id = %request_id, "LINE message sent");
        Ok(())
    }
}

fn text_messages(message: &str) -> serde_json::Value {
    json!([{ "type": "text", "text": message }])
}

#[async_trait]
impl LineClient for LineMessagingClient {
    async fn reply(&self, reply_token: &str, message: &str) -> Result<(), ProviderError> {
        let body = json!({
            "replyToken": reply_token,
            "messages": text_messages(message),
        });
        self.send("reply", "/v2/bot/message/reply", body, None)
            .await
            .inspect_err(|e| error!(error = %e, "Failed to reply message"))
    }

    async fn push(&self, to: &str, message: &str) -> Result<(), ProviderError> {
        let body = json!({
            "to": to,
            "messages": text_messages(message),
        });
        self.send("push", "/v2/bot/message/push", body, Some(Uuid::new_v4()))
            .await
            .inspect_err(|e| error!(to, error = %e, "Failed to push message"))
    }
}

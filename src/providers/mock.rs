//! Deterministic stand-ins for local development and tests.

use std::collections::HashMap;

use async_trait::async_trait;
use secrecy::SecretString;
use serde_json::json;
use tokio::sync::Mutex;
use tracing::info;

use super::{LineClient, Row, SecretProvider, SheetsRepository, SignatureVerifier};
use crate::error::ProviderError;

/// Fixed secret values keyed by the default secret names.
pub struct MockSecretProvider {
    secrets: HashMap<&'static str, &'static str>,
}

impl MockSecretProvider {
    pub fn new() -> Self {
        let secrets = HashMap::from([
            ("LINE_CHANNEL_ACCESS_TOKEN", "mock_line_channel_access_token"),
            ("LINE_CHANNEL_SECRET", "mock_line_channel_secret"),
            ("SPREADSHEET_ID", "mock_spreadsheet_id"),
            ("GOOGLE_CREDENTIALS_JSON", "{}"),
        ]);
        Self { secrets }
    }
}

impl Default for MockSecretProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SecretProvider for MockSecretProvider {
    async fn get_secret(&self, key: &str) -> Result<SecretString, ProviderError> {
        self.secrets
            .get(key)
            .map(|value| SecretString::from(value.to_string()))
            .ok_or_else(|| ProviderError::SecretNotFound {
                key: key.to_string(),
            })
    }
}

/// Returns the same two rows for every range.
pub struct MockSheetsRepository;

#[async_trait]
impl SheetsRepository for MockSheetsRepository {
    async fn fetch_sheet_data(&self, range: &str) -> Vec<Row> {
        info!(range, "Mock sheet fetch");
        vec![
            vec![json!("Header1"), json!("Header2")],
            vec![json!("Value1"), json!("Value2")],
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendKind {
    Reply,
    Push,
}

/// A message the mock client was asked to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub kind: SendKind,
    /// Reply token or recipient id.
    pub target: String,
    pub text: String,
}

/// Logs and records every send; never fails.
#[derive(Default)]
pub struct MockLineClient {
    sent: Mutex<Vec<SentMessage>>,
}

impl MockLineClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything sent so far, in call order.
    pub async fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().await.clone()
    }

    async fn record(&self, kind: SendKind, target: &str, text: &str) {
        self.sent.lock().await.push(SentMessage {
            kind,
            target: target.to_string(),
            text: text.to_string(),
        });
    }
}

#[async_trait]
impl LineClient for MockLineClient {
    async fn reply(&self, reply_token: &str, message: &str) -> Result<(), ProviderError> {
        info!(reply_token, message, "Mock reply");
        self.record(SendKind::Reply, reply_token, message).await;
        Ok(())
    }

    async fn push(&self, to: &str, message: &str) -> Result<(), ProviderError> {
        info!(to, message, "Mock push");
        self.record(SendKind::Push, to, message).await;
        Ok(())
    }
}

/// Accepts every signature.
pub struct MockSignatureVerifier;

#[async_trait]
impl SignatureVerifier for MockSignatureVerifier {
    async fn verify(&self, _body: &str, _signature: &str) -> bool {
        true
    }
}

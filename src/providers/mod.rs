//! External collaborators: secrets, spreadsheet rows, LINE messaging and
//! webhook signature verification.
//!
//! Each capability is a trait with a live (`cloud`) and a deterministic
//! (`mock`) implementation. [`Providers::from_config`] picks one per
//! capability at startup and the choice is fixed for the life of the process.

pub mod cloud;
pub mod mock;

use std::sync::Arc;

use async_trait::async_trait;
use secrecy::SecretString;

use crate::config::{AppConfig, ProviderMode};
use crate::error::{self, ConfigError, ProviderError};

pub use mock::{
    MockLineClient, MockSecretProvider, MockSheetsRepository, MockSignatureVerifier, SendKind,
    SentMessage,
};

/// One spreadsheet row: untyped cell values in column order.
pub type Row = Vec<serde_json::Value>;

/// Look up secret values by key.
#[async_trait]
pub trait SecretProvider: Send + Sync {
    /// Fails when the key is unset or unknown.
    async fn get_secret(&self, key: &str) -> Result<SecretString, ProviderError>;
}

/// Row-oriented read access to the spreadsheet.
#[async_trait]
pub trait SheetsRepository: Send + Sync {
    /// Rows in `range` (A1 notation). Any failure is logged and yields an
    /// empty vector; callers never see an error.
    async fn fetch_sheet_data(&self, range: &str) -> Vec<Row>;
}

/// LINE Messaging API.
#[async_trait]
pub trait LineClient: Send + Sync {
    /// Reply to an event using its single-use reply token.
    async fn reply(&self, reply_token: &str, message: &str) -> Result<(), ProviderError>;

    /// Send an unsolicited message to a user, group or room.
    async fn push(&self, to: &str, message: &str) -> Result<(), ProviderError>;
}

/// Checks the `X-Line-Signature` header against the raw request body.
#[async_trait]
pub trait SignatureVerifier: Send + Sync {
    async fn verify(&self, body: &str, signature: &str) -> bool;
}

/// The backend chosen for every capability.
#[derive(Clone)]
pub struct Providers {
    pub secrets: Arc<dyn SecretProvider>,
    pub sheets: Arc<dyn SheetsRepository>,
    pub line: Arc<dyn LineClient>,
    pub verifier: Arc<dyn SignatureVerifier>,
}

impl Providers {
    /// Instantiate one backend per capability according to the configured modes.
    ///
    /// Cloud backends that need credentials read them through the selected
    /// secret provider, so `cloud` sheets with `mock` secrets is a valid mix.
    pub fn from_config(config: &AppConfig) -> error::Result<Self> {
        let modes = config.providers;
        let http = reqwest::Client::new();

        let secrets: Arc<dyn SecretProvider> = match modes.secrets {
            ProviderMode::Cloud => {
                let project = config
                    .google_cloud_project
                    .clone()
                    .ok_or_else(|| ConfigError::MissingEnvVar("GOOGLE_CLOUD_PROJECT".into()))?;
                // Secret Manager itself always authenticates as the instance.
                let auth = Arc::new(cloud::GoogleAuth::new(
                    http.clone(),
                    &config.endpoints.metadata,
                ));
                Arc::new(cloud::GoogleSecretProvider::new(
                    http.clone(),
                    auth,
                    &config.endpoints.secret_manager,
                    project,
                ))
            }
            ProviderMode::Mock => Arc::new(MockSecretProvider::new()),
        };

        let sheets: Arc<dyn SheetsRepository> = match modes.sheets {
            ProviderMode::Cloud => Arc::new(cloud::GoogleSheetsRepository::new(
                http.clone(),
                Arc::new(cloud::GoogleAuth::with_credentials(
                    http.clone(),
                    &config.endpoints.metadata,
                    Arc::clone(&secrets),
                    config.secret_keys.google_credentials.clone(),
                    cloud::SHEETS_READONLY_SCOPE,
                )),
                Arc::clone(&secrets),
                &config.endpoints.sheets_api,
                config.secret_keys.spreadsheet_id.clone(),
            )),
            ProviderMode::Mock => Arc::new(MockSheetsRepository),
        };

        let line: Arc<dyn LineClient> = match modes.line {
            ProviderMode::Cloud => Arc::new(cloud::LineMessagingClient::new(
                http,
                Arc::clone(&secrets),
                &config.endpoints.line_api,
                config.secret_keys.channel_access_token.clone(),
            )),
            ProviderMode::Mock => Arc::new(MockLineClient::new()),
        };

        let verifier: Arc<dyn SignatureVerifier> = match modes.signature {
            ProviderMode::Cloud => Arc::new(cloud::LineSignatureVerifier::new(
                Arc::clone(&secrets),
                config.secret_keys.channel_secret.clone(),
            )),
            ProviderMode::Mock => Arc::new(MockSignatureVerifier),
        };

        tracing::info!(
            secrets = %modes.secrets,
            sheets = %modes.sheets,
            line = %modes.line,
            signature = %modes.signature,
            "Providers selected"
        );

        Ok(Self {
            secrets,
            sheets,
            line,
            verifier,
        })
    }
}

//! OAuth access tokens for Google APIs.
//!
//! Tokens come either from a service-account key kept in the secret store
//! (an RS256-signed JWT assertion exchanged at the key's `token_uri`) or from
//! the GCE / Cloud Run metadata server. Either way they are cached until
//! shortly before expiry.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, OnceCell};
use tracing::{debug, info, warn};

use super::{error_reason, trim_base};
use crate::error::ProviderError;
use crate::providers::SecretProvider;

const TOKEN_PATH: &str = "/computeMetadata/v1/instance/service-accounts/default/token";

/// Tokens are refreshed this long before they actually expire.
const REFRESH_MARGIN: Duration = Duration::from_secs(60);

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Google caps assertion lifetime at one hour.
const ASSERTION_LIFETIME_SECS: i64 = 3600;

pub const SHEETS_READONLY_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets.readonly";

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

struct CachedToken {
    token: String,
    refresh_at: Instant,
}

/// The fields of a service-account key file that the token exchange needs.
#[derive(Deserialize)]
struct ServiceAccountKey {
    #[serde(rename = "type")]
    key_type: String,
    client_email: String,
    private_key: String,
    token_uri: String,
}

impl ServiceAccountKey {
    /// `None` unless `raw` is a service-account key file.
    fn parse(raw: &str) -> Option<Self> {
        serde_json::from_str::<Self>(raw)
            .ok()
            .filter(|key| key.key_type == "service_account")
    }
}

#[derive(Serialize)]
struct Claims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

enum TokenSource {
    Metadata,
    ServiceAccount(ServiceAccountKey),
}

/// Where to look for a service-account key.
struct StoredCredentials {
    secrets: Arc<dyn SecretProvider>,
    key: String,
}

pub struct GoogleAuth {
    http: reqwest::Client,
    metadata_url: String,
    scope: String,
    credentials: Option<StoredCredentials>,
    source: OnceCell<TokenSource>,
    cached: Mutex<Option<CachedToken>>,
}

impl GoogleAuth {
    /// Default credentials of the instance, from the metadata server.
    pub fn new(http: reqwest::Client, metadata_base: &str) -> Self {
        Self {
            http,
            metadata_url: format!("{}{TOKEN_PATH}", trim_base(metadata_base)),
            scope: String::new(),
            credentials: None,
            source: OnceCell::new(),
            cached: Mutex::new(None),
        }
    }

    /// Prefer the service-account key stored under `credentials_key`.
    ///
    /// A missing secret or one that is not a service-account key falls back
    /// to the metadata server. The choice is made on first use and kept.
    pub fn with_credentials(
        http: reqwest::Client,
        metadata_base: &str,
        secrets: Arc<dyn SecretProvider>,
        credentials_key: String,
        scope: &str,
    ) -> Self {
        Self {
            scope: scope.to_string(),
            credentials: Some(StoredCredentials {
                secrets,
                key: credentials_key,
            }),
            ..Self::new(http, metadata_base)
        }
    }

    /// A bearer token for Google APIs.
    pub async fn access_token(&self) -> Result<SecretString, ProviderError> {
        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref() {
            if Instant::now() < token.refresh_at {
                return Ok(SecretString::from(token.token.clone()));
            }
        }

        let fresh = match self.source().await? {
            TokenSource::Metadata => self.fetch_from_metadata().await?,
            TokenSource::ServiceAccount(key) => self.fetch_with_key(key).await?,
        };
        debug!(expires_in = fresh.expires_in, "Fetched Google access token");

        let token = SecretString::from(fresh.access_token.clone());
        *cached = refresh_deadline(Instant::now(), fresh.expires_in).map(|refresh_at| {
            CachedToken {
                token: fresh.access_token,
                refresh_at,
            }
        });
        Ok(token)
    }

    async fn source(&self) -> Result<&TokenSource, ProviderError> {
        self.source
            .get_or_try_init(|| async {
                let Some(stored) = &self.credentials else {
                    return Ok(TokenSource::Metadata);
                };
                match stored.secrets.get_secret(&stored.key).await {
                    Ok(raw) => match ServiceAccountKey::parse(raw.expose_secret()) {
                        Some(key) => {
                            info!(client_email = %key.client_email, "Using service-account credentials");
                            Ok(TokenSource::ServiceAccount(key))
                        }
                        None => {
                            warn!(
                                key = %stored.key,
                                "Credentials secret is not a service-account key, using metadata server"
                            );
                            Ok(TokenSource::Metadata)
                        }
                    },
                    Err(ProviderError::SecretNotFound { .. }) => {
                        debug!(key = %stored.key, "No stored credentials, using metadata server");
                        Ok(TokenSource::Metadata)
                    }
                    Err(e) => Err(e),
                }
            })
            .await
    }

    async fn fetch_from_metadata(&self) -> Result<TokenResponse, ProviderError> {
        let resp = self
            .http
            .get(&self.metadata_url)
            .header("Metadata-Flavor", "Google")
            .send()
            .await
            .map_err(|e| auth_error(e.to_string()))?;
        read_token(resp).await
    }

    async fn fetch_with_key(&self, key: &ServiceAccountKey) -> Result<TokenResponse, ProviderError> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            iss: &key.client_email,
            scope: &self.scope,
            aud: &key.token_uri,
            iat: now,
            exp: now + ASSERTION_LIFETIME_SECS,
        };
        let signing_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
            .map_err(|e| auth_error(format!("invalid service-account private key: {e}")))?;
        let assertion = jsonwebtoken::encode(&Header::new(Algorithm::RS256), &claims, &signing_key)
            .map_err(|e| auth_error(format!("failed to sign assertion: {e}")))?;

        let resp = self
            .http
            .post(&key.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await
            .map_err(|e| auth_error(e.to_string()))?;
        read_token(resp).await
    }
}

fn auth_error(reason: String) -> ProviderError {
    ProviderError::Auth { reason }
}

async fn read_token(resp: reqwest::Response) -> Result<TokenResponse, ProviderError> {
    if !resp.status().is_success() {
        return Err(auth_error(error_reason(resp).await));
    }
    resp.json()
        .await
        .map_err(|e| auth_error(format!("invalid token response: {e}")))
}

/// When a token issued at `now` should be replaced. `None` means the
/// lifetime doesn't fit in an `Instant`; such a token is not cached.
fn refresh_deadline(now: Instant, expires_in: u64) -> Option<Instant> {
    now.checked_add(Duration::from_secs(expires_in).saturating_sub(REFRESH_MARGIN))
}

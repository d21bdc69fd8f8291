//! `X-Line-Signature` verification: base64(HMAC-SHA256(channel secret, body)).

use std::sync::Arc;

use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use tokio::sync::OnceCell;
use tracing::error;

use crate::error::ProviderError;
use crate::providers::{SecretProvider, SignatureVerifier};

type HmacSha256 = Hmac<Sha256>;

/// Constant-time check of `signature` against the body's HMAC.
pub fn verify_signature(channel_secret: &[u8], body: &[u8], signature: &str) -> bool {
    let Ok(expected) = BASE64.decode(signature.trim()) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(channel_secret) else {
        return false;
    };
    mac.update(body);
    mac.verify_slice(&expected).is_ok()
}

/// Verifies with the channel secret from the secret store.
pub struct LineSignatureVerifier {
    secrets: Arc<dyn SecretProvider>,
    channel_secret_key: String,
    channel_secret: OnceCell<SecretString>,
}

impl LineSignatureVerifier {
    pub fn new(secrets: Arc<dyn SecretProvider>, channel_secret_key: String) -> Self {
        Self {
            secrets,
            channel_secret_key,
            channel_secret: OnceCell::new(),
        }
    }

    async fn channel_secret(&self) -> Result<&SecretString, ProviderError> {
        self.channel_secret
            .get_or_try_init(|| self.secrets.get_secret(&self.channel_secret_key))
            .await
    }
}

#[async_trait]
impl SignatureVerifier for LineSignatureVerifier {
    async fn verify(&self, body: &str, signature: &str) -> bool {
        match self.channel_secret().await {
            Ok(secret) => verify_signature(
                secret.expose_secret().as_bytes(),
                body.as_bytes(),
                signature,
            ),
            Err(e) => {
                error!(error = %e, "Failed to verify signature");
                false
            }
        }
    }
}

//! Live backends: Google Secret Manager, Google Sheets and the LINE
//! Messaging API, all over plain HTTPS via reqwest.

mod google_auth;
mod line;
mod secret_manager;
mod sheets;
mod signature;

pub use google_auth::{GoogleAuth, SHEETS_READONLY_SCOPE};
pub use line::LineMessagingClient;
pub use secret_manager::GoogleSecretProvider;
pub use sheets::GoogleSheetsRepository;
pub use signature::{LineSignatureVerifier, verify_signature};

/// Strip trailing slashes so paths can be appended with `format!`.
fn trim_base(base: &str) -> String {
    base.trim_end_matches('/').to_string()
}

/// Read a non-2xx response into a short error reason.
async fn error_reason(resp: reqwest::Response) -> String {
    let status = resp.status();
    let body = resp.text().await.unwrap_or_default();
    if body.is_empty() {
        status.to_string()
    } else {
        format!("{status}: {body}")
    }
}

//! HTTP surface: LINE webhook, push trigger and health check.

use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{State, rejection::BytesRejection},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;
use tracing::{error, warn};

use crate::error::WebhookError;
use crate::service::LineBotService;

pub const SIGNATURE_HEADER: &str = "x-line-signature";

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<LineBotService>,
    /// Reported by `/health`.
    pub name: String,
}

/// Build the Axum router for the bot.
pub fn app_routes(service: Arc<LineBotService>, name: impl Into<String>) -> Router {
    let state = AppState {
        service,
        name: name.into(),
    };

    Router::new()
        .route("/webhook", post(webhook))
        .route("/push", post(push))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ── Health ──────────────────────────────────────────────────────────────

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": state.name,
    }))
}

// ── Webhook ─────────────────────────────────────────────────────────────

async fn webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> (StatusCode, &'static str) {
    let Some(signature) = headers.get(SIGNATURE_HEADER) else {
        warn!("Webhook without signature header");
        return (StatusCode::BAD_REQUEST, "Missing X-Line-Signature header.");
    };
    // A non-ASCII header can't be a valid base64 signature.
    let signature = signature.to_str().unwrap_or_default();

    let body = match body.map(|b| String::from_utf8(b.to_vec())) {
        Ok(Ok(body)) => body,
        Ok(Err(e)) => {
            error!(error = %e, "Webhook body is not UTF-8");
            return (StatusCode::INTERNAL_SERVER_ERROR, "Failed to receive request body.");
        }
        Err(e) => {
            error!(error = %e, "Failed to read webhook body");
            return (StatusCode::INTERNAL_SERVER_ERROR, "Failed to receive request body.");
        }
    };

    match state.service.handle_webhook(&body, signature).await {
        // Reply processing continues in the background.
        Ok(_) => (StatusCode::OK, "OK"),
        Err(WebhookError::InvalidSignature) => (StatusCode::UNAUTHORIZED, "Invalid signature."),
        Err(WebhookError::Parse(_)) => {
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
        }
    }
}

// ── Push ────────────────────────────────────────────────────────────────

async fn push(State(state): State<AppState>) -> (StatusCode, &'static str) {
    match state.service.execute_scheduled_push().await {
        Ok(_) => (StatusCode::OK, "OK"),
        Err(e) => {
            error!(error = %e, "Scheduled push failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to execute scheduled push.")
        }
    }
}

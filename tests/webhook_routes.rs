//! Integration tests for the webhook / push HTTP surface.
//!
//! Each test spins up an Axum server on a random port backed by the mock
//! providers (plus a real HMAC signature check) and talks to it over HTTP.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use hmac::{Hmac, Mac};
use serde_json::{Value, json};
use sha2::Sha256;
use tokio::net::TcpListener;
use tokio::time::timeout;

use line_agent::config::AppConfig;
use line_agent::error::ProviderError;
use line_agent::providers::cloud::LineSignatureVerifier;
use line_agent::providers::{LineClient, MockLineClient, Providers, SendKind, SentMessage};
use line_agent::routes::app_routes;
use line_agent::service::LineBotService;

/// Maximum time any test is allowed to run before we consider it hung.
const TEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Channel secret held by the mock secret provider.
const CHANNEL_SECRET: &str = "mock_line_channel_secret";

/// LINE client whose every send fails.
struct DownLine;

#[async_trait]
impl LineClient for DownLine {
    async fn reply(&self, _token: &str, _message: &str) -> Result<(), ProviderError> {
        Err(ProviderError::SendFailed {
            operation: "reply".into(),
            reason: "503 Service Unavailable".into(),
        })
    }

    async fn push(&self, _to: &str, _message: &str) -> Result<(), ProviderError> {
        Err(ProviderError::SendFailed {
            operation: "push".into(),
            reason: "503 Service Unavailable".into(),
        })
    }
}

/// Start an Axum server on a random port, return its base URL.
async fn start_server(line: Arc<dyn LineClient>) -> String {
    let config = AppConfig::mock();
    let mut providers = Providers::from_config(&config).unwrap();
    providers.verifier = Arc::new(LineSignatureVerifier::new(
        Arc::clone(&providers.secrets),
        config.secret_keys.channel_secret.clone(),
    ));
    providers.line = line;
    let service = Arc::new(LineBotService::new(&providers, config.ranges));
    let app = app_routes(service, "line-agent-it");

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    // Give the server a moment to start accepting connections.
    tokio::time::sleep(Duration::from_millis(50)).await;

    format!("http://127.0.0.1:{port}")
}

fn sign(body: &str) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(CHANNEL_SECRET.as_bytes()).unwrap();
    mac.update(body.as_bytes());
    BASE64.encode(mac.finalize().into_bytes())
}

fn text_event(source: Value) -> Value {
    json!({
        "type": "message",
        "replyToken": "reply-token-1",
        "source": source,
        "timestamp": 1700000000000i64,
        "mode": "active",
        "webhookEventId": "01HEVENT",
        "deliveryContext": { "isRedelivery": false },
        "message": { "id": "m1", "type": "text", "text": "hi" }
    })
}

fn envelope(events: Value) -> String {
    json!({ "destination": "Ubot", "events": events }).to_string()
}

async fn post_webhook(base: &str, body: &str, signature: Option<&str>) -> (u16, String) {
    let mut request = reqwest::Client::new()
        .post(format!("{base}/webhook"))
        .body(body.to_string());
    if let Some(signature) = signature {
        request = request.header("X-Line-Signature", signature);
    }
    let resp = request.send().await.unwrap();
    (resp.status().as_u16(), resp.text().await.unwrap())
}

/// Poll the mock client until `n` messages were sent.
async fn wait_for_sent(line: &MockLineClient, n: usize) -> Vec<SentMessage> {
    loop {
        let sent = line.sent().await;
        if sent.len() >= n {
            return sent;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}

// ── Webhook ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn signed_text_message_is_answered_in_background() {
    timeout(TEST_TIMEOUT, async {
        let line = Arc::new(MockLineClient::new());
        let base = start_server(line.clone()).await;

        let body = envelope(json!([text_event(json!({"type": "user", "userId": "U1"}))]));
        let (status, text) = post_webhook(&base, &body, Some(&sign(&body))).await;
        assert_eq!((status, text.as_str()), (200, "OK"));

        let sent = wait_for_sent(&line, 1).await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].kind, SendKind::Reply);
        assert_eq!(sent[0].target, "reply-token-1");
        assert_eq!(sent[0].text, "Header1\n\nUserId: U1");
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn missing_signature_header_is_400() {
    timeout(TEST_TIMEOUT, async {
        let line = Arc::new(MockLineClient::new());
        let base = start_server(line.clone()).await;

        let body = envelope(json!([]));
        let (status, text) = post_webhook(&base, &body, None).await;
        assert_eq!(status, 400);
        assert_eq!(text, "Missing X-Line-Signature header.");
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn wrong_signature_is_401_and_sends_nothing() {
    timeout(TEST_TIMEOUT, async {
        let line = Arc::new(MockLineClient::new());
        let base = start_server(line.clone()).await;

        let body = envelope(json!([text_event(json!({"type": "user", "userId": "U1"}))]));
        let tampered = sign(&format!("{body} "));
        let (status, text) = post_webhook(&base, &body, Some(&tampered)).await;
        assert_eq!((status, text.as_str()), (401, "Invalid signature."));

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(line.sent().await.is_empty());
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn signed_garbage_is_500() {
    timeout(TEST_TIMEOUT, async {
        let base = start_server(Arc::new(MockLineClient::new())).await;

        let body = "{not json";
        let (status, text) = post_webhook(&base, body, Some(&sign(body))).await;
        assert_eq!((status, text.as_str()), (500, "Internal Server Error"));
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn group_message_without_mention_is_accepted_silently() {
    timeout(TEST_TIMEOUT, async {
        let line = Arc::new(MockLineClient::new());
        let base = start_server(line.clone()).await;

        let group = json!({"type": "group", "groupId": "G1", "userId": "U1"});
        let body = envelope(json!([text_event(group)]));
        let (status, _) = post_webhook(&base, &body, Some(&sign(&body))).await;
        assert_eq!(status, 200);

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(line.sent().await.is_empty());
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn failed_reply_does_not_change_webhook_response() {
    timeout(TEST_TIMEOUT, async {
        let base = start_server(Arc::new(DownLine)).await;

        let body = envelope(json!([text_event(json!({"type": "user", "userId": "U1"}))]));
        let (status, text) = post_webhook(&base, &body, Some(&sign(&body))).await;
        assert_eq!((status, text.as_str()), (200, "OK"));
    })
    .await
    .expect("test timed out");
}

// ── Push ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn push_sends_every_row() {
    timeout(TEST_TIMEOUT, async {
        let line = Arc::new(MockLineClient::new());
        let base = start_server(line.clone()).await;

        let resp = reqwest::Client::new()
            .post(format!("{base}/push"))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status().as_u16(), 200);
        assert_eq!(resp.text().await.unwrap(), "OK");

        let sent = line.sent().await;
        let pushes: Vec<_> = sent
            .iter()
            .map(|s| (s.kind, s.target.as_str(), s.text.as_str()))
            .collect();
        assert_eq!(
            pushes,
            [
                (SendKind::Push, "Header1", "Header2"),
                (SendKind::Push, "Value1", "Value2"),
            ]
        );
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn push_failure_is_500() {
    timeout(TEST_TIMEOUT, async {
        let base = start_server(Arc::new(DownLine)).await;

        let resp = reqwest::Client::new()
            .post(format!("{base}/push"))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status().as_u16(), 500);
        assert_eq!(resp.text().await.unwrap(), "Failed to execute scheduled push.");
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn health_endpoint() {
    timeout(TEST_TIMEOUT, async {
        let base = start_server(Arc::new(MockLineClient::new())).await;

        let resp = reqwest::get(format!("{base}/health")).await.unwrap();
        assert_eq!(resp.status().as_u16(), 200);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["status"], "ok");
        assert_eq!(body["service"], "line-agent-it");
    })
    .await
    .expect("test timed out");
}

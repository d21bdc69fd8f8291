//! Error types for LINE Agent.

/// Top-level error type for the agent.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Webhook error: {0}")]
    Webhook(#[from] WebhookError),

    #[error("Push error: {0}")]
    Push(#[from] PushError),

    #[error("Server error: {0}")]
    Server(#[from] std::io::Error),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Failures of the external backends (secrets, sheets, messaging).
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("Secret `{key}` not found")]
    SecretNotFound { key: String },

    #[error("Failed to access secret `{key}`: {reason}")]
    SecretAccess { key: String, reason: String },

    #[error("Failed to obtain access token: {reason}")]
    Auth { reason: String },

    #[error("Failed to fetch sheet range {range}: {reason}")]
    SheetFetch { range: String, reason: String },

    #[error("LINE {operation} failed: {reason}")]
    SendFailed { operation: String, reason: String },
}

/// Request-level webhook rejections.
#[derive(Debug, thiserror::Error)]
pub enum WebhookError {
    #[error("Invalid signature.")]
    InvalidSignature,

    #[error("Failed to parse webhook event: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Aggregate outcome of a push batch.
#[derive(Debug, thiserror::Error)]
pub enum PushError {
    #[error("Push notifications completed with errors. Failed: {failed} / Total: {total}")]
    PartialFailure { failed: usize, total: usize },
}

/// Result type alias for the agent.
pub type Result<T> = std::result::Result<T, Error>;

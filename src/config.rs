//! Configuration types.
//!
//! Everything is read from environment variables at startup. `from_lookup`
//! takes any key → value function so tests don't have to touch the process
//! environment.

use std::fmt;
use std::str::FromStr;

use crate::error::ConfigError;

/// Which backend implements a capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderMode {
    /// Live cloud service (needs credentials and network).
    Cloud,
    /// Deterministic in-process stand-in.
    Mock,
}

impl FromStr for ProviderMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cloud" => Ok(Self::Cloud),
            "mock" => Ok(Self::Mock),
            other => Err(format!("unknown provider mode `{other}` (expected cloud or mock)")),
        }
    }
}

impl fmt::Display for ProviderMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cloud => write!(f, "cloud"),
            Self::Mock => write!(f, "mock"),
        }
    }
}

/// Provider mode per capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProviderModes {
    pub secrets: ProviderMode,
    pub sheets: ProviderMode,
    pub line: ProviderMode,
    pub signature: ProviderMode,
}

/// Names of the secrets the cloud backends look up.
#[derive(Debug, Clone)]
pub struct SecretKeys {
    pub spreadsheet_id: String,
    pub channel_access_token: String,
    pub channel_secret: String,
    /// Service-account key JSON for the Sheets API.
    pub google_credentials: String,
}

impl Default for SecretKeys {
    fn default() -> Self {
        Self {
            spreadsheet_id: "SPREADSHEET_ID".to_string(),
            channel_access_token: "LINE_CHANNEL_ACCESS_TOKEN".to_string(),
            channel_secret: "LINE_CHANNEL_SECRET".to_string(),
            google_credentials: "GOOGLE_CREDENTIALS_JSON".to_string(),
        }
    }
}

/// Spreadsheet ranges (A1 notation, two columns each).
#[derive(Debug, Clone)]
pub struct SheetRanges {
    /// Push source: recipient id, message.
    pub push: String,
    /// Webhook reply content.
    pub webhook: String,
}

impl Default for SheetRanges {
    fn default() -> Self {
        Self {
            push: "Sheet1!A:B".to_string(),
            webhook: "Sheet1!C:D".to_string(),
        }
    }
}

/// Base URLs of the external APIs. Overridable so tests can point them at
/// local stub servers.
#[derive(Debug, Clone)]
pub struct Endpoints {
    pub line_api: String,
    pub sheets_api: String,
    pub secret_manager: String,
    pub metadata: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            line_api: "https://api.line.me".to_string(),
            sheets_api: "https://sheets.googleapis.com".to_string(),
            secret_manager: "https://secretmanager.googleapis.com".to_string(),
            metadata: "http://metadata.google.internal".to_string(),
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Bot application identity name.
    pub name: String,
    /// HTTP listen port.
    pub port: u16,
    pub providers: ProviderModes,
    /// Google Cloud project for Secret Manager (only needed in cloud mode).
    pub google_cloud_project: Option<String>,
    pub secret_keys: SecretKeys,
    pub ranges: SheetRanges,
    /// Optional cron expression for the in-process push trigger.
    pub push_schedule: Option<cron::Schedule>,
    pub endpoints: Endpoints,
}

impl AppConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let name = var("LINE_AGENT_NAME").unwrap_or_else(|| "line-agent".to_string());

        let port: u16 = match var("LINE_AGENT_PORT").or_else(|| var("PORT")) {
            Some(raw) => raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
                key: "LINE_AGENT_PORT".into(),
                message: format!("`{raw}` is not a valid port"),
            })?,
            None => 8080,
        };

        let secrets = required_mode(&var, "LINE_AGENT_SECRET_PROVIDER")?;
        let sheets = required_mode(&var, "LINE_AGENT_SHEETS_PROVIDER")?;
        let line = required_mode(&var, "LINE_AGENT_LINE_PROVIDER")?;
        let signature = match var("LINE_AGENT_SIGNATURE_PROVIDER") {
            Some(raw) => parse_mode("LINE_AGENT_SIGNATURE_PROVIDER", &raw)?,
            None => line,
        };

        let google_cloud_project = var("GOOGLE_CLOUD_PROJECT");
        if secrets == ProviderMode::Cloud && google_cloud_project.is_none() {
            return Err(ConfigError::MissingEnvVar("GOOGLE_CLOUD_PROJECT".into()));
        }

        let key_defaults = SecretKeys::default();
        let secret_keys = SecretKeys {
            spreadsheet_id: var("LINE_AGENT_SPREADSHEET_ID_KEY")
                .unwrap_or(key_defaults.spreadsheet_id),
            channel_access_token: var("LINE_AGENT_CHANNEL_ACCESS_TOKEN_KEY")
                .unwrap_or(key_defaults.channel_access_token),
            channel_secret: var("LINE_AGENT_CHANNEL_SECRET_KEY")
                .unwrap_or(key_defaults.channel_secret),
            google_credentials: var("LINE_AGENT_GOOGLE_CREDENTIALS_KEY")
                .unwrap_or(key_defaults.google_credentials),
        };

        let range_defaults = SheetRanges::default();
        let ranges = SheetRanges {
            push: var("LINE_AGENT_PUSH_RANGE").unwrap_or(range_defaults.push),
            webhook: var("LINE_AGENT_WEBHOOK_RANGE").unwrap_or(range_defaults.webhook),
        };

        let push_schedule = match var("LINE_AGENT_PUSH_SCHEDULE") {
            Some(raw) => Some(cron::Schedule::from_str(raw.trim()).map_err(|e| {
                ConfigError::InvalidValue {
                    key: "LINE_AGENT_PUSH_SCHEDULE".into(),
                    message: format!("invalid cron: {e}"),
                }
            })?),
            None => None,
        };

        let endpoint_defaults = Endpoints::default();
        let endpoints = Endpoints {
            line_api: var("LINE_API_BASE_URL").unwrap_or(endpoint_defaults.line_api),
            sheets_api: var("SHEETS_API_BASE_URL").unwrap_or(endpoint_defaults.sheets_api),
            secret_manager: var("SECRET_MANAGER_BASE_URL")
                .unwrap_or(endpoint_defaults.secret_manager),
            metadata: var("GCE_METADATA_BASE_URL").unwrap_or(endpoint_defaults.metadata),
        };

        Ok(Self {
            name,
            port,
            providers: ProviderModes {
                secrets,
                sheets,
                line,
                signature,
            },
            google_cloud_project,
            secret_keys,
            ranges,
            push_schedule,
            endpoints,
        })
    }

    /// All-mock configuration for local development and tests.
    pub fn mock() -> Self {
        Self {
            name: "line-agent".to_string(),
            port: 8080,
            providers: ProviderModes {
                secrets: ProviderMode::Mock,
                sheets: ProviderMode::Mock,
                line: ProviderMode::Mock,
                signature: ProviderMode::Mock,
            },
            google_cloud_project: None,
            secret_keys: SecretKeys::default(),
            ranges: SheetRanges::default(),
            push_schedule: None,
            endpoints: Endpoints::default(),
        }
    }
}

fn required_mode<F>(var: &F, key: &str) -> Result<ProviderMode, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let raw = var(key).ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))?;
    parse_mode(key, &raw)
}

fn parse_mode(key: &str, raw: &str) -> Result<ProviderMode, ConfigError> {
    raw.parse().map_err(|message| ConfigError::InvalidValue {
        key: key.to_string(),
        message,
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    fn mock_modes() -> Vec<(&'static str, &'static str)> {
        vec![
            ("LINE_AGENT_SECRET_PROVIDER", "mock"),
            ("LINE_AGENT_SHEETS_PROVIDER", "mock"),
            ("LINE_AGENT_LINE_PROVIDER", "mock"),
        ]
    }

    #[test]
    fn defaults_applied() {
        let config = AppConfig::from_lookup(lookup(&mock_modes())).unwrap();
        assert_eq!(config.name, "line-agent");
        assert_eq!(config.port, 8080);
        assert_eq!(config.ranges.push, "Sheet1!A:B");
        assert_eq!(config.ranges.webhook, "Sheet1!C:D");
        assert_eq!(config.secret_keys.channel_secret, "LINE_CHANNEL_SECRET");
        assert_eq!(config.secret_keys.google_credentials, "GOOGLE_CREDENTIALS_JSON");
        assert_eq!(config.endpoints.line_api, "https://api.line.me");
        assert!(config.push_schedule.is_none());
    }

    #[test]
    fn signature_mode_follows_line_mode() {
        let mut pairs = mock_modes();
        pairs[2] = ("LINE_AGENT_LINE_PROVIDER", "cloud");
        let config = AppConfig::from_lookup(lookup(&pairs)).unwrap();
        assert_eq!(config.providers.line, ProviderMode::Cloud);
        assert_eq!(config.providers.signature, ProviderMode::Cloud);
    }

    #[test]
    fn mode_is_case_insensitive() {
        assert_eq!("CLOUD".parse::<ProviderMode>(), Ok(ProviderMode::Cloud));
        assert_eq!("Mock".parse::<ProviderMode>(), Ok(ProviderMode::Mock));
        assert!("local".parse::<ProviderMode>().is_err());
    }

    #[test]
    fn missing_mode_is_an_error() {
        let err = AppConfig::from_lookup(lookup(&[("LINE_AGENT_SECRET_PROVIDER", "mock")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(ref k) if k == "LINE_AGENT_SHEETS_PROVIDER"));
    }

    #[test]
    fn invalid_mode_is_an_error() {
        let mut pairs = mock_modes();
        pairs.push(("LINE_AGENT_SIGNATURE_PROVIDER", "sometimes"));
        let err = AppConfig::from_lookup(lookup(&pairs)).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn cloud_secrets_require_project() {
        let mut pairs = mock_modes();
        pairs[0] = ("LINE_AGENT_SECRET_PROVIDER", "cloud");
        let err = AppConfig::from_lookup(lookup(&pairs)).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(ref k) if k == "GOOGLE_CLOUD_PROJECT"));

        pairs.push(("GOOGLE_CLOUD_PROJECT", "my-project"));
        let config = AppConfig::from_lookup(lookup(&pairs)).unwrap();
        assert_eq!(config.google_cloud_project.as_deref(), Some("my-project"));
    }

    #[test]
    fn port_falls_back_to_platform_port() {
        let mut pairs = mock_modes();
        pairs.push(("PORT", "9090"));
        let config = AppConfig::from_lookup(lookup(&pairs)).unwrap();
        assert_eq!(config.port, 9090);

        pairs.push(("LINE_AGENT_PORT", "not-a-port"));
        assert!(AppConfig::from_lookup(lookup(&pairs)).is_err());
    }

    #[test]
    fn push_schedule_parsed() {
        let mut pairs = mock_modes();
        pairs.push(("LINE_AGENT_PUSH_SCHEDULE", "0 0 9 * * *"));
        let config = AppConfig::from_lookup(lookup(&pairs)).unwrap();
        assert!(config.push_schedule.is_some());

        pairs.pop();
        pairs.push(("LINE_AGENT_PUSH_SCHEDULE", "not a cron"));
        assert!(AppConfig::from_lookup(lookup(&pairs)).is_err());
    }

    #[test]
    fn custom_ranges() {
        let mut pairs = mock_modes();
        pairs.push(("LINE_AGENT_PUSH_RANGE", "Notifications!A2:B"));
        let config = AppConfig::from_lookup(lookup(&pairs)).unwrap();
        assert_eq!(config.ranges.push, "Notifications!A2:B");
        assert_eq!(config.ranges.webhook, "Sheet1!C:D");
    }
}

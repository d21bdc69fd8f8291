//! Webhook request body.

use serde::{Deserialize, Serialize};

use super::types::{EventType, MessageType, SourceType};

/// Top-level webhook payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookEnvelope {
    /// User ID of the bot that should receive the events.
    pub destination: String,
    #[serde(default)]
    pub events: Vec<Event>,
}

impl WebhookEnvelope {
    pub fn parse(body: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(body)
    }
}

/// A single webhook event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    #[serde(rename = "type", default)]
    pub event_type: EventType,
    #[serde(default)]
    pub reply_token: Option<String>,
    #[serde(default)]
    pub source: Option<Source>,
    #[serde(default)]
    pub message: Option<Message>,
    /// Milliseconds since the epoch.
    pub timestamp: i64,
    /// Channel mode, `active` or `standby`.
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(default)]
    pub webhook_event_id: Option<String>,
    #[serde(default)]
    pub delivery_context: DeliveryContext,
}

impl Event {
    pub fn is_redelivery(&self) -> bool {
        self.delivery_context.is_redelivery
    }

    pub fn source_type(&self) -> SourceType {
        self.source
            .as_ref()
            .map_or(SourceType::Unknown, |s| s.source_type)
    }

    pub fn message_type(&self) -> MessageType {
        self.message
            .as_ref()
            .map_or(MessageType::Unknown, |m| m.message_type)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryContext {
    #[serde(default)]
    pub is_redelivery: bool,
}

/// The user, group or room an event came from.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Source {
    #[serde(rename = "type", default)]
    pub source_type: SourceType,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub group_id: Option<String>,
    #[serde(default)]
    pub room_id: Option<String>,
}

impl Source {
    /// Human-readable identifier, e.g. `UserId: U123`.
    pub fn describe(&self) -> String {
        let (label, id) = match self.source_type {
            SourceType::User => ("UserId", &self.user_id),
            SourceType::Group => ("GroupId", &self.group_id),
            SourceType::Room => ("RoomId", &self.room_id),
            SourceType::Unknown => return "Unknown source".to_string(),
        };
        format!("{label}: {}", id.as_deref().unwrap_or("-"))
    }
}

/// Message object attached to `message` events.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    #[serde(rename = "type", default)]
    pub message_type: MessageType,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub mention: Option<Mention>,
}

impl Message {
    /// Whether `user_id` appears among the mentionees.
    pub fn mentions(&self, user_id: &str) -> bool {
        self.mention
            .as_ref()
            .is_some_and(|m| m.mentionees.iter().any(|e| e.user_id.as_deref() == Some(user_id)))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mention {
    #[serde(default)]
    pub mentionees: Vec<Mentionee>,
}

/// One @-mention: a character span and the user it refers to.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mentionee {
    pub index: u32,
    pub length: u32,
    /// Absent for `@All` mentions.
    #[serde(default)]
    pub user_id: Option<String>,
}

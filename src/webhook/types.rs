//! Closed wire-type enumerations for webhook payloads.
//!
//! Every family resolves raw strings the same way: exact, case-sensitive
//! match against the known values, anything else (including a missing or
//! null value) becomes `Unknown`. Decoding never fails on a new platform type.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A closed set of wire values with an explicit fallback member.
pub trait WireType: Copy + PartialEq + 'static {
    /// Every recognised member, excluding the fallback.
    const KNOWN: &'static [Self];
    /// Member returned for unrecognised or missing values.
    const UNKNOWN: Self;

    /// The string the platform uses for this member.
    fn wire_value(self) -> &'static str;

    /// Resolve a raw wire value. Never fails.
    fn classify(raw: Option<&str>) -> Self {
        raw.and_then(|raw| Self::KNOWN.iter().copied().find(|t| t.wire_value() == raw))
            .unwrap_or(Self::UNKNOWN)
    }
}

/// Webhook event type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "&'static str")]
pub enum EventType {
    Message,
    Follow,
    Unfollow,
    Join,
    Leave,
    Postback,
    Beacon,
    AccountLink,
    MemberJoined,
    MemberLeft,
    Things,
    #[default]
    Unknown,
}

impl WireType for EventType {
    const KNOWN: &'static [Self] = &[
        Self::Message,
        Self::Follow,
        Self::Unfollow,
        Self::Join,
        Self::Leave,
        Self::Postback,
        Self::Beacon,
        Self::AccountLink,
        Self::MemberJoined,
        Self::MemberLeft,
        Self::Things,
    ];
    const UNKNOWN: Self = Self::Unknown;

    fn wire_value(self) -> &'static str {
        match self {
            Self::Message => "message",
            Self::Follow => "follow",
            Self::Unfollow => "unfollow",
            Self::Join => "join",
            Self::Leave => "leave",
            Self::Postback => "postback",
            Self::Beacon => "beacon",
            Self::AccountLink => "accountLink",
            Self::MemberJoined => "memberJoined",
            Self::MemberLeft => "memberLeft",
            Self::Things => "things",
            Self::Unknown => "unknown",
        }
    }
}

/// Message content type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "&'static str")]
pub enum MessageType {
    Text,
    Image,
    Video,
    Audio,
    File,
    Location,
    Sticker,
    #[default]
    Unknown,
}

impl WireType for MessageType {
    const KNOWN: &'static [Self] = &[
        Self::Text,
        Self::Image,
        Self::Video,
        Self::Audio,
        Self::File,
        Self::Location,
        Self::Sticker,
    ];
    const UNKNOWN: Self = Self::Unknown;

    fn wire_value(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Image => "image",
            Self::Video => "video",
            Self::Audio => "audio",
            Self::File => "file",
            Self::Location => "location",
            Self::Sticker => "sticker",
            Self::Unknown => "unknown",
        }
    }
}

/// Where an event came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "&'static str")]
pub enum SourceType {
    User,
    Group,
    Room,
    #[default]
    Unknown,
}

impl WireType for SourceType {
    const KNOWN: &'static [Self] = &[Self::User, Self::Group, Self::Room];
    const UNKNOWN: Self = Self::Unknown;

    fn wire_value(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Group => "group",
            Self::Room => "room",
            Self::Unknown => "unknown",
        }
    }
}

impl From<Option<String>> for EventType {
    fn from(raw: Option<String>) -> Self {
        Self::classify(raw.as_deref())
    }
}

impl From<Option<String>> for MessageType {
    fn from(raw: Option<String>) -> Self {
        Self::classify(raw.as_deref())
    }
}

impl From<Option<String>> for SourceType {
    fn from(raw: Option<String>) -> Self {
        Self::classify(raw.as_deref())
    }
}

impl From<EventType> for &'static str {
    fn from(t: EventType) -> Self {
        t.wire_value()
    }
}

impl From<MessageType> for &'static str {
    fn from(t: MessageType) -> Self {
        t.wire_value()
    }
}

impl From<SourceType> for &'static str {
    fn from(t: SourceType) -> Self {
        t.wire_value()
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_value())
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_value())
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_value())
    }
}

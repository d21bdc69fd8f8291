//! Reply decision: which inbound events the bot answers.
//!
//! Direct text messages always get a reply. In groups the bot only answers
//! when it was explicitly @-mentioned; rooms and unknown sources never.

use super::model::Event;
use super::types::{EventType, MessageType, SourceType};

/// Decide whether `event` warrants a reply from the bot identified by `bot_id`.
pub fn should_reply(event: &Event, bot_id: &str) -> bool {
    if event.event_type != EventType::Message {
        return false;
    }
    let Some(message) = event.message.as_ref() else {
        return false;
    };
    if message.message_type != MessageType::Text {
        return false;
    }

    match event.source_type() {
        SourceType::User => true,
        SourceType::Group => message.mentions(bot_id),
        SourceType::Room | SourceType::Unknown => false,
    }
}

//! Inbound webhook payloads and the reply decision.

pub mod decision;
pub mod model;
pub mod types;

pub use decision::should_reply;
pub use model::{DeliveryContext, Event, Mention, Mentionee, Message, Source, WebhookEnvelope};
pub use types::{EventType, MessageType, SourceType, WireType};

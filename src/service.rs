//! LINE bot service: webhook handling and the scheduled push.
//!
//! `handle_webhook` verifies and parses synchronously, then hands the whole
//! envelope to one detached task and returns. Events inside an envelope are
//! processed sequentially by that task; nothing it does can change the
//! response already given to the caller.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::config::SheetRanges;
use crate::content::ContentLookup;
use crate::error::{PushError, WebhookError};
use crate::providers::{LineClient, Providers, SignatureVerifier};
use crate::push::{NotificationBatchProcessor, PushSummary};
use crate::webhook::{Event, Source, WebhookEnvelope, should_reply};

/// Terminal state of one webhook event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOutcome {
    Replied,
    Dropped(DropReason),
    /// Reply attempted and failed. Not retried.
    SendFailed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// Not a text message addressed to the bot.
    NotAddressed,
    NoReplyToken,
    /// The content range returned no rows.
    NoContent,
}

#[derive(Clone)]
pub struct LineBotService {
    content: ContentLookup,
    line: Arc<dyn LineClient>,
    verifier: Arc<dyn SignatureVerifier>,
    ranges: SheetRanges,
}

impl LineBotService {
    pub fn new(providers: &Providers, ranges: SheetRanges) -> Self {
        Self {
            content: ContentLookup::new(Arc::clone(&providers.sheets)),
            line: Arc::clone(&providers.line),
            verifier: Arc::clone(&providers.verifier),
            ranges,
        }
    }

    /// Verify and parse a webhook body, then dispatch reply processing in
    /// the background.
    ///
    /// Returns as soon as the envelope is accepted. The returned handle may
    /// be dropped; the task keeps running and only logs its failures.
    pub async fn handle_webhook(
        &self,
        body: &str,
        signature: &str,
    ) -> Result<JoinHandle<Vec<EventOutcome>>, WebhookError> {
        if !self.verifier.verify(body, signature).await {
            warn!("Invalid signature.");
            return Err(WebhookError::InvalidSignature);
        }

        let envelope = WebhookEnvelope::parse(body)
            .inspect_err(|e| error!(error = %e, "Failed to parse webhook event"))?;

        info!(
            destination = %envelope.destination,
            events = envelope.events.len(),
            "Webhook accepted"
        );

        let worker = self.clone();
        Ok(tokio::spawn(async move {
            worker.process_envelope(&envelope).await
        }))
    }

    /// Run every event of an envelope through the reply pipeline, in order.
    pub async fn process_envelope(&self, envelope: &WebhookEnvelope) -> Vec<EventOutcome> {
        let mut outcomes = Vec::with_capacity(envelope.events.len());

        for (index, event) in envelope.events.iter().enumerate() {
            let outcome = self.process_event(event, &envelope.destination).await;
            match outcome {
                EventOutcome::Replied => {
                    info!(index, event_type = %event.event_type, "Replied to event");
                }
                EventOutcome::Dropped(reason) => {
                    debug!(
                        index,
                        event_type = %event.event_type,
                        source_type = %event.source_type(),
                        redelivery = event.is_redelivery(),
                        ?reason,
                        "Event dropped"
                    );
                }
                EventOutcome::SendFailed => {
                    warn!(index, event_type = %event.event_type, "Reply failed, not retrying");
                }
            }
            outcomes.push(outcome);
        }

        outcomes
    }

    /// Decide, look up content and reply for one event.
    pub async fn process_event(&self, event: &Event, bot_id: &str) -> EventOutcome {
        if !should_reply(event, bot_id) {
            return EventOutcome::Dropped(DropReason::NotAddressed);
        }
        let Some(reply_token) = event.reply_token.as_deref() else {
            return EventOutcome::Dropped(DropReason::NoReplyToken);
        };
        let Some(content) = self.content.reply_content(&self.ranges.webhook).await else {
            info!(range = %self.ranges.webhook, "No reply content found");
            return EventOutcome::Dropped(DropReason::NoContent);
        };

        let text = compose_reply(&content, event.source.as_ref());
        match self.line.reply(reply_token, &text).await {
            Ok(()) => EventOutcome::Replied,
            Err(e) => {
                error!(error = %e, "Error sending reply");
                EventOutcome::SendFailed
            }
        }
    }

    /// Push every row of the push range to its recipient.
    ///
    /// An empty range is a success with nothing sent.
    pub async fn execute_scheduled_push(&self) -> Result<PushSummary, PushError> {
        let notifications = self.content.notifications(&self.ranges.push).await;
        if notifications.is_empty() {
            info!(range = %self.ranges.push, "No data found for scheduled push");
            return Ok(PushSummary::default());
        }

        NotificationBatchProcessor::new(Arc::clone(&self.line))
            .push_all(&notifications)
            .await
            .into_result()
    }
}

/// Reply text: the sheet content followed by who the event came from.
pub fn compose_reply(content: &str, source: Option<&Source>) -> String {
    let origin = source.map_or_else(|| "Unknown source".to_string(), Source::describe);
    format!("{content}\n\n{origin}")
}

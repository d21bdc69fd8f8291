//! Outbound push batch with partial-failure aggregation.
//!
//! Every notification gets exactly one send attempt, in input order. A
//! failed recipient never stops the rest of the batch; failures are only
//! counted and summarised at the end.

use std::sync::Arc;

use tracing::{error, info};

use crate::content::NotificationContent;
use crate::error::PushError;
use crate::providers::LineClient;

/// Counts for one batch run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PushSummary {
    pub attempted: usize,
    pub failed: usize,
}

impl PushSummary {
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }

    pub fn succeeded(&self) -> usize {
        self.attempted - self.failed
    }

    /// `Ok` when nothing failed, otherwise a single aggregate error.
    pub fn into_result(self) -> Result<Self, PushError> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(PushError::PartialFailure {
                failed: self.failed,
                total: self.attempted,
            })
        }
    }
}

/// Sends a batch of push messages sequentially.
pub struct NotificationBatchProcessor {
    client: Arc<dyn LineClient>,
}

impl NotificationBatchProcessor {
    pub fn new(client: Arc<dyn LineClient>) -> Self {
        Self { client }
    }

    pub async fn push_all(&self, notifications: &[NotificationContent]) -> PushSummary {
        let mut summary = PushSummary::default();

        for notification in notifications {
            summary.attempted += 1;
            match self
                .client
                .push(&notification.recipient_id, &notification.message)
                .await
            {
                Ok(()) => {
                    info!(recipient = %notification.recipient_id, "Pushed message");
                }
                Err(e) => {
                    error!(
                        recipient = %notification.recipient_id,
                        error = %e,
                        "Failed to push message"
                    );
                    summary.failed += 1;
                }
            }
        }

        if summary.is_success() {
            info!(total = summary.attempted, "All push notifications sent successfully");
        } else {
            error!(
                failed = summary.failed,
                total = summary.attempted,
                "Push notifications completed with errors"
            );
        }
        summary
    }
}

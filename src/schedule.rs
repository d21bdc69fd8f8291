//! In-process cron trigger for the scheduled push.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{error, info, warn};

use crate::service::LineBotService;

/// Next fire time strictly after `now`, if the schedule has one.
pub fn next_fire(schedule: &cron::Schedule, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    schedule.after(&now).next()
}

/// Run the push batch every time `schedule` fires (UTC).
///
/// Ticks are independent: a failed batch is logged and the ticker moves on
/// to the next fire time.
pub fn spawn_push_schedule(
    service: Arc<LineBotService>,
    schedule: cron::Schedule,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let now = Utc::now();
            let Some(fire_at) = next_fire(&schedule, now) else {
                warn!("Push schedule has no upcoming fire time, stopping");
                return;
            };
            let wait = (fire_at - now).to_std().unwrap_or_default();
            tokio::time::sleep(wait).await;
            run_tick(&service).await;
        }
    })
}

/// One scheduled batch. Failures are logged and reported as `false`.
pub async fn run_tick(service: &LineBotService) -> bool {
    match service.execute_scheduled_push().await {
        Ok(summary) => {
            info!(sent = summary.succeeded(), "Scheduled push tick done");
            true
        }
        Err(e) => {
            error!(error = %e, "Scheduled push tick failed");
            false
        }
    }
}

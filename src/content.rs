//! Reply content and push payloads read from the spreadsheet.

use std::sync::Arc;

use serde_json::Value;

use crate::providers::{Row, SheetsRepository};

/// One outbound push: recipient id and message text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationContent {
    pub recipient_id: String,
    pub message: String,
}

impl NotificationContent {
    /// Build from a `[recipient, message, ..]` row. Rows whose first two
    /// cells are not both populated yield `None`.
    pub fn from_row(row: &[Value]) -> Option<Self> {
        let recipient_id = cell_text(row.first()?)?;
        let message = cell_text(row.get(1)?)?;
        Some(Self {
            recipient_id,
            message,
        })
    }
}

/// Render a cell as text; blank and null cells count as unpopulated.
pub fn cell_text(cell: &Value) -> Option<String> {
    let text = match cell {
        Value::Null => return None,
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    (!text.trim().is_empty()).then_some(text)
}

/// Thin wrapper over the sheets repository. No retries, no caching; a
/// failed fetch already arrives here as "no rows".
#[derive(Clone)]
pub struct ContentLookup {
    sheets: Arc<dyn SheetsRepository>,
}

impl ContentLookup {
    pub fn new(sheets: Arc<dyn SheetsRepository>) -> Self {
        Self { sheets }
    }

    pub async fn fetch_rows(&self, range: &str) -> Vec<Row> {
        self.sheets.fetch_sheet_data(range).await
    }

    /// First cell of the first row, if any.
    pub async fn reply_content(&self, range: &str) -> Option<String> {
        let rows = self.fetch_rows(range).await;
        rows.first().and_then(|row| row.first()).and_then(cell_text)
    }

    /// Push payloads, one per well-formed row. Short rows are dropped.
    pub async fn notifications(&self, range: &str) -> Vec<NotificationContent> {
        let rows = self.fetch_rows(range).await;
        let total = rows.len();
        let notifications: Vec<_> = rows
            .iter()
            .filter_map(|row| NotificationContent::from_row(row))
            .collect();
        if notifications.len() < total {
            tracing::debug!(
                range,
                skipped = total - notifications.len(),
                "Skipped rows without recipient and message"
            );
        }
        notifications
    }
}

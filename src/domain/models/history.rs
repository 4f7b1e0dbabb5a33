#[cfg(test)]
#[path = "history_test.rs"]
mod tests;

use chrono::DateTime;
use chrono::Utc;
use serde_derive::Deserialize;
use serde_derive::Serialize;

/// One stored turn as returned by the history endpoint. Roles on the wire
/// are `user` and `model`.
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    #[serde(default)]
    pub id: Option<u64>,
    pub role: String,
    pub parts: String,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

/// Grouped-by-date summary of past conversations.
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationSummary {
    pub date: String,
    #[serde(default)]
    pub message_count: u32,
    #[serde(default)]
    pub preview: String,
    #[serde(default)]
    pub last_message: String,
}

impl ConversationSummary {
    /// First line of the preview, truncated to at most 70 characters. The
    /// preview is server-supplied text, so the cut lands on a char
    /// boundary, never mid-codepoint.
    pub fn preview_line(&self) -> String {
        let line = self.preview.split('\n').next().unwrap_or_default();
        if line.chars().count() >= 70 {
            return format!("{}...", line.chars().take(67).collect::<String>());
        }

        return line.to_string();
    }
}

use uuid::Uuid;

use super::ChatDelta;
use super::ConversationSummary;
use super::FinancialSnapshot;

pub enum Event {
    AssistantDelta(ChatDelta),
    AssistantError(Uuid, String),
    ConversationList(Vec<ConversationSummary>),
    DocumentImported(String, bool),
    HistoryCleared(),
    ImageAnalyzed(Uuid, String),
    LedgerRefreshed(FinancialSnapshot),
    Notice(String),
    TranscriptReady(String),
}

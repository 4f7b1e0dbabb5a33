use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::mpsc;
use uuid::Uuid;

use super::AttachmentUpload;
use super::ConversationSummary;
use super::DocumentSummary;
use super::Event;
use super::FinancialSnapshot;
use super::HistoryEntry;
use super::ReceiptAnalysis;
use super::TransactionSummary;

/// One outstanding chat exchange. The request id ties every streamed delta
/// back to the placeholder message it belongs to, so concurrent exchanges
/// cannot write into each other.
#[derive(Clone)]
pub struct ChatPrompt {
    pub request_id: Uuid,
    pub message: String,
    pub user_id: String,
    pub financial_context: Option<FinancialSnapshot>,
}

impl ChatPrompt {
    pub fn new(message: &str, user_id: &str, context: Option<FinancialSnapshot>) -> ChatPrompt {
        return ChatPrompt {
            request_id: Uuid::new_v4(),
            message: message.to_string(),
            user_id: user_id.to_string(),
            financial_context: context,
        };
    }
}

/// A fragment of assistant text delivered as one unit over the stream.
/// The final delta of an exchange carries `done` with empty text.
pub struct ChatDelta {
    pub request_id: Uuid,
    pub text: String,
    pub done: bool,
}

#[async_trait]
pub trait Backend {
    /// Used at startup to verify the backend is reachable before dropping
    /// the user into a chat they can't use.
    async fn health_check(&self) -> Result<()>;

    /// Requests a streamed completion. Deltas are forwarded through the
    /// channel in wire order, with a final `done` delta once the stream
    /// terminates. Transport failures are returned as errors, never sent
    /// as deltas.
    async fn stream_chat<'a>(
        &self,
        prompt: ChatPrompt,
        tx: &'a mpsc::UnboundedSender<Event>,
    ) -> Result<()>;

    /// Non-streaming fallback returning the full response in one piece.
    async fn chat(&self, prompt: ChatPrompt) -> Result<String>;

    async fn history(&self, user_id: &str) -> Result<Vec<HistoryEntry>>;

    async fn conversations(&self, user_id: &str) -> Result<Vec<ConversationSummary>>;

    /// Clears stored history upstream. Idempotent: clearing an already
    /// empty history succeeds.
    async fn clear_history(&self, user_id: &str) -> Result<()>;

    /// Submits a base64 data-URL receipt image for structured extraction.
    async fn analyze_image(&self, image: &str, user_id: &str) -> Result<ReceiptAnalysis>;

    /// Submits a spreadsheet as multipart form data. The backend imports
    /// rows as transactions and reports what it kept and skipped.
    async fn analyze_document(&self, upload: AttachmentUpload) -> Result<DocumentSummary>;

    async fn transaction_summary(&self, user_id: &str) -> Result<TransactionSummary>;
}

pub type BackendBox = Box<dyn Backend + Send + Sync>;

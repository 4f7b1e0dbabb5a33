use super::AttachmentUpload;
use super::ChatPrompt;

pub enum Action {
    AbortStream(),
    AnalyzeDocument(AttachmentUpload),
    AnalyzeImage(ChatPrompt, String),
    ClearHistory(String),
    ListConversations(String),
    RefreshLedger(String),
    Speak(String),
    StreamRequest(ChatPrompt),
    Transcribe(),
}

#[cfg(test)]
#[path = "conversation_test.rs"]
mod tests;

use std::collections::HashMap;

use uuid::Uuid;

use crate::domain::models::Author;
use crate::domain::models::ChatDelta;
use crate::domain::models::FinancialSnapshot;
use crate::domain::models::HistoryEntry;
use crate::domain::models::Message;
use crate::domain::models::MessageType;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SessionState {
    AwaitingFirstChunk,
    Streaming,
    SettledOk,
    SettledError,
}

/// Bookkeeping for one outstanding streamed exchange: which placeholder
/// message it fills, and where in its lifecycle it is.
pub struct StreamSession {
    pub request_id: Uuid,
    pub placeholder_id: u64,
    pub state: SessionState,
}

impl StreamSession {
    pub fn is_settled(&self) -> bool {
        return self.state == SessionState::SettledOk || self.state == SessionState::SettledError;
    }
}

/// Ordered message list plus the active stream sessions mutating it.
/// Messages are append-only while streaming; a settled placeholder is
/// never touched again.
#[derive(Default)]
pub struct Conversation {
    messages: Vec<Message>,
    sessions: HashMap<Uuid, StreamSession>,
    next_message_id: u64,
}

impl Conversation {
    pub fn new() -> Conversation {
        return Conversation::default();
    }

    fn next_id(&mut self) -> u64 {
        self.next_message_id += 1;
        return self.next_message_id;
    }

    pub fn messages(&self) -> &[Message] {
        return &self.messages;
    }

    pub fn message(&self, id: u64) -> Option<&Message> {
        return self.messages.iter().find(|e| return e.id == id);
    }

    pub fn session(&self, request_id: Uuid) -> Option<&StreamSession> {
        return self.sessions.get(&request_id);
    }

    pub fn has_active_session(&self) -> bool {
        return self.active_session().is_some();
    }

    pub fn active_session(&self) -> Option<&StreamSession> {
        return self.sessions.values().find(|e| return !e.is_settled());
    }

    pub fn push(&mut self, author: Author, text: &str) -> u64 {
        let id = self.next_id();
        self.messages.push(Message::new(id, author, text));
        return id;
    }

    pub fn push_error(&mut self, text: &str) -> u64 {
        let id = self.next_id();
        self.messages
            .push(Message::new_with_type(id, Author::App, MessageType::Error, text));
        return id;
    }

    /// Loads backend history into an empty conversation, or seeds a welcome
    /// message quoting current metrics when there is none.
    pub fn hydrate(&mut self, entries: &[HistoryEntry], snapshot: &FinancialSnapshot) {
        if entries.is_empty() {
            let welcome = format!(
                "Hello! I'm your accounting assistant with access to your organization's data. Your current revenue is ${:.2} and expenses are ${:.2}. I can help with taxes, audits, and financial planning. What would you like to know?",
                snapshot.revenue, snapshot.expenses
            );
            self.push(Author::Assistant, &welcome);
            return;
        }

        for entry in entries {
            let author = if entry.role == "model" {
                Author::Assistant
            } else {
                Author::User
            };
            self.push(author, &entry.parts);
        }
    }

    /// Appends the finalized user message and an empty assistant
    /// placeholder, and opens a session tracking the exchange. Returns the
    /// placeholder's message id.
    pub fn begin_exchange(
        &mut self,
        request_id: Uuid,
        text: &str,
        attachment: Option<String>,
    ) -> u64 {
        // Settled sessions are only kept around until the next exchange, so
        // the map stays bounded over a long chat.
        self.sessions.retain(|_, e| return !e.is_settled());

        let user_text = if text.is_empty() && attachment.is_some() {
            "Uploaded a receipt image"
        } else {
            text
        };

        let user_id = self.next_id();
        let mut user_message = Message::new(user_id, Author::User, user_text);
        if let Some(data_url) = attachment {
            user_message = user_message.with_attachment(data_url);
        }
        self.messages.push(user_message);

        let placeholder_id = self.push(Author::Assistant, "");
        self.sessions.insert(
            request_id,
            StreamSession {
                request_id,
                placeholder_id,
                state: SessionState::AwaitingFirstChunk,
            },
        );

        return placeholder_id;
    }

    /// Applies one streamed delta to its session's placeholder. Returns
    /// true exactly once per exchange: on the delta that settles it, which
    /// is when the caller should refresh the transaction aggregate.
    /// Deltas for unknown or already settled sessions are dropped.
    pub fn apply_delta(&mut self, delta: &ChatDelta) -> bool {
        let Some(session) = self.sessions.get_mut(&delta.request_id) else {
            tracing::debug!(request_id = %delta.request_id, "Dropping delta for unknown session");
            return false;
        };

        if session.is_settled() {
            tracing::debug!(request_id = %delta.request_id, "Dropping delta for settled session");
            return false;
        }

        if delta.done {
            session.state = SessionState::SettledOk;
            return true;
        }

        session.state = SessionState::Streaming;
        let placeholder_id = session.placeholder_id;
        if let Some(message) = self.messages.iter_mut().find(|e| return e.id == placeholder_id) {
            message.append(&delta.text);
        }

        return false;
    }

    /// Settles an exchange with an error. The placeholder's text is
    /// replaced wholesale so a partial response is never left dangling.
    pub fn fail_exchange(&mut self, request_id: Uuid, error: &str) {
        let Some(session) = self.sessions.get_mut(&request_id) else {
            return;
        };
        if session.is_settled() {
            return;
        }

        session.state = SessionState::SettledError;
        let placeholder_id = session.placeholder_id;
        if let Some(message) = self.messages.iter_mut().find(|e| return e.id == placeholder_id) {
            message.fail(&format!("Connection error: {error}"));
        }
    }

    /// Settles an image exchange with the analysis result as one atomic
    /// write. Image submissions bypass streaming entirely.
    pub fn settle_exchange(&mut self, request_id: Uuid, text: &str) {
        let Some(session) = self.sessions.get_mut(&request_id) else {
            return;
        };
        if session.is_settled() {
            return;
        }

        session.state = SessionState::SettledOk;
        let placeholder_id = session.placeholder_id;
        if let Some(message) = self.messages.iter_mut().find(|e| return e.id == placeholder_id) {
            message.settle(text);
        }
    }

    pub fn clear(&mut self) {
        self.messages.clear();
        self.sessions.clear();
    }
}

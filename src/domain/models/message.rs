#[cfg(test)]
#[path = "message_test.rs"]
mod tests;

use chrono::DateTime;
use chrono::Utc;
use serde_derive::Deserialize;
use serde_derive::Serialize;

use super::Author;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageType {
    Normal,
    Error,
}

/// A single conversation entry. Ids are handed out by the owning
/// conversation from a monotonic counter, never from wall-clock time.
#[derive(Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: u64,
    pub author: Author,
    pub text: String,
    pub timestamp: DateTime<Utc>,
    pub attachment: Option<String>,
    mtype: MessageType,
}

impl Message {
    pub fn new(id: u64, author: Author, text: &str) -> Message {
        return Message {
            id,
            author,
            text: text.to_string(),
            timestamp: Utc::now(),
            attachment: None,
            mtype: MessageType::Normal,
        };
    }

    pub fn new_with_type(id: u64, author: Author, mtype: MessageType, text: &str) -> Message {
        return Message {
            id,
            author,
            text: text.to_string(),
            timestamp: Utc::now(),
            attachment: None,
            mtype,
        };
    }

    pub fn with_attachment(mut self, data_url: String) -> Message {
        self.attachment = Some(data_url);
        return self;
    }

    pub fn message_type(&self) -> MessageType {
        return self.mtype;
    }

    /// Streaming mutation, strictly additive.
    pub fn append(&mut self, text: &str) {
        self.text += text;
    }

    /// The one non-append mutation: a failed exchange replaces whatever
    /// partial text was streamed so the user never sees a silently
    /// abandoned half-response.
    pub fn fail(&mut self, text: &str) {
        self.text = text.to_string();
        self.mtype = MessageType::Error;
    }

    /// Atomic replacement used by attachment analysis, which settles a
    /// placeholder in one write instead of streaming into it.
    pub fn settle(&mut self, text: &str) {
        self.text = text.to_string();
    }
}

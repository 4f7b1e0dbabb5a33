use anyhow::Result;
use async_trait::async_trait;
use strum::EnumIter;
use strum::EnumVariantNames;
use strum::IntoEnumIterator;

#[derive(Clone, Debug, PartialEq, Eq, EnumIter, EnumVariantNames, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum VoiceName {
    Command,
    None,
}

impl VoiceName {
    pub fn parse(text: String) -> Option<VoiceName> {
        return VoiceName::iter().find(|e| return e.to_string() == text);
    }
}

/// Speech I/O port. Transcription and synthesis are delegated to external
/// programs; environments without any are served by a no-op implementation
/// rather than a crash.
#[async_trait]
pub trait Voice {
    fn name(&self) -> VoiceName;

    /// Used at startup and on toggle to verify speech support before the
    /// user relies on it.
    async fn health_check(&self) -> Result<()>;

    /// Single-shot speech-to-text. Returns None when nothing was heard.
    async fn transcribe(&self) -> Result<Option<String>>;

    /// Text-to-speech. Callers strip markdown before handing text over.
    async fn speak(&self, text: &str) -> Result<()>;
}

pub type VoiceBox = Box<dyn Voice + Send + Sync>;

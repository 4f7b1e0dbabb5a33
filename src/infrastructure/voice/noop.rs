#[cfg(test)]
#[path = "noop_test.rs"]
mod tests;

use anyhow::Result;
use async_trait::async_trait;

use crate::domain::models::Voice;
use crate::domain::models::VoiceName;

/// Stands in when the environment has no speech support. Every operation
/// is a harmless no-op so voice toggles never crash the chat.
#[derive(Default)]
pub struct NoopVoice {}

#[async_trait]
impl Voice for NoopVoice {
    fn name(&self) -> VoiceName {
        return VoiceName::None;
    }

    #[allow(clippy::implicit_return)]
    async fn health_check(&self) -> Result<()> {
        return Ok(());
    }

    #[allow(clippy::implicit_return)]
    async fn transcribe(&self) -> Result<Option<String>> {
        tracing::warn!("Speech recognition is not available in this environment");
        return Ok(None);
    }

    #[allow(clippy::implicit_return)]
    async fn speak(&self, _text: &str) -> Result<()> {
        tracing::warn!("Speech synthesis is not available in this environment");
        return Ok(());
    }
}

use anyhow::Result;

use super::NoopVoice;
use crate::domain::models::Voice;
use crate::domain::models::VoiceName;

#[tokio::test]
async fn it_is_always_healthy() {
    let voice = NoopVoice::default();
    assert!(voice.health_check().await.is_ok());
    assert_eq!(voice.name(), VoiceName::None);
}

#[tokio::test]
async fn it_hears_nothing() -> Result<()> {
    let voice = NoopVoice::default();
    assert_eq!(voice.transcribe().await?, None);
    return Ok(());
}

#[tokio::test]
async fn it_speaks_silently() -> Result<()> {
    let voice = NoopVoice::default();
    voice.speak("Hello").await?;
    return Ok(());
}

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::time::Instant;

use super::transcribe;
use crate::domain::models::Event;
use crate::domain::models::Voice;
use crate::domain::models::VoiceName;
use crate::domain::services::speech::AUTO_SEND_DELAY;

struct ScriptedVoice {
    transcript: Option<String>,
}

#[async_trait]
impl Voice for ScriptedVoice {
    fn name(&self) -> VoiceName {
        return VoiceName::None;
    }

    #[allow(clippy::implicit_return)]
    async fn health_check(&self) -> Result<()> {
        return Ok(());
    }

    #[allow(clippy::implicit_return)]
    async fn transcribe(&self) -> Result<Option<String>> {
        return Ok(self.transcript.clone());
    }

    #[allow(clippy::implicit_return)]
    async fn speak(&self, _text: &str) -> Result<()> {
        return Ok(());
    }
}

#[tokio::test]
async fn it_pauses_before_sending_a_transcript() {
    let (tx, mut rx) = mpsc::unbounded_channel::<Event>();
    let start = Instant::now();
    transcribe(
        Box::new(ScriptedVoice {
            transcript: Some("check my balance".to_string()),
        }),
        tx,
    );

    match rx.recv().await.unwrap() {
        Event::TranscriptReady(transcript) => assert_eq!(transcript, "check my balance"),
        _ => panic!("Wrong event type"),
    }
    assert!(start.elapsed() >= AUTO_SEND_DELAY);
}

#[tokio::test]
async fn it_drops_empty_transcripts() {
    let (tx, mut rx) = mpsc::unbounded_channel::<Event>();
    let worker = transcribe(Box::new(ScriptedVoice { transcript: None }), tx);
    worker.await.unwrap().unwrap();

    assert!(rx.recv().await.is_none());
}

#[cfg(test)]
#[path = "actions_test.rs"]
mod tests;

use anyhow::Result;
use tokio::sync::mpsc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time;

use super::ingest;
use super::speech;
use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::Action;
use crate::domain::models::AttachmentUpload;
use crate::domain::models::ChatPrompt;
use crate::domain::models::Event;
use crate::domain::models::FinancialSnapshot;
use crate::domain::models::VoiceBox;
use crate::domain::models::VoiceName;
use crate::infrastructure::backends::BackendManager;
use crate::infrastructure::voice::VoiceManager;

pub fn help_text() -> String {
    let text = r#"
COMMANDS:
- /attach (/a) [FILE] - Attaches a file. Receipt images are staged and analyzed with your next message, spreadsheets (.csv, .xlsx, .xls) are imported immediately.
- /history (/hi) - Lists stored conversation summaries grouped by date.
- /clear - Clears conversation history, both locally and on the backend.
- /refresh - Re-fetches the transaction summary used to ground the assistant.
- /voice (/v) - Captures one spoken prompt and sends it after a short delay.
- /speak (/s) - Toggles reading assistant replies aloud.
- /abort - Stops waiting for the current streamed reply.
- /quit /exit (/q) - Exit Ledgerchat.
- /help (/h) - Provides this help menu.

Anything else you type is sent to the assistant, along with a snapshot of
your current financial metrics so answers are grounded in your data.
        "#;

    return text.trim().to_string();
}

async fn clear_history(user_id: &str, tx: &mpsc::UnboundedSender<Event>) -> Result<()> {
    let res = BackendManager::get()?.clear_history(user_id).await;
    match res {
        Ok(()) => tx.send(Event::HistoryCleared())?,
        Err(err) => tx.send(Event::Notice(format!("Failed to clear history: {err}")))?,
    }

    return Ok(());
}

async fn list_conversations(user_id: &str, tx: &mpsc::UnboundedSender<Event>) -> Result<()> {
    let res = BackendManager::get()?.conversations(user_id).await;
    match res {
        Ok(conversations) => tx.send(Event::ConversationList(conversations))?,
        Err(err) => tx.send(Event::Notice(format!("Failed to list conversations: {err}")))?,
    }

    return Ok(());
}

async fn refresh_ledger(
    user_id: &str,
    tx: &mpsc::UnboundedSender<Event>,
    snapshot_tx: &watch::Sender<FinancialSnapshot>,
) -> Result<()> {
    let res = BackendManager::get()?.transaction_summary(user_id).await;
    match res {
        Ok(summary) => {
            let snapshot = FinancialSnapshot::from_summary(&summary);
            snapshot_tx.send_replace(snapshot.clone());
            tx.send(Event::LedgerRefreshed(snapshot))?;
        }
        Err(err) => {
            tracing::warn!(error = ?err, "Failed to refresh transaction summary");
            tx.send(Event::Notice(format!(
                "Failed to refresh transaction summary: {err}"
            )))?;
        }
    }

    return Ok(());
}

fn analyze_image(
    prompt: ChatPrompt,
    image: String,
    tx: mpsc::UnboundedSender<Event>,
) -> JoinHandle<Result<()>> {
    return tokio::spawn(async move {
        let res = BackendManager::get()?
            .analyze_image(&image, &prompt.user_id)
            .await;

        match res {
            Ok(analysis) => {
                tx.send(Event::ImageAnalyzed(
                    prompt.request_id,
                    ingest::render_receipt(&analysis),
                ))?;
            }
            Err(err) => {
                tx.send(Event::AssistantError(
                    prompt.request_id,
                    format!("Failed to analyze image: {err}"),
                ))?;
            }
        }

        return Ok(());
    });
}

fn analyze_document(
    upload: AttachmentUpload,
    tx: mpsc::UnboundedSender<Event>,
) -> JoinHandle<Result<()>> {
    return tokio::spawn(async move {
        let res = BackendManager::get()?.analyze_document(upload).await;

        match res {
            Ok(summary) => {
                let refresh = summary.imported > 0;
                tx.send(Event::DocumentImported(
                    ingest::render_document_summary(&summary),
                    refresh,
                ))?;
            }
            Err(err) => {
                tx.send(Event::Notice(format!("Failed to analyze document: {err}")))?;
            }
        }

        return Ok(());
    });
}

fn transcribe(voice: VoiceBox, tx: mpsc::UnboundedSender<Event>) -> JoinHandle<Result<()>> {
    return tokio::spawn(async move {
        let res = voice.transcribe().await;

        // Recognition failure resets listening silently, log only.
        match res {
            Ok(Some(transcript)) => {
                // The auto-send pause happens here, off the UI loop.
                time::sleep(speech::AUTO_SEND_DELAY).await;
                tx.send(Event::TranscriptReady(transcript))?;
            }
            Ok(None) => {}
            Err(err) => tracing::warn!(error = ?err, "Speech recognition failed"),
        }

        return Ok(());
    });
}

fn speak(text: String) -> JoinHandle<Result<()>> {
    return tokio::spawn(async move {
        let voice_name =
            VoiceName::parse(Config::get(ConfigKey::VoiceBackend)).unwrap_or(VoiceName::None);
        let res = VoiceManager::get(voice_name)?
            .speak(&speech::prepare_for_speech(&text))
            .await;

        if let Err(err) = res {
            tracing::warn!(error = ?err, "Speech synthesis failed");
        }

        return Ok(());
    });
}

pub struct ActionsService {}

impl ActionsService {
    pub async fn start(
        tx: mpsc::UnboundedSender<Event>,
        rx: &mut mpsc::UnboundedReceiver<Action>,
        snapshot_tx: watch::Sender<FinancialSnapshot>,
    ) -> Result<()> {
        // Lazy default.
        let mut worker: JoinHandle<Result<()>> = tokio::spawn(async {
            return Ok(());
        });

        loop {
            let action = rx.recv().await;
            if action.is_none() {
                return Ok(());
            }

            let worker_tx = tx.clone();
            match action.unwrap() {
                Action::AbortStream() => {
                    worker.abort();
                }
                Action::StreamRequest(prompt) => {
                    let request_id = prompt.request_id;
                    worker = tokio::spawn(async move {
                        let res = BackendManager::get()?
                            .stream_chat(prompt, &worker_tx)
                            .await;

                        if let Err(err) = res {
                            worker_tx.send(Event::AssistantError(request_id, err.to_string()))?;
                        }

                        return Ok(());
                    });
                }
                Action::AnalyzeImage(prompt, image) => {
                    analyze_image(prompt, image, worker_tx);
                }
                Action::AnalyzeDocument(upload) => {
                    analyze_document(upload, worker_tx);
                }
                Action::ClearHistory(user_id) => {
                    clear_history(&user_id, &tx).await?;
                }
                Action::ListConversations(user_id) => {
                    list_conversations(&user_id, &tx).await?;
                }
                Action::RefreshLedger(user_id) => {
                    refresh_ledger(&user_id, &tx, &snapshot_tx).await?;
                }
                Action::Speak(text) => {
                    speak(text);
                }
                Action::Transcribe() => {
                    let voice_name = VoiceName::parse(Config::get(ConfigKey::VoiceBackend))
                        .unwrap_or(VoiceName::None);
                    transcribe(VoiceManager::get(voice_name)?, worker_tx);
                }
            }
        }
    }
}

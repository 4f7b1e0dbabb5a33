use std::io;
use std::io::Write;
use std::path;

use anyhow::Result;
use owo_colors::OwoColorize;
use tokio::io::AsyncBufReadExt;
use tokio::io::BufReader;
use tokio::sync::mpsc;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::Action;
use crate::domain::models::AttachmentKind;
use crate::domain::models::Author;
use crate::domain::models::ChatPrompt;
use crate::domain::models::ConversationSummary;
use crate::domain::models::Event;
use crate::domain::models::FinancialSnapshot;
use crate::domain::models::Message;
use crate::domain::models::MessageType;
use crate::domain::models::VoiceName;
use crate::domain::services::actions::help_text;
use crate::domain::services::ingest;
use crate::domain::services::speech;
use crate::domain::services::Conversation;
use crate::infrastructure::backends::BackendManager;
use crate::infrastructure::voice::VoiceManager;

const SUGGESTED_PROMPTS: [&str; 4] = [
    "What is my current profit margin?",
    "Where am I spending the most money?",
    "How can I reduce my expenses?",
    "Summarize my financial health.",
];

fn print_prompt() {
    print!("{} ", ">".bold());
    let _ = io::stdout().flush();
}

fn print_message(message: &Message) {
    let author = message.author.to_string();
    let text = if message.message_type() == MessageType::Error {
        message.text.red().to_string()
    } else {
        message.text.to_string()
    };

    match message.author {
        Author::User => println!("{} {text}", format!("{author}:").cyan().bold()),
        Author::Assistant => println!("{} {text}", format!("{author}:").green().bold()),
        Author::App => println!("{} {text}", format!("{author}:").yellow().bold()),
    }
}

fn print_conversation_list(conversations: &[ConversationSummary]) {
    if conversations.is_empty() {
        println!("There are no stored conversations yet.");
        return;
    }

    for conversation in conversations {
        println!(
            "- {} ({} messages) {}",
            conversation.date,
            conversation.message_count,
            conversation.preview_line()
        );
    }
}

struct ChatUI {
    action_tx: mpsc::UnboundedSender<Action>,
    conversation: Conversation,
    snapshot: FinancialSnapshot,
    staged_image: Option<String>,
    speak_replies: bool,
    user_id: String,
}

impl ChatUI {
    async fn init(action_tx: mpsc::UnboundedSender<Action>) -> Result<ChatUI> {
        let user_id = Config::get(ConfigKey::UserID);
        let backend = BackendManager::get()?;

        if let Err(err) = backend.health_check().await {
            println!("{}", format!("{err}").yellow());
        }

        let mut snapshot = FinancialSnapshot::default();
        match backend.transaction_summary(&user_id).await {
            Ok(summary) => snapshot = FinancialSnapshot::from_summary(&summary),
            Err(err) => {
                tracing::warn!(error = ?err, "Failed to load transaction summary");
                println!(
                    "{}",
                    "Could not load your financial snapshot. Answers will not be grounded in your data until /refresh succeeds.".yellow()
                );
            }
        }

        let mut conversation = Conversation::new();
        let mut fresh = true;
        match backend.history(&user_id).await {
            Ok(entries) => {
                fresh = entries.is_empty();
                conversation.hydrate(&entries, &snapshot);
            }
            Err(err) => {
                tracing::warn!(error = ?err, "Failed to load conversation history");
                conversation.hydrate(&[], &snapshot);
            }
        }

        for message in conversation.messages() {
            print_message(message);
        }

        if fresh {
            println!("\nSome things you could ask:");
            for prompt in SUGGESTED_PROMPTS {
                println!("  - {prompt}");
            }
        }
        println!("\nType {} for commands.", "/help".bold());

        return Ok(ChatUI {
            action_tx,
            conversation,
            snapshot,
            staged_image: None,
            speak_replies: speech::voice_output_enabled(),
            user_id,
        });
    }

    fn placeholder_text(&self, request_id: uuid::Uuid) -> Option<String> {
        let session = self.conversation.session(request_id)?;
        let message = self.conversation.message(session.placeholder_id)?;
        return Some(message.text.to_string());
    }

    fn submit(&mut self, text: &str) -> Result<()> {
        if self.conversation.has_active_session() {
            println!(
                "{}",
                "Still waiting on the previous reply. Use /abort to stop it.".yellow()
            );
            print_prompt();
            return Ok(());
        }

        if text.is_empty() && self.staged_image.is_none() {
            print_prompt();
            return Ok(());
        }

        let prompt = ChatPrompt::new(text, &self.user_id, Some(self.snapshot.clone()));
        self.conversation
            .begin_exchange(prompt.request_id, text, self.staged_image.clone());

        print!("{} ", "Assistant:".green().bold());
        let _ = io::stdout().flush();

        if let Some(image) = self.staged_image.take() {
            self.action_tx.send(Action::AnalyzeImage(prompt, image))?;
        } else {
            self.action_tx.send(Action::StreamRequest(prompt))?;
        }

        return Ok(());
    }

    async fn attach(&mut self, file_path: &str) -> Result<()> {
        if file_path.is_empty() {
            println!("Usage: /attach [FILE]");
            return Ok(());
        }

        let upload = match ingest::load_upload(path::Path::new(file_path)).await {
            Ok(upload) => upload,
            Err(err) => {
                println!("{}", format!("{err}").red());
                return Ok(());
            }
        };

        match ingest::validate(&upload) {
            Ok(AttachmentKind::Image) => {
                self.staged_image = Some(ingest::to_data_url(&upload));
                println!(
                    "Receipt image staged. It will be analyzed when you send your next message."
                );
            }
            Ok(AttachmentKind::Spreadsheet) => {
                println!("Importing {}...", upload.filename);
                self.action_tx.send(Action::AnalyzeDocument(upload))?;
            }
            Err(err) => {
                println!("{}", format!("{err}").red());
            }
        }

        return Ok(());
    }

    /// Returns false when the user asked to exit.
    async fn handle_input(&mut self, line: &str) -> Result<bool> {
        let line = line.trim();
        let (command, args) = match line.split_once(' ') {
            Some((command, args)) => (command, args.trim()),
            None => (line, ""),
        };

        if !command.starts_with('/') {
            self.submit(line)?;
            return Ok(true);
        }

        match command {
            "/help" | "/h" => {
                println!("{}", help_text());
                print_prompt();
            }
            "/attach" | "/a" => {
                self.attach(args).await?;
                print_prompt();
            }
            "/history" | "/hi" => {
                self.action_tx
                    .send(Action::ListConversations(self.user_id.to_string()))?;
            }
            "/clear" => {
                self.conversation.clear();
                self.action_tx
                    .send(Action::ClearHistory(self.user_id.to_string()))?;
            }
            "/refresh" => {
                println!("Refreshing financial snapshot...");
                self.action_tx
                    .send(Action::RefreshLedger(self.user_id.to_string()))?;
                print_prompt();
            }
            "/voice" | "/v" => {
                let voice_name = VoiceName::parse(Config::get(ConfigKey::VoiceBackend))
                    .unwrap_or(VoiceName::None);
                if voice_name == VoiceName::None {
                    println!(
                        "{}",
                        "Voice input is not configured. Set voice-backend and stt-command to enable it.".yellow()
                    );
                } else if let Err(err) = VoiceManager::get(voice_name)?.health_check().await {
                    println!("{}", format!("{err}").yellow());
                } else {
                    println!("Listening...");
                    self.action_tx.send(Action::Transcribe())?;
                }
                print_prompt();
            }
            "/speak" | "/s" => {
                self.speak_replies = !self.speak_replies;
                if self.speak_replies {
                    println!("Assistant replies will be read aloud.");
                } else {
                    println!("Assistant replies will no longer be read aloud.");
                }
                print_prompt();
            }
            "/abort" => {
                if let Some(session) = self.conversation.active_session() {
                    let request_id = session.request_id;
                    self.action_tx.send(Action::AbortStream())?;
                    self.conversation.fail_exchange(request_id, "aborted");
                    println!("\n{}", "Aborted.".yellow());
                } else {
                    println!("Nothing to abort.");
                }
                print_prompt();
            }
            "/quit" | "/exit" | "/q" => {
                return Ok(false);
            }
            _ => {
                println!("Unknown command {command}. Type /help to list commands.");
                print_prompt();
            }
        }

        return Ok(true);
    }

    async fn handle_event(&mut self, event: Event) -> Result<()> {
        match event {
            Event::AssistantDelta(delta) => {
                let active = self
                    .conversation
                    .session(delta.request_id)
                    .map_or(false, |session| return !session.is_settled());
                let settled = self.conversation.apply_delta(&delta);
                if !active {
                    return Ok(());
                }

                if settled {
                    println!();
                    self.action_tx
                        .send(Action::RefreshLedger(self.user_id.to_string()))?;
                    if self.speak_replies {
                        if let Some(text) = self.placeholder_text(delta.request_id) {
                            self.action_tx.send(Action::Speak(text))?;
                        }
                    }
                    print_prompt();
                } else if !delta.text.is_empty() {
                    print!("{}", delta.text);
                    let _ = io::stdout().flush();
                }
            }
            Event::AssistantError(request_id, error) => {
                self.conversation.fail_exchange(request_id, &error);
                println!("\n{}", format!("Connection error: {error}").red());
                print_prompt();
            }
            Event::ImageAnalyzed(request_id, text) => {
                self.conversation.settle_exchange(request_id, &text);
                println!("{text}");
                if self.speak_replies {
                    self.action_tx.send(Action::Speak(text))?;
                }
                print_prompt();
            }
            Event::ConversationList(conversations) => {
                print_conversation_list(&conversations);
                print_prompt();
            }
            Event::DocumentImported(summary, refresh) => {
                self.conversation.push(Author::Assistant, &summary);
                println!("{} {summary}", "Assistant:".green().bold());
                if refresh {
                    self.action_tx
                        .send(Action::RefreshLedger(self.user_id.to_string()))?;
                }
                print_prompt();
            }
            Event::HistoryCleared() => {
                println!("Conversation history cleared.");
                print_prompt();
            }
            Event::LedgerRefreshed(snapshot) => {
                tracing::debug!(profit = snapshot.profit, "Ledger refreshed");
                self.snapshot = snapshot;
            }
            Event::Notice(text) => {
                self.conversation.push_error(&text);
                println!("{}", text.yellow());
                print_prompt();
            }
            Event::TranscriptReady(transcript) => {
                println!("{} {transcript}", "You said:".cyan().bold());
                self.submit(&transcript)?;
            }
        }

        return Ok(());
    }
}

pub async fn start(
    action_tx: mpsc::UnboundedSender<Action>,
    event_rx: &mut mpsc::UnboundedReceiver<Event>,
) -> Result<()> {
    let mut ui = ChatUI::init(action_tx).await?;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    print_prompt();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    return Ok(());
                };
                if !ui.handle_input(&line).await? {
                    return Ok(());
                }
            }
            event = event_rx.recv() => {
                let Some(event) = event else {
                    return Ok(());
                };
                ui.handle_event(event).await?;
            }
        }
    }
}

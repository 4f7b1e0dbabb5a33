use anyhow::bail;
use anyhow::Result;
use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::Voice;
use crate::domain::models::VoiceName;

/// Speech I/O through external programs, the desktop stand-in for browser
/// speech APIs. The speech-to-text command prints one transcript to
/// stdout; the text-to-speech command reads its text from stdin and gets
/// the preferred voice name in $LEDGERCHAT_VOICE.
pub struct CommandVoice {
    stt_command: String,
    tts_command: String,
    voice: String,
}

impl Default for CommandVoice {
    fn default() -> CommandVoice {
        return CommandVoice {
            stt_command: Config::get(ConfigKey::SttCommand),
            tts_command: Config::get(ConfigKey::TtsCommand),
            voice: Config::get(ConfigKey::Voice),
        };
    }
}

#[async_trait]
impl Voice for CommandVoice {
    fn name(&self) -> VoiceName {
        return VoiceName::Command;
    }

    #[allow(clippy::implicit_return)]
    async fn health_check(&self) -> Result<()> {
        if self.stt_command.is_empty() && self.tts_command.is_empty() {
            bail!("No speech commands configured. Set stt-command and/or tts-command to enable voice I/O.");
        }

        return Ok(());
    }

    #[allow(clippy::implicit_return)]
    async fn transcribe(&self) -> Result<Option<String>> {
        if self.stt_command.is_empty() {
            bail!("Speech recognition is not configured. Set stt-command to enable it.");
        }

        let output = Command::new("sh")
            .arg("-c")
            .arg(&self.stt_command)
            .output()
            .await?;

        if !output.status.success() {
            bail!(format!(
                "Speech recognition command exited with {}",
                output.status
            ));
        }

        let transcript = String::from_utf8(output.stdout)?.trim().to_string();
        if transcript.is_empty() {
            return Ok(None);
        }

        return Ok(Some(transcript));
    }

    #[allow(clippy::implicit_return)]
    async fn speak(&self, text: &str) -> Result<()> {
        if self.tts_command.is_empty() {
            bail!("Speech synthesis is not configured. Set tts-command to enable it.");
        }

        let mut child = Command::new("sh")
            .arg("-c")
            .arg(&self.tts_command)
            .env("LEDGERCHAT_VOICE", &self.voice)
            .stdin(std::process::Stdio::piped())
            .spawn()?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(text.as_bytes()).await?;
        }

        let status = child.wait().await?;
        if !status.success() {
            bail!(format!("Speech synthesis command exited with {status}"));
        }

        return Ok(());
    }
}

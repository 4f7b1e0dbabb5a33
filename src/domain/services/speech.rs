#[cfg(test)]
#[path = "speech_test.rs"]
mod tests;

use std::time::Duration;

use crate::configuration::Config;
use crate::configuration::ConfigKey;

/// Pause between capturing a transcript and auto-sending it, applied in
/// the transcription worker so the UI loop never blocks on it. A debounce,
/// not a contract.
pub const AUTO_SEND_DELAY: Duration = Duration::from_millis(500);

pub fn voice_output_enabled() -> bool {
    return Config::get(ConfigKey::VoiceOutput) == "true";
}

/// Strips markdown punctuation and flattens newlines so synthesized speech
/// doesn't read formatting characters aloud.
pub fn prepare_for_speech(text: &str) -> String {
    return text
        .chars()
        .filter(|c| return !matches!(c, '*' | '_' | '#' | '`'))
        .collect::<String>()
        .replace('\n', ". ");
}

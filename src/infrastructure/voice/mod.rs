pub mod command;
pub mod noop;

use anyhow::bail;
use anyhow::Result;

use crate::domain::models::VoiceBox;
use crate::domain::models::VoiceName;

pub struct VoiceManager {}

impl VoiceManager {
    pub fn get(name: VoiceName) -> Result<VoiceBox> {
        if name == VoiceName::Command {
            return Ok(Box::<command::CommandVoice>::default());
        }

        if name == VoiceName::None {
            return Ok(Box::<noop::NoopVoice>::default());
        }

        bail!(format!("No voice backend implemented for {name}"))
    }
}

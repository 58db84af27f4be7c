//! Voice command phrases.
//!
//! Speech recognition lives outside the engine; a transcript string comes in
//! and at most one command comes out.

use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VoiceCommand {
    /// Clear all strokes and recalibrate.
    ResetScene,
    /// Flip between the virtual scene and passthrough.
    TogglePassthrough,
}

/// Phrase lists matched against lowercased transcripts by substring.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct VoicePhrases {
    pub reset_scene: Vec<String>,
    pub toggle_mode: Vec<String>,
}

impl Default for VoicePhrases {
    fn default() -> Self {
        let owned = |v: &[&str]| -> Vec<String> { v.iter().map(|s| s.to_string()).collect() };
        VoicePhrases {
            reset_scene: owned(&["new", "reset scene", "clear scene", "start over", "reset"]),
            toggle_mode: owned(&["mode", "toggle mode", "passthrough", "real world", "toggle background"]),
        }
    }
}

impl VoicePhrases {
    /// Reset phrases win over mode phrases when both appear.
    pub fn match_transcript(&self, text: &str) -> Option<VoiceCommand> {
        let text = text.trim().to_lowercase();
        if text.is_empty() {
            return None;
        }
        let hit = |phrases: &[String]| {
            phrases
                .iter()
                .map(|p| p.trim().to_lowercase())
                .any(|p| !p.is_empty() && text.contains(&p))
        };
        if hit(&self.reset_scene) {
            Some(VoiceCommand::ResetScene)
        } else if hit(&self.toggle_mode) {
            Some(VoiceCommand::TogglePassthrough)
        } else {
            None
        }
    }
}

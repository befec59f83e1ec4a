//! Conversation log shared by the player, the driver and the UI shell.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    Player,
    Driver,
    System,
}

impl Speaker {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Player => "player",
            Self::Driver => "driver",
            Self::System => "system",
        }
    }
}

impl fmt::Display for Speaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shell-visible voice pipeline state. `Processing` is owned by the turn
/// protocol; the others are set by the shell around capture and playback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum VoiceStatus {
    #[default]
    Idle,
    Listening,
    Processing,
    Replying,
}

impl VoiceStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Listening => "listening",
            Self::Processing => "processing",
            Self::Replying => "replying",
        }
    }

    /// Whether a conversational turn is awaiting its reply.
    #[must_use]
    pub const fn is_processing(self) -> bool {
        matches!(self, Self::Processing)
    }
}

impl fmt::Display for VoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One message in the ride conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationEntry {
    pub id: String,
    pub speaker: Speaker,
    pub text: String,
    #[serde(default)]
    pub translation: Option<String>,
    #[serde(default)]
    pub romanization: Option<String>,
    /// Owning character for translation bookkeeping (an NPC id or a
    /// progressive hint id).
    #[serde(default)]
    pub character_id: Option<String>,
    #[serde(default)]
    pub translation_revealed: bool,
}

impl ConversationEntry {
    #[must_use]
    pub fn new(id: String, speaker: Speaker, text: String) -> Self {
        Self {
            id,
            speaker,
            text,
            translation: None,
            romanization: None,
            character_id: None,
            translation_revealed: false,
        }
    }
}

/// Append-only message sequence for one round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ConversationLog {
    entries: Vec<ConversationEntry>,
}

impl ConversationLog {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn push(&mut self, entry: ConversationEntry) {
        self.entries.push(entry);
    }

    #[must_use]
    pub fn entries(&self) -> &[ConversationEntry] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Flag every message owned by `character_id` as translation-revealed.
    pub fn mark_translation_revealed(&mut self, character_id: &str) {
        for entry in &mut self.entries {
            if entry.character_id.as_deref() == Some(character_id) {
                entry.translation_revealed = true;
            }
        }
    }
}

impl<'a> IntoIterator for &'a ConversationLog {
    type Item = &'a ConversationEntry;
    type IntoIter = std::slice::Iter<'a, ConversationEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

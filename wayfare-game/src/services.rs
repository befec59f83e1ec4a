//! Traits for the platform collaborators the session depends on.
//!
//! The core never talks to a network or an audio device itself. Hosts supply
//! implementations of these traits; tests supply scripted ones.

use serde::{Deserialize, Serialize};

use crate::conversation::Speaker;
use crate::location::{Difficulty, Location, ProgressiveHint};

/// Everything a scenario backend needs to produce the next location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioRequest {
    pub difficulty: Difficulty,
    /// Names of locations already visited, so the backend can avoid repeats.
    pub used_location_names: Vec<String>,
}

/// One prior exchange, slimmed down for the dialogue backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryTurn {
    pub speaker: Speaker,
    pub text: String,
}

/// Everything a dialogue backend needs to answer one player question.
///
/// `conversation_history` holds the exchanges *before* the current question
/// and `progressive_hints` carries the full ladder so the backend can phrase
/// a reply as the next tier when it chooses to hint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DialogueRequest {
    pub player_question: String,
    pub location_name: String,
    pub driver_name: String,
    pub driver_languages: Vec<String>,
    pub difficulty: Difficulty,
    pub conversation_history: Vec<HistoryTurn>,
    pub hints_given: u32,
    pub progressive_hints: Vec<ProgressiveHint>,
}

/// A driver reply, possibly flagged as revealing a progressive hint tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DialogueReply {
    pub response: String,
    #[serde(default)]
    pub is_hint: bool,
    /// Ladder tier (1 through 3) when `is_hint` is set.
    #[serde(default)]
    pub hint_level: Option<u8>,
}

/// Recognized player speech.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transcription {
    pub text: String,
}

/// Produces the location for a round.
pub trait ScenarioSource {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Generate a location for the requested difficulty.
    ///
    /// # Errors
    ///
    /// Returns an error when no scenario can be produced; the session falls
    /// back to its built-in catalog in that case.
    fn generate(&mut self, request: &ScenarioRequest) -> Result<Location, Self::Error>;
}

/// Answers player questions in the driver's voice.
pub trait DialogueSource {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Produce the driver's reply to one player question.
    ///
    /// # Errors
    ///
    /// Returns an error when no reply can be produced; the player's message
    /// stays in the log and the turn is abandoned without penalty.
    fn reply(&mut self, request: &DialogueRequest) -> Result<DialogueReply, Self::Error>;
}

/// Speaks driver lines aloud.
pub trait SpeechSynthesizer {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Voice one line in the given language.
    ///
    /// # Errors
    ///
    /// Returns an error when synthesis fails; callers treat this as
    /// cosmetic and keep the round running.
    fn speak(&mut self, text: &str, language: &str) -> Result<(), Self::Error>;
}

/// Turns player speech into text.
pub trait Transcriber {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Capture one utterance.
    ///
    /// # Errors
    ///
    /// Returns an error when recognition fails; callers surface a notice and
    /// leave the round state untouched.
    fn transcribe(&mut self) -> Result<Transcription, Self::Error>;
}

//! Wayfare Game Engine
//!
//! Platform-agnostic core logic for the Wayfare taxi-ride geography game.
//! This crate provides round scoring and session progression without UI or
//! platform-specific dependencies.

pub mod catalog;
pub mod config;
mod constants;
pub mod conversation;
pub mod event;
pub mod location;
pub mod numbers;
pub mod rng;
pub mod round;
pub mod scoring;
pub mod services;
pub mod session;

// Re-export commonly used types
pub use catalog::FallbackCatalog;
pub use config::{GameConfig, GameConfigError};
pub use conversation::{ConversationEntry, ConversationLog, Speaker, VoiceStatus};
pub use event::{EventId, EventKind, EventSeverity, GameEvent, UiSurfaceHint};
pub use location::{
    Difficulty, DriverProfile, HintTier, Location, LocationError, NpcEntry, ProgressiveHint,
    normalize_guess,
};
pub use round::{HintKey, RoundState};
pub use rng::SessionRng;
pub use scoring::{ScoreConfig, ScoreInput, score_round};
pub use services::{
    DialogueReply, DialogueRequest, DialogueSource, HistoryTurn, ScenarioRequest, ScenarioSource,
    SpeechSynthesizer, Transcriber, Transcription,
};
pub use session::{
    ClueOutcome, GamePhase, GameSession, GuessOutcome, HintOutcome, RoundOutcome, SessionError,
    TickOutcome, TranslationOutcome, TurnError, TurnOutcome, TurnTicket,
};

/// What `advance_from_summary` did with the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionAdvance {
    /// A new round began; schedule ticks against this epoch.
    NextRound { epoch: u64 },
    /// The final round's summary was confirmed and the session ended.
    Completed { total_points: u32 },
}

/// Session plus its content collaborators, wired together.
///
/// The host owns the scenario and dialogue sources and runs the fetch /
/// apply halves of each exchange so shells only deal in session calls.
/// Speech synthesis and transcription stay shell-side; their failures are
/// reported through [`GameSession::note_speech_failure`].
pub struct GameHost<S, D>
where
    S: ScenarioSource,
    D: DialogueSource,
{
    session: GameSession,
    scenarios: S,
    dialogue: D,
}

impl<S, D> GameHost<S, D>
where
    S: ScenarioSource,
    D: DialogueSource,
{
    /// Create a host around an existing session and its collaborators.
    pub const fn new(session: GameSession, scenarios: S, dialogue: D) -> Self {
        Self {
            session,
            scenarios,
            dialogue,
        }
    }

    #[must_use]
    pub const fn session(&self) -> &GameSession {
        &self.session
    }

    pub const fn session_mut(&mut self) -> &mut GameSession {
        &mut self.session
    }

    /// Fetch the next scenario and start the round with it. Generation
    /// failure is absorbed into the session's fallback path.
    ///
    /// # Errors
    ///
    /// Returns an error when the session refuses the transition or no
    /// scenario is available at all.
    pub fn start_round(&mut self) -> Result<u64, anyhow::Error> {
        let request = self.session.scenario_request();
        let generated = self.scenarios.generate(&request).ok();
        Ok(self.session.start_round(generated)?)
    }

    /// Run one full conversational turn: begin, fetch the driver reply,
    /// resolve. A dialogue failure resolves as [`TurnOutcome::Failed`]
    /// rather than an error.
    ///
    /// # Errors
    ///
    /// Returns an error when the session refuses to begin the turn (wrong
    /// phase, review mode, a reply already pending, blank input).
    pub fn take_turn(&mut self, question: &str) -> Result<TurnOutcome, anyhow::Error> {
        let (request, ticket) = self.session.begin_turn(question)?;
        match self.dialogue.reply(&request) {
            Ok(reply) => Ok(self.session.complete_turn(ticket, reply)?),
            Err(_) => Ok(self.session.fail_turn(ticket)?),
        }
    }

    /// Confirm a ride summary: start the next round while rounds remain,
    /// otherwise complete the session.
    ///
    /// # Errors
    ///
    /// Returns an error when the session is not sitting in a summary.
    pub fn advance_from_summary(&mut self) -> Result<SessionAdvance, anyhow::Error> {
        if self.session.has_next_round() {
            let epoch = self.start_round()?;
            Ok(SessionAdvance::NextRound { epoch })
        } else {
            let total_points = self.session.complete_session()?;
            Ok(SessionAdvance::Completed { total_points })
        }
    }
}

//! Centralized balance and tuning constants for Wayfare game logic.
//!
//! These values define the deterministic math for round scoring and the
//! session state machine. Keeping them together ensures that gameplay can
//! only be adjusted via code changes reviewed in version control, rather
//! than through external JSON assets.

// Logging keys -------------------------------------------------------------
pub(crate) const LOG_ROUND_START: &str = "log.round.start";
pub(crate) const LOG_ROUND_CORRECT: &str = "log.round.correct";
pub(crate) const LOG_ROUND_TIMEOUT: &str = "log.round.timeout";
pub(crate) const LOG_ROUND_ABANDONED: &str = "log.round.abandoned";
pub(crate) const LOG_GUESS_WRONG: &str = "log.guess.wrong";
pub(crate) const LOG_HINT_REVEALED: &str = "log.hint.revealed";
pub(crate) const LOG_HINT_EXHAUSTED: &str = "log.hint.exhausted";
pub(crate) const LOG_HINT_NPC_CLUE: &str = "log.hint.npc-clue";
pub(crate) const LOG_HINT_DIALOGUE: &str = "log.hint.dialogue";
pub(crate) const LOG_TRANSLATION_REVEALED: &str = "log.translation.revealed";
pub(crate) const LOG_SCENARIO_FALLBACK: &str = "log.scenario.fallback";
pub(crate) const LOG_DIALOGUE_FAILED: &str = "log.dialogue.failed";
pub(crate) const LOG_SPEECH_FAILED: &str = "log.speech.failed";
pub(crate) const LOG_TURN_STALE_DROP: &str = "log.turn.stale-drop";
pub(crate) const LOG_REVIEW_ENTER: &str = "log.review.enter";
pub(crate) const LOG_REVIEW_EXIT: &str = "log.review.exit";
pub(crate) const LOG_SESSION_COMPLETE: &str = "log.session.complete";

// Scoring tuning -----------------------------------------------------------
pub(crate) const BASE_POINTS: u32 = 1_000;
pub(crate) const TIME_BONUS_MAX: u32 = 500;
pub(crate) const HINT_PENALTY: u32 = 100;
pub(crate) const TRANSLATION_PENALTY: u32 = 50;
pub(crate) const WRONG_GUESS_PENALTY: u32 = 75;

// Round and session tuning -------------------------------------------------
pub(crate) const ROUND_SECONDS: u32 = 300;
pub(crate) const TOTAL_ROUNDS: usize = 6;
pub(crate) const PROGRESSIVE_HINT_SLOTS: usize = 3;
pub(crate) const NPCS_PER_LOCATION: usize = 3;

// Difficulty ladder: rounds below the first bound are easy, rounds at or
// above the second are hard, everything between is medium.
pub(crate) const EASY_ROUND_LIMIT: usize = 2;
pub(crate) const HARD_ROUND_START: usize = 4;

// Configuration bounds -----------------------------------------------------
pub(crate) const MIN_ROUND_SECONDS: u32 = 10;
pub(crate) const MAX_ROUND_SECONDS: u32 = 3_600;
pub(crate) const MIN_TOTAL_ROUNDS: usize = 1;
pub(crate) const MAX_TOTAL_ROUNDS: usize = 50;
pub(crate) const MAX_BASE_POINTS: u32 = 1_000_000;

// Conversation boilerplate -------------------------------------------------
pub(crate) const HINT_REQUEST_LINE: &str = "Can you give me a hint?";
pub(crate) const FIRST_RIDE_INTRO: &str =
    "Your driver glances at you in the rear-view mirror and starts chatting: ";

#[cfg(test)]
pub(crate) const PERFECT_ROUND_POINTS: u32 = 1_500;
#[cfg(test)]
pub(crate) const PERFECT_SESSION_POINTS: u32 = 9_000;

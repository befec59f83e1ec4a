//! Session controller: the intro/playing/result/summary phase machine.
//!
//! One `GameSession` owns the live round, the cross-round aggregates and the
//! event queue. Every mutation goes through a named transition method that
//! returns a typed outcome; refusals are data, misuse is a typed error. The
//! session never talks to a backend itself: hosts fetch scenarios and driver
//! replies through the `services` traits and feed the results back in.

use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;

use crate::catalog::FallbackCatalog;
use crate::config::{GameConfig, GameConfigError};
use crate::constants::{
    FIRST_RIDE_INTRO, HINT_REQUEST_LINE, LOG_DIALOGUE_FAILED, LOG_GUESS_WRONG, LOG_HINT_DIALOGUE,
    LOG_HINT_EXHAUSTED, LOG_HINT_NPC_CLUE, LOG_HINT_REVEALED, LOG_REVIEW_ENTER, LOG_REVIEW_EXIT,
    LOG_ROUND_ABANDONED, LOG_ROUND_CORRECT, LOG_ROUND_START, LOG_ROUND_TIMEOUT,
    LOG_SCENARIO_FALLBACK, LOG_SESSION_COMPLETE, LOG_SPEECH_FAILED, LOG_TRANSLATION_REVEALED,
    LOG_TURN_STALE_DROP,
};
use crate::conversation::{ConversationEntry, Speaker, VoiceStatus};
use crate::event::{EventId, EventKind, GameEvent};
use crate::location::{Difficulty, HintTier, Location};
use crate::numbers::usize_to_u32;
use crate::rng::SessionRng;
use crate::round::{HintKey, RoundState};
use crate::scoring::{ScoreInput, score_round};
use crate::services::{DialogueReply, DialogueRequest, HistoryTurn, ScenarioRequest};

/// Top-level phase of the session state machine. Review mode is an
/// orthogonal flag on top of `Playing`, never a phase of its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GamePhase {
    Intro,
    Playing,
    Result,
    Summary,
}

impl GamePhase {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Intro => "intro",
            Self::Playing => "playing",
            Self::Result => "result",
            Self::Summary => "summary",
        }
    }
}

impl std::fmt::Display for GamePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything a result screen needs about a finished round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundOutcome {
    pub correct: bool,
    pub points: u32,
    /// The accepted guess, or `None` when the timer ran out.
    pub player_guess: Option<String>,
    pub location_name: String,
    /// Counter snapshot at the moment the round ended.
    pub score: ScoreInput,
}

/// Opaque handle for one in-flight conversational turn. Completion and
/// failure are validated against it; a ticket from a dead round is dropped
/// instead of applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TurnTicket {
    epoch: u64,
    turn: u32,
}

impl TurnTicket {
    /// Round epoch captured when the turn began.
    #[must_use]
    pub const fn epoch(&self) -> u64 {
        self.epoch
    }
}

/// Result of submitting a player guess.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuessOutcome {
    /// Terminal: the guess matched and the round moved to `Result`.
    Correct { points: u32 },
    /// Non-terminal: the counter grew, the round keeps playing.
    Wrong { wrong_guesses: u32 },
    /// Blank input is refused before it can count as wrong.
    EmptyRejected,
    /// Guessing is frozen while reviewing a finished ride.
    ReviewLocked,
}

/// Result of an explicit hint request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HintOutcome {
    Revealed { tier: HintTier, hints_used: u32 },
    /// The shared reveal set already holds three entries.
    Exhausted,
    ReviewLocked,
}

/// Result of tapping a street character.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClueOutcome {
    /// The clue bubble opened; `counted` says whether it joined the scored
    /// set (an `npc_clue_cap` can exhaust without closing the bubbles).
    Revealed { counted: bool, hints_used: u32 },
    AlreadyRevealed,
    ReviewLocked,
}

/// Result of revealing a message translation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranslationOutcome {
    Revealed { translations_used: u32 },
    AlreadyRevealed,
    ReviewLocked,
}

/// Result of one timer tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Ticked { time_remaining: u32 },
    /// Terminal: the clock hit zero and the round was scored.
    Expired { points: u32 },
    /// Epoch mismatch, wrong phase or review mode; nothing changed.
    Stale,
}

/// Result of resolving a conversational turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnOutcome {
    /// The driver reply was appended; `hint_revealed` is set when the reply
    /// was hint-flagged and the tier was new.
    Replied { hint_revealed: Option<HintTier> },
    /// The backend failed; the player message stays, nothing is charged.
    Failed,
    /// The result belonged to a dead round and was discarded.
    StaleDropped,
}

/// Misuse of the two-phase turn protocol.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TurnError {
    #[error("a driver reply is already pending for this round")]
    ReplyPending,
    #[error("conversation is unavailable in the {phase} phase")]
    Unavailable { phase: GamePhase },
    #[error("conversation is frozen during ride review")]
    ReviewLocked,
    #[error("utterance is empty")]
    EmptyUtterance,
    #[error("no matching turn is in flight")]
    NoTurnInFlight,
}

/// Misuse of the session state machine.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("{op} is not allowed in the {phase} phase")]
    WrongPhase { op: &'static str, phase: GamePhase },
    #[error("no scenario available: generation failed and the fallback catalog is empty")]
    NoScenarioAvailable,
    #[error("review is only available after a correct guess")]
    ReviewUnavailable,
    #[error("rounds remain before the session can complete")]
    RoundsRemaining,
    #[error("all rounds are played; the session can only complete")]
    AllRoundsPlayed,
    #[error("unknown street character id: {id}")]
    UnknownNpc { id: String },
}

/// Session controller owning the live round and all cross-round state.
#[derive(Debug, Clone)]
pub struct GameSession {
    config: GameConfig,
    rng: SessionRng,
    catalog: FallbackCatalog,
    phase: GamePhase,
    review_mode: bool,
    voice_status: VoiceStatus,
    total_points: u32,
    current_round_index: usize,
    visited_location_names: Vec<String>,
    round: Option<RoundState>,
    last_outcome: Option<RoundOutcome>,
    pending_turn: Option<TurnTicket>,
    epoch_counter: u64,
    turn_counter: u32,
    event_seq: u32,
    events: Vec<GameEvent>,
}

impl GameSession {
    /// Create a session with the built-in fallback catalog.
    ///
    /// # Errors
    ///
    /// Returns `GameConfigError` when the configuration violates its bounds.
    pub fn new(config: GameConfig, seed: u64) -> Result<Self, GameConfigError> {
        Self::with_catalog(config, seed, FallbackCatalog::load())
    }

    /// Create a session with an explicit fallback catalog.
    ///
    /// # Errors
    ///
    /// Returns `GameConfigError` when the configuration violates its bounds.
    pub fn with_catalog(
        config: GameConfig,
        seed: u64,
        catalog: FallbackCatalog,
    ) -> Result<Self, GameConfigError> {
        config.validate()?;
        Ok(Self::build(config, seed, catalog))
    }

    /// Create a session from an untrusted configuration, clamping every
    /// field into bounds instead of rejecting it.
    #[must_use]
    pub fn sanitized(mut config: GameConfig, seed: u64) -> Self {
        config.sanitize();
        Self::build(config, seed, FallbackCatalog::load())
    }

    fn build(config: GameConfig, seed: u64, catalog: FallbackCatalog) -> Self {
        Self {
            config,
            rng: SessionRng::from_user_seed(seed),
            catalog,
            phase: GamePhase::Intro,
            review_mode: false,
            voice_status: VoiceStatus::Idle,
            total_points: 0,
            current_round_index: 0,
            visited_location_names: Vec::new(),
            round: None,
            last_outcome: None,
            pending_turn: None,
            epoch_counter: 0,
            turn_counter: 0,
            event_seq: 0,
            events: Vec::new(),
        }
    }

    /// Deterministically reseed the session RNG streams.
    pub fn reseed(&mut self, seed: u64) {
        self.rng = SessionRng::from_user_seed(seed);
    }

    #[must_use]
    pub const fn config(&self) -> &GameConfig {
        &self.config
    }

    #[must_use]
    pub const fn phase(&self) -> GamePhase {
        self.phase
    }

    #[must_use]
    pub const fn in_review(&self) -> bool {
        self.review_mode
    }

    #[must_use]
    pub const fn voice_status(&self) -> VoiceStatus {
        self.voice_status
    }

    #[must_use]
    pub const fn total_points(&self) -> u32 {
        self.total_points
    }

    #[must_use]
    pub const fn current_round_index(&self) -> usize {
        self.current_round_index
    }

    #[must_use]
    pub fn visited_location_names(&self) -> &[String] {
        &self.visited_location_names
    }

    #[must_use]
    pub const fn round(&self) -> Option<&RoundState> {
        self.round.as_ref()
    }

    #[must_use]
    pub const fn last_outcome(&self) -> Option<&RoundOutcome> {
        self.last_outcome.as_ref()
    }

    #[must_use]
    pub const fn turn_in_flight(&self) -> bool {
        self.pending_turn.is_some()
    }

    /// Whether another round follows the current one.
    #[must_use]
    pub const fn has_next_round(&self) -> bool {
        self.current_round_index + 1 < self.config.total_rounds
    }

    /// Events emitted since the last drain, oldest first.
    #[must_use]
    pub fn events(&self) -> &[GameEvent] {
        &self.events
    }

    /// Take every queued event, leaving the queue empty.
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// The request a scenario backend needs for the round `start_round`
    /// would begin next.
    #[must_use]
    pub fn scenario_request(&self) -> ScenarioRequest {
        ScenarioRequest {
            difficulty: Difficulty::for_round(self.next_round_index()),
            used_location_names: self.visited_location_names.clone(),
        }
    }

    /// Begin the next round with a generated location, or with `None` when
    /// generation failed. An invalid location is treated like a failure:
    /// both take the fallback catalog path and surface a warning. Returns
    /// the new round's epoch for tick scheduling.
    ///
    /// # Errors
    ///
    /// `WrongPhase` outside `Intro`/`Summary`, `AllRoundsPlayed` after the
    /// final round's summary, and `NoScenarioAvailable` when generation
    /// failed and the catalog is empty; the session stays in its prior
    /// phase.
    pub fn start_round(&mut self, generated: Option<Location>) -> Result<u64, SessionError> {
        if !matches!(self.phase, GamePhase::Intro | GamePhase::Summary) {
            return Err(SessionError::WrongPhase {
                op: "start_round",
                phase: self.phase,
            });
        }
        if self.phase == GamePhase::Summary && !self.has_next_round() {
            return Err(SessionError::AllRoundsPlayed);
        }
        let index = self.next_round_index();
        let location = match generated {
            Some(location) if location.validate().is_ok() => location,
            other => {
                let fallback = self
                    .catalog
                    .pick(self.rng.scenario(), &self.visited_location_names)
                    .cloned()
                    .ok_or(SessionError::NoScenarioAvailable)?;
                let reason = match other {
                    Some(bad) => bad
                        .validate()
                        .err()
                        .map_or_else(|| "invalid location".to_string(), |e| e.to_string()),
                    None => "generation failed".to_string(),
                };
                self.emit_warning(
                    EventKind::ScenarioFallback,
                    LOG_SCENARIO_FALLBACK,
                    json!({ "location": fallback.name, "reason": reason }),
                );
                fallback
            }
        };

        self.current_round_index = index;
        self.epoch_counter = self.epoch_counter.saturating_add(1);
        let epoch = self.epoch_counter;
        let difficulty = Difficulty::for_round(index);
        let mut round = RoundState::new(location, difficulty, self.config.round_seconds, epoch);

        let opening = round.location().driver.opening_line.clone();
        let translation = round.location().driver.opening_translation.clone();
        let romanization = round.location().driver.opening_romanization.clone();
        let text = if index == 0 {
            format!("{FIRST_RIDE_INTRO}\"{opening}\"")
        } else {
            opening
        };
        let id = round.allocate_message_id();
        let mut entry = ConversationEntry::new(id, Speaker::Driver, text);
        entry.translation = translation;
        entry.romanization = romanization;
        round.push_message(entry);

        self.round = Some(round);
        self.phase = GamePhase::Playing;
        self.review_mode = false;
        self.voice_status = VoiceStatus::Idle;
        self.last_outcome = None;
        self.emit_notice(
            EventKind::RoundStarted,
            LOG_ROUND_START,
            json!({ "round": index + 1, "difficulty": difficulty.as_str() }),
        );
        Ok(epoch)
    }

    /// Submit a player guess. Correct guesses are terminal; wrong guesses
    /// grow the counter and keep the round playing; blank input never
    /// counts.
    ///
    /// # Errors
    ///
    /// `WrongPhase` when no round is being played.
    pub fn submit_guess(&mut self, guess: &str) -> Result<GuessOutcome, SessionError> {
        let Some(round) =
            Self::playing_round(self.phase, self.review_mode, &mut self.round, "submit_guess")?
        else {
            return Ok(GuessOutcome::ReviewLocked);
        };
        let trimmed = guess.trim();
        if trimmed.is_empty() {
            return Ok(GuessOutcome::EmptyRejected);
        }
        if round.location().accepts_guess(trimmed) {
            let points = self.finish_round(true, Some(trimmed.to_string()));
            self.emit_notice(
                EventKind::RoundCorrect,
                LOG_ROUND_CORRECT,
                json!({ "points": points }),
            );
            return Ok(GuessOutcome::Correct { points });
        }
        let wrong_guesses = round.record_wrong_guess();
        self.emit_toast(
            EventKind::GuessWrong,
            LOG_GUESS_WRONG,
            json!({ "wrong_guesses": wrong_guesses }),
        );
        Ok(GuessOutcome::Wrong { wrong_guesses })
    }

    /// Ask the driver for the next progressive hint. At most three entries
    /// ever sit in the shared reveal set; a further request is refused with
    /// a "no hints left" notice.
    ///
    /// # Errors
    ///
    /// `WrongPhase` when no round is being played.
    pub fn request_hint(&mut self) -> Result<HintOutcome, SessionError> {
        let Some(round) =
            Self::playing_round(self.phase, self.review_mode, &mut self.round, "request_hint")?
        else {
            return Ok(HintOutcome::ReviewLocked);
        };
        if !round.can_request_hint() {
            self.emit_toast(EventKind::HintExhausted, LOG_HINT_EXHAUSTED, json!(null));
            return Ok(HintOutcome::Exhausted);
        }
        let Some(tier) = round.next_unrevealed_tier() else {
            self.emit_toast(EventKind::HintExhausted, LOG_HINT_EXHAUSTED, json!(null));
            return Ok(HintOutcome::Exhausted);
        };
        let Some(hint) = round.location().hint(tier) else {
            return Ok(HintOutcome::Exhausted);
        };
        let text = hint.text.clone();
        let translation = hint.translation.clone();
        let romanization = hint.romanization.clone();
        let owner = format!("hint-{}", tier.level());

        let player_id = round.allocate_message_id();
        round.push_message(ConversationEntry::new(
            player_id,
            Speaker::Player,
            HINT_REQUEST_LINE.to_string(),
        ));
        let driver_id = round.allocate_message_id();
        let mut reply = ConversationEntry::new(driver_id, Speaker::Driver, text);
        reply.translation = translation;
        reply.romanization = romanization;
        reply.character_id = Some(owner);
        round.push_message(reply);
        round.reveal_hint(HintKey::Progressive(tier));
        let hints_used = round.hints_used();
        self.emit_toast(
            EventKind::HintRevealed,
            LOG_HINT_REVEALED,
            json!({ "tier": tier.as_str(), "hints_used": hints_used }),
        );
        Ok(HintOutcome::Revealed { tier, hints_used })
    }

    /// Open a street character's clue bubble. The first tap joins the
    /// scored reveal set unless `npc_clue_cap` is exhausted; the bubble
    /// itself always opens.
    ///
    /// # Errors
    ///
    /// `WrongPhase` when no round is being played, `UnknownNpc` for an id
    /// the location does not carry.
    pub fn reveal_npc_clue(&mut self, npc_id: &str) -> Result<ClueOutcome, SessionError> {
        let cap = self.config.npc_clue_cap;
        let Some(round) = Self::playing_round(
            self.phase,
            self.review_mode,
            &mut self.round,
            "reveal_npc_clue",
        )?
        else {
            return Ok(ClueOutcome::ReviewLocked);
        };
        if round.location().npc(npc_id).is_none() {
            return Err(SessionError::UnknownNpc {
                id: npc_id.to_string(),
            });
        }
        let key = HintKey::Npc(npc_id.to_string());
        if round.is_hint_revealed(&key) {
            return Ok(ClueOutcome::AlreadyRevealed);
        }
        if !cap.is_none_or(|cap| round.npc_clues_used() < cap) {
            return Ok(ClueOutcome::Revealed {
                counted: false,
                hints_used: round.hints_used(),
            });
        }
        round.reveal_hint(key);
        let hints_used = round.hints_used();
        self.emit_toast(
            EventKind::NpcClueRevealed,
            LOG_HINT_NPC_CLUE,
            json!({ "npc": npc_id, "hints_used": hints_used }),
        );
        Ok(ClueOutcome::Revealed {
            counted: true,
            hints_used,
        })
    }

    /// Reveal the translation owned by a message or character id. Only the
    /// first reveal counts; re-toggling never double-charges.
    ///
    /// # Errors
    ///
    /// `WrongPhase` when no round is being played.
    pub fn reveal_translation(
        &mut self,
        owner_id: &str,
    ) -> Result<TranslationOutcome, SessionError> {
        let Some(round) = Self::playing_round(
            self.phase,
            self.review_mode,
            &mut self.round,
            "reveal_translation",
        )?
        else {
            return Ok(TranslationOutcome::ReviewLocked);
        };
        if !round.reveal_translation(owner_id) {
            return Ok(TranslationOutcome::AlreadyRevealed);
        }
        let translations_used = round.translations_used();
        self.emit_toast(
            EventKind::TranslationRevealed,
            LOG_TRANSLATION_REVEALED,
            json!({ "owner": owner_id, "translations_used": translations_used }),
        );
        Ok(TranslationOutcome::Revealed { translations_used })
    }

    /// Burn one second off the live round's clock. The epoch, phase and
    /// review guards are re-checked here on every call; a tick scheduled
    /// for a dead round is a no-op. Expiry terminates the round exactly
    /// once, scoring with zero time remaining.
    #[must_use]
    pub fn tick(&mut self, epoch: u64) -> TickOutcome {
        let live = self.phase == GamePhase::Playing
            && !self.review_mode
            && self.round.as_ref().is_some_and(|r| r.epoch() == epoch);
        if !live {
            return TickOutcome::Stale;
        }
        let Some(round) = self.round.as_mut() else {
            return TickOutcome::Stale;
        };
        let time_remaining = round.tick();
        if time_remaining > 0 {
            return TickOutcome::Ticked { time_remaining };
        }
        let points = self.finish_round(false, None);
        self.emit_warning(
            EventKind::RoundTimeout,
            LOG_ROUND_TIMEOUT,
            json!({ "points": points }),
        );
        TickOutcome::Expired { points }
    }

    /// Begin a conversational turn: append the player message, enter the
    /// `processing` voice state and hand back the backend request plus the
    /// ticket the reply must be resolved with.
    ///
    /// # Errors
    ///
    /// `ReplyPending` while a turn for this round is in flight,
    /// `Unavailable`/`ReviewLocked` outside live play, `EmptyUtterance` for
    /// blank input.
    pub fn begin_turn(
        &mut self,
        question: &str,
    ) -> Result<(DialogueRequest, TurnTicket), TurnError> {
        if self.phase != GamePhase::Playing {
            return Err(TurnError::Unavailable { phase: self.phase });
        }
        if self.review_mode {
            return Err(TurnError::ReviewLocked);
        }
        let trimmed = question.trim();
        if trimmed.is_empty() {
            return Err(TurnError::EmptyUtterance);
        }
        let Some(live_epoch) = self.round.as_ref().map(RoundState::epoch) else {
            return Err(TurnError::Unavailable { phase: self.phase });
        };
        if let Some(pending) = self.pending_turn {
            if pending.epoch == live_epoch {
                return Err(TurnError::ReplyPending);
            }
            // A turn begun in an earlier round never resolved; its reply is
            // dead on arrival either way.
            self.pending_turn = None;
            self.emit_notice(
                EventKind::TurnStaleDropped,
                LOG_TURN_STALE_DROP,
                json!({ "turn": pending.turn }),
            );
        }
        self.turn_counter = self.turn_counter.saturating_add(1);
        let ticket = TurnTicket {
            epoch: live_epoch,
            turn: self.turn_counter,
        };
        let Some(round) = self.round.as_mut() else {
            return Err(TurnError::Unavailable { phase: self.phase });
        };
        let location = round.location();
        let request = DialogueRequest {
            player_question: trimmed.to_string(),
            location_name: location.name.clone(),
            driver_name: location.driver.name.clone(),
            driver_languages: location.driver.languages.clone(),
            difficulty: location.language_difficulty,
            conversation_history: round
                .conversation()
                .entries()
                .iter()
                .map(|entry| HistoryTurn {
                    speaker: entry.speaker,
                    text: entry.text.clone(),
                })
                .collect(),
            hints_given: round.hints_used(),
            progressive_hints: round.location().progressive_hints.clone(),
        };
        let id = round.allocate_message_id();
        round.push_message(ConversationEntry::new(
            id,
            Speaker::Player,
            trimmed.to_string(),
        ));
        self.pending_turn = Some(ticket);
        self.voice_status = VoiceStatus::Processing;
        Ok((request, ticket))
    }

    /// Resolve a turn with the driver's reply. A hint-flagged reply with a
    /// valid tier level gets the same bookkeeping as an explicit request;
    /// a reply for a dead round is dropped with a notice.
    ///
    /// # Errors
    ///
    /// `NoTurnInFlight` when the ticket targets the live round but no such
    /// turn is pending.
    pub fn complete_turn(
        &mut self,
        ticket: TurnTicket,
        reply: DialogueReply,
    ) -> Result<TurnOutcome, TurnError> {
        if !self.ticket_is_live(ticket) {
            return self.reject_turn_result(ticket);
        }
        self.pending_turn = None;
        self.voice_status = VoiceStatus::Idle;
        let hint_tier = if reply.is_hint {
            reply.hint_level.and_then(HintTier::from_level)
        } else {
            None
        };
        let Some(round) = self.round.as_mut() else {
            return Err(TurnError::NoTurnInFlight);
        };
        let id = round.allocate_message_id();
        round.push_message(ConversationEntry::new(id, Speaker::Driver, reply.response));
        let mut revealed = None;
        if let Some(tier) = hint_tier {
            if round.reveal_hint(HintKey::Progressive(tier)) {
                revealed = Some((tier, round.hints_used()));
            }
        }
        if let Some((tier, hints_used)) = revealed {
            self.emit_toast(
                EventKind::DialogueHintRevealed,
                LOG_HINT_DIALOGUE,
                json!({ "tier": tier.as_str(), "hints_used": hints_used }),
            );
        }
        Ok(TurnOutcome::Replied {
            hint_revealed: revealed.map(|(tier, _)| tier),
        })
    }

    /// Resolve a turn whose backend call failed. The player message stays
    /// in the log, nothing is appended or charged, and a warning is
    /// surfaced.
    ///
    /// # Errors
    ///
    /// `NoTurnInFlight` when the ticket targets the live round but no such
    /// turn is pending.
    pub fn fail_turn(&mut self, ticket: TurnTicket) -> Result<TurnOutcome, TurnError> {
        if !self.ticket_is_live(ticket) {
            return self.reject_turn_result(ticket);
        }
        self.pending_turn = None;
        self.voice_status = VoiceStatus::Idle;
        self.emit_warning(EventKind::DialogueFailed, LOG_DIALOGUE_FAILED, json!(null));
        Ok(TurnOutcome::Failed)
    }

    /// Record a speech synthesis or transcription failure. Cosmetic: the
    /// turn, the timer and guessing are unaffected.
    pub fn note_speech_failure(&mut self) {
        self.emit_notice(EventKind::SpeechFailed, LOG_SPEECH_FAILED, json!(null));
    }

    /// Set the shell-owned voice state. Ignored while a turn is in flight
    /// for the live round; `processing` belongs to the turn protocol.
    pub fn set_voice_status(&mut self, status: VoiceStatus) {
        if self.voice_status.is_processing() && self.turn_in_flight() {
            return;
        }
        self.voice_status = status;
    }

    /// Re-enter the just-finished round read-only.
    ///
    /// # Errors
    ///
    /// `WrongPhase` outside `Result`, `ReviewUnavailable` when the round
    /// ended without a correct guess.
    pub fn enter_review(&mut self) -> Result<(), SessionError> {
        if self.phase != GamePhase::Result {
            return Err(SessionError::WrongPhase {
                op: "enter_review",
                phase: self.phase,
            });
        }
        if !self.last_outcome.as_ref().is_some_and(|o| o.correct) {
            return Err(SessionError::ReviewUnavailable);
        }
        self.phase = GamePhase::Playing;
        self.review_mode = true;
        self.emit_notice(EventKind::ReviewEntered, LOG_REVIEW_ENTER, json!(null));
        Ok(())
    }

    /// Leave review and return to the result screen.
    ///
    /// # Errors
    ///
    /// `WrongPhase` when not reviewing.
    pub fn leave_review(&mut self) -> Result<(), SessionError> {
        if !(self.phase == GamePhase::Playing && self.review_mode) {
            return Err(SessionError::WrongPhase {
                op: "leave_review",
                phase: self.phase,
            });
        }
        self.phase = GamePhase::Result;
        self.review_mode = false;
        self.emit_notice(EventKind::ReviewExited, LOG_REVIEW_EXIT, json!(null));
        Ok(())
    }

    /// Move from the result screen (or directly out of review) to the ride
    /// summary, appending the location to the visited list. The phase
    /// change makes a second append impossible.
    ///
    /// # Errors
    ///
    /// `WrongPhase` anywhere else.
    pub fn advance_to_summary(&mut self) -> Result<(), SessionError> {
        let from_review = self.phase == GamePhase::Playing && self.review_mode;
        if !(self.phase == GamePhase::Result || from_review) {
            return Err(SessionError::WrongPhase {
                op: "advance_to_summary",
                phase: self.phase,
            });
        }
        let Some(round) = self.round.as_ref() else {
            return Err(SessionError::WrongPhase {
                op: "advance_to_summary",
                phase: self.phase,
            });
        };
        let name = round.location().name.clone();
        if from_review {
            self.review_mode = false;
            self.emit_notice(EventKind::ReviewExited, LOG_REVIEW_EXIT, json!(null));
        }
        self.visited_location_names.push(name);
        self.phase = GamePhase::Summary;
        Ok(())
    }

    /// End the session after the final round's summary. Emits the
    /// completion event, resets the session for the menu and returns the
    /// final total.
    ///
    /// # Errors
    ///
    /// `WrongPhase` outside `Summary`, `RoundsRemaining` while rounds are
    /// left to play.
    pub fn complete_session(&mut self) -> Result<u32, SessionError> {
        if self.phase != GamePhase::Summary {
            return Err(SessionError::WrongPhase {
                op: "complete_session",
                phase: self.phase,
            });
        }
        if self.has_next_round() {
            return Err(SessionError::RoundsRemaining);
        }
        let total = self.total_points;
        self.emit_notice(
            EventKind::SessionCompleted,
            LOG_SESSION_COMPLETE,
            json!({ "total_points": total, "rounds": self.visited_location_names.len() }),
        );
        self.reset_to_menu();
        Ok(total)
    }

    /// Abandon the session from any phase: no scoring, the epoch dies with
    /// the round, and the session resets for the menu. The abandoned notice
    /// only fires for a round that was still being played.
    pub fn quit(&mut self) {
        let mid_round = self.phase == GamePhase::Playing && !self.review_mode;
        if mid_round && self.round.is_some() {
            self.emit_notice(
                EventKind::RoundAbandoned,
                LOG_ROUND_ABANDONED,
                json!({ "round": self.current_round_index + 1 }),
            );
        }
        self.reset_to_menu();
    }

    /// Round index `start_round` would begin next.
    fn next_round_index(&self) -> usize {
        match self.phase {
            GamePhase::Summary => self.current_round_index.saturating_add(1),
            _ => self.current_round_index,
        }
    }

    /// Shared gate for round operations: errors outside `Playing`, yields
    /// `None` in review mode so callers can refuse with their own outcome.
    fn playing_round<'a>(
        phase: GamePhase,
        review: bool,
        round: &'a mut Option<RoundState>,
        op: &'static str,
    ) -> Result<Option<&'a mut RoundState>, SessionError> {
        if phase != GamePhase::Playing {
            return Err(SessionError::WrongPhase { op, phase });
        }
        if review {
            return Ok(None);
        }
        let Some(round) = round.as_mut() else {
            return Err(SessionError::WrongPhase { op, phase });
        };
        Ok(Some(round))
    }

    /// Terminal bookkeeping shared by correct guesses and timer expiry.
    fn finish_round(&mut self, correct: bool, player_guess: Option<String>) -> u32 {
        let (points, outcome) = match self.round.as_ref() {
            Some(round) => {
                let input = round.score_input();
                let points = score_round(&self.config.scoring, self.config.round_seconds, &input);
                (
                    points,
                    Some(RoundOutcome {
                        correct,
                        points,
                        player_guess,
                        location_name: round.location().name.clone(),
                        score: input,
                    }),
                )
            }
            None => (0, None),
        };
        self.total_points = self.total_points.saturating_add(points);
        self.last_outcome = outcome;
        self.phase = GamePhase::Result;
        self.review_mode = false;
        self.voice_status = VoiceStatus::Idle;
        points
    }

    fn ticket_is_live(&self, ticket: TurnTicket) -> bool {
        self.phase == GamePhase::Playing
            && !self.review_mode
            && self.pending_turn == Some(ticket)
            && self.round.as_ref().is_some_and(|r| r.epoch() == ticket.epoch)
    }

    /// Discriminate a dead-round result (graceful drop) from protocol
    /// misuse against the live round.
    fn reject_turn_result(&mut self, ticket: TurnTicket) -> Result<TurnOutcome, TurnError> {
        let targets_live_round = self.phase == GamePhase::Playing
            && !self.review_mode
            && self.round.as_ref().is_some_and(|r| r.epoch() == ticket.epoch);
        if targets_live_round {
            return Err(TurnError::NoTurnInFlight);
        }
        if self.pending_turn == Some(ticket) {
            self.pending_turn = None;
            if self.voice_status.is_processing() {
                self.voice_status = VoiceStatus::Idle;
            }
        }
        self.emit_notice(
            EventKind::TurnStaleDropped,
            LOG_TURN_STALE_DROP,
            json!({ "turn": ticket.turn }),
        );
        Ok(TurnOutcome::StaleDropped)
    }

    fn reset_to_menu(&mut self) {
        // epoch_counter survives so tickets and ticks from the dead session
        // can never match a future round
        self.phase = GamePhase::Intro;
        self.review_mode = false;
        self.voice_status = VoiceStatus::Idle;
        self.total_points = 0;
        self.current_round_index = 0;
        self.visited_location_names.clear();
        self.round = None;
        self.last_outcome = None;
        self.pending_turn = None;
    }

    fn next_event_id(&mut self) -> EventId {
        let id = EventId::new(usize_to_u32(self.current_round_index), self.event_seq);
        self.event_seq = self.event_seq.saturating_add(1);
        id
    }

    fn emit_notice(&mut self, kind: EventKind, key: &'static str, payload: serde_json::Value) {
        let id = self.next_event_id();
        self.events
            .push(GameEvent::notice(id, kind, key).with_payload(payload));
    }

    fn emit_toast(&mut self, kind: EventKind, key: &'static str, payload: serde_json::Value) {
        let id = self.next_event_id();
        self.events
            .push(GameEvent::toast(id, kind, key).with_payload(payload));
    }

    fn emit_warning(&mut self, kind: EventKind, key: &'static str, payload: serde_json::Value) {
        let id = self.next_event_id();
        self.events
            .push(GameEvent::warning(id, kind, key).with_payload(payload));
    }
}

//! Per-round mutable state: timer, reveal sets, counters and transcript.
//!
//! Every round starts from a zeroed `RoundState`; nothing carries over from
//! the previous ride except session-level totals.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::constants::PROGRESSIVE_HINT_SLOTS;
use crate::conversation::{ConversationEntry, ConversationLog};
use crate::location::{Difficulty, HintTier, Location};
use crate::numbers::usize_to_u32;
use crate::scoring::ScoreInput;

/// One revealed hint. Explicit requests and hint-flagged driver replies share
/// the `Progressive` keys; street-character taps use `Npc` keys. All of them
/// live in a single set, so three NPC clues exhaust the explicit requests
/// just as three ladder rungs would.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HintKey {
    Progressive(HintTier),
    Npc(String),
}

/// Mutable state for the ride currently being played.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundState {
    location: Location,
    difficulty: Difficulty,
    epoch: u64,
    time_remaining: u32,
    revealed_hints: SmallVec<[HintKey; 6]>,
    revealed_translations: SmallVec<[String; 4]>,
    wrong_guesses: u32,
    conversation: ConversationLog,
    next_message_seq: u32,
}

impl RoundState {
    /// Fresh state for a new ride: full timer, zeroed counters, empty sets,
    /// empty transcript.
    #[must_use]
    pub fn new(location: Location, difficulty: Difficulty, round_seconds: u32, epoch: u64) -> Self {
        Self {
            location,
            difficulty,
            epoch,
            time_remaining: round_seconds,
            revealed_hints: SmallVec::new(),
            revealed_translations: SmallVec::new(),
            wrong_guesses: 0,
            conversation: ConversationLog::new(),
            next_message_seq: 0,
        }
    }

    #[must_use]
    pub const fn location(&self) -> &Location {
        &self.location
    }

    #[must_use]
    pub const fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    /// Timer generation this round belongs to; stale ticks carry an older one.
    #[must_use]
    pub const fn epoch(&self) -> u64 {
        self.epoch
    }

    #[must_use]
    pub const fn time_remaining(&self) -> u32 {
        self.time_remaining
    }

    #[must_use]
    pub const fn expired(&self) -> bool {
        self.time_remaining == 0
    }

    /// Burn one second off the clock, saturating at zero.
    pub fn tick(&mut self) -> u32 {
        self.time_remaining = self.time_remaining.saturating_sub(1);
        self.time_remaining
    }

    #[must_use]
    pub fn hints_used(&self) -> u32 {
        usize_to_u32(self.revealed_hints.len())
    }

    #[must_use]
    pub fn npc_clues_used(&self) -> u32 {
        let count = self
            .revealed_hints
            .iter()
            .filter(|key| matches!(key, HintKey::Npc(_)))
            .count();
        usize_to_u32(count)
    }

    #[must_use]
    pub fn translations_used(&self) -> u32 {
        usize_to_u32(self.revealed_translations.len())
    }

    #[must_use]
    pub const fn wrong_guesses(&self) -> u32 {
        self.wrong_guesses
    }

    /// Whether an explicit hint request is still allowed. The gate counts the
    /// whole reveal set, NPC clues included.
    #[must_use]
    pub fn can_request_hint(&self) -> bool {
        self.revealed_hints.len() < PROGRESSIVE_HINT_SLOTS
    }

    /// Lowest ladder rung not yet revealed, in climate, culture, landmark
    /// order.
    #[must_use]
    pub fn next_unrevealed_tier(&self) -> Option<HintTier> {
        HintTier::LADDER
            .into_iter()
            .find(|tier| !self.is_hint_revealed(&HintKey::Progressive(*tier)))
    }

    #[must_use]
    pub fn is_hint_revealed(&self, key: &HintKey) -> bool {
        self.revealed_hints.contains(key)
    }

    /// Insert a hint key. Returns `true` when the key is new; repeats never
    /// grow the set.
    pub fn reveal_hint(&mut self, key: HintKey) -> bool {
        if self.revealed_hints.contains(&key) {
            return false;
        }
        self.revealed_hints.push(key);
        true
    }

    #[must_use]
    pub fn is_translation_revealed(&self, owner_id: &str) -> bool {
        self.revealed_translations.iter().any(|id| id == owner_id)
    }

    /// Reveal the translation owned by an NPC or hint id. The first reveal
    /// counts and flags the owner's transcript messages; repeats are no-ops.
    pub fn reveal_translation(&mut self, owner_id: &str) -> bool {
        if self.is_translation_revealed(owner_id) {
            self.conversation.mark_translation_revealed(owner_id);
            return false;
        }
        self.revealed_translations.push(owner_id.to_string());
        self.conversation.mark_translation_revealed(owner_id);
        true
    }

    pub fn record_wrong_guess(&mut self) -> u32 {
        self.wrong_guesses = self.wrong_guesses.saturating_add(1);
        self.wrong_guesses
    }

    /// Counter snapshot in the shape the scorer consumes.
    #[must_use]
    pub fn score_input(&self) -> ScoreInput {
        ScoreInput {
            time_remaining: self.time_remaining,
            hints_used: self.hints_used(),
            translations_used: self.translations_used(),
            wrong_guesses: self.wrong_guesses,
        }
    }

    /// Deterministic id for the next transcript message.
    pub fn allocate_message_id(&mut self) -> String {
        let id = format!("msg-{}", self.next_message_seq);
        self.next_message_seq = self.next_message_seq.saturating_add(1);
        id
    }

    pub fn push_message(&mut self, entry: ConversationEntry) {
        self.conversation.push(entry);
    }

    #[must_use]
    pub const fn conversation(&self) -> &ConversationLog {
        &self.conversation
    }
}

//! Location scenarios: the immutable record a round is played against.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::constants::{
    EASY_ROUND_LIMIT, HARD_ROUND_START, NPCS_PER_LOCATION, PROGRESSIVE_HINT_SLOTS,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    #[default]
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Hard => "hard",
        }
    }

    /// Ladder across a session: early rounds are easy, late rounds hard.
    #[must_use]
    pub const fn for_round(round_index: usize) -> Self {
        if round_index < EASY_ROUND_LIMIT {
            Self::Easy
        } else if round_index >= HARD_ROUND_START {
            Self::Hard
        } else {
            Self::Medium
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "easy" => Ok(Self::Easy),
            "medium" => Ok(Self::Medium),
            "hard" => Ok(Self::Hard),
            _ => Err(()),
        }
    }
}

impl From<Difficulty> for String {
    fn from(value: Difficulty) -> Self {
        value.as_str().to_string()
    }
}

/// The three fixed clue tiers, revealed in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HintTier {
    Climate,
    Culture,
    Landmark,
}

impl HintTier {
    pub const LADDER: [Self; PROGRESSIVE_HINT_SLOTS] =
        [Self::Climate, Self::Culture, Self::Landmark];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Climate => "climate",
            Self::Culture => "culture",
            Self::Landmark => "landmark",
        }
    }

    /// One-based level as reported by the dialogue collaborator.
    #[must_use]
    pub const fn level(self) -> u8 {
        match self {
            Self::Climate => 1,
            Self::Culture => 2,
            Self::Landmark => 3,
        }
    }

    #[must_use]
    pub const fn from_level(level: u8) -> Option<Self> {
        match level {
            1 => Some(Self::Climate),
            2 => Some(Self::Culture),
            3 => Some(Self::Landmark),
            _ => None,
        }
    }
}

impl fmt::Display for HintTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A background passenger or street character carrying one clue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NpcEntry {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub clue: String,
    #[serde(default)]
    pub translation: Option<String>,
    #[serde(default)]
    pub romanization: Option<String>,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub mood: String,
    #[serde(default)]
    pub role: String,
}

/// One rung of the progressive hint ladder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressiveHint {
    pub tier: HintTier,
    pub text: String,
    #[serde(default)]
    pub translation: Option<String>,
    #[serde(default)]
    pub romanization: Option<String>,
}

/// The taxi driver persona attached to a location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriverProfile {
    pub name: String,
    #[serde(default)]
    pub languages: Vec<String>,
    pub opening_line: String,
    #[serde(default)]
    pub opening_translation: Option<String>,
    #[serde(default)]
    pub opening_romanization: Option<String>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LocationError {
    #[error("location name must not be empty")]
    EmptyName,
    #[error("expected {expected} npc entries, found {found}")]
    NpcCount { expected: usize, found: usize },
    #[error("npc entry {index} is missing an id or a clue")]
    NpcIncomplete { index: usize },
    #[error("expected {expected} progressive hints, found {found}")]
    HintCount { expected: usize, found: usize },
    #[error("progressive hint {position} should be {expected}, found {found}")]
    HintLadder {
        position: usize,
        expected: HintTier,
        found: HintTier,
    },
    #[error("progressive hint {tier} has no text")]
    EmptyHint { tier: HintTier },
    #[error("acceptable answers must contain at least one non-blank entry")]
    NoAcceptableAnswers,
}

/// Immutable scenario record for one round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub name: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub country: String,
    pub acceptable_answers: Vec<String>,
    /// How much the driver leans on the local language.
    #[serde(default)]
    pub language_difficulty: Difficulty,
    pub npcs: Vec<NpcEntry>,
    pub progressive_hints: Vec<ProgressiveHint>,
    pub driver: DriverProfile,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl Location {
    /// Check the structural invariants a round depends on.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant: empty name, NPC count or
    /// incomplete NPC entries, hint count or ladder order, empty hint text,
    /// or an answers set with no usable entry.
    pub fn validate(&self) -> Result<(), LocationError> {
        if self.name.trim().is_empty() {
            return Err(LocationError::EmptyName);
        }
        if self.npcs.len() != NPCS_PER_LOCATION {
            return Err(LocationError::NpcCount {
                expected: NPCS_PER_LOCATION,
                found: self.npcs.len(),
            });
        }
        for (index, npc) in self.npcs.iter().enumerate() {
            if npc.id.trim().is_empty() || npc.clue.trim().is_empty() {
                return Err(LocationError::NpcIncomplete { index });
            }
        }
        if self.progressive_hints.len() != PROGRESSIVE_HINT_SLOTS {
            return Err(LocationError::HintCount {
                expected: PROGRESSIVE_HINT_SLOTS,
                found: self.progressive_hints.len(),
            });
        }
        for (position, (hint, expected)) in self
            .progressive_hints
            .iter()
            .zip(HintTier::LADDER)
            .enumerate()
        {
            if hint.tier != expected {
                return Err(LocationError::HintLadder {
                    position,
                    expected,
                    found: hint.tier,
                });
            }
            if hint.text.trim().is_empty() {
                return Err(LocationError::EmptyHint { tier: hint.tier });
            }
        }
        if !self
            .acceptable_answers
            .iter()
            .any(|a| !normalize_guess(a).is_empty())
        {
            return Err(LocationError::NoAcceptableAnswers);
        }
        Ok(())
    }

    /// Whether a player guess matches any acceptable answer: normalized
    /// exact match, guess containing the answer, or answer containing the
    /// guess. Blank guesses never match.
    #[must_use]
    pub fn accepts_guess(&self, guess: &str) -> bool {
        let guess = normalize_guess(guess);
        if guess.is_empty() {
            return false;
        }
        self.acceptable_answers.iter().any(|answer| {
            let answer = normalize_guess(answer);
            !answer.is_empty()
                && (guess == answer || guess.contains(&answer) || answer.contains(&guess))
        })
    }

    #[must_use]
    pub fn hint(&self, tier: HintTier) -> Option<&ProgressiveHint> {
        self.progressive_hints.iter().find(|h| h.tier == tier)
    }

    #[must_use]
    pub fn npc(&self, id: &str) -> Option<&NpcEntry> {
        self.npcs.iter().find(|n| n.id == id)
    }
}

/// Trim and lowercase, the shared normalization for answers and guesses.
#[must_use]
pub fn normalize_guess(text: &str) -> String {
    text.trim().to_lowercase()
}

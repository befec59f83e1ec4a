//! Round scoring: pure, deterministic point computation.

use serde::{Deserialize, Serialize};

use crate::constants::{
    BASE_POINTS, HINT_PENALTY, TIME_BONUS_MAX, TRANSLATION_PENALTY, WRONG_GUESS_PENALTY,
};
use crate::numbers::clamp_i64_to_u32;

/// Tunable weights for the round score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreConfig {
    pub base_points: u32,
    pub time_bonus_max: u32,
    pub hint_penalty: u32,
    pub translation_penalty: u32,
    pub wrong_guess_penalty: u32,
}

impl Default for ScoreConfig {
    fn default() -> Self {
        Self {
            base_points: BASE_POINTS,
            time_bonus_max: TIME_BONUS_MAX,
            hint_penalty: HINT_PENALTY,
            translation_penalty: TRANSLATION_PENALTY,
            wrong_guess_penalty: WRONG_GUESS_PENALTY,
        }
    }
}

/// Usage counters for one finished round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ScoreInput {
    pub time_remaining: u32,
    pub hints_used: u32,
    pub translations_used: u32,
    pub wrong_guesses: u32,
}

/// Compute the points earned for a finished round.
///
/// Base points plus a time bonus of `floor(time_remaining / round_seconds ×
/// time_bonus_max)`, minus hint, translation and wrong-guess penalties,
/// clamped so the result is never negative. `time_remaining` above the round
/// budget is treated as a full budget.
#[must_use]
pub fn score_round(cfg: &ScoreConfig, round_seconds: u32, input: &ScoreInput) -> u32 {
    let budget = i64::from(round_seconds.max(1));
    let remaining = i64::from(input.time_remaining.min(round_seconds));
    let bonus = remaining * i64::from(cfg.time_bonus_max) / budget;

    let mut total = i64::from(cfg.base_points) + bonus;
    total -= i64::from(input.hints_used) * i64::from(cfg.hint_penalty);
    total -= i64::from(input.translations_used) * i64::from(cfg.translation_penalty);
    total -= i64::from(input.wrong_guesses) * i64::from(cfg.wrong_guess_penalty);
    clamp_i64_to_u32(total)
}

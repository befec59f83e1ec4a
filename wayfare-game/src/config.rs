//! Session configuration with validation and in-place sanitization.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{
    MAX_BASE_POINTS, MAX_ROUND_SECONDS, MAX_TOTAL_ROUNDS, MIN_ROUND_SECONDS, MIN_TOTAL_ROUNDS,
    ROUND_SECONDS, TOTAL_ROUNDS,
};
use crate::scoring::ScoreConfig;

/// Policy knobs for a whole session.
///
/// `npc_clue_cap` bounds how many street-character clues may join the scored
/// hint set; `None` leaves them uncapped. A cap of zero is legal and means
/// clue bubbles still open but never count against the score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameConfig {
    #[serde(default = "GameConfig::default_total_rounds")]
    pub total_rounds: usize,
    #[serde(default = "GameConfig::default_round_seconds")]
    pub round_seconds: u32,
    #[serde(default)]
    pub npc_clue_cap: Option<u32>,
    #[serde(default)]
    pub scoring: ScoreConfig,
}

impl GameConfig {
    #[must_use]
    pub const fn default_total_rounds() -> usize {
        TOTAL_ROUNDS
    }

    #[must_use]
    pub const fn default_round_seconds() -> u32 {
        ROUND_SECONDS
    }

    /// Validate configuration invariants before a session starts.
    ///
    /// # Errors
    ///
    /// Returns `GameConfigError` when any field violates the documented
    /// bounds.
    pub fn validate(&self) -> Result<(), GameConfigError> {
        self.validate_total_rounds()?;
        self.validate_round_seconds()?;
        self.validate_scoring()?;
        Ok(())
    }

    fn validate_total_rounds(&self) -> Result<(), GameConfigError> {
        if !(MIN_TOTAL_ROUNDS..=MAX_TOTAL_ROUNDS).contains(&self.total_rounds) {
            return Err(GameConfigError::RangeViolation {
                field: "total_rounds",
                min: MIN_TOTAL_ROUNDS as u64,
                max: MAX_TOTAL_ROUNDS as u64,
                value: self.total_rounds as u64,
            });
        }
        Ok(())
    }

    fn validate_round_seconds(&self) -> Result<(), GameConfigError> {
        if !(MIN_ROUND_SECONDS..=MAX_ROUND_SECONDS).contains(&self.round_seconds) {
            return Err(GameConfigError::RangeViolation {
                field: "round_seconds",
                min: u64::from(MIN_ROUND_SECONDS),
                max: u64::from(MAX_ROUND_SECONDS),
                value: u64::from(self.round_seconds),
            });
        }
        Ok(())
    }

    fn validate_scoring(&self) -> Result<(), GameConfigError> {
        if !(1..=MAX_BASE_POINTS).contains(&self.scoring.base_points) {
            return Err(GameConfigError::RangeViolation {
                field: "scoring.base_points",
                min: 1,
                max: u64::from(MAX_BASE_POINTS),
                value: u64::from(self.scoring.base_points),
            });
        }
        if self.scoring.time_bonus_max > MAX_BASE_POINTS {
            return Err(GameConfigError::RangeViolation {
                field: "scoring.time_bonus_max",
                min: 0,
                max: u64::from(MAX_BASE_POINTS),
                value: u64::from(self.scoring.time_bonus_max),
            });
        }
        Ok(())
    }

    /// Clamp every field into its documented bounds.
    pub fn sanitize(&mut self) {
        self.total_rounds = self.total_rounds.clamp(MIN_TOTAL_ROUNDS, MAX_TOTAL_ROUNDS);
        self.round_seconds = self.round_seconds.clamp(MIN_ROUND_SECONDS, MAX_ROUND_SECONDS);
        self.scoring.base_points = self.scoring.base_points.clamp(1, MAX_BASE_POINTS);
        self.scoring.time_bonus_max = self.scoring.time_bonus_max.min(MAX_BASE_POINTS);
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            total_rounds: Self::default_total_rounds(),
            round_seconds: Self::default_round_seconds(),
            npc_clue_cap: None,
            scoring: ScoreConfig::default(),
        }
    }
}

/// Errors raised when session configuration invariants are violated.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GameConfigError {
    #[error("{field} must be between {min} and {max} (got {value})")]
    RangeViolation {
        field: &'static str,
        min: u64,
        max: u64,
        value: u64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        assert_eq!(GameConfig::default().validate(), Ok(()));
    }

    #[test]
    fn zero_rounds_rejected() {
        let cfg = GameConfig {
            total_rounds: 0,
            ..GameConfig::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(GameConfigError::RangeViolation { field, .. }) if field == "total_rounds"
        ));
    }

    #[test]
    fn short_timer_rejected() {
        let cfg = GameConfig {
            round_seconds: 3,
            ..GameConfig::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(GameConfigError::RangeViolation { field, .. }) if field == "round_seconds"
        ));
    }

    #[test]
    fn absurd_base_points_rejected() {
        let mut cfg = GameConfig::default();
        cfg.scoring.base_points = 2_000_000;
        assert!(matches!(
            cfg.validate(),
            Err(GameConfigError::RangeViolation { field, .. }) if field == "scoring.base_points"
        ));
    }

    #[test]
    fn sanitize_clamps_into_bounds() {
        let mut cfg = GameConfig {
            total_rounds: 0,
            round_seconds: 1_000_000,
            ..GameConfig::default()
        };
        cfg.scoring.base_points = 0;
        cfg.sanitize();
        assert_eq!(cfg.total_rounds, MIN_TOTAL_ROUNDS);
        assert_eq!(cfg.round_seconds, MAX_ROUND_SECONDS);
        assert_eq!(cfg.scoring.base_points, 1);
        assert_eq!(cfg.validate(), Ok(()));
    }

    #[test]
    fn zero_clue_cap_is_legal() {
        let cfg = GameConfig {
            npc_clue_cap: Some(0),
            ..GameConfig::default()
        };
        assert_eq!(cfg.validate(), Ok(()));
    }

    #[test]
    fn empty_json_fills_defaults() {
        let cfg: GameConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg, GameConfig::default());
    }
}

use anyhow::Result;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use thiserror::Error;

use wayfare_game::{
    DialogueReply, DialogueRequest, DialogueSource, GameConfig, GameEvent, GamePhase, GameSession,
    RoundOutcome, TickOutcome,
};

use crate::logic::policy::{PlayerPolicy, PolicyDecision, RideAction};

/// Configuration for a simulation session.
#[derive(Debug, Clone)]
pub struct SimulationConfig {
    pub seed: u64,
    pub game_config: GameConfig,
    /// Probability that any single driver exchange fails outright.
    pub dialogue_failure_rate: f64,
}

impl SimulationConfig {
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            game_config: GameConfig::default(),
            dialogue_failure_rate: 0.0,
        }
    }

    #[must_use]
    pub fn with_game_config(mut self, game_config: GameConfig) -> Self {
        self.game_config = game_config;
        self
    }

    #[must_use]
    pub const fn with_dialogue_failure_rate(mut self, rate: f64) -> Self {
        self.dialogue_failure_rate = rate;
        self
    }
}

/// Snapshot of one applied policy decision.
#[derive(Debug, Clone)]
pub struct DecisionRecord {
    pub round: usize,
    /// Clock reading before the action was applied.
    pub time_remaining: u32,
    pub action: String,
    pub policy_name: String,
    pub rationale: Option<String>,
}

/// Result of advancing the simulation by one step. A step is one policy
/// consultation plus at most one clock tick, or one phase transition.
#[derive(Debug, Clone)]
pub struct StepOutcome {
    pub step: u32,
    pub round: usize,
    /// Phase after the step resolved.
    pub phase: GamePhase,
    pub ticked: bool,
    /// Present only when the policy did something other than wait.
    pub decision: Option<DecisionRecord>,
    /// Present on the step that ended a round.
    pub round_result: Option<RoundOutcome>,
    /// Events the engine emitted during this step.
    pub events: Vec<GameEvent>,
    /// Final session total, present on the completing step.
    pub session_total: Option<u32>,
    pub game_ended: bool,
}

#[derive(Debug, Error)]
#[error("driver script declined to answer")]
pub struct DriverScriptError;

/// Deterministic stand-in for the dialogue backend. Questions containing
/// the word "hint" are answered with the next ladder entry; everything else
/// gets canned small talk.
pub struct DriverScript {
    rng: ChaCha20Rng,
    failure_rate: f64,
}

const SMALL_TALK: &[&str] = &[
    "Ha! Twenty years behind this wheel and I still get lost.",
    "Busy? This is nothing, you should see it on match days.",
    "My cousin runs a food stall two streets over. Best in town.",
    "The radio only plays the same four songs, forgive me.",
];

impl DriverScript {
    #[must_use]
    pub fn new(seed: u64, failure_rate: f64) -> Self {
        Self {
            rng: ChaCha20Rng::seed_from_u64(seed),
            failure_rate,
        }
    }
}

impl DialogueSource for DriverScript {
    type Error = DriverScriptError;

    fn reply(&mut self, request: &DialogueRequest) -> Result<DialogueReply, Self::Error> {
        if self.failure_rate > 0.0 && self.rng.r#gen::<f64>() < self.failure_rate {
            return Err(DriverScriptError);
        }

        let wants_hint = request.player_question.to_lowercase().contains("hint");
        if wants_hint {
            let next = request.hints_given.min(2) as usize;
            if let Some(hint) = request.progressive_hints.get(next) {
                return Ok(DialogueReply {
                    response: format!("Since you ask so nicely... {}", hint.text),
                    is_hint: true,
                    hint_level: Some(hint.tier.level()),
                });
            }
        }

        let idx = self.rng.gen_range(0..SMALL_TALK.len());
        Ok(DialogueReply {
            response: SMALL_TALK[idx].to_string(),
            is_hint: false,
            hint_level: None,
        })
    }
}

/// Core deterministic simulation harness used by the tester. Owns the
/// session and resolves driver exchanges inline through [`DriverScript`],
/// so a step never leaves a turn in flight.
pub struct SimulationSession {
    session: GameSession,
    driver: DriverScript,
    epoch: u64,
    step: u32,
}

impl SimulationSession {
    #[must_use]
    pub fn new(config: &SimulationConfig) -> Self {
        let session = GameSession::sanitized(config.game_config.clone(), config.seed);
        let driver = DriverScript::new(config.seed, config.dialogue_failure_rate);
        Self {
            session,
            driver,
            epoch: 0,
            step: 0,
        }
    }

    #[must_use]
    pub const fn session(&self) -> &GameSession {
        &self.session
    }

    #[must_use]
    pub const fn session_mut(&mut self) -> &mut GameSession {
        &mut self.session
    }

    /// Advance the session by one step.
    ///
    /// Outside of live play this performs the pending phase transition;
    /// during play it applies one policy action and burns one second.
    ///
    /// # Errors
    ///
    /// Returns an error when the engine refuses an operation the harness
    /// believed legal. That indicates a harness or engine bug, so the run
    /// is aborted rather than patched over.
    pub fn advance(&mut self, policy: &mut dyn PlayerPolicy) -> Result<StepOutcome> {
        self.step += 1;
        let mut outcome = StepOutcome {
            step: self.step,
            round: self.session.current_round_index(),
            phase: self.session.phase(),
            ticked: false,
            decision: None,
            round_result: None,
            events: Vec::new(),
            session_total: None,
            game_ended: false,
        };

        match self.session.phase() {
            GamePhase::Intro => {
                self.epoch = self.session.start_round(None)?;
            }
            GamePhase::Playing => {
                self.play_one_second(policy, &mut outcome)?;
            }
            GamePhase::Result => {
                self.session.advance_to_summary()?;
            }
            GamePhase::Summary => {
                if self.session.has_next_round() {
                    self.epoch = self.session.start_round(None)?;
                } else {
                    let total = self.session.complete_session()?;
                    outcome.session_total = Some(total);
                    outcome.game_ended = true;
                }
            }
        }

        outcome.round = self.session.current_round_index();
        outcome.phase = self.session.phase();
        outcome.events = self.session.drain_events();
        Ok(outcome)
    }

    fn play_one_second(
        &mut self,
        policy: &mut dyn PlayerPolicy,
        outcome: &mut StepOutcome,
    ) -> Result<()> {
        let PolicyDecision { action, rationale } = policy.decide(&self.session);

        if action != RideAction::Wait {
            let time_remaining = self
                .session
                .round()
                .map_or(0, wayfare_game::RoundState::time_remaining);
            outcome.decision = Some(DecisionRecord {
                round: self.session.current_round_index(),
                time_remaining,
                action: action.label(),
                policy_name: policy.name().to_string(),
                rationale,
            });
        }

        match action {
            RideAction::Wait => {}
            RideAction::Guess(text) => {
                self.session.submit_guess(&text)?;
            }
            RideAction::RequestHint => {
                self.session.request_hint()?;
            }
            RideAction::AskNpc(id) => {
                self.session.reveal_npc_clue(&id)?;
            }
            RideAction::AskDriver(question) => {
                let (request, ticket) = self.session.begin_turn(&question)?;
                match self.driver.reply(&request) {
                    Ok(reply) => {
                        self.session.complete_turn(ticket, reply)?;
                    }
                    Err(_) => {
                        self.session.fail_turn(ticket)?;
                    }
                }
            }
            RideAction::RevealTranslation(owner) => {
                self.session.reveal_translation(&owner)?;
            }
        }

        if self.session.phase() == GamePhase::Playing {
            match self.session.tick(self.epoch) {
                TickOutcome::Ticked { .. } | TickOutcome::Expired { .. } => {
                    outcome.ticked = true;
                }
                TickOutcome::Stale => {}
            }
        }

        if self.session.phase() == GamePhase::Result {
            outcome.round_result = self.session.last_outcome().cloned();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::policy::GameplayStrategy;

    #[test]
    fn decisive_step_ends_the_round_without_burning_time() {
        let config = SimulationConfig::new(0xFACE);
        let mut sim = SimulationSession::new(&config);
        let mut policy = GameplayStrategy::Decisive.create_policy(config.seed);

        let intro = sim.advance(policy.as_mut()).unwrap();
        assert_eq!(intro.phase, GamePhase::Playing);
        assert!(intro.decision.is_none());

        let guess = sim.advance(policy.as_mut()).unwrap();
        assert_eq!(guess.phase, GamePhase::Result);
        assert!(!guess.ticked);
        let result = guess.round_result.expect("round settled");
        assert!(result.correct);
        assert_eq!(result.score.time_remaining, GameConfig::default_round_seconds());
    }

    #[test]
    fn distracted_steps_burn_exactly_one_second_each() {
        let config = SimulationConfig::new(0xFACE);
        let mut sim = SimulationSession::new(&config);
        let mut policy = GameplayStrategy::Distracted.create_policy(config.seed);

        sim.advance(policy.as_mut()).unwrap();
        let step = sim.advance(policy.as_mut()).unwrap();
        assert!(step.ticked);
        assert!(step.decision.is_none());
        let remaining = sim
            .session()
            .round()
            .map(wayfare_game::RoundState::time_remaining);
        assert_eq!(remaining, Some(GameConfig::default_round_seconds() - 1));
    }

    #[test]
    fn driver_script_answers_hint_questions_with_the_ladder() {
        let config = SimulationConfig::new(0xD1CE);
        let mut sim = SimulationSession::new(&config);
        let mut policy = GameplayStrategy::Chatty.create_policy(config.seed);

        sim.advance(policy.as_mut()).unwrap();
        let step = sim.advance(policy.as_mut()).unwrap();
        assert!(step.decision.is_some());
        let hints = sim.session().round().map(wayfare_game::RoundState::hints_used);
        assert_eq!(hints, Some(1));
    }

    #[test]
    fn failing_driver_costs_nothing() {
        let config = SimulationConfig::new(0xD1CE).with_dialogue_failure_rate(1.0);
        let mut sim = SimulationSession::new(&config);
        let mut policy = GameplayStrategy::Chatty.create_policy(config.seed);

        sim.advance(policy.as_mut()).unwrap();
        let step = sim.advance(policy.as_mut()).unwrap();
        assert!(
            step.events
                .iter()
                .any(|event| event.kind == wayfare_game::EventKind::DialogueFailed)
        );
        let hints = sim.session().round().map(wayfare_game::RoundState::hints_used);
        assert_eq!(hints, Some(0));
    }

    #[test]
    fn transition_steps_walk_result_and_summary() {
        let config = SimulationConfig::new(0xFACE);
        let mut sim = SimulationSession::new(&config);
        let mut policy = GameplayStrategy::Decisive.create_policy(config.seed);

        sim.advance(policy.as_mut()).unwrap();
        sim.advance(policy.as_mut()).unwrap();
        let summary = sim.advance(policy.as_mut()).unwrap();
        assert_eq!(summary.phase, GamePhase::Summary);
        let next_round = sim.advance(policy.as_mut()).unwrap();
        assert_eq!(next_round.phase, GamePhase::Playing);
        assert_eq!(next_round.round, 1);
    }
}

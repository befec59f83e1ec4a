use std::fmt;
use std::sync::Arc;

use anyhow::Result;

use wayfare_game::{EventKind, EventSeverity, GameConfig, GamePhase, RoundOutcome};

use crate::logic::policy::GameplayStrategy;
use crate::logic::simulation::{DecisionRecord, SimulationConfig, SimulationSession, StepOutcome};

/// Rule presets the tester can exercise. `Standard` mirrors the shipped
/// defaults; `Blitz` shortens rounds and caps NPC clues to stress the
/// penalty economy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RulesPreset {
    Standard,
    Blitz,
}

impl RulesPreset {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Standard => "Standard",
            Self::Blitz => "Blitz",
        }
    }

    #[must_use]
    pub fn game_config(self) -> GameConfig {
        match self {
            Self::Standard => GameConfig::default(),
            Self::Blitz => GameConfig {
                round_seconds: 60,
                npc_clue_cap: Some(2),
                ..GameConfig::default()
            },
        }
    }
}

impl fmt::Display for RulesPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Post-run assertion evaluated against a [`SimulationSummary`].
#[derive(Clone)]
pub struct SimulationExpectation(
    Arc<dyn Fn(&SimulationSummary) -> Result<()> + Send + Sync + 'static>,
);

impl SimulationExpectation {
    pub fn new<F>(check: F) -> Self
    where
        F: Fn(&SimulationSummary) -> Result<()> + Send + Sync + 'static,
    {
        Self(Arc::new(check))
    }

    /// # Errors
    ///
    /// Propagates the failure produced by the wrapped check.
    pub fn evaluate(&self, summary: &SimulationSummary) -> Result<()> {
        (self.0)(summary)
    }
}

impl fmt::Debug for SimulationExpectation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimulationExpectation").finish()
    }
}

impl<F> From<F> for SimulationExpectation
where
    F: Fn(&SimulationSummary) -> Result<()> + Send + Sync + 'static,
{
    fn from(check: F) -> Self {
        Self::new(check)
    }
}

/// Declarative description of one simulated session.
#[derive(Debug, Clone)]
pub struct SimulationPlan {
    pub preset: RulesPreset,
    pub strategy: GameplayStrategy,
    /// Step budget override. `None` derives one from the config; zero skips
    /// the simulation entirely (used by pure logic scenarios).
    pub max_steps: Option<u32>,
    pub setup: Option<fn(&mut GameConfig)>,
    pub dialogue_failure_rate: f64,
    pub expectations: Vec<SimulationExpectation>,
}

impl SimulationPlan {
    #[must_use]
    pub const fn new(preset: RulesPreset, strategy: GameplayStrategy) -> Self {
        Self {
            preset,
            strategy,
            max_steps: None,
            setup: None,
            dialogue_failure_rate: 0.0,
            expectations: Vec::new(),
        }
    }

    #[must_use]
    pub const fn with_max_steps(mut self, max_steps: u32) -> Self {
        self.max_steps = Some(max_steps);
        self
    }

    #[must_use]
    pub fn with_setup(mut self, setup: fn(&mut GameConfig)) -> Self {
        self.setup = Some(setup);
        self
    }

    #[must_use]
    pub const fn with_dialogue_failure_rate(mut self, rate: f64) -> Self {
        self.dialogue_failure_rate = rate;
        self
    }

    #[must_use]
    pub fn with_expectation(mut self, expectation: impl Into<SimulationExpectation>) -> Self {
        self.expectations.push(expectation.into());
        self
    }
}

/// Counters accumulated over a full simulated session.
#[derive(Debug, Clone, Default)]
pub struct SessionMetrics {
    pub rounds_played: u32,
    pub rounds_correct: u32,
    pub rounds_timed_out: u32,
    pub perfect_rounds: u32,
    pub total_points: u32,
    pub hints_used: u32,
    pub translations_used: u32,
    pub wrong_guesses: u32,
    pub dialogue_turns: u32,
    pub dialogue_hints: u32,
    pub dialogue_failures: u32,
    pub fallback_rounds: u32,
    pub steps_taken: u32,
    pub seconds_played: u32,
    pub warnings: u32,
    pub decision_log: Vec<DecisionRecord>,
    pub round_results: Vec<RoundOutcome>,
    pub ending: String,
}

impl SessionMetrics {
    pub fn record_step(&mut self, step: &StepOutcome) {
        self.steps_taken = step.step;
        if step.ticked {
            self.seconds_played += 1;
        }
        if let Some(decision) = &step.decision {
            if decision.action == "ask-driver" {
                self.dialogue_turns += 1;
            }
            self.decision_log.push(decision.clone());
        }
        if let Some(result) = &step.round_result {
            self.round_results.push(result.clone());
        }
        for event in &step.events {
            match event.kind {
                EventKind::DialogueHintRevealed => self.dialogue_hints += 1,
                EventKind::DialogueFailed => self.dialogue_failures += 1,
                EventKind::ScenarioFallback => self.fallback_rounds += 1,
                _ => {}
            }
            if event.severity != EventSeverity::Info {
                self.warnings += 1;
            }
        }
    }

    /// Derive the per-round aggregates once the run has stopped.
    pub fn finalize(&mut self, config: &GameConfig, ending: String) {
        self.ending = ending;
        let perfect = config
            .scoring
            .base_points
            .saturating_add(config.scoring.time_bonus_max);
        self.rounds_played = u32::try_from(self.round_results.len()).unwrap_or(u32::MAX);
        self.rounds_correct = 0;
        self.rounds_timed_out = 0;
        self.perfect_rounds = 0;
        self.total_points = 0;
        self.hints_used = 0;
        self.translations_used = 0;
        self.wrong_guesses = 0;
        for result in &self.round_results {
            if result.correct {
                self.rounds_correct += 1;
            } else {
                self.rounds_timed_out += 1;
            }
            if result.points == perfect {
                self.perfect_rounds += 1;
            }
            self.total_points = self.total_points.saturating_add(result.points);
            self.hints_used += result.score.hints_used;
            self.translations_used += result.score.translations_used;
            self.wrong_guesses += result.score.wrong_guesses;
        }
    }
}

/// Everything a run produced: the step log, derived metrics and the final
/// session reading. Expectations receive this whole.
#[derive(Debug, Clone)]
pub struct SimulationSummary {
    pub seed: u64,
    pub preset: RulesPreset,
    pub strategy: GameplayStrategy,
    pub steps: Vec<StepOutcome>,
    pub metrics: SessionMetrics,
    pub final_points: u32,
    pub final_phase: GamePhase,
    pub ending_message: String,
    pub game_ended: bool,
}

/// Derive a step budget that lets the slowest legal player finish: every
/// round can run its full clock plus transition steps, with headroom for
/// the intro and the closing summary.
#[must_use]
pub fn default_step_budget(config: &GameConfig) -> u32 {
    let rounds = u32::try_from(config.total_rounds).unwrap_or(u32::MAX);
    rounds
        .saturating_mul(config.round_seconds.saturating_add(8))
        .saturating_add(16)
}

/// Headless session runner. Builds the engine from a plan, drives it with
/// the plan's policy and collects the full step log.
#[derive(Debug, Clone)]
pub struct GameTester {
    verbose: bool,
}

impl GameTester {
    #[must_use]
    pub const fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    #[must_use]
    pub const fn verbose(&self) -> bool {
        self.verbose
    }

    #[must_use]
    pub fn run_plan(&self, plan: &SimulationPlan, seed: u64) -> SimulationSummary {
        let mut game_config = plan.preset.game_config();
        if let Some(setup) = plan.setup {
            setup(&mut game_config);
        }
        let max_steps = plan
            .max_steps
            .unwrap_or_else(|| default_step_budget(&game_config));

        let sim_config = SimulationConfig::new(seed)
            .with_game_config(game_config.clone())
            .with_dialogue_failure_rate(plan.dialogue_failure_rate);
        let mut sim = SimulationSession::new(&sim_config);
        let mut policy = plan.strategy.create_policy(seed);

        let mut metrics = SessionMetrics::default();
        let mut steps: Vec<StepOutcome> = Vec::new();
        let mut ending = String::new();
        let mut game_ended = false;
        let mut final_points = None;

        if max_steps == 0 {
            ending = "Simulation not executed".to_string();
        }

        for _ in 0..max_steps {
            match sim.advance(policy.as_mut()) {
                Ok(step) => {
                    if self.verbose {
                        Self::narrate(&step);
                    }
                    if let Some(total) = step.session_total {
                        final_points = Some(total);
                    }
                    let ended = step.game_ended;
                    metrics.record_step(&step);
                    steps.push(step);
                    if ended {
                        game_ended = true;
                        ending = "Session complete".to_string();
                        break;
                    }
                }
                Err(err) => {
                    ending = format!("Harness fault: {err:#}");
                    break;
                }
            }
        }
        if ending.is_empty() {
            ending = "Step budget exhausted".to_string();
        }

        let final_phase = sim.session().phase();
        let final_points = final_points.unwrap_or_else(|| sim.session().total_points());
        metrics.finalize(&game_config, ending.clone());

        SimulationSummary {
            seed,
            preset: plan.preset,
            strategy: plan.strategy,
            steps,
            metrics,
            final_points,
            final_phase,
            ending_message: ending,
            game_ended,
        }
    }

    fn narrate(step: &StepOutcome) {
        if let Some(decision) = &step.decision {
            println!(
                "  🎯 step {:>4} round {} t={:>3}s: {}",
                step.step,
                decision.round + 1,
                decision.time_remaining,
                decision.action
            );
        }
        if let Some(result) = &step.round_result {
            let mark = if result.correct { "✅" } else { "⏰" };
            println!(
                "🛣️  Round {} settled {} {} pts ({})",
                step.round + 1,
                mark,
                result.points,
                result.location_name
            );
        }
        if let Some(total) = step.session_total {
            println!("🏁 Session complete with {total} points");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::ensure;

    #[test]
    fn step_budget_covers_a_full_timeout_session() {
        let standard = RulesPreset::Standard.game_config();
        // Slowest path: intro + per-round full clock + settle/summary steps.
        let rounds = u32::try_from(standard.total_rounds).unwrap();
        let slowest = 1 + rounds * (standard.round_seconds + 2);
        assert!(default_step_budget(&standard) >= slowest);

        let blitz = RulesPreset::Blitz.game_config();
        let slowest = 1 + rounds * (blitz.round_seconds + 2);
        assert!(default_step_budget(&blitz) >= slowest);
    }

    #[test]
    fn blitz_preset_tightens_the_rules() {
        let config = RulesPreset::Blitz.game_config();
        assert_eq!(config.round_seconds, 60);
        assert_eq!(config.npc_clue_cap, Some(2));
        assert_eq!(
            config.total_rounds,
            RulesPreset::Standard.game_config().total_rounds
        );
    }

    #[test]
    fn plan_builders_compose() {
        let plan = SimulationPlan::new(RulesPreset::Standard, GameplayStrategy::Decisive)
            .with_max_steps(5)
            .with_dialogue_failure_rate(0.25)
            .with_expectation(|summary: &SimulationSummary| {
                ensure!(summary.seed == 7, "seed mismatch");
                Ok(())
            });
        assert_eq!(plan.max_steps, Some(5));
        assert!((plan.dialogue_failure_rate - 0.25).abs() < f64::EPSILON);
        assert_eq!(plan.expectations.len(), 1);
    }

    #[test]
    fn zero_step_plans_do_not_execute() {
        let tester = GameTester::new(false);
        let plan = SimulationPlan::new(RulesPreset::Standard, GameplayStrategy::Decisive)
            .with_max_steps(0);
        let summary = tester.run_plan(&plan, 99);
        assert!(!summary.game_ended);
        assert_eq!(summary.ending_message, "Simulation not executed");
        assert!(summary.steps.is_empty());
    }

    #[test]
    fn setup_hooks_reshape_the_session() {
        let tester = GameTester::new(false);
        let plan = SimulationPlan::new(RulesPreset::Standard, GameplayStrategy::Decisive)
            .with_setup(|config| config.total_rounds = 2);
        let summary = tester.run_plan(&plan, 0x5EED);
        assert!(summary.game_ended);
        assert_eq!(summary.metrics.rounds_played, 2);
    }

    #[test]
    fn decisive_run_completes_with_perfect_rounds() {
        let tester = GameTester::new(false);
        let plan = SimulationPlan::new(RulesPreset::Standard, GameplayStrategy::Decisive);
        let summary = tester.run_plan(&plan, 0x5EED);
        assert!(summary.game_ended);
        assert_eq!(summary.final_phase, GamePhase::Intro);
        let config = RulesPreset::Standard.game_config();
        let rounds = u32::try_from(config.total_rounds).unwrap();
        assert_eq!(summary.metrics.rounds_played, rounds);
        assert_eq!(summary.metrics.perfect_rounds, rounds);
        assert_eq!(
            summary.final_points,
            rounds * (config.scoring.base_points + config.scoring.time_bonus_max)
        );
    }

    #[test]
    fn distracted_run_times_out_every_round_and_banks_base_points() {
        let tester = GameTester::new(false);
        let plan = SimulationPlan::new(RulesPreset::Blitz, GameplayStrategy::Distracted);
        let summary = tester.run_plan(&plan, 0x5EED);
        assert!(summary.game_ended);
        let config = RulesPreset::Blitz.game_config();
        let rounds = u32::try_from(config.total_rounds).unwrap();
        assert_eq!(summary.metrics.rounds_timed_out, rounds);
        assert_eq!(summary.metrics.rounds_correct, 0);
        assert_eq!(summary.final_points, rounds * config.scoring.base_points);
        assert_eq!(
            summary.metrics.seconds_played,
            rounds * config.round_seconds
        );
    }
}

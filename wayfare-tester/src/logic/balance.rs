use std::collections::BTreeMap;

use anyhow::{Context, Result, ensure};

use wayfare_game::{
    Difficulty, FallbackCatalog, GameConfig, ScoreConfig, ScoreInput, normalize_guess, score_round,
};

use crate::logic::game_tester::{GameTester, RulesPreset, SessionMetrics, SimulationPlan};
use crate::logic::policy::GameplayStrategy;
use crate::logic::seeds::SeedInfo;
use crate::scenario::strategy_expectation;

/// One completed session inside a balance sweep.
#[derive(Debug, Clone)]
pub struct BalanceRecord {
    pub scenario_name: String,
    pub preset: RulesPreset,
    pub strategy: GameplayStrategy,
    pub seed_value: u64,
    pub metrics: SessionMetrics,
}

/// Aggregated view of every record sharing a scenario name.
#[derive(Debug, Clone)]
pub struct BalanceAggregate {
    pub scenario_name: String,
    pub preset: RulesPreset,
    pub strategy: GameplayStrategy,
    pub iterations: u32,
    pub mean_points: f64,
    pub std_points: f64,
    pub min_points: u32,
    pub max_points: u32,
    pub correct_rate: f64,
    pub timeout_rate: f64,
    pub perfect_rate: f64,
    pub mean_hints: f64,
    pub mean_wrong_guesses: f64,
    pub mean_dialogue_turns: f64,
    pub mean_seconds: f64,
}

/// Every preset crossed with every scripted player.
pub const BALANCE_SCENARIOS: &[(RulesPreset, GameplayStrategy)] = &[
    (RulesPreset::Standard, GameplayStrategy::Decisive),
    (RulesPreset::Standard, GameplayStrategy::Methodical),
    (RulesPreset::Standard, GameplayStrategy::Chatty),
    (RulesPreset::Standard, GameplayStrategy::Scattershot),
    (RulesPreset::Standard, GameplayStrategy::Distracted),
    (RulesPreset::Blitz, GameplayStrategy::Decisive),
    (RulesPreset::Blitz, GameplayStrategy::Methodical),
    (RulesPreset::Blitz, GameplayStrategy::Chatty),
    (RulesPreset::Blitz, GameplayStrategy::Scattershot),
    (RulesPreset::Blitz, GameplayStrategy::Distracted),
];

/// Run the full preset x strategy grid and collect per-session metrics.
///
/// # Errors
///
/// Fails as soon as any session violates its strategy expectation, with
/// enough context to reproduce the run.
pub fn run_balance_analysis(
    tester: &GameTester,
    seeds: &[SeedInfo],
    iterations: u32,
) -> Result<Vec<BalanceRecord>> {
    let mut records = Vec::new();
    for &(preset, strategy) in BALANCE_SCENARIOS {
        let scenario_name = format!("{} - {strategy}", preset.label());
        let plan =
            SimulationPlan::new(preset, strategy).with_expectation(strategy_expectation(strategy));
        if tester.verbose() {
            println!("🚕 Balance sweep: {scenario_name}");
        }
        for seed in seeds {
            for iteration in 0..iterations {
                let iteration_seed = seed.seed.wrapping_add(u64::from(iteration));
                let summary = tester.run_plan(&plan, iteration_seed);
                for expectation in &plan.expectations {
                    expectation.evaluate(&summary).with_context(|| {
                        format!(
                            "balance sweep '{scenario_name}' seed {iteration_seed} \
                             (base {}, iteration {iteration})",
                            seed.source
                        )
                    })?;
                }
                records.push(BalanceRecord {
                    scenario_name: scenario_name.clone(),
                    preset,
                    strategy,
                    seed_value: iteration_seed,
                    metrics: summary.metrics,
                });
            }
        }
    }
    Ok(records)
}

/// Collapse records into one aggregate per scenario name, sorted by name.
#[must_use]
pub fn aggregate_balance(records: &[BalanceRecord]) -> Vec<BalanceAggregate> {
    let mut builders: BTreeMap<String, AggregateBuilder> = BTreeMap::new();
    for record in records {
        builders
            .entry(record.scenario_name.clone())
            .or_insert_with(|| AggregateBuilder::new(record.preset, record.strategy))
            .ingest(&record.metrics);
    }
    builders
        .into_iter()
        .map(|(name, builder)| builder.finish(name))
        .collect()
}

struct AggregateBuilder {
    preset: RulesPreset,
    strategy: GameplayStrategy,
    count: u32,
    points: RunningStats,
    hints: RunningStats,
    wrong_guesses: RunningStats,
    dialogue_turns: RunningStats,
    seconds: RunningStats,
    rounds_played: u32,
    rounds_correct: u32,
    rounds_timed_out: u32,
    perfect_rounds: u32,
    min_points: u32,
    max_points: u32,
}

impl AggregateBuilder {
    const fn new(preset: RulesPreset, strategy: GameplayStrategy) -> Self {
        Self {
            preset,
            strategy,
            count: 0,
            points: RunningStats::new(),
            hints: RunningStats::new(),
            wrong_guesses: RunningStats::new(),
            dialogue_turns: RunningStats::new(),
            seconds: RunningStats::new(),
            rounds_played: 0,
            rounds_correct: 0,
            rounds_timed_out: 0,
            perfect_rounds: 0,
            min_points: u32::MAX,
            max_points: 0,
        }
    }

    fn ingest(&mut self, metrics: &SessionMetrics) {
        self.count += 1;
        self.points.add(f64::from(metrics.total_points));
        self.hints.add(f64::from(metrics.hints_used));
        self.wrong_guesses.add(f64::from(metrics.wrong_guesses));
        self.dialogue_turns.add(f64::from(metrics.dialogue_turns));
        self.seconds.add(f64::from(metrics.seconds_played));
        self.rounds_played = self.rounds_played.saturating_add(metrics.rounds_played);
        self.rounds_correct = self.rounds_correct.saturating_add(metrics.rounds_correct);
        self.rounds_timed_out = self.rounds_timed_out.saturating_add(metrics.rounds_timed_out);
        self.perfect_rounds = self.perfect_rounds.saturating_add(metrics.perfect_rounds);
        self.min_points = self.min_points.min(metrics.total_points);
        self.max_points = self.max_points.max(metrics.total_points);
    }

    fn finish(self, scenario_name: String) -> BalanceAggregate {
        let round_denom = if self.rounds_played == 0 {
            1.0
        } else {
            f64::from(self.rounds_played)
        };
        BalanceAggregate {
            scenario_name,
            preset: self.preset,
            strategy: self.strategy,
            iterations: self.count,
            mean_points: self.points.mean(),
            std_points: self.points.std_dev(),
            min_points: if self.count == 0 { 0 } else { self.min_points },
            max_points: self.max_points,
            correct_rate: f64::from(self.rounds_correct) / round_denom,
            timeout_rate: f64::from(self.rounds_timed_out) / round_denom,
            perfect_rate: f64::from(self.perfect_rounds) / round_denom,
            mean_hints: self.hints.mean(),
            mean_wrong_guesses: self.wrong_guesses.mean(),
            mean_dialogue_turns: self.dialogue_turns.mean(),
            mean_seconds: self.seconds.mean(),
        }
    }
}

/// Welford accumulator. Single pass, no stored samples.
#[derive(Debug, Clone, Default)]
struct RunningStats {
    count: u32,
    mean: f64,
    m2: f64,
}

impl RunningStats {
    const fn new() -> Self {
        Self {
            count: 0,
            mean: 0.0,
            m2: 0.0,
        }
    }

    fn add(&mut self, value: f64) {
        self.count += 1;
        let delta = value - self.mean;
        self.mean += delta / f64::from(self.count);
        let delta2 = value - self.mean;
        self.m2 += delta * delta2;
    }

    const fn mean(&self) -> f64 {
        self.mean
    }

    fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / f64::from(self.count - 1)
        }
    }

    fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }
}

/// Cross-check the sweep against the scoring rules and the counters
/// against each other.
///
/// # Errors
///
/// Reports the first violated invariant with the offending scenario.
pub fn validate_balance_targets(
    aggregates: &[BalanceAggregate],
    records: &[BalanceRecord],
) -> Result<()> {
    validate_scoring_invariants()?;
    validate_scoring_consistency(records)?;
    ensure_counter_coherence(records)?;

    for aggregate in aggregates {
        ensure!(
            aggregate.iterations > 0,
            "aggregate '{}' has no sessions",
            aggregate.scenario_name
        );
        for (label, rate) in [
            ("correct", aggregate.correct_rate),
            ("timeout", aggregate.timeout_rate),
            ("perfect", aggregate.perfect_rate),
        ] {
            ensure!(
                (0.0..=1.0).contains(&rate),
                "aggregate '{}' has {label} rate {rate} outside [0, 1]",
                aggregate.scenario_name
            );
        }
        ensure!(
            f64::from(aggregate.min_points) <= aggregate.mean_points + 1e-9
                && aggregate.mean_points <= f64::from(aggregate.max_points) + 1e-9,
            "aggregate '{}' mean {} escapes [{}, {}]",
            aggregate.scenario_name,
            aggregate.mean_points,
            aggregate.min_points,
            aggregate.max_points
        );
        match aggregate.strategy {
            GameplayStrategy::Decisive => ensure!(
                (aggregate.correct_rate - 1.0).abs() < f64::EPSILON
                    && (aggregate.perfect_rate - 1.0).abs() < f64::EPSILON,
                "decisive sweep '{}' should solve every round perfectly",
                aggregate.scenario_name
            ),
            GameplayStrategy::Distracted => ensure!(
                (aggregate.timeout_rate - 1.0).abs() < f64::EPSILON,
                "distracted sweep '{}' should time out every round",
                aggregate.scenario_name
            ),
            _ => {}
        }
    }
    Ok(())
}

/// Pure scoring spot checks that do not depend on any simulation.
fn validate_scoring_invariants() -> Result<()> {
    let cfg = ScoreConfig::default();
    let config = GameConfig::default();

    let perfect = score_round(
        &cfg,
        config.round_seconds,
        &ScoreInput {
            time_remaining: config.round_seconds,
            hints_used: 0,
            translations_used: 0,
            wrong_guesses: 0,
        },
    );
    ensure!(
        perfect == cfg.base_points + cfg.time_bonus_max,
        "perfect round scored {perfect}"
    );

    let floored = score_round(
        &cfg,
        300,
        &ScoreInput {
            time_remaining: 100,
            hints_used: 0,
            translations_used: 0,
            wrong_guesses: 0,
        },
    );
    ensure!(
        floored == cfg.base_points + 166,
        "time bonus must floor, got {floored}"
    );

    let buried = score_round(
        &cfg,
        300,
        &ScoreInput {
            time_remaining: 0,
            hints_used: 3,
            translations_used: 5,
            wrong_guesses: 20,
        },
    );
    ensure!(buried == 0, "negative totals must clamp to zero, got {buried}");

    ensure!(
        normalize_guess("  PaRiS  ") == "paris",
        "guess normalization must trim and lowercase"
    );

    let ladder: Vec<Difficulty> = (0..6).map(Difficulty::for_round).collect();
    ensure!(
        ladder.first() == Some(&Difficulty::Easy) && ladder.last() == Some(&Difficulty::Hard),
        "difficulty ladder must rise across the session"
    );
    ensure!(
        ladder.windows(2).all(|pair| pair[0] <= pair[1]),
        "difficulty ladder must be monotonic"
    );

    let catalog = FallbackCatalog::load();
    ensure!(
        catalog.len() == GameConfig::default().total_rounds,
        "fallback catalog must cover a full session, has {} entries",
        catalog.len()
    );
    for location in &catalog {
        location
            .validate()
            .with_context(|| format!("fallback location '{}'", location.name))?;
    }
    Ok(())
}

/// Recompute every recorded round with the preset's scoring table.
fn validate_scoring_consistency(records: &[BalanceRecord]) -> Result<()> {
    for record in records {
        let config = record.preset.game_config();
        for (index, result) in record.metrics.round_results.iter().enumerate() {
            let recomputed = score_round(&config.scoring, config.round_seconds, &result.score);
            ensure!(
                recomputed == result.points,
                "scenario '{}' seed {} round {}: stored {} pts but the formula gives {}",
                record.scenario_name,
                record.seed_value,
                index + 1,
                result.points,
                recomputed
            );
        }
    }
    Ok(())
}

/// The per-session counters must agree with the per-round results.
fn ensure_counter_coherence(records: &[BalanceRecord]) -> Result<()> {
    for record in records {
        let metrics = &record.metrics;
        ensure!(
            metrics.rounds_correct + metrics.rounds_timed_out == metrics.rounds_played,
            "scenario '{}' seed {}: correct {} + timeouts {} != played {}",
            record.scenario_name,
            record.seed_value,
            metrics.rounds_correct,
            metrics.rounds_timed_out,
            metrics.rounds_played
        );
        let summed: u32 = metrics.round_results.iter().map(|r| r.points).sum();
        ensure!(
            summed == metrics.total_points,
            "scenario '{}' seed {}: round points sum {} != session total {}",
            record.scenario_name,
            record.seed_value,
            summed,
            metrics.total_points
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sha2::{Digest, Sha256};

    use crate::logic::reports::generate_csv_report;

    fn sweep_records() -> Vec<BalanceRecord> {
        let tester = GameTester::new(false);
        let seeds = vec![SeedInfo::from_numeric(0x5EED)];
        run_balance_analysis(&tester, &seeds, 1).unwrap()
    }

    #[test]
    fn welford_matches_the_textbook_example() {
        let mut stats = RunningStats::new();
        for value in [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0] {
            stats.add(value);
        }
        assert!((stats.mean() - 5.0).abs() < 1e-9);
        assert!((stats.variance() - 32.0 / 7.0).abs() < 1e-9);
    }

    #[test]
    fn stats_with_one_sample_have_zero_variance() {
        let mut stats = RunningStats::new();
        stats.add(42.0);
        assert!((stats.mean() - 42.0).abs() < f64::EPSILON);
        assert!(stats.variance().abs() < f64::EPSILON);
    }

    #[test]
    fn aggregates_group_by_scenario_name() {
        let records = sweep_records();
        let aggregates = aggregate_balance(&records);
        assert_eq!(aggregates.len(), BALANCE_SCENARIOS.len());
        for aggregate in &aggregates {
            assert_eq!(aggregate.iterations, 1);
            assert!(aggregate.min_points <= aggregate.max_points);
        }
        // BTreeMap keys come back sorted.
        let names: Vec<&str> = aggregates
            .iter()
            .map(|a| a.scenario_name.as_str())
            .collect();
        let mut sorted = names.clone();
        sorted.sort_unstable();
        assert_eq!(names, sorted);
    }

    #[test]
    fn sweep_satisfies_every_balance_target() {
        let records = sweep_records();
        let aggregates = aggregate_balance(&records);
        validate_balance_targets(&aggregates, &records).unwrap();
    }

    #[test]
    fn scoring_invariants_hold_on_defaults() {
        validate_scoring_invariants().unwrap();
    }

    #[test]
    fn csv_output_is_deterministic_for_a_fixed_seed() {
        let digest_of = |records: &[BalanceRecord]| {
            let mut buffer = Vec::new();
            generate_csv_report(&mut buffer, records).unwrap();
            let mut hasher = Sha256::new();
            hasher.update(&buffer);
            format!("{:x}", hasher.finalize())
        };
        assert_eq!(digest_of(&sweep_records()), digest_of(&sweep_records()));
    }

    #[test]
    fn tampered_round_points_fail_consistency() {
        let mut records = sweep_records();
        let record = records
            .iter_mut()
            .find(|r| !r.metrics.round_results.is_empty())
            .unwrap();
        record.metrics.round_results[0].points += 1;
        assert!(validate_scoring_consistency(&records).is_err());
    }
}

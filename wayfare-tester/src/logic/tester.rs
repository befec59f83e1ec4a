use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::logic::game_tester::{GameTester, SimulationSummary};
use crate::logic::seeds::SeedInfo;
use crate::logic::simulation::DecisionRecord;
use crate::scenario::TestScenario;

/// Outcome of running one scenario against one seed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub scenario_name: String,
    pub passed: bool,
    pub iterations_run: u32,
    pub successful_iterations: u32,
    pub failures: Vec<String>,
    #[serde(with = "duration_serde")]
    pub average_duration: Duration,
    #[serde(with = "duration_vec_serde")]
    pub performance_data: Vec<Duration>,
}

/// Runs scenarios through the [`GameTester`] and turns expectation
/// failures into reportable results.
pub struct LogicTester {
    game_tester: GameTester,
}

impl LogicTester {
    #[must_use]
    pub const fn new(game_tester: GameTester) -> Self {
        Self { game_tester }
    }

    /// Run `scenario` once per seed, `iterations` times per seed.
    #[must_use]
    pub fn run_scenario(
        &self,
        scenario: &TestScenario,
        seeds: &[SeedInfo],
        iterations: u32,
    ) -> Vec<ScenarioResult> {
        seeds
            .iter()
            .map(|seed| {
                if self.game_tester.verbose() {
                    println!(
                        "\n🧪 Testing scenario: {} (seed {})",
                        scenario.name, seed.source
                    );
                }
                let result = self.run_single_scenario(scenario, seed, iterations, seeds.len() > 1);
                if self.game_tester.verbose() {
                    let mark = if result.passed { "✅" } else { "❌" };
                    println!(
                        "{mark} {}: {}/{} iterations clean",
                        result.scenario_name, result.successful_iterations, result.iterations_run
                    );
                }
                result
            })
            .collect()
    }

    fn run_single_scenario(
        &self,
        scenario: &TestScenario,
        seed: &SeedInfo,
        iterations: u32,
        label_seed: bool,
    ) -> ScenarioResult {
        let scenario_name = if label_seed {
            format!("{} [seed {}]", scenario.name, seed.source)
        } else {
            scenario.name.clone()
        };

        let mut failures = Vec::new();
        let mut successful_iterations = 0;
        let mut performance_data = Vec::new();

        for iteration in 0..iterations {
            // Spread iterations across deterministic derived seeds so a
            // flaky expectation cannot hide behind a single lucky draw.
            let iteration_seed = seed.seed.wrapping_add(u64::from(iteration));
            let start = Instant::now();
            let summary = self.game_tester.run_plan(&scenario.plan, iteration_seed);
            performance_data.push(start.elapsed());

            let mut iteration_clean = true;
            for expectation in &scenario.plan.expectations {
                if let Err(err) = expectation.evaluate(&summary) {
                    iteration_clean = false;
                    failures.push(describe_failure(iteration, iteration_seed, &summary, &err));
                }
            }
            if iteration_clean {
                successful_iterations += 1;
            }
        }

        let total: Duration = performance_data.iter().sum();
        let average_duration = if performance_data.is_empty() {
            Duration::ZERO
        } else {
            total / u32::try_from(performance_data.len()).unwrap_or(1)
        };

        ScenarioResult {
            scenario_name,
            passed: failures.is_empty(),
            iterations_run: iterations,
            successful_iterations,
            failures,
            average_duration,
            performance_data,
        }
    }
}

#[rustfmt::skip]
fn describe_failure(
    iteration: u32,
    iteration_seed: u64,
    summary: &SimulationSummary,
    err: &anyhow::Error,
) -> String {
    format!(
        "Iteration {iteration} (preset {}, strategy {}, seed {iteration_seed}): {err:#} | steps {}, ending '{}', final points {}, rounds {}/{} | path: {}",
        summary.preset,
        summary.strategy,
        summary.metrics.steps_taken,
        summary.ending_message,
        summary.final_points,
        summary.metrics.rounds_correct,
        summary.metrics.rounds_played,
        summarize_decision_path(&summary.metrics.decision_log),
    )
}

/// Last few decisions, newest last, for failure context.
fn summarize_decision_path(log: &[DecisionRecord]) -> String {
    if log.is_empty() {
        return "no decisions".to_string();
    }
    let tail: Vec<String> = log
        .iter()
        .rev()
        .take(3)
        .map(|d| format!("round {} t={}: {}", d.round + 1, d.time_remaining, d.action))
        .collect();
    tail.into_iter().rev().collect::<Vec<_>>().join(" -> ")
}

mod duration_serde {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        u64::try_from(duration.as_millis())
            .unwrap_or(u64::MAX)
            .serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

mod duration_vec_serde {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S>(durations: &[Duration], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let millis: Vec<u64> = durations
            .iter()
            .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
            .collect();
        millis.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = Vec::<u64>::deserialize(deserializer)?;
        Ok(millis.into_iter().map(Duration::from_millis).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::game_tester::{RulesPreset, SimulationPlan, SimulationSummary};
    use crate::logic::policy::GameplayStrategy;
    use crate::scenario::TestScenario;
    use anyhow::bail;

    fn failing_scenario() -> TestScenario {
        let plan = SimulationPlan::new(RulesPreset::Standard, GameplayStrategy::Decisive)
            .with_max_steps(0)
            .with_expectation(|_summary: &SimulationSummary| bail!("always wrong"));
        TestScenario::simulation("doomed", plan)
    }

    #[test]
    fn results_serialize_durations_as_millis() {
        let result = ScenarioResult {
            scenario_name: "smoke".to_string(),
            passed: true,
            iterations_run: 2,
            successful_iterations: 2,
            failures: Vec::new(),
            average_duration: Duration::from_millis(42),
            performance_data: vec![Duration::from_millis(40), Duration::from_millis(44)],
        };
        let json = serde_json::to_string(&result).unwrap();
        assert!(json.contains("\"average_duration\":42"));

        let back: ScenarioResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back.average_duration, Duration::from_millis(42));
        assert_eq!(back.performance_data.len(), 2);
    }

    #[test]
    fn failed_expectations_carry_seed_and_context() {
        let tester = LogicTester::new(GameTester::new(false));
        let seeds = vec![SeedInfo::from_numeric(9)];
        let results = tester.run_scenario(&failing_scenario(), &seeds, 2);
        assert_eq!(results.len(), 1);
        let result = &results[0];
        assert!(!result.passed);
        assert_eq!(result.iterations_run, 2);
        assert_eq!(result.successful_iterations, 0);
        assert_eq!(result.failures.len(), 2);
        assert!(result.failures[0].contains("always wrong"));
        assert!(result.failures[0].contains("seed 9"));
        assert!(result.failures[1].contains("seed 10"));
    }

    #[test]
    fn multiple_seeds_get_labelled_results() {
        let tester = LogicTester::new(GameTester::new(false));
        let seeds = vec![SeedInfo::from_numeric(1), SeedInfo::from_numeric(2)];
        let results = tester.run_scenario(&failing_scenario(), &seeds, 1);
        assert_eq!(results.len(), 2);
        assert!(results[0].scenario_name.contains("[seed 1]"));
        assert!(results[1].scenario_name.contains("[seed 2]"));
    }

    #[test]
    fn decision_path_summaries_keep_the_newest_three() {
        let log: Vec<DecisionRecord> = (0..5)
            .map(|i| DecisionRecord {
                round: i,
                time_remaining: 300 - u32::try_from(i).unwrap(),
                action: format!("guess 'g{i}'"),
                policy_name: "test".to_string(),
                rationale: None,
            })
            .collect();
        let summary = summarize_decision_path(&log);
        assert!(summary.starts_with("round 3"));
        assert!(summary.ends_with("guess 'g4'"));
        assert_eq!(summary.matches("->").count(), 2);
        assert_eq!(summarize_decision_path(&[]), "no decisions");
    }
}

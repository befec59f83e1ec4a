pub mod catalog;

use anyhow::ensure;

use crate::logic::{
    GameplayStrategy, RulesPreset, SimulationExpectation, SimulationPlan, SimulationSummary,
};

/// A named, self-checking test plan.
#[derive(Debug, Clone)]
pub struct TestScenario {
    pub name: String,
    pub plan: SimulationPlan,
}

impl TestScenario {
    #[must_use]
    pub fn simulation(name: impl Into<String>, plan: SimulationPlan) -> Self {
        Self {
            name: name.into(),
            plan,
        }
    }
}

/// The invariant profile each scripted player must satisfy over a full
/// session. Assumes the plan runs the preset's stock config.
#[must_use]
pub fn strategy_expectation(strategy: GameplayStrategy) -> SimulationExpectation {
    SimulationExpectation::new(move |summary: &SimulationSummary| {
        ensure!(
            summary.game_ended,
            "session did not finish: {}",
            summary.ending_message
        );
        let config = summary.preset.game_config();
        let metrics = &summary.metrics;
        let rounds = u32::try_from(config.total_rounds).unwrap_or(u32::MAX);
        ensure!(
            metrics.rounds_played == rounds,
            "played {} of {} rounds",
            metrics.rounds_played,
            rounds
        );
        ensure!(
            summary.final_points == metrics.total_points,
            "session banked {} points but rounds sum to {}",
            summary.final_points,
            metrics.total_points
        );

        let perfect = config.scoring.base_points + config.scoring.time_bonus_max;
        match strategy {
            GameplayStrategy::Decisive => {
                ensure!(
                    metrics.rounds_correct == rounds,
                    "decisive player missed a round"
                );
                for (index, result) in metrics.round_results.iter().enumerate() {
                    ensure!(
                        result.points == perfect,
                        "round {} scored {} instead of a perfect {perfect}",
                        index + 1,
                        result.points
                    );
                }
            }
            GameplayStrategy::Methodical => {
                ensure!(
                    metrics.rounds_correct == rounds,
                    "methodical player missed a round"
                );
                for (index, result) in metrics.round_results.iter().enumerate() {
                    ensure!(
                        result.score.hints_used == 3,
                        "round {} used {} hints, expected the full ladder",
                        index + 1,
                        result.score.hints_used
                    );
                    ensure!(
                        result.score.translations_used == 1,
                        "round {} paid for {} translations",
                        index + 1,
                        result.score.translations_used
                    );
                    ensure!(
                        result.points > config.scoring.base_points && result.points < perfect,
                        "round {} scored {}, outside the hint-taxed band",
                        index + 1,
                        result.points
                    );
                }
            }
            GameplayStrategy::Chatty => {
                ensure!(
                    metrics.rounds_correct == rounds,
                    "chatty player missed a round"
                );
                ensure!(metrics.dialogue_turns > 0, "no driver conversation happened");
                ensure!(
                    metrics.dialogue_hints > 0,
                    "driver hints never landed despite hint questions"
                );
                ensure!(metrics.wrong_guesses == 0, "chatty player guessed wrong");
            }
            GameplayStrategy::Scattershot => {
                ensure!(
                    metrics.rounds_correct == rounds,
                    "scattershot player never recovered"
                );
                for (index, result) in metrics.round_results.iter().enumerate() {
                    ensure!(
                        (1..=3).contains(&result.score.wrong_guesses),
                        "round {} logged {} wrong guesses, expected 1 to 3",
                        index + 1,
                        result.score.wrong_guesses
                    );
                }
            }
            GameplayStrategy::Distracted => {
                ensure!(
                    metrics.rounds_correct == 0,
                    "distracted player somehow answered"
                );
                ensure!(
                    metrics.rounds_timed_out == rounds,
                    "only {} rounds timed out",
                    metrics.rounds_timed_out
                );
                for (index, result) in metrics.round_results.iter().enumerate() {
                    ensure!(
                        result.points == config.scoring.base_points,
                        "timed-out round {} scored {} instead of the base award",
                        index + 1,
                        result.points
                    );
                }
                ensure!(
                    metrics.total_points == rounds * config.scoring.base_points,
                    "timeout session banked {}",
                    metrics.total_points
                );
            }
        }
        Ok(())
    })
}

fn strategy_scenario(name: &str, preset: RulesPreset, strategy: GameplayStrategy) -> TestScenario {
    let plan = SimulationPlan::new(preset, strategy).with_expectation(strategy_expectation(strategy));
    TestScenario::simulation(name, plan)
}

fn dialogue_outage_scenario() -> TestScenario {
    let plan = SimulationPlan::new(RulesPreset::Standard, GameplayStrategy::Chatty)
        .with_dialogue_failure_rate(1.0)
        .with_expectation(|summary: &SimulationSummary| {
            ensure!(
                summary.game_ended,
                "outage run stalled: {}",
                summary.ending_message
            );
            let metrics = &summary.metrics;
            ensure!(metrics.dialogue_failures > 0, "the outage never fired");
            ensure!(
                metrics.dialogue_hints == 0,
                "a failed driver still revealed hints"
            );
            ensure!(
                metrics.rounds_correct == metrics.rounds_played,
                "the ride must stay winnable with the driver offline"
            );
            Ok(())
        });
    TestScenario::simulation("dialogue-outage", plan)
}

/// Resolve a scenario by key or alias.
#[must_use]
pub fn get_scenario(name: &str) -> Option<TestScenario> {
    match name {
        "smoke" => Some(strategy_scenario(
            "smoke",
            RulesPreset::Standard,
            GameplayStrategy::Decisive,
        )),
        "perfect-run" | "decisive" => Some(strategy_scenario(
            "perfect-run",
            RulesPreset::Standard,
            GameplayStrategy::Decisive,
        )),
        "methodical" => Some(strategy_scenario(
            "methodical",
            RulesPreset::Standard,
            GameplayStrategy::Methodical,
        )),
        "chatty" | "dialogue" => Some(strategy_scenario(
            "chatty",
            RulesPreset::Standard,
            GameplayStrategy::Chatty,
        )),
        "scattershot" | "wrong-guesses" => Some(strategy_scenario(
            "scattershot",
            RulesPreset::Standard,
            GameplayStrategy::Scattershot,
        )),
        "timeout-sweep" | "distracted" => Some(strategy_scenario(
            "timeout-sweep",
            RulesPreset::Standard,
            GameplayStrategy::Distracted,
        )),
        "blitz" => Some(strategy_scenario(
            "blitz",
            RulesPreset::Blitz,
            GameplayStrategy::Methodical,
        )),
        "dialogue-outage" => Some(dialogue_outage_scenario()),
        other => catalog::find_catalog_scenario(other),
    }
}

/// Canonical scenario keys with a one-line description each.
#[must_use]
pub fn list_scenarios() -> Vec<(&'static str, &'static str)> {
    let mut entries = vec![
        ("smoke", "One decisive session on standard rules"),
        ("perfect-run", "Every round guessed before the first tick"),
        ("methodical", "Full hint ladder and a translation, then guess"),
        ("chatty", "Driver questions and a street clue on the way"),
        ("scattershot", "A few wrong guesses before the right one"),
        ("timeout-sweep", "Let every round run out the clock"),
        ("blitz", "Methodical player under blitz rules"),
        ("dialogue-outage", "Driver backend down, ride still playable"),
    ];
    entries.extend(catalog::catalog_entries());
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::{GameTester, LogicTester, SeedInfo};

    fn run_once(name: &str) -> bool {
        let scenario = get_scenario(name).unwrap();
        let tester = LogicTester::new(GameTester::new(false));
        let results = tester.run_scenario(&scenario, &[SeedInfo::from_numeric(1337)], 1);
        results.iter().all(|r| r.passed)
    }

    #[test]
    fn every_listed_scenario_resolves() {
        for (key, _) in list_scenarios() {
            assert!(get_scenario(key).is_some(), "unresolvable scenario {key}");
        }
    }

    #[test]
    fn aliases_reach_their_canonical_scenarios() {
        for (alias, canonical) in [
            ("decisive", "perfect-run"),
            ("dialogue", "chatty"),
            ("wrong-guesses", "scattershot"),
            ("distracted", "timeout-sweep"),
        ] {
            assert_eq!(get_scenario(alias).unwrap().name, canonical);
        }
    }

    #[test]
    fn unknown_names_resolve_to_nothing() {
        assert!(get_scenario("not-a-scenario").is_none());
        assert!(get_scenario("").is_none());
    }

    #[test]
    fn smoke_scenario_passes() {
        assert!(run_once("smoke"));
    }

    #[test]
    fn every_strategy_scenario_passes() {
        for name in [
            "perfect-run",
            "methodical",
            "chatty",
            "scattershot",
            "timeout-sweep",
            "blitz",
        ] {
            assert!(run_once(name), "scenario {name} failed");
        }
    }

    #[test]
    fn dialogue_outage_scenario_passes() {
        assert!(run_once("dialogue-outage"));
    }
}

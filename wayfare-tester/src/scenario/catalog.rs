//! Pure logic scenarios. Each one drives the engine directly inside its
//! expectation, so the plans carry a zero step budget.

use anyhow::{Context, ensure};

use wayfare_game::{
    Difficulty, DialogueReply, EventKind, FallbackCatalog, GameConfig, GamePhase, GameSession,
    GuessOutcome, HintOutcome, ScoreConfig, ScoreInput, SessionError, TickOutcome,
    TranslationOutcome, TurnError, TurnOutcome, normalize_guess, score_round,
};

use super::TestScenario;
use crate::logic::{GameplayStrategy, RulesPreset, SimulationPlan, SimulationSummary};

fn base_plan() -> SimulationPlan {
    SimulationPlan::new(RulesPreset::Standard, GameplayStrategy::Decisive).with_max_steps(0)
}

/// Start a default session and put it into live play.
fn live_session(seed: u64) -> anyhow::Result<(GameSession, u64)> {
    let mut session = GameSession::sanitized(GameConfig::default(), seed);
    let epoch = session.start_round(None)?;
    Ok((session, epoch))
}

fn current_answer(session: &GameSession) -> anyhow::Result<String> {
    let round = session.round().context("no live round")?;
    Ok(round
        .location()
        .acceptable_answers
        .first()
        .cloned()
        .unwrap_or_else(|| round.location().name.clone()))
}

fn session_defaults() -> TestScenario {
    TestScenario::simulation(
        "session-defaults",
        base_plan().with_expectation(|_summary: &SimulationSummary| {
            let config = GameConfig::default();
            ensure!(config.total_rounds == 6, "default ride is six rounds");
            ensure!(config.round_seconds == 300, "default clock is five minutes");
            ensure!(config.npc_clue_cap.is_none(), "street clues are uncapped");
            let scoring = &config.scoring;
            ensure!(
                scoring.base_points == 1_000 && scoring.time_bonus_max == 500,
                "default award table moved"
            );
            ensure!(
                scoring.hint_penalty == 100
                    && scoring.translation_penalty == 50
                    && scoring.wrong_guess_penalty == 75,
                "default penalty table moved"
            );

            let mut session = GameSession::sanitized(config, 1);
            ensure!(session.phase() == GamePhase::Intro, "fresh sessions open on the intro");
            ensure!(session.total_points() == 0, "points must start at zero");
            ensure!(session.round().is_none(), "no round before the first start");
            ensure!(!session.in_review(), "review cannot be on at the intro");
            ensure!(
                session.drain_events().is_empty(),
                "construction must not emit events"
            );
            Ok(())
        }),
    )
}

fn score_formula() -> TestScenario {
    TestScenario::simulation(
        "score-formula",
        base_plan().with_expectation(|_summary: &SimulationSummary| {
            let cfg = ScoreConfig::default();
            let clean = |time_remaining| ScoreInput {
                time_remaining,
                hints_used: 0,
                translations_used: 0,
                wrong_guesses: 0,
            };

            ensure!(score_round(&cfg, 300, &clean(300)) == 1_500, "perfect round");
            ensure!(score_round(&cfg, 300, &clean(0)) == 1_000, "zero bonus at the buzzer");
            ensure!(score_round(&cfg, 300, &clean(100)) == 1_166, "bonus must floor");
            ensure!(
                score_round(&cfg, 300, &clean(400)) == 1_500,
                "excess time clamps to a full budget"
            );

            let mut one_hint = clean(300);
            one_hint.hints_used = 1;
            ensure!(score_round(&cfg, 300, &one_hint) == 1_400, "hint penalty");

            let mut one_translation = clean(300);
            one_translation.translations_used = 1;
            ensure!(
                score_round(&cfg, 300, &one_translation) == 1_450,
                "translation penalty"
            );

            let mut one_wrong = clean(300);
            one_wrong.wrong_guesses = 1;
            ensure!(score_round(&cfg, 300, &one_wrong) == 1_425, "wrong-guess penalty");

            let mut buried = clean(0);
            buried.hints_used = 3;
            buried.translations_used = 5;
            buried.wrong_guesses = 20;
            ensure!(score_round(&cfg, 300, &buried) == 0, "totals clamp at zero");
            Ok(())
        }),
    )
}

fn guess_matching() -> TestScenario {
    TestScenario::simulation(
        "guess-matching",
        base_plan().with_expectation(|_summary: &SimulationSummary| {
            ensure!(normalize_guess("  PaRiS  ") == "paris", "normalization");

            let catalog = FallbackCatalog::load();
            let paris = catalog
                .get_by_name("Paris, France")
                .context("Paris missing from the fallback catalog")?;
            ensure!(paris.accepts_guess("  PARIS  "), "case and whitespace");
            ensure!(paris.accepts_guess("paris, france"), "listed variant");
            ensure!(
                paris.accepts_guess("i think it's paris"),
                "guesses containing an answer"
            );
            ensure!(!paris.accepts_guess("berlin"), "wrong city");
            ensure!(!paris.accepts_guess("   "), "blank guess");

            let (mut session, _epoch) = live_session(7)?;
            let answer = current_answer(&session)?;
            let shouted = format!("  {}  ", answer.to_uppercase());
            let outcome = session.submit_guess(&shouted)?;
            ensure!(
                matches!(outcome, GuessOutcome::Correct { points: 1_500 }),
                "a correct pre-tick guess must bank 1500, got {outcome:?}"
            );

            let (mut session, _epoch) = live_session(8)?;
            ensure!(
                matches!(session.submit_guess("   ")?, GuessOutcome::EmptyRejected),
                "blank guesses are refused without a penalty"
            );
            ensure!(
                matches!(
                    session.submit_guess("atlantis")?,
                    GuessOutcome::Wrong { wrong_guesses: 1 }
                ),
                "wrong guesses are counted"
            );
            Ok(())
        }),
    )
}

fn config_sanitization() -> TestScenario {
    TestScenario::simulation(
        "config-sanitization",
        base_plan().with_expectation(|_summary: &SimulationSummary| {
            let mut low = GameConfig {
                total_rounds: 0,
                round_seconds: 3,
                npc_clue_cap: Some(0),
                scoring: ScoreConfig {
                    base_points: 0,
                    time_bonus_max: 9_999_999,
                    ..ScoreConfig::default()
                },
            };
            low.sanitize();
            ensure!(low.total_rounds == 1, "round floor");
            ensure!(low.round_seconds == 10, "clock floor");
            ensure!(low.scoring.base_points == 1, "base points floor");
            ensure!(low.scoring.time_bonus_max == 1_000_000, "bonus ceiling");
            ensure!(low.npc_clue_cap == Some(0), "a zero clue cap is legal");

            let mut high = GameConfig {
                total_rounds: 600,
                round_seconds: 1_000_000,
                ..GameConfig::default()
            };
            high.sanitize();
            ensure!(high.total_rounds == 50, "round ceiling");
            ensure!(high.round_seconds == 3_600, "clock ceiling");

            let session = GameSession::sanitized(
                GameConfig {
                    total_rounds: 0,
                    ..GameConfig::default()
                },
                1,
            );
            ensure!(
                session.config().total_rounds == 1,
                "the constructor applies the same clamps"
            );
            Ok(())
        }),
    )
}

fn fallback_catalog() -> TestScenario {
    TestScenario::simulation(
        "fallback-catalog",
        base_plan().with_expectation(|_summary: &SimulationSummary| {
            let catalog = FallbackCatalog::load();
            ensure!(!catalog.is_empty(), "embedded catalog must load");
            ensure!(
                catalog.len() == GameConfig::default().total_rounds,
                "catalog must cover a full default session without repeats"
            );

            let mut names: Vec<&str> = catalog.iter().map(|l| l.name.as_str()).collect();
            names.sort_unstable();
            names.dedup();
            ensure!(names.len() == catalog.len(), "location names must be unique");

            for location in &catalog {
                location
                    .validate()
                    .with_context(|| format!("embedded location '{}'", location.name))?;
            }
            for difficulty in [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard] {
                ensure!(
                    catalog.iter().any(|l| l.language_difficulty == difficulty),
                    "no {difficulty} location in the catalog"
                );
            }
            Ok(())
        }),
    )
}

fn turn_protocol() -> TestScenario {
    TestScenario::simulation(
        "turn-protocol",
        base_plan().with_expectation(|_summary: &SimulationSummary| {
            let (mut session, _epoch) = live_session(11)?;

            ensure!(
                matches!(session.begin_turn("   "), Err(TurnError::EmptyUtterance)),
                "blank questions are refused"
            );

            let (request, ticket) = session.begin_turn("Where are we headed?")?;
            ensure!(request.player_question == "Where are we headed?");
            ensure!(!request.location_name.is_empty(), "request names the location");
            ensure!(!request.driver_name.is_empty(), "request names the driver");
            ensure!(
                matches!(session.begin_turn("Hello?"), Err(TurnError::ReplyPending)),
                "one turn at a time"
            );

            let small_talk = DialogueReply {
                response: "Just enjoy the ride.".to_string(),
                is_hint: false,
                hint_level: None,
            };
            let outcome = session.complete_turn(ticket, small_talk.clone())?;
            ensure!(
                matches!(outcome, TurnOutcome::Replied { hint_revealed: None }),
                "small talk reveals nothing"
            );
            ensure!(
                matches!(
                    session.complete_turn(ticket, small_talk),
                    Err(TurnError::NoTurnInFlight)
                ),
                "a settled ticket cannot settle again"
            );

            let (_request, ticket) = session.begin_turn("Any hint?")?;
            let hinted = DialogueReply {
                response: "Look at the wide boulevards.".to_string(),
                is_hint: true,
                hint_level: Some(1),
            };
            let outcome = session.complete_turn(ticket, hinted)?;
            ensure!(
                matches!(outcome, TurnOutcome::Replied { hint_revealed: Some(_) }),
                "a first-tier hint reply must reveal"
            );
            let hints = session.round().context("round")?.hints_used();
            ensure!(hints == 1, "the revealed hint joins the scored set");

            let (_request, ticket) = session.begin_turn("And now?")?;
            ensure!(
                matches!(session.fail_turn(ticket)?, TurnOutcome::Failed),
                "failures resolve the turn"
            );
            ensure!(
                session.round().context("round")?.hints_used() == 1,
                "failures must not charge the player"
            );
            Ok(())
        }),
    )
}

fn review_mode() -> TestScenario {
    TestScenario::simulation(
        "review-mode",
        base_plan().with_expectation(|_summary: &SimulationSummary| {
            let (mut session, epoch) = live_session(21)?;
            let answer = current_answer(&session)?;
            session.submit_guess(&answer)?;
            ensure!(session.phase() == GamePhase::Result);

            session.enter_review()?;
            ensure!(session.phase() == GamePhase::Playing && session.in_review());
            ensure!(
                matches!(session.submit_guess("anything")?, GuessOutcome::ReviewLocked),
                "guessing is frozen in review"
            );
            ensure!(
                matches!(session.request_hint()?, HintOutcome::ReviewLocked),
                "hints are frozen in review"
            );
            ensure!(
                matches!(
                    session.reveal_translation("driver-opening")?,
                    TranslationOutcome::ReviewLocked
                ),
                "translations are frozen in review"
            );
            ensure!(
                matches!(session.begin_turn("hello"), Err(TurnError::ReviewLocked)),
                "conversation is frozen in review"
            );
            ensure!(
                matches!(session.tick(epoch), TickOutcome::Stale),
                "the clock does not run in review"
            );

            session.leave_review()?;
            ensure!(session.phase() == GamePhase::Result && !session.in_review());

            session.enter_review()?;
            session.advance_to_summary()?;
            ensure!(
                session.phase() == GamePhase::Summary && !session.in_review(),
                "review exits cleanly into the summary"
            );

            // Review is a reward: timed-out rounds do not get one.
            let config = GameConfig {
                round_seconds: 10,
                ..GameConfig::default()
            };
            let mut session = GameSession::sanitized(config, 22);
            let epoch = session.start_round(None)?;
            let expired = (0..10).any(|_| matches!(session.tick(epoch), TickOutcome::Expired { .. }));
            ensure!(expired, "a ten second round must expire in ten ticks");
            ensure!(
                matches!(session.enter_review(), Err(SessionError::ReviewUnavailable)),
                "no review after a timeout"
            );
            Ok(())
        }),
    )
}

fn timer_expiry() -> TestScenario {
    TestScenario::simulation(
        "timer-expiry",
        base_plan().with_expectation(|_summary: &SimulationSummary| {
            let config = GameConfig {
                round_seconds: 10,
                ..GameConfig::default()
            };
            let mut session = GameSession::sanitized(config, 31);
            let epoch = session.start_round(None)?;

            ensure!(
                matches!(session.tick(epoch + 1), TickOutcome::Stale),
                "a foreign epoch must not move the clock"
            );
            for second in 1..10 {
                let outcome = session.tick(epoch);
                ensure!(
                    matches!(outcome, TickOutcome::Ticked { time_remaining } if time_remaining == 10 - second),
                    "second {second} misticked: {outcome:?}"
                );
            }
            let expired = session.tick(epoch);
            ensure!(
                matches!(expired, TickOutcome::Expired { points: 1_000 }),
                "expiry must bank the base award, got {expired:?}"
            );
            ensure!(session.phase() == GamePhase::Result);

            let outcome = session.last_outcome().context("timeout outcome")?;
            ensure!(!outcome.correct, "a timeout is not a win");
            ensure!(outcome.points == 1_000);
            ensure!(outcome.player_guess.is_none(), "no guess on a timeout");

            ensure!(
                matches!(session.tick(epoch), TickOutcome::Stale),
                "expiry fires exactly once"
            );
            Ok(())
        }),
    )
}

fn event_order() -> TestScenario {
    TestScenario::simulation(
        "event-order",
        base_plan().with_expectation(|_summary: &SimulationSummary| {
            let (mut session, _epoch) = live_session(41)?;
            session.request_hint()?;
            session.submit_guess("atlantis")?;
            let answer = current_answer(&session)?;
            session.submit_guess(&answer)?;

            let events = session.drain_events();
            ensure!(events.len() >= 4, "expected a busy round, got {}", events.len());
            ensure!(
                events.windows(2).all(|pair| pair[0].id.seq < pair[1].id.seq),
                "event sequence numbers must strictly increase"
            );
            ensure!(
                events.iter().all(|e| e.id.round == 0),
                "all events belong to the first round"
            );

            let position = |kind: EventKind| events.iter().position(|e| e.kind == kind);
            let started = position(EventKind::RoundStarted).context("RoundStarted")?;
            let hinted = position(EventKind::HintRevealed).context("HintRevealed")?;
            let missed = position(EventKind::GuessWrong).context("GuessWrong")?;
            let solved = position(EventKind::RoundCorrect).context("RoundCorrect")?;
            ensure!(
                started < hinted && hinted < missed && missed < solved,
                "round events must replay in play order"
            );

            ensure!(
                session.drain_events().is_empty(),
                "draining must consume the buffer"
            );
            Ok(())
        }),
    )
}

fn difficulty_ladder() -> TestScenario {
    TestScenario::simulation(
        "difficulty-ladder",
        base_plan().with_expectation(|_summary: &SimulationSummary| {
            let ladder: Vec<Difficulty> = (0..6).map(Difficulty::for_round).collect();
            ensure!(
                ladder
                    == [
                        Difficulty::Easy,
                        Difficulty::Easy,
                        Difficulty::Medium,
                        Difficulty::Medium,
                        Difficulty::Hard,
                        Difficulty::Hard,
                    ],
                "six-round ladder moved: {ladder:?}"
            );
            ensure!(
                Difficulty::for_round(49) == Difficulty::Hard,
                "long sessions stay hard"
            );
            ensure!(Difficulty::default() == Difficulty::Easy);
            ensure!(
                Difficulty::Easy.as_str() == "easy" && Difficulty::Hard.as_str() == "hard",
                "persisted difficulty labels moved"
            );
            Ok(())
        }),
    )
}

/// Key and description for every catalog scenario.
#[must_use]
pub fn catalog_entries() -> Vec<(&'static str, &'static str)> {
    vec![
        ("session-defaults", "Stock config and a fresh session"),
        ("score-formula", "Award, bonus and penalty arithmetic"),
        ("guess-matching", "Normalization and acceptable answers"),
        ("config-sanitization", "Out-of-range configs are clamped"),
        ("fallback-catalog", "Embedded locations are sound"),
        ("turn-protocol", "Two-phase driver turns and tickets"),
        ("review-mode", "Review freezes play and the clock"),
        ("timer-expiry", "Expiry scores once, then goes stale"),
        ("event-order", "Events replay in play order"),
        ("difficulty-ladder", "Rounds get harder across a session"),
    ]
}

/// Resolve a catalog scenario by key or alias.
#[must_use]
pub fn find_catalog_scenario(name: &str) -> Option<TestScenario> {
    match name {
        "session-defaults" | "defaults" => Some(session_defaults()),
        "score-formula" | "scoring" => Some(score_formula()),
        "guess-matching" | "matching" => Some(guess_matching()),
        "config-sanitization" | "config" => Some(config_sanitization()),
        "fallback-catalog" | "catalog" => Some(fallback_catalog()),
        "turn-protocol" | "turns" => Some(turn_protocol()),
        "review-mode" | "review" => Some(review_mode()),
        "timer-expiry" | "timer" => Some(timer_expiry()),
        "event-order" | "events" => Some(event_order()),
        "difficulty-ladder" | "ladder" => Some(difficulty_ladder()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::{GameTester, LogicTester, SeedInfo};

    #[test]
    fn every_catalog_scenario_passes() {
        let tester = LogicTester::new(GameTester::new(false));
        let seeds = [SeedInfo::from_numeric(1)];
        for (key, _) in catalog_entries() {
            let scenario = find_catalog_scenario(key).unwrap();
            let results = tester.run_scenario(&scenario, &seeds, 1);
            for result in results {
                assert!(
                    result.passed,
                    "catalog scenario {key} failed: {:?}",
                    result.failures
                );
            }
        }
    }

    #[test]
    fn catalog_aliases_resolve() {
        for alias in [
            "defaults", "scoring", "matching", "config", "catalog", "turns", "review", "timer",
            "events", "ladder",
        ] {
            assert!(find_catalog_scenario(alias).is_some(), "alias {alias}");
        }
    }

    #[test]
    fn catalog_plans_never_simulate() {
        for (key, _) in catalog_entries() {
            let scenario = find_catalog_scenario(key).unwrap();
            assert_eq!(scenario.plan.max_steps, Some(0), "{key} must stay pure");
        }
    }
}

use wayfare_game::{
    ClueOutcome, DialogueReply, DialogueRequest, DialogueSource, EventKind, FallbackCatalog,
    GameConfig, GameHost, GamePhase, GameSession, GuessOutcome, HintOutcome, HintTier, Location,
    ScenarioRequest, ScenarioSource, SessionAdvance, TickOutcome, TranslationOutcome, TurnOutcome,
    VoiceStatus,
};

fn catalog_locations() -> Vec<Location> {
    FallbackCatalog::load().iter().cloned().collect()
}

fn session_with_empty_catalog(config: GameConfig, seed: u64) -> GameSession {
    GameSession::with_catalog(config, seed, FallbackCatalog::empty()).expect("valid config")
}

/// Six rides answered instantly with no hints, translations or wrong guesses.
#[test]
fn perfect_session_totals_nine_thousand() {
    let locations = catalog_locations();
    assert_eq!(locations.len(), 6);
    let mut session = session_with_empty_catalog(GameConfig::default(), 0xDEAD_BEEF);

    for location in &locations {
        session.start_round(Some(location.clone())).unwrap();
        let guess = location.acceptable_answers[0].clone();
        assert!(matches!(
            session.submit_guess(&guess).unwrap(),
            GuessOutcome::Correct { points: 1_500 }
        ));
        session.advance_to_summary().unwrap();
    }

    assert!(!session.has_next_round());
    let visited: Vec<&str> = session
        .visited_location_names()
        .iter()
        .map(String::as_str)
        .collect();
    let expected: Vec<&str> = locations.iter().map(|l| l.name.as_str()).collect();
    assert_eq!(visited, expected);
    assert_eq!(visited.len(), 6);

    let total = session.complete_session().unwrap();
    assert_eq!(total, 9_000);
    assert_eq!(session.phase(), GamePhase::Intro);
    assert_eq!(session.total_points(), 0);
}

/// Penalties and a timed-out ride both land in the running total.
#[test]
fn penalties_and_timeouts_shape_the_total() {
    let config = GameConfig {
        total_rounds: 2,
        round_seconds: 10,
        ..GameConfig::default()
    };
    let locations = catalog_locations();
    let mut session = session_with_empty_catalog(config, 0xFACE_B00C);

    // Ride one: one hint, one translation, one wrong guess, full clock.
    session.start_round(Some(locations[0].clone())).unwrap();
    assert!(matches!(
        session.request_hint().unwrap(),
        HintOutcome::Revealed {
            tier: HintTier::Climate,
            hints_used: 1
        }
    ));
    assert_eq!(
        session.reveal_translation("1").unwrap(),
        TranslationOutcome::Revealed {
            translations_used: 1
        }
    );
    assert!(matches!(
        session.submit_guess("lisbon").unwrap(),
        GuessOutcome::Wrong { wrong_guesses: 1 }
    ));
    // 1000 + 500 - 100 - 50 - 75
    assert!(matches!(
        session.submit_guess("paris").unwrap(),
        GuessOutcome::Correct { points: 1_275 }
    ));
    session.advance_to_summary().unwrap();

    // Ride two: let the clock run out.
    let epoch = session.start_round(Some(locations[1].clone())).unwrap();
    for _ in 0..9 {
        assert!(matches!(session.tick(epoch), TickOutcome::Ticked { .. }));
    }
    assert_eq!(session.tick(epoch), TickOutcome::Expired { points: 1_000 });
    let outcome = session.last_outcome().unwrap();
    assert!(!outcome.correct);
    assert_eq!(outcome.player_guess, None);

    // The dead epoch's leftover ticks change nothing.
    assert_eq!(session.tick(epoch), TickOutcome::Stale);

    session.advance_to_summary().unwrap();
    assert_eq!(session.complete_session().unwrap(), 2_275);
}

/// Street clues and explicit requests drain the same three-slot economy.
#[test]
fn street_clues_and_requests_share_one_economy() {
    let locations = catalog_locations();
    let mut session = session_with_empty_catalog(GameConfig::default(), 0x00C0_FFEE);
    session.start_round(Some(locations[2].clone())).unwrap();

    assert!(matches!(
        session.reveal_npc_clue("1").unwrap(),
        ClueOutcome::Revealed {
            counted: true,
            hints_used: 1
        }
    ));
    assert!(matches!(
        session.reveal_npc_clue("2").unwrap(),
        ClueOutcome::Revealed {
            counted: true,
            hints_used: 2
        }
    ));
    assert!(matches!(
        session.request_hint().unwrap(),
        HintOutcome::Revealed {
            tier: HintTier::Climate,
            hints_used: 3
        }
    ));
    assert_eq!(session.request_hint().unwrap(), HintOutcome::Exhausted);

    // 1000 + 500 - 300
    assert!(matches!(
        session.submit_guess("cairo").unwrap(),
        GuessOutcome::Correct { points: 1_200 }
    ));
}

/// Generation failure falls back to the embedded catalog and keeps playing.
#[test]
fn fallback_round_is_fully_playable() {
    let mut session = GameSession::new(GameConfig::default(), 0xBAD_5EED).expect("valid config");
    session.start_round(None).unwrap();

    let events = session.drain_events();
    assert!(events.iter().any(|e| e.kind == EventKind::ScenarioFallback));
    assert!(events.iter().any(|e| e.kind == EventKind::RoundStarted));

    let answer = session.round().unwrap().location().acceptable_answers[0].clone();
    assert!(matches!(
        session.submit_guess(&answer).unwrap(),
        GuessOutcome::Correct { points: 1_500 }
    ));
}

/// The same seed picks the same fallback ride every time.
#[test]
fn fallback_selection_is_deterministic() {
    let pick_name = |seed: u64| {
        let mut session = GameSession::new(GameConfig::default(), seed).expect("valid config");
        session.start_round(None).unwrap();
        session.round().unwrap().location().name.clone()
    };
    assert_eq!(pick_name(42), pick_name(42));
}

/// Review replays a correct ride read-only, then the summary appends once.
#[test]
fn review_flow_keeps_the_round_frozen() {
    let locations = catalog_locations();
    let mut session = session_with_empty_catalog(GameConfig::default(), 0xFEED_FACE);
    let epoch = session.start_round(Some(locations[0].clone())).unwrap();
    session.submit_guess("paris").unwrap();

    session.enter_review().unwrap();
    assert_eq!(session.phase(), GamePhase::Playing);
    assert!(session.in_review());
    assert_eq!(
        session.submit_guess("france").unwrap(),
        GuessOutcome::ReviewLocked
    );
    assert_eq!(session.request_hint().unwrap(), HintOutcome::ReviewLocked);
    assert_eq!(session.tick(epoch), TickOutcome::Stale);
    assert_eq!(session.total_points(), 1_500);

    session.advance_to_summary().unwrap();
    assert_eq!(session.phase(), GamePhase::Summary);
    assert_eq!(session.visited_location_names().len(), 1);

    // The next ride is unaffected by the review detour.
    session.start_round(Some(locations[1].clone())).unwrap();
    assert!(!session.in_review());
    assert_eq!(session.round().unwrap().wrong_guesses(), 0);
}

/// Quitting mid-ride abandons it and resets everything for the menu.
#[test]
fn quitting_resets_the_session() {
    let locations = catalog_locations();
    let mut session = session_with_empty_catalog(GameConfig::default(), 0xD15_EA5E);

    session.start_round(Some(locations[0].clone())).unwrap();
    session.submit_guess("paris").unwrap();
    session.advance_to_summary().unwrap();
    let epoch = session.start_round(Some(locations[1].clone())).unwrap();
    session.submit_guess("oslo").unwrap();

    session.quit();
    assert_eq!(session.phase(), GamePhase::Intro);
    assert_eq!(session.total_points(), 0);
    assert_eq!(session.current_round_index(), 0);
    assert!(session.visited_location_names().is_empty());
    assert!(session.round().is_none());
    assert_eq!(session.tick(epoch), TickOutcome::Stale);
    assert!(
        session
            .drain_events()
            .iter()
            .any(|e| e.kind == EventKind::RoundAbandoned)
    );

    // A fresh session starts cleanly from the same controller.
    session.start_round(Some(locations[0].clone())).unwrap();
    assert_eq!(session.round().unwrap().wrong_guesses(), 0);
}

/// Ticks captured against an earlier ride never touch a later one.
#[test]
fn cross_round_ticks_are_stale() {
    let locations = catalog_locations();
    let mut session = session_with_empty_catalog(GameConfig::default(), 0xAB1E_5EED);
    let first = session.start_round(Some(locations[0].clone())).unwrap();
    session.submit_guess("paris").unwrap();
    session.advance_to_summary().unwrap();
    let second = session.start_round(Some(locations[1].clone())).unwrap();

    assert_eq!(session.tick(first), TickOutcome::Stale);
    assert!(matches!(
        session.tick(second),
        TickOutcome::Ticked {
            time_remaining: 299
        }
    ));
}

/// Scenario source that deals catalog rides in order, skipping used names.
struct DealtScenarios {
    deck: Vec<Location>,
}

impl DealtScenarios {
    fn new() -> Self {
        Self {
            deck: catalog_locations(),
        }
    }
}

impl ScenarioSource for DealtScenarios {
    type Error = std::convert::Infallible;

    fn generate(&mut self, request: &ScenarioRequest) -> Result<Location, Self::Error> {
        let next = self
            .deck
            .iter()
            .find(|l| !request.used_location_names.contains(&l.name))
            .cloned()
            .unwrap_or_else(|| self.deck[0].clone());
        Ok(next)
    }
}

struct ChattyDriver;

impl DialogueSource for ChattyDriver {
    type Error = std::convert::Infallible;

    fn reply(&mut self, request: &DialogueRequest) -> Result<DialogueReply, Self::Error> {
        Ok(DialogueReply {
            response: format!("{} hums along to the radio.", request.driver_name),
            is_hint: false,
            hint_level: None,
        })
    }
}

/// A host-driven session: generated rides, small talk, clean completion.
#[test]
fn host_drives_a_whole_session() {
    let session = session_with_empty_catalog(GameConfig::default(), 0x5EED_CAFE);
    let mut host = GameHost::new(session, DealtScenarios::new(), ChattyDriver);

    host.start_round().unwrap();
    for round in 0..6 {
        assert_eq!(host.session().current_round_index(), round);
        assert_eq!(
            host.take_turn("How far is it?").unwrap(),
            TurnOutcome::Replied {
                hint_revealed: None
            }
        );
        assert_eq!(host.session().voice_status(), VoiceStatus::Idle);

        let answer = host.session().round().unwrap().location().acceptable_answers[0].clone();
        assert!(matches!(
            host.session_mut().submit_guess(&answer).unwrap(),
            GuessOutcome::Correct { points: 1_500 }
        ));
        host.session_mut().advance_to_summary().unwrap();

        match host.advance_from_summary().unwrap() {
            SessionAdvance::NextRound { .. } => assert!(round < 5),
            SessionAdvance::Completed { total_points } => {
                assert_eq!(round, 5);
                assert_eq!(total_points, 9_000);
            }
        }
    }
    assert_eq!(host.session().phase(), GamePhase::Intro);
}

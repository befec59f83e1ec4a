//! Re-runs the engine's integration suites inside the tester build, so a
//! tester dependency bump cannot silently drift from engine behavior.

#[path = "../../wayfare-game/tests/data_shapes.rs"]
mod data_shapes;

#[path = "../../wayfare-game/tests/full_session.rs"]
mod full_session;

pub mod balance;
pub mod game_tester;
pub mod policy;
pub mod reports;
pub mod seeds;
pub mod simulation;
pub mod tester;

pub use balance::{
    BalanceAggregate, BalanceRecord, aggregate_balance, run_balance_analysis,
    validate_balance_targets,
};
pub use game_tester::{
    GameTester, RulesPreset, SessionMetrics, SimulationExpectation, SimulationPlan,
    SimulationSummary,
};
pub use policy::GameplayStrategy;
pub use seeds::{SeedInfo, resolve_seed_inputs};
pub use tester::{LogicTester, ScenarioResult};

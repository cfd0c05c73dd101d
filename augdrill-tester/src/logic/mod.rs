pub mod analysis;
pub mod drill_tester;
pub mod policy;
pub mod reports;
pub mod seeds;
pub mod simulation;
pub mod tester;

pub use analysis::{
    StrategyAggregate, StrategyRecord, aggregate_strategies, run_strategy_analysis,
    validate_strategy_targets,
};
pub use drill_tester::{DrillTester, SimulationPlan, SimulationSummary, TesterAssets};
pub use policy::GameplayStrategy;
pub use seeds::{SeedInfo, resolve_seed_inputs};
pub use tester::*;

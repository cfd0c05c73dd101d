use anyhow::{Result, ensure};
use augdrill_core::{CorrectAction, Slot, SlotId, TierMode, TrainingMode};

use crate::logic::{GameplayStrategy, SimulationPlan, SimulationSummary};
use catalog::find_catalog_scenario;

pub mod catalog;
pub mod smoke;

/// Named simulation plan run over seeds and iterations.
#[derive(Debug, Clone)]
pub struct TestScenario {
    pub name: String,
    pub plan: SimulationPlan,
}

impl TestScenario {
    #[must_use]
    pub fn new(name: impl Into<String>, plan: SimulationPlan) -> Self {
        Self {
            name: name.into(),
            plan,
        }
    }

    /// Override the plan's tier and training mode from CLI flags.
    #[must_use]
    pub fn with_modes(mut self, tier_mode: Option<TierMode>, mode: Option<TrainingMode>) -> Self {
        if let Some(tier_mode) = tier_mode {
            self.plan.tier_mode = tier_mode;
        }
        if let Some(mode) = mode {
            self.plan.mode = mode;
        }
        self
    }
}

fn completion_expectation(summary: &SimulationSummary) -> Result<()> {
    ensure!(summary.completed, "playthrough did not finish");
    let playable = summary.set.playable_count();
    ensure!(
        usize::try_from(summary.score.total).unwrap_or(usize::MAX) == playable,
        "scored {} spots, {playable} playable",
        summary.score.total
    );
    Ok(())
}

fn oracle_expectation(summary: &SimulationSummary) -> Result<()> {
    completion_expectation(summary)?;
    ensure!(
        summary.score.correct == summary.score.total,
        "oracle scored {}",
        summary.score
    );
    ensure!(
        summary.auto_losses() == 0,
        "oracle hit {} automatic losses",
        summary.auto_losses()
    );
    Ok(())
}

fn answers(summary: &SimulationSummary) -> impl Iterator<Item = SlotId> + '_ {
    summary
        .set
        .playable_spots()
        .filter_map(|spot| spot.correct_pick)
}

fn first_pick_expectation(summary: &SimulationSummary) -> Result<()> {
    completion_expectation(summary)?;
    let expected = answers(summary)
        .filter(|id| *id == Slot::A.primary())
        .count();
    ensure!(
        usize::try_from(summary.score.correct).unwrap_or(usize::MAX) == expected,
        "first pick scored {}, expected {expected} correct",
        summary.score
    );
    ensure!(summary.rerolls() == 0, "first pick rerolled");
    Ok(())
}

fn reroll_all_expectation(summary: &SimulationSummary) -> Result<()> {
    completion_expectation(summary)?;
    let primaries = answers(summary)
        .filter(|id| id.action() == CorrectAction::Pick)
        .count();
    ensure!(
        summary.auto_losses() == primaries,
        "reroll-all lost {} spots automatically, expected {primaries}",
        summary.auto_losses()
    );
    let expected = answers(summary)
        .filter(|id| *id == Slot::A.replacement())
        .count();
    ensure!(
        usize::try_from(summary.score.correct).unwrap_or(usize::MAX) == expected,
        "reroll-all scored {}, expected {expected} correct",
        summary.score
    );
    Ok(())
}

fn strategy_scenario(name: &'static str, strategy: GameplayStrategy) -> TestScenario {
    let plan = SimulationPlan::new(TierMode::Mixed, TrainingMode::Augment21, strategy);
    let plan = match strategy {
        GameplayStrategy::Oracle => plan.with_expectation(oracle_expectation),
        GameplayStrategy::FirstPick => plan.with_expectation(first_pick_expectation),
        GameplayStrategy::RerollAll => plan.with_expectation(reroll_all_expectation),
        GameplayStrategy::Random => plan.with_expectation(completion_expectation),
    };
    TestScenario::new(name, plan)
}

pub fn get_scenario(name: &str) -> Option<TestScenario> {
    match name.to_lowercase().as_str() {
        "smoke" => Some(smoke::smoke_scenario()),
        "sampler-properties" | "sampler" => find_catalog_scenario("Sampler Properties"),
        "pool-exhaustion" | "exhaustion" => find_catalog_scenario("Pool Exhaustion"),
        "tier-spread" | "tiers" => find_catalog_scenario("Mixed Tier Spread"),
        "reveal-rules" | "reveal" => find_catalog_scenario("Reveal Rules"),
        "deterministic-generation" | "deterministic" => {
            find_catalog_scenario("Deterministic Generation")
        }
        "partial-set" | "partial" => find_catalog_scenario("Partially Authored Set"),
        "oracle-strategy" | "oracle" => Some(strategy_scenario(
            "Oracle Strategy Test",
            GameplayStrategy::Oracle,
        )),
        "first-pick-strategy" | "first-pick" => Some(strategy_scenario(
            "First Pick Strategy Test",
            GameplayStrategy::FirstPick,
        )),
        "reroll-all-strategy" | "reroll-all" => Some(strategy_scenario(
            "Reroll All Strategy Test",
            GameplayStrategy::RerollAll,
        )),
        "random-strategy" | "random" => Some(strategy_scenario(
            "Random Strategy Test",
            GameplayStrategy::Random,
        )),
        _ => None,
    }
}

pub fn list_scenarios() -> Vec<(&'static str, &'static str)> {
    vec![
        ("smoke", "Smoke Test"),
        ("sampler-properties", "Sampler Properties"),
        ("pool-exhaustion", "Pool Exhaustion"),
        ("tier-spread", "Mixed Tier Spread"),
        ("reveal-rules", "Reveal Rules"),
        ("deterministic-generation", "Deterministic Generation"),
        ("partial-set", "Partially Authored Set"),
        ("oracle-strategy", "Oracle Strategy Test"),
        ("first-pick-strategy", "First Pick Strategy Test"),
        ("reroll-all-strategy", "Reroll All Strategy Test"),
        ("random-strategy", "Random Strategy Test"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::{DrillTester, TesterAssets};
    use augdrill_core::Tier;

    fn tester() -> DrillTester {
        DrillTester::new(TesterAssets::load_default().unwrap(), false)
    }

    #[test]
    fn every_listed_scenario_resolves() {
        for (key, name) in list_scenarios() {
            let scenario = get_scenario(key).unwrap_or_else(|| panic!("missing {key}"));
            assert_eq!(scenario.name, name);
            assert!(!scenario.plan.expectations.is_empty());
        }
        assert!(get_scenario("nope").is_none());
        assert!(get_scenario("SMOKE").is_some());
    }

    #[test]
    fn listed_scenarios_pass_on_bundled_catalog() {
        let tester = tester();
        for (key, _) in list_scenarios() {
            let scenario = get_scenario(key).unwrap();
            for seed in [1_u64, 1337] {
                let summary = tester.run_plan(&scenario.plan, seed).unwrap();
                for expectation in &scenario.plan.expectations {
                    expectation
                        .evaluate(&summary)
                        .unwrap_or_else(|err| panic!("{key} seed {seed}: {err:#}"));
                }
            }
        }
    }

    #[test]
    fn mode_overrides_apply() {
        let scenario = get_scenario("tier-spread")
            .unwrap()
            .with_modes(Some(TierMode::Fixed(Tier::Gold)), Some(TrainingMode::Augment42));
        assert_eq!(scenario.plan.tier_mode, TierMode::Fixed(Tier::Gold));
        assert_eq!(scenario.plan.mode, TrainingMode::Augment42);
        let summary = tester().run_plan(&scenario.plan, 5).unwrap();
        for expectation in &scenario.plan.expectations {
            expectation.evaluate(&summary).unwrap();
        }
    }
}

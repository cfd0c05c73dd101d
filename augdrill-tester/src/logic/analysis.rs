use anyhow::{Context, Result, ensure};
use augdrill_core::numbers::{count_to_f64, len_to_u32, percent};
use augdrill_core::{Score, TierMode, TrainingMode};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::logic::drill_tester::{DrillTester, SimulationPlan};
use crate::logic::policy::GameplayStrategy;
use crate::logic::seeds::SeedInfo;

/// One simulated playthrough.
#[derive(Debug, Clone, Serialize)]
pub struct StrategyRecord {
    pub scenario_name: String,
    pub tier_mode: TierMode,
    pub mode: TrainingMode,
    pub strategy: GameplayStrategy,
    pub seed_label: String,
    pub seed_value: u64,
    pub score: Score,
    pub auto_losses: u32,
    pub rerolls: u32,
}

impl StrategyRecord {
    #[must_use]
    pub fn accuracy_pct(&self) -> f64 {
        self.score.accuracy_pct()
    }
}

/// Per-strategy statistics over many playthroughs.
#[derive(Debug, Clone, Serialize)]
pub struct StrategyAggregate {
    pub scenario_name: String,
    pub tier_mode: TierMode,
    pub mode: TrainingMode,
    pub strategy: GameplayStrategy,
    pub runs: u32,
    pub spots_played: u32,
    pub mean_accuracy: f64,
    pub std_accuracy: f64,
    pub min_accuracy: f64,
    pub max_accuracy: f64,
    /// Share of played spots lost to rerolling the answer slot.
    pub auto_loss_pct: f64,
    pub mean_rerolls: f64,
}

fn scenario_label(strategy: GameplayStrategy, tier_mode: TierMode, mode: TrainingMode) -> String {
    format!("{} ({tier_mode}, {mode})", strategy.label())
}

/// Play every strategy over every seed, `iterations` times each.
///
/// # Errors
///
/// Fails on the first playthrough that cannot be completed.
pub fn run_strategy_analysis(
    tester: &DrillTester,
    strategies: &[GameplayStrategy],
    seeds: &[SeedInfo],
    iterations: usize,
    tier_mode: TierMode,
    mode: TrainingMode,
) -> Result<Vec<StrategyRecord>> {
    let mut records = Vec::with_capacity(strategies.len() * seeds.len() * iterations);

    for &strategy in strategies {
        let plan = SimulationPlan::new(tier_mode, mode, strategy);
        let scenario_name = scenario_label(strategy, tier_mode, mode);
        for seed in seeds {
            for i in 0..iterations {
                let seed_value = seed
                    .seed
                    .wrapping_add(u64::try_from(i).unwrap_or(u64::MAX));
                let summary = tester.run_plan(&plan, seed_value).with_context(|| {
                    format!("{scenario_name} failed for seed {}", seed.label())
                })?;
                records.push(StrategyRecord {
                    scenario_name: scenario_name.clone(),
                    tier_mode,
                    mode,
                    strategy,
                    seed_label: seed.label(),
                    seed_value,
                    score: summary.score,
                    auto_losses: len_to_u32(summary.auto_losses()),
                    rerolls: len_to_u32(summary.rerolls()),
                });
            }
        }
    }

    Ok(records)
}

#[must_use]
pub fn aggregate_strategies(records: &[StrategyRecord]) -> Vec<StrategyAggregate> {
    let mut aggregates: BTreeMap<String, AggregateBuilder> = BTreeMap::new();
    for record in records {
        aggregates
            .entry(record.scenario_name.clone())
            .or_insert_with(|| AggregateBuilder::new(record))
            .ingest(record);
    }
    aggregates
        .into_values()
        .map(AggregateBuilder::finish)
        .collect()
}

/// The oracle plays the authored answer, so anything short of a perfect
/// score is an engine defect.
///
/// # Errors
///
/// Names the first oracle run that missed a spot.
pub fn validate_strategy_targets(
    aggregates: &[StrategyAggregate],
    records: &[StrategyRecord],
) -> Result<()> {
    for record in records
        .iter()
        .filter(|r| r.strategy == GameplayStrategy::Oracle)
    {
        ensure!(
            record.score.correct == record.score.total && record.auto_losses == 0,
            "Oracle scored {} with {} automatic losses on seed {}",
            record.score,
            record.auto_losses,
            record.seed_label
        );
    }
    for aggregate in aggregates {
        ensure!(
            (0.0..=100.0).contains(&aggregate.mean_accuracy),
            "{} reported accuracy {}",
            aggregate.scenario_name,
            aggregate.mean_accuracy
        );
    }
    Ok(())
}

#[derive(Debug, Clone)]
struct AggregateBuilder {
    scenario_name: String,
    tier_mode: TierMode,
    mode: TrainingMode,
    strategy: GameplayStrategy,
    accuracy: RunningStats,
    min_accuracy: f64,
    max_accuracy: f64,
    spots_played: u32,
    auto_losses: u32,
    rerolls: u32,
}

impl AggregateBuilder {
    fn new(record: &StrategyRecord) -> Self {
        Self {
            scenario_name: record.scenario_name.clone(),
            tier_mode: record.tier_mode,
            mode: record.mode,
            strategy: record.strategy,
            accuracy: RunningStats::default(),
            min_accuracy: f64::INFINITY,
            max_accuracy: f64::NEG_INFINITY,
            spots_played: 0,
            auto_losses: 0,
            rerolls: 0,
        }
    }

    fn ingest(&mut self, record: &StrategyRecord) {
        let accuracy = record.accuracy_pct();
        self.accuracy.add(accuracy);
        self.min_accuracy = self.min_accuracy.min(accuracy);
        self.max_accuracy = self.max_accuracy.max(accuracy);
        self.spots_played += record.score.total;
        self.auto_losses += record.auto_losses;
        self.rerolls += record.rerolls;
    }

    fn finish(self) -> StrategyAggregate {
        let runs = self.accuracy.count;
        let mean_rerolls = if runs == 0 {
            0.0
        } else {
            count_to_f64(self.rerolls) / count_to_f64(runs)
        };
        StrategyAggregate {
            scenario_name: self.scenario_name,
            tier_mode: self.tier_mode,
            mode: self.mode,
            strategy: self.strategy,
            runs,
            spots_played: self.spots_played,
            mean_accuracy: self.accuracy.mean(),
            std_accuracy: self.accuracy.std_dev(),
            min_accuracy: if runs == 0 { 0.0 } else { self.min_accuracy },
            max_accuracy: if runs == 0 { 0.0 } else { self.max_accuracy },
            auto_loss_pct: percent(self.auto_losses, self.spots_played),
            mean_rerolls,
        }
    }
}

#[derive(Debug, Default, Clone)]
struct RunningStats {
    count: u32,
    mean: f64,
    m2: f64,
}

impl RunningStats {
    fn add(&mut self, value: f64) {
        self.count += 1;
        let count = f64::from(self.count);
        let delta = value - self.mean;
        self.mean += delta / count;
        let delta2 = value - self.mean;
        self.m2 += delta * delta2;
    }

    const fn mean(&self) -> f64 {
        if self.count == 0 { 0.0 } else { self.mean }
    }

    fn variance(&self) -> f64 {
        if self.count > 1 {
            self.m2 / f64::from(self.count - 1)
        } else {
            0.0
        }
    }

    fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }
}

use anyhow::{Result, ensure};
use augdrill_core::constants::OPTIONS_PER_SPOT;
use augdrill_core::{SlotId, TierMode, TrainingMode};

use super::TestScenario;
use crate::logic::{GameplayStrategy, SimulationPlan, SimulationSummary};

pub fn smoke_scenario() -> TestScenario {
    TestScenario::new(
        "Smoke Test",
        SimulationPlan::new(
            TierMode::Mixed,
            TrainingMode::Augment21,
            GameplayStrategy::Oracle,
        )
        .with_expectation(smoke_expectation),
    )
}

fn smoke_expectation(summary: &SimulationSummary) -> Result<()> {
    let set = &summary.set;
    ensure!(!set.spots.is_empty(), "set {} has no spots", set.id);
    ensure!(set.is_published(), "set {} was not published", set.id);
    for spot in &set.spots {
        ensure!(
            spot.options.len() == OPTIONS_PER_SPOT,
            "spot {} has {} options",
            spot.index,
            spot.options.len()
        );
        let ids: Vec<SlotId> = spot.options.iter().map(|o| o.id).collect();
        ensure!(
            ids == SlotId::ALL,
            "spot {} options are tagged {ids:?}",
            spot.index
        );
        ensure!(
            spot.stage_label == summary.mode.stage_label(),
            "spot {} is labelled {}",
            spot.index,
            spot.stage_label
        );
    }
    ensure!(summary.completed, "playthrough did not finish");
    ensure!(
        usize::try_from(summary.score.total).unwrap_or(usize::MAX) == set.playable_count(),
        "scored {} of {} playable spots",
        summary.score.total,
        set.playable_count()
    );
    Ok(())
}

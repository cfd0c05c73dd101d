use anyhow::{Result, anyhow, ensure};
use augdrill_core::constants::OPTIONS_PER_SPOT;
use augdrill_core::{
    AugmentStage, CorrectAction, InvalidTransition, Phase, Playthrough, Resolution, RevealMachine,
    RevealRule, SampleRequest, SamplerError, Tier, TierMode, TrainingMode, generate_seeded_set,
    sample_augments,
};
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use std::collections::{BTreeMap, HashSet};

use super::TestScenario;
use crate::logic::{GameplayStrategy, SimulationPlan, SimulationSummary};

pub fn catalog_scenarios() -> Vec<TestScenario> {
    vec![
        TestScenario::new(
            "Sampler Properties",
            base_plan().with_expectation(sampler_properties_expectation),
        ),
        TestScenario::new(
            "Pool Exhaustion",
            base_plan().with_expectation(pool_exhaustion_expectation),
        ),
        TestScenario::new(
            "Mixed Tier Spread",
            base_plan().with_expectation(tier_spread_expectation),
        ),
        TestScenario::new(
            "Reveal Rules",
            base_plan().with_expectation(reveal_rules_expectation),
        ),
        TestScenario::new(
            "Deterministic Generation",
            base_plan().with_expectation(deterministic_generation_expectation),
        ),
        TestScenario::new(
            "Partially Authored Set",
            base_plan()
                .with_unanswered_every(3)
                .with_expectation(partial_set_expectation),
        ),
    ]
}

pub fn find_catalog_scenario(name: &str) -> Option<TestScenario> {
    catalog_scenarios()
        .into_iter()
        .find(|scenario| scenario.name == name)
}

fn base_plan() -> SimulationPlan {
    SimulationPlan::new(
        TierMode::Mixed,
        TrainingMode::Augment21,
        GameplayStrategy::Oracle,
    )
}

fn sampler_properties_expectation(summary: &SimulationSummary) -> Result<()> {
    let catalog = &summary.catalog;
    let mut rng = ChaCha20Rng::seed_from_u64(summary.seed);
    for tier in Tier::ALL {
        for stage in AugmentStage::ALL {
            let eligible = catalog.eligible_count(tier, Some(stage));
            for count in 1..=eligible {
                let request = SampleRequest::new(tier, count).with_stage(stage);
                let picked = sample_augments(catalog, &request, &mut rng)?;
                ensure!(
                    picked.len() == count,
                    "{tier} stage {stage}: asked for {count}, got {}",
                    picked.len()
                );
                let names: HashSet<&str> = picked.iter().map(|a| a.name.as_str()).collect();
                ensure!(
                    names.len() == count,
                    "{tier} stage {stage}: duplicate augments in {names:?}"
                );
                ensure!(
                    picked.iter().all(|a| a.tier == tier && a.available_at(stage)),
                    "{tier} stage {stage}: ineligible augment sampled"
                );
            }
        }
    }
    Ok(())
}

fn pool_exhaustion_expectation(summary: &SimulationSummary) -> Result<()> {
    let catalog = &summary.catalog;
    let mut rng = ChaCha20Rng::seed_from_u64(summary.seed);
    for tier in Tier::ALL {
        for stage in AugmentStage::ALL {
            let eligible: Vec<&str> = catalog
                .iter()
                .filter(|a| a.tier == tier && a.available_at(stage))
                .map(|a| a.name.as_str())
                .collect();
            ensure!(
                eligible.len() >= OPTIONS_PER_SPOT,
                "{tier} stage {stage} only has {} augments",
                eligible.len()
            );
            let kept = OPTIONS_PER_SPOT - 1;
            let request = SampleRequest::new(tier, OPTIONS_PER_SPOT)
                .with_stage(stage)
                .excluding(eligible[kept..].iter().copied());
            match sample_augments(catalog, &request, &mut rng) {
                Err(SamplerError::PoolExhausted {
                    available,
                    requested,
                    ..
                }) => ensure!(
                    available == kept && requested == OPTIONS_PER_SPOT,
                    "{tier} stage {stage}: reported {available}/{requested}"
                ),
                Ok(picked) => {
                    return Err(anyhow!(
                        "{tier} stage {stage}: exhausted pool returned {} augments",
                        picked.len()
                    ));
                }
                Err(other) => return Err(other.into()),
            }
        }
    }
    Ok(())
}

fn tier_spread_expectation(summary: &SimulationSummary) -> Result<()> {
    let mut counts: BTreeMap<Tier, usize> = BTreeMap::new();
    for spot in &summary.set.spots {
        *counts.entry(spot.tier).or_default() += 1;
    }
    match summary.tier_mode {
        TierMode::Mixed => {
            let total = summary.set.spots.len();
            for (position, tier) in Tier::ALL.into_iter().enumerate() {
                let expected = total / Tier::ALL.len()
                    + usize::from(position < total % Tier::ALL.len());
                let actual = counts.get(&tier).copied().unwrap_or(0);
                ensure!(
                    actual == expected,
                    "mixed set has {actual} {tier} spots, expected {expected}"
                );
            }
        }
        TierMode::Fixed(tier) => ensure!(
            counts.len() == 1 && counts.contains_key(&tier),
            "fixed {tier} set contains {counts:?}"
        ),
    }
    for spot in &summary.set.spots {
        ensure!(
            spot.options.iter().all(|o| o.augment.tier == spot.tier),
            "spot {} mixes tiers",
            spot.index
        );
    }
    Ok(())
}

fn reveal_rules_expectation(summary: &SimulationSummary) -> Result<()> {
    for spot in summary.set.playable_spots() {
        let Some(answer) = spot.correct_pick else {
            continue;
        };
        let mut run = Playthrough::new(vec![spot.clone()]);
        match answer.action() {
            CorrectAction::Pick => {
                ensure!(
                    run.reroll(answer.slot) == Ok(Phase::Resolved),
                    "spot {}: rerolling the answer slot did not end the spot",
                    spot.index
                );
                ensure!(
                    run.machine().resolution() == Some(Resolution::AutoLoss { slot: answer.slot }),
                    "spot {}: expected an automatic loss",
                    spot.index
                );
                ensure!(
                    run.pick(answer.slot) == Err(InvalidTransition::AlreadyResolved),
                    "spot {}: pick allowed after automatic loss",
                    spot.index
                );

                let mut authoring = RevealMachine::new(RevealRule::Authoring);
                ensure!(
                    authoring.reroll(spot, answer.slot) == Ok(Phase::PartiallyRevealed),
                    "spot {}: authoring reroll should not resolve",
                    spot.index
                );
            }
            CorrectAction::RerollThenPick => {
                ensure!(
                    run.reroll(answer.slot) == Ok(Phase::PartiallyRevealed),
                    "spot {}: reroll of a replacement answer resolved the spot",
                    spot.index
                );
                ensure!(
                    run.reroll(answer.slot) == Err(InvalidTransition::AlreadyRerolled(answer.slot)),
                    "spot {}: second reroll was accepted",
                    spot.index
                );
                ensure!(
                    run.pick(answer.slot) == Ok(answer),
                    "spot {}: pick after reroll did not land on {answer}",
                    spot.index
                );
            }
        }
        let outcome = run.next()?;
        ensure!(
            outcome.correct == (answer.action() == CorrectAction::RerollThenPick),
            "spot {}: unexpected score for {answer}",
            spot.index
        );
    }
    Ok(())
}

fn deterministic_generation_expectation(summary: &SimulationSummary) -> Result<()> {
    let plan = summary.set.plan();
    let first = generate_seeded_set(&summary.catalog, &plan, summary.set.seed)?;
    let second = generate_seeded_set(&summary.catalog, &plan, summary.set.seed)?;
    ensure!(first == second, "seed {} generated two different sets", summary.set.seed);
    ensure!(
        first.len() == summary.set.spots.len(),
        "regenerated {} spots, set has {}",
        first.len(),
        summary.set.spots.len()
    );
    for (draft, spot) in first.iter().zip(&summary.set.spots) {
        ensure!(
            draft.tier == spot.tier && draft.options == spot.options,
            "spot {} differs from its seeded regeneration",
            spot.index
        );
    }
    Ok(())
}

fn partial_set_expectation(summary: &SimulationSummary) -> Result<()> {
    let playable = summary.set.playable_count();
    let unanswered = summary
        .set
        .spots
        .iter()
        .filter(|s| s.correct_pick.is_none())
        .count();
    ensure!(
        unanswered == summary.set.spots.len() / 3,
        "expected every third spot unanswered, found {unanswered}"
    );
    ensure!(
        usize::try_from(summary.score.total).unwrap_or(usize::MAX) == playable,
        "played {} spots but {playable} are playable",
        summary.score.total
    );
    Ok(())
}

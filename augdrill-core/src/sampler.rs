//! Constraint-respecting random draws from the augment catalog.
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

use crate::catalog::{Augment, AugmentCatalog, AugmentStage, Tier};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SamplerError {
    #[error(
        "not enough {tier} augments for {}: {available} eligible, {requested} requested",
        describe_stage(.stage)
    )]
    PoolExhausted {
        tier: Tier,
        stage: Option<AugmentStage>,
        available: usize,
        requested: usize,
    },
    #[error("sample count {requested} outside 1..={max}")]
    InvalidCount { requested: usize, max: usize },
}

/// Bound applied to caller-facing draws; the sampler itself has no ceiling.
///
/// # Errors
///
/// Returns `SamplerError::InvalidCount` when `count` is zero or above `max`.
pub const fn check_count(count: usize, max: usize) -> Result<(), SamplerError> {
    if count == 0 || count > max {
        return Err(SamplerError::InvalidCount {
            requested: count,
            max,
        });
    }
    Ok(())
}

fn describe_stage(stage: &Option<AugmentStage>) -> String {
    stage.map_or_else(|| String::from("any stage"), |s| format!("stage {s}"))
}

/// Parameters of a single sampler call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleRequest {
    pub tier: Tier,
    pub count: usize,
    #[serde(default)]
    pub stage: Option<AugmentStage>,
    /// Names removed from the pool before drawing.
    #[serde(default)]
    pub exclude: Vec<String>,
}

impl SampleRequest {
    #[must_use]
    pub const fn new(tier: Tier, count: usize) -> Self {
        Self {
            tier,
            count,
            stage: None,
            exclude: Vec::new(),
        }
    }

    #[must_use]
    pub const fn with_stage(mut self, stage: AugmentStage) -> Self {
        self.stage = Some(stage);
        self
    }

    #[must_use]
    pub fn excluding<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude.extend(names.into_iter().map(Into::into));
        self
    }

    /// Check the count against `1..=max`.
    ///
    /// # Errors
    ///
    /// Returns `SamplerError::InvalidCount` when the count is zero or above `max`.
    pub const fn validate(&self, max: usize) -> Result<(), SamplerError> {
        check_count(self.count, max)
    }

    fn admits(&self, augment: &Augment, excluded: &HashSet<&str>) -> bool {
        augment.tier == self.tier
            && self.stage.is_none_or(|stage| augment.available_at(stage))
            && !excluded.contains(augment.name.trim())
    }
}

/// Draw `request.count` distinct augments uniformly from the eligible pool.
///
/// The eligible pool is every augment of the requested tier, available at
/// the requested stage when one is given, whose name is not excluded. The
/// pool is shuffled (Fisher-Yates) and the first `count` entries returned.
///
/// # Errors
///
/// Returns `SamplerError::PoolExhausted` when fewer than `count` augments
/// are eligible. A short result is never returned.
pub fn sample_augments<R: Rng + ?Sized>(
    catalog: &AugmentCatalog,
    request: &SampleRequest,
    rng: &mut R,
) -> Result<Vec<Augment>, SamplerError> {
    let excluded: HashSet<&str> = request
        .exclude
        .iter()
        .map(|name| name.trim())
        .filter(|name| !name.is_empty())
        .collect();
    let mut eligible: Vec<&Augment> = catalog
        .iter()
        .filter(|augment| request.admits(augment, &excluded))
        .collect();

    if eligible.len() < request.count {
        log::debug!(
            "pool exhausted for {} ({}): {} < {}",
            request.tier,
            describe_stage(&request.stage),
            eligible.len(),
            request.count
        );
        return Err(SamplerError::PoolExhausted {
            tier: request.tier,
            stage: request.stage,
            available: eligible.len(),
            requested: request.count,
        });
    }

    eligible.shuffle(rng);
    Ok(eligible
        .into_iter()
        .take(request.count)
        .cloned()
        .collect())
}

/// Independent draws for one tier of a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierBatch {
    pub tier: Tier,
    pub selections: Vec<Vec<Augment>>,
}

/// Draw `per_tier` independent selections of `count` augments for every
/// tier, in silver, gold, prismatic order.
///
/// # Errors
///
/// Propagates the first sampler failure; no partial batch is returned.
pub fn sample_batch<R: Rng + ?Sized>(
    catalog: &AugmentCatalog,
    stage: Option<AugmentStage>,
    per_tier: usize,
    count: usize,
    rng: &mut R,
) -> Result<Vec<TierBatch>, SamplerError> {
    Tier::ALL
        .into_iter()
        .map(|tier| {
            let mut request = SampleRequest::new(tier, count);
            request.stage = stage;
            let selections = (0..per_tier)
                .map(|_| sample_augments(catalog, &request, rng))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(TierBatch { tier, selections })
        })
        .collect()
}

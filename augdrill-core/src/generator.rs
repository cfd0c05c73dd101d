//! Spot and set generation on top of the sampler.
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::{AugmentCatalog, AugmentStage, Tier};
use crate::constants::{MIN_OPTIONS_PER_SPOT, OPTIONS_PER_SPOT, SPOTS_PER_SET};
use crate::modes::{TierMode, TrainingMode};
use crate::rng::spot_rng;
use crate::sampler::{SampleRequest, SamplerError, sample_augments};
use crate::spot::{SpotDraft, tag_options};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerateError {
    #[error("spot {index} could not be generated: {source}")]
    Spot {
        index: usize,
        #[source]
        source: SamplerError,
    },
    #[error("{field} = {value} is outside {min}..={max}")]
    InvalidPlan {
        field: &'static str,
        value: usize,
        min: usize,
        max: usize,
    },
}

/// Shape of a set to generate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SetPlan {
    pub tier_mode: TierMode,
    pub mode: TrainingMode,
    pub spots: usize,
    pub options_per_spot: usize,
}

impl Default for SetPlan {
    fn default() -> Self {
        Self {
            tier_mode: TierMode::Mixed,
            mode: TrainingMode::Augment21,
            spots: SPOTS_PER_SET,
            options_per_spot: OPTIONS_PER_SPOT,
        }
    }
}

impl SetPlan {
    #[must_use]
    pub fn new(tier_mode: TierMode, mode: TrainingMode) -> Self {
        Self {
            tier_mode,
            mode,
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn stage(&self) -> AugmentStage {
        self.mode.stage()
    }

    /// Tier of the spot at 1-based `index`.
    #[must_use]
    pub fn tier_for(&self, index: usize) -> Tier {
        self.tier_mode.tier_for_index(index)
    }

    /// # Errors
    ///
    /// Returns `GenerateError::InvalidPlan` when the spot count is zero or
    /// the option count is outside `MIN_OPTIONS_PER_SPOT..=OPTIONS_PER_SPOT`.
    pub const fn validate(&self) -> Result<(), GenerateError> {
        if self.spots == 0 || self.spots > SPOTS_PER_SET {
            return Err(GenerateError::InvalidPlan {
                field: "spots",
                value: self.spots,
                min: 1,
                max: SPOTS_PER_SET,
            });
        }
        if self.options_per_spot < MIN_OPTIONS_PER_SPOT || self.options_per_spot > OPTIONS_PER_SPOT
        {
            return Err(GenerateError::InvalidPlan {
                field: "options_per_spot",
                value: self.options_per_spot,
                min: MIN_OPTIONS_PER_SPOT,
                max: OPTIONS_PER_SPOT,
            });
        }
        Ok(())
    }
}

/// Generate the spot at 1-based `index` with one sampler call.
///
/// # Errors
///
/// Returns the sampler error when the tier/stage pool is too small.
pub fn generate_spot<R: Rng + ?Sized>(
    catalog: &AugmentCatalog,
    plan: &SetPlan,
    index: usize,
    rng: &mut R,
) -> Result<SpotDraft, SamplerError> {
    let tier = plan.tier_for(index);
    let request = SampleRequest::new(tier, plan.options_per_spot).with_stage(plan.stage());
    let augments = sample_augments(catalog, &request, rng)?;
    log::debug!(
        "spot {index}: {tier} x{} at stage {}",
        augments.len(),
        plan.mode.stage_label()
    );
    Ok(SpotDraft {
        index,
        tier,
        stage_label: plan.mode.stage_label().to_string(),
        options: tag_options(augments),
    })
}

/// Generate every spot of `plan` from one shared random stream.
///
/// # Errors
///
/// Fails the whole set on the first spot that cannot be generated; no
/// partial set is returned.
pub fn generate_set<R: Rng + ?Sized>(
    catalog: &AugmentCatalog,
    plan: &SetPlan,
    rng: &mut R,
) -> Result<Vec<SpotDraft>, GenerateError> {
    plan.validate()?;
    (1..=plan.spots)
        .map(|index| generate_spot(catalog, plan, index, rng).map_err(|source| abort(index, source)))
        .collect()
}

/// Generate every spot of `plan` with a dedicated stream per spot derived
/// from `seed`, so [`regenerate_spot`] with the same seed reproduces spot
/// `index` exactly.
///
/// # Errors
///
/// Same as [`generate_set`].
pub fn generate_seeded_set(
    catalog: &AugmentCatalog,
    plan: &SetPlan,
    seed: u64,
) -> Result<Vec<SpotDraft>, GenerateError> {
    plan.validate()?;
    (1..=plan.spots)
        .map(|index| regenerate_spot(catalog, plan, index, seed))
        .collect()
}

/// Rebuild the options of one spot from its per-spot stream.
///
/// # Errors
///
/// Returns `GenerateError::Spot` when the pool is too small.
pub fn regenerate_spot(
    catalog: &AugmentCatalog,
    plan: &SetPlan,
    index: usize,
    seed: u64,
) -> Result<SpotDraft, GenerateError> {
    let mut rng = spot_rng(seed, index);
    generate_spot(catalog, plan, index, &mut rng).map_err(|source| abort(index, source))
}

fn abort(index: usize, source: SamplerError) -> GenerateError {
    log::warn!("generation aborted at spot {index}: {source}");
    GenerateError::Spot { index, source }
}

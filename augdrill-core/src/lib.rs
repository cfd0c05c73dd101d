//! Augdrill Engine
//!
//! Platform-agnostic core for augment decision drills: catalog sampling,
//! spot and set generation, the reveal/reroll state machine and scoring.
//! Catalog loading and set persistence are injected through traits.

pub mod catalog;
pub mod config;
pub mod constants;
pub mod generator;
pub mod ids;
pub mod modes;
pub mod numbers;
pub mod reveal;
pub mod rng;
pub mod sampler;
pub mod scoring;
pub mod set;
pub mod slot;
pub mod source;
pub mod spot;
pub mod store;

use chrono::{DateTime, Utc};
use rand::Rng;
use std::error::Error as StdError;
use thiserror::Error;

// Re-export commonly used types
pub use catalog::{Augment, AugmentCatalog, AugmentStage, CatalogError, StageAvailability, Tier};
pub use config::{ConfigError, DrillConfig};
pub use generator::{
    GenerateError, SetPlan, generate_seeded_set, generate_set, generate_spot, regenerate_spot,
};
pub use ids::{format_set_id, next_set_id, parse_set_seq, slugify_pro};
pub use modes::{ModeParseError, TierMode, TrainingMode};
pub use reveal::{InvalidTransition, Phase, Resolution, RevealMachine, RevealRule, VisibleOption};
pub use rng::{derive_stream_seed, spot_rng, stream_rng};
pub use sampler::{
    SampleRequest, SamplerError, TierBatch, check_count, sample_augments, sample_batch,
};
pub use scoring::{Playthrough, Score, SpotOutcome};
pub use set::{PublishState, SetError, SetHeader, TrainingSet};
pub use slot::{CorrectAction, Slot, SlotId, SlotIdError, derive_action};
pub use source::{
    CatalogSource, CatalogSourceKind, CatalogSourceStatus, JsonFileCatalog, StaticCatalog,
};
pub use spot::{Spot, SpotDraft, SpotOption, SpotOptions, tag_options};
pub use store::{MemorySetStore, MemoryStoreError, SetStore};

type BoxedError = Box<dyn StdError + Send + Sync + 'static>;

/// Failures surfaced by [`DrillEngine`]. Collaborator failures keep their
/// source error.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("catalog unavailable: {0}")]
    Catalog(#[source] BoxedError),
    #[error("set store failure: {0}")]
    Store(#[source] BoxedError),
    #[error(transparent)]
    Generate(#[from] GenerateError),
    #[error(transparent)]
    Sampler(#[from] SamplerError),
    #[error(transparent)]
    Set(#[from] SetError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("unknown set {0}")]
    UnknownSet(String),
    #[error("set {0} is not published")]
    NotPublished(String),
}

fn catalog_failure<E: StdError + Send + Sync + 'static>(err: E) -> EngineError {
    EngineError::Catalog(Box::new(err))
}

fn store_failure<E: StdError + Send + Sync + 'static>(err: E) -> EngineError {
    EngineError::Store(Box::new(err))
}

/// Inputs for [`DrillEngine::create_set`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSet {
    /// Account id of the author; becomes the set owner.
    pub author: String,
    /// Display name used for the id prefix.
    pub display_name: String,
    pub patch: String,
    pub tier_mode: Option<TierMode>,
    pub mode: Option<TrainingMode>,
    pub seed: u64,
    pub screenshots: Vec<String>,
}

/// Main drill engine tying a catalog source to a set store.
pub struct DrillEngine<C, S>
where
    C: CatalogSource,
    S: SetStore,
{
    source: C,
    store: S,
    config: DrillConfig,
}

impl<C, S> DrillEngine<C, S>
where
    C: CatalogSource,
    S: SetStore,
{
    /// Create an engine with the default configuration.
    pub fn new(source: C, store: S) -> Self {
        Self {
            source,
            store,
            config: DrillConfig::default(),
        }
    }

    /// # Errors
    ///
    /// Returns an error if `config` fails validation.
    pub fn with_config(source: C, store: S, config: DrillConfig) -> Result<Self, EngineError> {
        config.validate()?;
        Ok(Self {
            source,
            store,
            config,
        })
    }

    pub const fn config(&self) -> &DrillConfig {
        &self.config
    }

    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Load the catalog from the source.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Catalog` if the source fails.
    pub fn catalog(&self) -> Result<AugmentCatalog, EngineError> {
        self.source.load_catalog().map_err(catalog_failure)
    }

    /// Ad-hoc draw, bounded by the configured maximum count.
    ///
    /// # Errors
    ///
    /// Returns an error if the count is out of bounds, the pool is too
    /// small or the catalog cannot be loaded.
    pub fn sample<R: Rng + ?Sized>(
        &self,
        request: &SampleRequest,
        rng: &mut R,
    ) -> Result<Vec<Augment>, EngineError> {
        request.validate(self.config.max_sample_count)?;
        let catalog = self.catalog()?;
        Ok(sample_augments(&catalog, request, rng)?)
    }

    /// `per_tier` draws of `count` augments for every tier.
    ///
    /// # Errors
    ///
    /// Same as [`DrillEngine::sample`].
    pub fn sample_batch<R: Rng + ?Sized>(
        &self,
        stage: Option<AugmentStage>,
        per_tier: usize,
        count: usize,
        rng: &mut R,
    ) -> Result<Vec<TierBatch>, EngineError> {
        check_count(count, self.config.max_sample_count)?;
        let catalog = self.catalog()?;
        Ok(sample_batch(&catalog, stage, per_tier, count, rng)?)
    }

    /// Generate and persist a new draft set.
    ///
    /// # Errors
    ///
    /// Returns an error if generation fails for any spot, no screenshot is
    /// given, or a collaborator fails. Nothing is stored on error.
    pub fn create_set(&self, new_set: NewSet) -> Result<TrainingSet, EngineError> {
        let catalog = self.catalog()?;
        let plan = self.config.plan(new_set.tier_mode, new_set.mode);
        let drafts = generate_seeded_set(&catalog, &plan, new_set.seed)?;

        let existing = self.store.set_ids().map_err(store_failure)?;
        let id = next_set_id(
            &new_set.display_name,
            &new_set.patch,
            existing.iter().map(String::as_str),
        );
        let header = SetHeader {
            id,
            patch: new_set.patch.trim().to_string(),
            owner: new_set.author,
            plan,
            catalog_fingerprint: catalog.fingerprint(),
            seed: new_set.seed,
        };
        let set = TrainingSet::from_drafts(header, drafts, &new_set.screenshots)?;
        self.store.insert_set(&set).map_err(store_failure)?;
        log::info!(
            "created set {} ({} spots, {} {})",
            set.id,
            set.spots.len(),
            set.tier_mode,
            set.mode
        );
        Ok(set)
    }

    /// # Errors
    ///
    /// Returns `EngineError::UnknownSet` if no set has this id.
    pub fn load_set(&self, set_id: &str) -> Result<TrainingSet, EngineError> {
        self.store
            .load_set(set_id)
            .map_err(store_failure)?
            .ok_or_else(|| EngineError::UnknownSet(set_id.to_string()))
    }

    fn edit_set<T>(
        &self,
        set_id: &str,
        edit: impl FnOnce(&mut TrainingSet) -> Result<T, EngineError>,
    ) -> Result<T, EngineError> {
        let mut set = self.load_set(set_id)?;
        let out = edit(&mut set)?;
        self.store.update_set(&set).map_err(store_failure)?;
        Ok(out)
    }

    /// Redraw one spot's options from a fresh seed. The spot keeps its tier
    /// and screenshot; its answer is cleared.
    ///
    /// # Errors
    ///
    /// Fails for a non-owner, an unknown spot, a spot without a screenshot
    /// or an exhausted pool.
    pub fn regenerate_spot(
        &self,
        author: &str,
        set_id: &str,
        index: usize,
        seed: u64,
    ) -> Result<Spot, EngineError> {
        let catalog = self.catalog()?;
        self.edit_set(set_id, |set| {
            set.ensure_owner(author)?;
            set.spot(index)?;
            let draft = regenerate_spot(&catalog, &set.plan(), index, seed)?;
            let spot = set.replace_spot(author, draft)?;
            log::info!("regenerated spot {index} of {set_id}");
            Ok(spot.clone())
        })
    }

    /// Record the correct pick and note for a spot.
    ///
    /// # Errors
    ///
    /// Fails for a non-owner, an unknown set or spot, or a pick the spot
    /// does not offer.
    pub fn author_answer(
        &self,
        author: &str,
        set_id: &str,
        index: usize,
        pick: Option<SlotId>,
        note: Option<&str>,
    ) -> Result<Spot, EngineError> {
        self.edit_set(set_id, |set| {
            Ok(set.author_answer(author, index, pick, note)?.clone())
        })
    }

    /// Submit the pick made in an authoring reveal session as the answer.
    ///
    /// # Errors
    ///
    /// Returns `SetError::MissingPick` when the session has not ended in a
    /// pick, otherwise fails as [`DrillEngine::author_answer`].
    pub fn submit_authoring_pick(
        &self,
        author: &str,
        set_id: &str,
        index: usize,
        machine: &RevealMachine,
        note: Option<&str>,
    ) -> Result<Spot, EngineError> {
        match machine.resolution() {
            Some(Resolution::Picked { id }) => {
                self.author_answer(author, set_id, index, Some(id), note)
            }
            _ => Err(EngineError::Set(SetError::MissingPick { index })),
        }
    }

    /// # Errors
    ///
    /// Fails for a non-owner, an unknown set or spot, or a blank url.
    pub fn attach_screenshot(
        &self,
        author: &str,
        set_id: &str,
        index: usize,
        url: &str,
    ) -> Result<Spot, EngineError> {
        self.edit_set(set_id, |set| {
            Ok(set.attach_screenshot(author, index, url)?.clone())
        })
    }

    /// Publish now.
    ///
    /// # Errors
    ///
    /// Fails for a non-owner or an unknown set.
    pub fn publish(&self, author: &str, set_id: &str) -> Result<TrainingSet, EngineError> {
        self.publish_at(author, set_id, Utc::now())
    }

    /// # Errors
    ///
    /// Fails for a non-owner or an unknown set.
    pub fn publish_at(
        &self,
        author: &str,
        set_id: &str,
        at: DateTime<Utc>,
    ) -> Result<TrainingSet, EngineError> {
        self.edit_set(set_id, |set| {
            set.publish(author, at)?;
            log::info!(
                "published {} with {} playable spots",
                set.id,
                set.playable_count()
            );
            Ok(set.clone())
        })
    }

    /// # Errors
    ///
    /// Fails for a non-owner or an unknown set.
    pub fn unpublish(&self, author: &str, set_id: &str) -> Result<TrainingSet, EngineError> {
        self.edit_set(set_id, |set| {
            set.unpublish(author)?;
            log::info!("unpublished {}", set.id);
            Ok(set.clone())
        })
    }

    /// Published sets, newest first.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Store` if the store cannot be read.
    pub fn published_sets(&self) -> Result<Vec<TrainingSet>, EngineError> {
        let mut sets = Vec::new();
        for id in self.store.set_ids().map_err(store_failure)? {
            if let Some(set) = self.store.load_set(&id).map_err(store_failure)?
                && set.is_published()
            {
                sets.push(set);
            }
        }
        sets.sort_by(|a, b| b.published_at.cmp(&a.published_at).then_with(|| a.id.cmp(&b.id)));
        Ok(sets)
    }

    /// Open a player run over the playable spots of a published set.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::NotPublished` for drafts and
    /// `EngineError::UnknownSet` for missing sets.
    pub fn start_playthrough(&self, set_id: &str) -> Result<Playthrough, EngineError> {
        let set = self.load_set(set_id)?;
        if !set.is_published() {
            return Err(EngineError::NotPublished(set.id));
        }
        let spots: Vec<Spot> = set.playable_spots().cloned().collect();
        log::debug!(
            "playthrough of {}: {} of {} spots playable",
            set.id,
            spots.len(),
            set.spots.len()
        );
        Ok(Playthrough::new(spots))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;
    use std::convert::Infallible;

    #[derive(Clone, Copy, Default)]
    struct BrokenSource;

    #[derive(Debug, Error)]
    #[error("catalog service offline")]
    struct Offline;

    impl CatalogSource for BrokenSource {
        type Error = Offline;

        fn load_catalog(&self) -> Result<AugmentCatalog, Self::Error> {
            Err(Offline)
        }
    }

    #[derive(Clone, Copy, Default)]
    struct TinySource;

    impl CatalogSource for TinySource {
        type Error = Infallible;

        fn load_catalog(&self) -> Result<AugmentCatalog, Self::Error> {
            Ok(AugmentCatalog::from_augments(
                (0..4)
                    .map(|i| Augment::new(format!("S{i}"), Tier::Silver, "", StageAvailability::all()))
                    .collect(),
            ))
        }
    }

    fn new_set(seed: u64) -> NewSet {
        NewSet {
            author: String::from("pro-1"),
            display_name: String::from("Pro One"),
            patch: String::from("14.5"),
            tier_mode: None,
            mode: None,
            seed,
            screenshots: vec![String::from("a.png")],
        }
    }

    #[test]
    fn catalog_failure_is_named() {
        let engine = DrillEngine::new(BrokenSource, MemorySetStore::new());
        let err = engine.create_set(new_set(1)).unwrap_err();
        assert!(matches!(err, EngineError::Catalog(_)));
        assert_eq!(err.to_string(), "catalog unavailable: catalog service offline");
        assert!(engine.store().is_empty());
    }

    #[test]
    fn exhausted_generation_stores_nothing() {
        let engine = DrillEngine::new(TinySource, MemorySetStore::new());
        let err = engine.create_set(new_set(1)).unwrap_err();
        assert!(matches!(
            err,
            EngineError::Generate(GenerateError::Spot { index: 1, .. })
        ));
        assert!(engine.store().is_empty());
    }

    #[test]
    fn sample_respects_configured_limit() {
        let config = DrillConfig {
            max_sample_count: 3,
            ..DrillConfig::default()
        };
        let engine = DrillEngine::with_config(TinySource, MemorySetStore::new(), config).unwrap();
        let mut rng = ChaCha20Rng::seed_from_u64(4);
        assert!(matches!(
            engine.sample(&SampleRequest::new(Tier::Silver, 4), &mut rng),
            Err(EngineError::Sampler(SamplerError::InvalidCount { max: 3, .. }))
        ));
        let drawn = engine
            .sample(&SampleRequest::new(Tier::Silver, 3), &mut rng)
            .unwrap();
        assert_eq!(drawn.len(), 3);
    }

    #[derive(Clone, Copy, Default)]
    struct EveryTierSource;

    impl CatalogSource for EveryTierSource {
        type Error = Infallible;

        fn load_catalog(&self) -> Result<AugmentCatalog, Self::Error> {
            Ok(AugmentCatalog::from_augments(
                Tier::ALL
                    .into_iter()
                    .flat_map(|tier| {
                        (0..3).map(move |i| {
                            Augment::new(format!("{tier} {i}"), tier, "", StageAvailability::all())
                        })
                    })
                    .collect(),
            ))
        }
    }

    #[test]
    fn sample_batch_orders_tiers_and_respects_limit() {
        let config = DrillConfig {
            max_sample_count: 2,
            ..DrillConfig::default()
        };
        let engine =
            DrillEngine::with_config(EveryTierSource, MemorySetStore::new(), config).unwrap();
        let mut rng = ChaCha20Rng::seed_from_u64(21);

        let batch = engine
            .sample_batch(Some(AugmentStage::Three), 4, 2, &mut rng)
            .unwrap();
        let tiers: Vec<Tier> = batch.iter().map(|b| b.tier).collect();
        assert_eq!(tiers, vec![Tier::Silver, Tier::Gold, Tier::Prismatic]);
        for tier_batch in &batch {
            assert_eq!(tier_batch.selections.len(), 4);
            assert!(tier_batch.selections.iter().all(|picked| {
                picked.len() == 2 && picked.iter().all(|a| a.tier == tier_batch.tier)
            }));
        }

        assert!(matches!(
            engine.sample_batch(None, 1, 3, &mut rng),
            Err(EngineError::Sampler(SamplerError::InvalidCount { requested: 3, max: 2 }))
        ));
        assert!(matches!(
            engine.sample_batch(None, 1, 0, &mut rng),
            Err(EngineError::Sampler(SamplerError::InvalidCount { requested: 0, .. }))
        ));
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = DrillConfig {
            spots_per_set: 0,
            ..DrillConfig::default()
        };
        assert!(matches!(
            DrillEngine::with_config(TinySource, MemorySetStore::new(), config),
            Err(EngineError::Config(_))
        ));
    }
}

//! Training sets: ordered spots plus authoring and publishing metadata.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::OPTIONS_PER_SPOT;
use crate::generator::SetPlan;
use crate::modes::{TierMode, TrainingMode};
use crate::slot::SlotId;
use crate::spot::{Spot, SpotDraft};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SetError {
    #[error("{author} does not own set {set_id}")]
    NotOwner { set_id: String, author: String },
    #[error("set {set_id} has no spot {index} (1..={len})")]
    SpotOutOfRange {
        set_id: String,
        index: usize,
        len: usize,
    },
    #[error("at least one screenshot is required to create a set")]
    NoScreenshots,
    #[error("spot {index} needs a screenshot first")]
    MissingScreenshot { index: usize },
    #[error("screenshot url is blank")]
    BlankScreenshot,
    #[error("spot {index} has no option {pick}")]
    UnknownOption { index: usize, pick: SlotId },
    #[error("no pick was made for spot {index}")]
    MissingPick { index: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PublishState {
    #[default]
    Draft,
    Published,
}

/// Set metadata supplied at creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetHeader {
    pub id: String,
    pub patch: String,
    pub owner: String,
    pub plan: SetPlan,
    pub catalog_fingerprint: u64,
    pub seed: u64,
}

const fn default_options_per_spot() -> usize {
    OPTIONS_PER_SPOT
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingSet {
    pub id: String,
    pub patch: String,
    pub owner: String,
    pub tier_mode: TierMode,
    pub mode: TrainingMode,
    /// Options drawn per spot at creation; regeneration draws the same.
    #[serde(default = "default_options_per_spot")]
    pub options_per_spot: usize,
    /// Fingerprint of the catalog the options were drawn from.
    pub catalog_fingerprint: u64,
    pub seed: u64,
    #[serde(default)]
    pub status: PublishState,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
    pub spots: Vec<Spot>,
}

impl TrainingSet {
    /// Build a draft set from generated spots, handing out screenshots
    /// round-robin: spot `i` gets `screenshots[(i - 1) % len]`.
    ///
    /// # Errors
    ///
    /// Returns `SetError::NoScreenshots` when no non-blank url is given.
    pub fn from_drafts(
        header: SetHeader,
        drafts: Vec<SpotDraft>,
        screenshots: &[String],
    ) -> Result<Self, SetError> {
        let pool: Vec<&str> = screenshots
            .iter()
            .map(|url| url.trim())
            .filter(|url| !url.is_empty())
            .collect();
        if pool.is_empty() {
            return Err(SetError::NoScreenshots);
        }
        let spots = drafts
            .into_iter()
            .map(|draft| {
                let shot = pool[draft.index.saturating_sub(1) % pool.len()];
                Spot::from(draft).with_screenshot(shot)
            })
            .collect();
        Ok(Self {
            id: header.id,
            patch: header.patch,
            owner: header.owner,
            tier_mode: header.plan.tier_mode,
            mode: header.plan.mode,
            options_per_spot: header.plan.options_per_spot,
            catalog_fingerprint: header.catalog_fingerprint,
            seed: header.seed,
            status: PublishState::Draft,
            published_at: None,
            spots,
        })
    }

    /// Plan that reproduces this set's spots.
    #[must_use]
    pub fn plan(&self) -> SetPlan {
        SetPlan {
            spots: self.spots.len(),
            options_per_spot: self.options_per_spot,
            ..SetPlan::new(self.tier_mode, self.mode)
        }
    }

    #[must_use]
    pub fn is_published(&self) -> bool {
        self.status == PublishState::Published
    }

    /// # Errors
    ///
    /// Returns `SetError::NotOwner` when `author` is not the set owner.
    pub fn ensure_owner(&self, author: &str) -> Result<(), SetError> {
        if self.owner == author {
            Ok(())
        } else {
            Err(SetError::NotOwner {
                set_id: self.id.clone(),
                author: author.to_string(),
            })
        }
    }

    /// Spot at 1-based `index`.
    ///
    /// # Errors
    ///
    /// Returns `SetError::SpotOutOfRange` for an unknown index.
    pub fn spot(&self, index: usize) -> Result<&Spot, SetError> {
        self.spots
            .iter()
            .find(|spot| spot.index == index)
            .ok_or_else(|| self.out_of_range(index))
    }

    fn spot_mut(&mut self, index: usize) -> Result<&mut Spot, SetError> {
        let err = self.out_of_range(index);
        self.spots
            .iter_mut()
            .find(|spot| spot.index == index)
            .ok_or(err)
    }

    fn out_of_range(&self, index: usize) -> SetError {
        SetError::SpotOutOfRange {
            set_id: self.id.clone(),
            index,
            len: self.spots.len(),
        }
    }

    /// Spots that have a screenshot, options and a correct pick, in order.
    /// Incomplete spots are skipped rather than treated as errors.
    pub fn playable_spots(&self) -> impl Iterator<Item = &Spot> {
        self.spots.iter().filter(|spot| spot.is_playable())
    }

    #[must_use]
    pub fn playable_count(&self) -> usize {
        self.playable_spots().count()
    }

    /// Record the correct pick and note for one spot. `None` clears the
    /// answer; a blank note is stored as no note.
    ///
    /// # Errors
    ///
    /// Fails for a non-owner, an unknown spot, or a pick naming an option
    /// the spot does not have.
    pub fn author_answer(
        &mut self,
        author: &str,
        index: usize,
        pick: Option<SlotId>,
        note: Option<&str>,
    ) -> Result<&Spot, SetError> {
        self.ensure_owner(author)?;
        let spot = self.spot_mut(index)?;
        if let Some(pick) = pick
            && spot.option(pick).is_none()
        {
            return Err(SetError::UnknownOption { index, pick });
        }
        spot.correct_pick = pick;
        spot.note = note
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .map(str::to_string);
        Ok(spot)
    }

    /// # Errors
    ///
    /// Fails for a non-owner, an unknown spot or a blank url.
    pub fn attach_screenshot(
        &mut self,
        author: &str,
        index: usize,
        url: &str,
    ) -> Result<&Spot, SetError> {
        self.ensure_owner(author)?;
        let url = url.trim();
        if url.is_empty() {
            return Err(SetError::BlankScreenshot);
        }
        let spot = self.spot_mut(index)?;
        spot.screenshot_url = Some(url.to_string());
        Ok(spot)
    }

    /// Swap in regenerated options for one spot, clearing its answer.
    ///
    /// # Errors
    ///
    /// Fails for a non-owner, an unknown spot, or a spot without a
    /// screenshot.
    pub fn replace_spot(&mut self, author: &str, draft: SpotDraft) -> Result<&Spot, SetError> {
        self.ensure_owner(author)?;
        let index = draft.index;
        let spot = self.spot_mut(index)?;
        if spot.screenshot_url.is_none() {
            return Err(SetError::MissingScreenshot { index });
        }
        spot.tier = draft.tier;
        spot.stage_label = draft.stage_label;
        spot.replace_options(draft.options);
        Ok(spot)
    }

    /// # Errors
    ///
    /// Returns `SetError::NotOwner` for a non-owner.
    pub fn publish(&mut self, author: &str, at: DateTime<Utc>) -> Result<(), SetError> {
        self.ensure_owner(author)?;
        self.status = PublishState::Published;
        self.published_at = Some(at);
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `SetError::NotOwner` for a non-owner.
    pub fn unpublish(&mut self, author: &str) -> Result<(), SetError> {
        self.ensure_owner(author)?;
        self.status = PublishState::Draft;
        self.published_at = None;
        Ok(())
    }
}

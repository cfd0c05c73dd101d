//! Spots: single augment decisions with three visible slots.
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::catalog::{Augment, Tier};
use crate::constants::OPTIONS_PER_SPOT;
use crate::slot::{CorrectAction, Slot, SlotId};

/// One augment tagged with its slot-position id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpotOption {
    pub id: SlotId,
    #[serde(flatten)]
    pub augment: Augment,
}

pub type SpotOptions = SmallVec<[SpotOption; OPTIONS_PER_SPOT]>;

/// Tag sampled augments with ids in sampled order: `a, b, c, a1, b1, c1`.
#[must_use]
pub fn tag_options(augments: Vec<Augment>) -> SpotOptions {
    augments
        .into_iter()
        .zip(SlotId::ALL)
        .map(|(augment, id)| SpotOption { id, augment })
        .collect()
}

/// Freshly generated spot, before any authoring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpotDraft {
    pub index: usize,
    pub tier: Tier,
    pub stage_label: String,
    pub options: SpotOptions,
}

/// A spot as stored on a training set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Spot {
    /// 1-based position within the set.
    pub index: usize,
    pub tier: Tier,
    pub stage_label: String,
    pub options: SpotOptions,
    #[serde(default)]
    pub screenshot_url: Option<String>,
    #[serde(default)]
    pub correct_pick: Option<SlotId>,
    #[serde(default)]
    pub note: Option<String>,
}

impl From<SpotDraft> for Spot {
    fn from(draft: SpotDraft) -> Self {
        Self {
            index: draft.index,
            tier: draft.tier,
            stage_label: draft.stage_label,
            options: draft.options,
            screenshot_url: None,
            correct_pick: None,
            note: None,
        }
    }
}

impl Spot {
    /// Build an unauthored spot from bare options.
    #[must_use]
    pub fn new(index: usize, tier: Tier, stage_label: impl Into<String>, options: SpotOptions) -> Self {
        Self {
            index,
            tier,
            stage_label: stage_label.into(),
            options,
            screenshot_url: None,
            correct_pick: None,
            note: None,
        }
    }

    #[must_use]
    pub fn with_correct_pick(mut self, pick: SlotId) -> Self {
        self.correct_pick = Some(pick);
        self
    }

    #[must_use]
    pub fn with_screenshot(mut self, url: impl Into<String>) -> Self {
        self.screenshot_url = Some(url.into());
        self
    }

    /// Derived from the correct pick; `None` until one is authored.
    #[must_use]
    pub fn correct_action(&self) -> Option<CorrectAction> {
        self.correct_pick.map(SlotId::action)
    }

    #[must_use]
    pub fn option(&self, id: SlotId) -> Option<&SpotOption> {
        self.options.iter().find(|opt| opt.id == id)
    }

    /// Replacement shown after rerolling `slot`, if the spot has one.
    #[must_use]
    pub fn replacement(&self, slot: Slot) -> Option<&SpotOption> {
        self.option(slot.replacement())
    }

    /// A spot counts toward play only with a screenshot, options and a
    /// correct pick that names one of its options.
    #[must_use]
    pub fn is_playable(&self) -> bool {
        let has_shot = self
            .screenshot_url
            .as_deref()
            .is_some_and(|url| !url.trim().is_empty());
        let pick_known = self.correct_pick.is_some_and(|id| self.option(id).is_some());
        has_shot && !self.options.is_empty() && pick_known
    }

    /// Replace the options and drop the now stale answer.
    pub fn replace_options(&mut self, options: SpotOptions) {
        self.options = options;
        self.correct_pick = None;
        self.note = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::StageAvailability;

    fn options(n: usize) -> SpotOptions {
        tag_options(
            (0..n)
                .map(|i| Augment::new(format!("Aug {i}"), Tier::Gold, "", StageAvailability::all()))
                .collect(),
        )
    }

    #[test]
    fn options_are_tagged_in_sampled_order() {
        let tagged = options(6);
        let ids: Vec<String> = tagged.iter().map(|o| o.id.to_string()).collect();
        assert_eq!(ids, vec!["a", "b", "c", "a1", "b1", "c1"]);
        assert_eq!(tagged[3].augment.name, "Aug 3");
        assert!(!tagged.spilled());
    }

    #[test]
    fn short_spot_has_no_replacements() {
        let spot = Spot::new(1, Tier::Gold, "2-1", options(3));
        assert!(spot.replacement(Slot::A).is_none());
        assert!(spot.option(Slot::C.primary()).is_some());
    }

    #[test]
    fn playable_requires_screenshot_and_known_pick() {
        let spot = Spot::new(4, Tier::Gold, "2-1", options(6));
        assert!(!spot.is_playable());
        let spot = spot.with_correct_pick(Slot::B.replacement());
        assert!(!spot.is_playable());
        assert_eq!(spot.correct_action(), Some(CorrectAction::RerollThenPick));
        let spot = spot.with_screenshot("https://cdn.example/shot.png");
        assert!(spot.is_playable());

        let short = Spot::new(5, Tier::Gold, "2-1", options(3))
            .with_screenshot("s.png")
            .with_correct_pick(Slot::A.replacement());
        assert!(!short.is_playable());
    }

    #[test]
    fn replacing_options_clears_answer() {
        let mut spot = Spot::new(2, Tier::Gold, "2-1", options(6)).with_correct_pick(Slot::A.primary());
        spot.note = Some(String::from("tempo"));
        spot.replace_options(options(6));
        assert_eq!(spot.correct_pick, None);
        assert_eq!(spot.note, None);
    }

    #[test]
    fn option_serializes_flat() {
        let json = serde_json::to_value(&options(1)[0]).unwrap();
        assert_eq!(json["id"], "a");
        assert_eq!(json["name"], "Aug 0");
        assert_eq!(json["tier"], "gold");
    }
}

//! Reveal/reroll state machine for a single spot.
//!
//! The machine never owns the spot; every event takes the spot it applies
//! to so the same rules drive the admin authoring view and the player view.
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::PLACEHOLDER_MESSAGE;
use crate::slot::{CorrectAction, Slot, SlotId};
use crate::spot::{Spot, SpotOption};

/// Which rule set the machine enforces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevealRule {
    /// Public play: rerolling away the correct primary is an instant loss.
    #[default]
    Player,
    /// Answer authoring: same reveal mechanics, no instant loss.
    Authoring,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Unrevealed,
    PartiallyRevealed,
    Resolved,
}

/// Terminal state of a spot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Resolution {
    /// The player chose the option currently shown in a slot.
    Picked { id: SlotId },
    /// The player rerolled the slot whose primary was the correct pick.
    AutoLoss { slot: Slot },
}

impl Resolution {
    /// Whether this resolution scores against `correct_pick`.
    #[must_use]
    pub fn is_correct(self, correct_pick: Option<SlotId>) -> bool {
        match self {
            Self::Picked { id } => correct_pick == Some(id),
            Self::AutoLoss { .. } => false,
        }
    }

    #[must_use]
    pub const fn is_auto_loss(self) -> bool {
        matches!(self, Self::AutoLoss { .. })
    }
}

/// What a slot currently displays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisibleOption<'a> {
    Real(&'a SpotOption),
    /// Rerolled slot with no replacement (or a primary that was never generated).
    Placeholder(Slot),
}

impl VisibleOption<'_> {
    #[must_use]
    pub const fn is_placeholder(&self) -> bool {
        matches!(self, Self::Placeholder(_))
    }

    /// Display label: the augment name, or the placeholder message.
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::Real(option) => &option.augment.name,
            Self::Placeholder(_) => PLACEHOLDER_MESSAGE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InvalidTransition {
    #[error("spot is already resolved")]
    AlreadyResolved,
    #[error("slot {0} has already been rerolled")]
    AlreadyRerolled(Slot),
    #[error("slot {0} shows no augment to pick")]
    PlaceholderPick(Slot),
    #[error("spot is not resolved yet")]
    NotResolved,
    #[error("playthrough has no spots left")]
    Finished,
}

/// Per-spot reveal state: which slots were rerolled and how the spot ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RevealMachine {
    rule: RevealRule,
    rerolled: [bool; 3],
    resolution: Option<Resolution>,
}

impl RevealMachine {
    #[must_use]
    pub const fn new(rule: RevealRule) -> Self {
        Self {
            rule,
            rerolled: [false; 3],
            resolution: None,
        }
    }

    #[must_use]
    pub const fn rule(&self) -> RevealRule {
        self.rule
    }

    #[must_use]
    pub const fn phase(&self) -> Phase {
        if self.resolution.is_some() {
            Phase::Resolved
        } else if self.rerolled[0] || self.rerolled[1] || self.rerolled[2] {
            Phase::PartiallyRevealed
        } else {
            Phase::Unrevealed
        }
    }

    #[must_use]
    pub const fn resolution(&self) -> Option<Resolution> {
        self.resolution
    }

    #[must_use]
    pub const fn is_rerolled(&self, slot: Slot) -> bool {
        self.rerolled[slot.index()]
    }

    /// Id of the option slot `slot` currently points at.
    #[must_use]
    pub const fn shown_id(&self, slot: Slot) -> SlotId {
        if self.is_rerolled(slot) {
            slot.replacement()
        } else {
            slot.primary()
        }
    }

    /// The three options currently on screen, in slot order.
    #[must_use]
    pub fn visible<'s>(&self, spot: &'s Spot) -> [VisibleOption<'s>; 3] {
        Slot::ALL.map(|slot| {
            spot.option(self.shown_id(slot))
                .map_or(VisibleOption::Placeholder(slot), VisibleOption::Real)
        })
    }

    /// Reveal the replacement for `slot`.
    ///
    /// Under [`RevealRule::Player`], rerolling the slot whose primary is the
    /// correct pick resolves the spot as an automatic loss.
    ///
    /// # Errors
    ///
    /// Rejects the event, leaving state untouched, when the spot is resolved
    /// or the slot was already rerolled.
    pub fn reroll(&mut self, spot: &Spot, slot: Slot) -> Result<Phase, InvalidTransition> {
        if self.resolution.is_some() {
            return Err(reject(spot, InvalidTransition::AlreadyResolved));
        }
        if self.is_rerolled(slot) {
            return Err(reject(spot, InvalidTransition::AlreadyRerolled(slot)));
        }
        self.rerolled[slot.index()] = true;

        let loses = self.rule == RevealRule::Player
            && spot.correct_pick == Some(slot.primary())
            && spot.correct_action() == Some(CorrectAction::Pick);
        if loses {
            log::debug!("spot {}: rerolled the correct pick in slot {slot}", spot.index);
            self.resolution = Some(Resolution::AutoLoss { slot });
        }
        Ok(self.phase())
    }

    /// Choose the option currently shown in `slot`.
    ///
    /// # Errors
    ///
    /// Rejects the event when the spot is resolved or the slot shows a
    /// placeholder.
    pub fn pick(&mut self, spot: &Spot, slot: Slot) -> Result<SlotId, InvalidTransition> {
        if self.resolution.is_some() {
            return Err(reject(spot, InvalidTransition::AlreadyResolved));
        }
        let id = self.shown_id(slot);
        if spot.option(id).is_none() {
            return Err(reject(spot, InvalidTransition::PlaceholderPick(slot)));
        }
        self.resolution = Some(Resolution::Picked { id });
        Ok(id)
    }

    /// Clear reroll flags and resolution for the next spot.
    pub const fn reset(&mut self) {
        self.rerolled = [false; 3];
        self.resolution = None;
    }
}

fn reject(spot: &Spot, err: InvalidTransition) -> InvalidTransition {
    log::warn!("spot {}: rejected event: {err}", spot.index);
    err
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Augment, StageAvailability, Tier};
    use crate::spot::tag_options;

    fn spot(options: usize, pick: &str) -> Spot {
        let augments = (0..options)
            .map(|i| Augment::new(format!("Aug {i}"), Tier::Silver, "", StageAvailability::all()))
            .collect();
        Spot::new(1, Tier::Silver, "2-1", tag_options(augments)).with_correct_pick(pick.parse().unwrap())
    }

    #[test]
    fn phases_progress() {
        let spot = spot(6, "c");
        let mut machine = RevealMachine::new(RevealRule::Player);
        assert_eq!(machine.phase(), Phase::Unrevealed);
        assert_eq!(machine.reroll(&spot, Slot::A), Ok(Phase::PartiallyRevealed));
        assert_eq!(machine.pick(&spot, Slot::A), Ok(Slot::A.replacement()));
        assert_eq!(machine.phase(), Phase::Resolved);
        assert_eq!(
            machine.pick(&spot, Slot::B),
            Err(InvalidTransition::AlreadyResolved)
        );
        assert_eq!(
            machine.resolution(),
            Some(Resolution::Picked {
                id: Slot::A.replacement()
            })
        );
    }

    #[test]
    fn second_reroll_is_rejected_without_effect() {
        let spot = spot(6, "a");
        let mut machine = RevealMachine::new(RevealRule::Player);
        machine.reroll(&spot, Slot::C).unwrap();
        let before = machine;
        assert_eq!(
            machine.reroll(&spot, Slot::C),
            Err(InvalidTransition::AlreadyRerolled(Slot::C))
        );
        assert_eq!(machine, before);
    }

    #[test]
    fn missing_replacement_shows_placeholder() {
        let spot = spot(4, "a1");
        let mut machine = RevealMachine::new(RevealRule::Player);
        machine.reroll(&spot, Slot::B).unwrap();
        let visible = machine.visible(&spot);
        assert!(!visible[0].is_placeholder());
        assert_eq!(visible[1], VisibleOption::Placeholder(Slot::B));
        assert_eq!(visible[1].label(), "No replacement available");
        assert_eq!(
            machine.pick(&spot, Slot::B),
            Err(InvalidTransition::PlaceholderPick(Slot::B))
        );
        assert_eq!(machine.phase(), Phase::PartiallyRevealed);
    }

    #[test]
    fn authoring_never_auto_loses() {
        let spot = spot(6, "b");
        let mut machine = RevealMachine::new(RevealRule::Authoring);
        assert_eq!(machine.reroll(&spot, Slot::B), Ok(Phase::PartiallyRevealed));
        assert_eq!(machine.pick(&spot, Slot::B), Ok(Slot::B.replacement()));

        let short = self::spot(4, "a");
        let mut authoring = RevealMachine::new(RevealRule::Authoring);
        authoring.reroll(&short, Slot::C).unwrap();
        let label = authoring.visible(&short)[2].label().to_string();
        assert_eq!(label, PLACEHOLDER_MESSAGE);
        assert!(!label.contains("loss"));
    }

    #[test]
    fn rerolling_a_replacement_answer_is_safe() {
        let spot = spot(6, "b1");
        let mut machine = RevealMachine::new(RevealRule::Player);
        assert_eq!(machine.reroll(&spot, Slot::B), Ok(Phase::PartiallyRevealed));
    }

    #[test]
    fn reset_clears_state() {
        let spot = spot(6, "a");
        let mut machine = RevealMachine::new(RevealRule::Player);
        machine.reroll(&spot, Slot::A).unwrap();
        assert!(machine.resolution().is_some_and(Resolution::is_auto_loss));
        machine.reset();
        assert_eq!(machine.phase(), Phase::Unrevealed);
        assert_eq!(machine.rule(), RevealRule::Player);
    }
}

//! Scoring and sequential playthroughs over a list of spots.
use serde::{Deserialize, Serialize};

use crate::catalog::Tier;
use crate::numbers::percent;
use crate::reveal::{InvalidTransition, Phase, Resolution, RevealMachine, RevealRule, VisibleOption};
use crate::slot::{Slot, SlotId};
use crate::spot::Spot;

/// Running tally of a playthrough.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Score {
    pub correct: u32,
    pub total: u32,
}

impl Score {
    #[must_use]
    pub const fn new(correct: u32, total: u32) -> Self {
        Self { correct, total }
    }

    /// Fold one finished spot into the tally.
    pub const fn record(&mut self, correct: bool) {
        self.total += 1;
        if correct {
            self.correct += 1;
        }
    }

    /// Percentage of correct answers, `0.0` before any spot is scored.
    #[must_use]
    pub fn accuracy_pct(&self) -> f64 {
        percent(self.correct, self.total)
    }
}

impl std::fmt::Display for Score {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.correct, self.total)
    }
}

/// Result of one spot, kept for review after the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpotOutcome {
    pub index: usize,
    pub tier: Tier,
    pub resolution: Resolution,
    pub correct_pick: Option<SlotId>,
    pub correct: bool,
}

/// A player's pass through an ordered list of spots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Playthrough {
    spots: Vec<Spot>,
    position: usize,
    machine: RevealMachine,
    score: Score,
    history: Vec<SpotOutcome>,
}

impl Playthrough {
    #[must_use]
    pub fn new(spots: Vec<Spot>) -> Self {
        Self {
            spots,
            position: 0,
            machine: RevealMachine::new(RevealRule::Player),
            score: Score::default(),
            history: Vec::new(),
        }
    }

    #[must_use]
    pub fn spots(&self) -> &[Spot] {
        &self.spots
    }

    /// Zero-based position of the current spot.
    #[must_use]
    pub const fn position(&self) -> usize {
        self.position
    }

    #[must_use]
    pub fn current(&self) -> Option<&Spot> {
        self.spots.get(self.position)
    }

    #[must_use]
    pub fn visible(&self) -> Option<[VisibleOption<'_>; 3]> {
        self.current().map(|spot| self.machine.visible(spot))
    }

    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.machine.phase()
    }

    #[must_use]
    pub const fn machine(&self) -> &RevealMachine {
        &self.machine
    }

    #[must_use]
    pub const fn score(&self) -> Score {
        self.score
    }

    #[must_use]
    pub fn history(&self) -> &[SpotOutcome] {
        &self.history
    }

    #[must_use]
    pub fn is_done(&self) -> bool {
        self.position >= self.spots.len()
    }

    /// Final `(correct, total)` once every spot has been consumed.
    #[must_use]
    pub fn final_score(&self) -> Option<Score> {
        self.is_done().then_some(self.score)
    }

    /// # Errors
    ///
    /// See [`RevealMachine::reroll`]; also fails once the run is finished.
    pub fn reroll(&mut self, slot: Slot) -> Result<Phase, InvalidTransition> {
        let spot = self.spots.get(self.position).ok_or(InvalidTransition::Finished)?;
        self.machine.reroll(spot, slot)
    }

    /// # Errors
    ///
    /// See [`RevealMachine::pick`]; also fails once the run is finished.
    pub fn pick(&mut self, slot: Slot) -> Result<SlotId, InvalidTransition> {
        let spot = self.spots.get(self.position).ok_or(InvalidTransition::Finished)?;
        self.machine.pick(spot, slot)
    }

    /// Score the resolved spot and advance.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition::NotResolved` while the current spot is
    /// open and `InvalidTransition::Finished` after the last spot.
    pub fn next(&mut self) -> Result<SpotOutcome, InvalidTransition> {
        let spot = self.spots.get(self.position).ok_or(InvalidTransition::Finished)?;
        let resolution = self
            .machine
            .resolution()
            .ok_or(InvalidTransition::NotResolved)?;
        let correct = resolution.is_correct(spot.correct_pick);
        let outcome = SpotOutcome {
            index: spot.index,
            tier: spot.tier,
            resolution,
            correct_pick: spot.correct_pick,
            correct,
        };
        self.score.record(correct);
        self.history.push(outcome);
        self.position += 1;
        self.machine.reset();
        if self.is_done() {
            log::debug!("playthrough finished at {}", self.score);
        }
        Ok(outcome)
    }

    /// Back to the first spot with a zero score.
    pub fn restart(&mut self) {
        self.position = 0;
        self.score = Score::default();
        self.history.clear();
        self.machine.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Augment, StageAvailability};
    use crate::spot::tag_options;

    fn spot(index: usize, pick: Slot) -> Spot {
        let augments = (0..6)
            .map(|i| Augment::new(format!("S{index} {i}"), Tier::Gold, "", StageAvailability::all()))
            .collect();
        Spot::new(index, Tier::Gold, "3-2", tag_options(augments)).with_correct_pick(pick.primary())
    }

    #[test]
    fn score_accuracy_and_display() {
        let mut score = Score::default();
        assert!(score.accuracy_pct().abs() < f64::EPSILON);
        score.record(true);
        score.record(false);
        assert_eq!(score, Score::new(1, 2));
        assert!((score.accuracy_pct() - 50.0).abs() < f64::EPSILON);
        assert_eq!(score.to_string(), "1/2");
    }

    #[test]
    fn next_requires_resolution() {
        let mut run = Playthrough::new(vec![spot(1, Slot::A)]);
        assert_eq!(run.next(), Err(InvalidTransition::NotResolved));
        run.pick(Slot::A).unwrap();
        let outcome = run.next().unwrap();
        assert!(outcome.correct);
        assert!(run.is_done());
        assert_eq!(run.final_score(), Some(Score::new(1, 1)));
        assert_eq!(run.next(), Err(InvalidTransition::Finished));
        assert_eq!(run.pick(Slot::A), Err(InvalidTransition::Finished));
    }

    #[test]
    fn auto_loss_counts_toward_total_only() {
        let mut run = Playthrough::new(vec![spot(1, Slot::C)]);
        assert_eq!(run.reroll(Slot::C), Ok(Phase::Resolved));
        let outcome = run.next().unwrap();
        assert!(!outcome.correct);
        assert!(outcome.resolution.is_auto_loss());
        assert_eq!(run.final_score(), Some(Score::new(0, 1)));
    }

    #[test]
    fn restart_resets_everything() {
        let mut run = Playthrough::new(vec![spot(1, Slot::A), spot(2, Slot::B)]);
        run.reroll(Slot::B).unwrap();
        run.pick(Slot::A).unwrap();
        run.next().unwrap();
        run.reroll(Slot::C).unwrap();
        run.restart();
        assert_eq!(run.position(), 0);
        assert_eq!(run.score(), Score::default());
        assert!(run.history().is_empty());
        assert_eq!(run.phase(), Phase::Unrevealed);
        assert_eq!(run.final_score(), None);
    }

    #[test]
    fn empty_playthrough_is_done_immediately() {
        let run = Playthrough::new(Vec::new());
        assert!(run.is_done());
        assert!(run.visible().is_none());
        assert_eq!(run.final_score(), Some(Score::default()));
    }
}

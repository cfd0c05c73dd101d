use std::fmt;
use std::str::FromStr;

use augdrill_core::{RevealMachine, Slot, Spot};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use serde::Serialize;

/// One move on the current spot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyAction {
    Reroll(Slot),
    Pick(Slot),
}

impl fmt::Display for PolicyAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reroll(slot) => write!(f, "reroll {slot}"),
            Self::Pick(slot) => write!(f, "pick {slot}"),
        }
    }
}

/// Policy interface for automated players.
pub trait PlayerPolicy {
    /// Name used for logging/debug output.
    fn name(&self) -> &'static str;

    /// Next move for an unresolved spot.
    fn decide(&mut self, spot: &Spot, machine: &RevealMachine) -> PolicyAction;
}

/// Built-in strategies for simulated playthroughs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum GameplayStrategy {
    /// Plays the authored answer.
    Oracle,
    /// Always takes the first shown option.
    FirstPick,
    /// Rerolls every slot, then takes the first option.
    RerollAll,
    /// Random rerolls and picks.
    Random,
}

impl GameplayStrategy {
    pub const ALL: [Self; 4] = [Self::Oracle, Self::FirstPick, Self::RerollAll, Self::Random];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Oracle => "Oracle",
            Self::FirstPick => "First Pick",
            Self::RerollAll => "Reroll All",
            Self::Random => "Random",
        }
    }

    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Oracle => "oracle",
            Self::FirstPick => "first-pick",
            Self::RerollAll => "reroll-all",
            Self::Random => "random",
        }
    }

    #[must_use]
    pub fn create_policy(self, seed: u64) -> Box<dyn PlayerPolicy + Send> {
        match self {
            Self::Oracle => Box::new(OraclePolicy),
            Self::FirstPick => Box::new(FirstPickPolicy),
            Self::RerollAll => Box::new(RerollAllPolicy),
            Self::Random => Box::new(RandomPolicy::new(seed)),
        }
    }
}

impl fmt::Display for GameplayStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown strategy '{0}' (expected oracle, first-pick, reroll-all or random)")]
pub struct StrategyParseError(String);

impl FromStr for GameplayStrategy {
    type Err = StrategyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace(['_', ' '], "-");
        Self::ALL
            .into_iter()
            .find(|strategy| strategy.key() == wanted)
            .ok_or_else(|| StrategyParseError(s.to_string()))
    }
}

struct OraclePolicy;
struct FirstPickPolicy;
struct RerollAllPolicy;

struct RandomPolicy {
    rng: ChaCha20Rng,
}

impl RandomPolicy {
    fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha20Rng::seed_from_u64(seed),
        }
    }
}

impl PlayerPolicy for OraclePolicy {
    fn name(&self) -> &'static str {
        "Oracle"
    }

    fn decide(&mut self, spot: &Spot, machine: &RevealMachine) -> PolicyAction {
        let Some(answer) = spot.correct_pick else {
            return PolicyAction::Pick(Slot::A);
        };
        if answer.revealed && !machine.is_rerolled(answer.slot) {
            PolicyAction::Reroll(answer.slot)
        } else {
            PolicyAction::Pick(answer.slot)
        }
    }
}

impl PlayerPolicy for FirstPickPolicy {
    fn name(&self) -> &'static str {
        "First Pick"
    }

    fn decide(&mut self, _spot: &Spot, _machine: &RevealMachine) -> PolicyAction {
        PolicyAction::Pick(Slot::A)
    }
}

impl PlayerPolicy for RerollAllPolicy {
    fn name(&self) -> &'static str {
        "Reroll All"
    }

    fn decide(&mut self, _spot: &Spot, machine: &RevealMachine) -> PolicyAction {
        Slot::ALL
            .into_iter()
            .find(|slot| !machine.is_rerolled(*slot))
            .map_or(PolicyAction::Pick(Slot::A), PolicyAction::Reroll)
    }
}

impl PlayerPolicy for RandomPolicy {
    fn name(&self) -> &'static str {
        "Random"
    }

    fn decide(&mut self, _spot: &Spot, machine: &RevealMachine) -> PolicyAction {
        let slot = Slot::ALL[self.rng.gen_range(0..Slot::ALL.len())];
        if !machine.is_rerolled(slot) && self.rng.gen_bool(0.3) {
            PolicyAction::Reroll(slot)
        } else {
            PolicyAction::Pick(slot)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use augdrill_core::{Augment, RevealRule, StageAvailability, Tier, tag_options};

    fn spot(pick: &str) -> Spot {
        let augments = (0..6)
            .map(|i| Augment::new(format!("opt-{i}"), Tier::Silver, "", StageAvailability::all()))
            .collect();
        Spot::new(1, Tier::Silver, "2-1", tag_options(augments))
            .with_correct_pick(pick.parse().unwrap())
    }

    #[test]
    fn strategies_parse_from_keys_and_labels() {
        assert_eq!("oracle".parse(), Ok(GameplayStrategy::Oracle));
        assert_eq!("First Pick".parse(), Ok(GameplayStrategy::FirstPick));
        assert_eq!("reroll_all".parse(), Ok(GameplayStrategy::RerollAll));
        assert!("greedy".parse::<GameplayStrategy>().is_err());
    }

    #[test]
    fn oracle_rerolls_only_for_replacement_answers() {
        let mut policy = GameplayStrategy::Oracle.create_policy(1);
        let mut machine = RevealMachine::new(RevealRule::Player);

        let direct = spot("b");
        assert_eq!(policy.decide(&direct, &machine), PolicyAction::Pick(Slot::B));

        let hidden = spot("c1");
        assert_eq!(policy.decide(&hidden, &machine), PolicyAction::Reroll(Slot::C));
        machine.reroll(&hidden, Slot::C).unwrap();
        assert_eq!(policy.decide(&hidden, &machine), PolicyAction::Pick(Slot::C));
    }

    #[test]
    fn reroll_all_walks_slots_in_order() {
        let mut policy = GameplayStrategy::RerollAll.create_policy(1);
        let spot = spot("a1");
        let mut machine = RevealMachine::new(RevealRule::Authoring);
        for slot in Slot::ALL {
            assert_eq!(policy.decide(&spot, &machine), PolicyAction::Reroll(slot));
            machine.reroll(&spot, slot).unwrap();
        }
        assert_eq!(policy.decide(&spot, &machine), PolicyAction::Pick(Slot::A));
    }

    #[test]
    fn random_policy_is_seed_stable() {
        let spot = spot("a");
        let machine = RevealMachine::new(RevealRule::Player);
        let run = |seed| {
            let mut policy = GameplayStrategy::Random.create_policy(seed);
            (0..8)
                .map(|_| policy.decide(&spot, &machine))
                .collect::<Vec<_>>()
        };
        assert_eq!(run(9), run(9));
    }
}

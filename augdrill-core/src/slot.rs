//! Slot positions and the six option identifiers of a spot.
//!
//! Internally an option id is the pair `(slot, revealed)`. The compact
//! string form (`a`, `b`, `c`, `a1`, `b1`, `c1`) only exists at the
//! serialization boundary.
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// One of the three visible positions of a spot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Slot {
    A,
    B,
    C,
}

impl Slot {
    pub const ALL: [Self; 3] = [Self::A, Self::B, Self::C];

    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::A => 0,
            Self::B => 1,
            Self::C => 2,
        }
    }

    #[must_use]
    pub const fn letter(self) -> char {
        match self {
            Self::A => 'a',
            Self::B => 'b',
            Self::C => 'c',
        }
    }

    /// The primary option id of this slot.
    #[must_use]
    pub const fn primary(self) -> SlotId {
        SlotId {
            slot: self,
            revealed: false,
        }
    }

    /// The replacement option id of this slot.
    #[must_use]
    pub const fn replacement(self) -> SlotId {
        SlotId {
            slot: self,
            revealed: true,
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter().to_ascii_uppercase())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SlotIdError {
    #[error("unknown slot id '{0}' (expected a, b, c, a1, b1 or c1)")]
    Unknown(String),
}

/// Identifier of one of the (at most) six options of a spot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SlotId {
    pub slot: Slot,
    pub revealed: bool,
}

impl SlotId {
    /// Generation order: primaries first, then replacements.
    pub const ALL: [Self; 6] = [
        Slot::A.primary(),
        Slot::B.primary(),
        Slot::C.primary(),
        Slot::A.replacement(),
        Slot::B.replacement(),
        Slot::C.replacement(),
    ];

    /// Id assigned to the option at `position` in sampled order.
    #[must_use]
    pub fn from_position(position: usize) -> Option<Self> {
        Self::ALL.get(position).copied()
    }

    /// What the player must do to end up on this option.
    #[must_use]
    pub const fn action(self) -> CorrectAction {
        derive_action(self)
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.revealed {
            write!(f, "{}1", self.slot.letter())
        } else {
            write!(f, "{}", self.slot.letter())
        }
    }
}

impl FromStr for SlotId {
    type Err = SlotIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let (letter, revealed) = match trimmed.strip_suffix('1') {
            Some(base) => (base, true),
            None => (trimmed, false),
        };
        let slot = match letter.to_ascii_lowercase().as_str() {
            "a" => Slot::A,
            "b" => Slot::B,
            "c" => Slot::C,
            _ => return Err(SlotIdError::Unknown(s.to_string())),
        };
        Ok(Self { slot, revealed })
    }
}

impl TryFrom<String> for SlotId {
    type Error = SlotIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SlotId> for String {
    fn from(value: SlotId) -> Self {
        value.to_string()
    }
}

/// Classification of the correct answer of a spot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrectAction {
    /// The answer is one of the initially visible options.
    Pick,
    /// The answer only appears after rerolling its slot.
    RerollThenPick,
}

impl CorrectAction {
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Pick => "pick",
            Self::RerollThenPick => "reroll_then_pick",
        }
    }
}

impl fmt::Display for CorrectAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Derive the correct action from a correct pick. This is never stored
/// independently of the pick.
#[must_use]
pub const fn derive_action(pick: SlotId) -> CorrectAction {
    if pick.revealed {
        CorrectAction::RerollThenPick
    } else {
        CorrectAction::Pick
    }
}

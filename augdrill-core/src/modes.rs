//! Training modes and tier modes selected when a set is created.
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::catalog::{AugmentStage, Tier};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModeParseError {
    #[error("unknown tier mode '{0}' (expected mixed, silver, gold or prismatic)")]
    TierMode(String),
    #[error("unknown training mode '{0}' (expected augment_2_1, augment_3_2 or augment_4_2)")]
    TrainingMode(String),
}

/// Which augment round a set drills.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TrainingMode {
    #[default]
    #[serde(rename = "augment_2_1")]
    Augment21,
    #[serde(rename = "augment_3_2")]
    Augment32,
    #[serde(rename = "augment_4_2")]
    Augment42,
}

impl TrainingMode {
    pub const ALL: [Self; 3] = [Self::Augment21, Self::Augment32, Self::Augment42];

    /// Catalog stage filter for this mode.
    #[must_use]
    pub const fn stage(self) -> AugmentStage {
        match self {
            Self::Augment21 => AugmentStage::Two,
            Self::Augment32 => AugmentStage::Three,
            Self::Augment42 => AugmentStage::Four,
        }
    }

    /// Descriptive in-game stage label.
    #[must_use]
    pub const fn stage_label(self) -> &'static str {
        match self {
            Self::Augment21 => "2-1",
            Self::Augment32 => "3-2",
            Self::Augment42 => "4-2",
        }
    }

    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Augment21 => "augment_2_1",
            Self::Augment32 => "augment_3_2",
            Self::Augment42 => "augment_4_2",
        }
    }
}

impl fmt::Display for TrainingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for TrainingMode {
    type Err = ModeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|mode| mode.key() == wanted || mode.stage_label() == wanted)
            .ok_or_else(|| ModeParseError::TrainingMode(s.to_string()))
    }
}

/// Tier assignment policy for the spots of a set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TierMode {
    /// Round-robin over silver, gold, prismatic.
    #[default]
    Mixed,
    /// Every spot uses the same tier.
    Fixed(Tier),
}

impl TierMode {
    /// Tier of the spot at 1-based `index`.
    #[must_use]
    pub fn tier_for_index(self, index: usize) -> Tier {
        match self {
            Self::Fixed(tier) => tier,
            Self::Mixed => Tier::ALL[index.saturating_sub(1) % Tier::ALL.len()],
        }
    }

    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Mixed => "mixed",
            Self::Fixed(tier) => tier.key(),
        }
    }
}

impl fmt::Display for TierMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for TierMode {
    type Err = ModeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("mixed") {
            return Ok(Self::Mixed);
        }
        trimmed
            .parse::<Tier>()
            .map(Self::Fixed)
            .map_err(|_| ModeParseError::TierMode(s.to_string()))
    }
}

impl TryFrom<String> for TierMode {
    type Error = ModeParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TierMode> for String {
    fn from(value: TierMode) -> Self {
        value.key().to_string()
    }
}

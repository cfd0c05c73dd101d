//! Engine configuration.
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{MAX_SAMPLE_COUNT, MIN_OPTIONS_PER_SPOT, OPTIONS_PER_SPOT, SPOTS_PER_SET};
use crate::generator::SetPlan;
use crate::modes::{TierMode, TrainingMode};

/// Errors raised when drill configuration invariants are violated.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{field} must be between {min} and {max} (got {value})")]
    RangeViolation {
        field: &'static str,
        min: usize,
        max: usize,
        value: usize,
    },
    #[error("config JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Tunable set shape and request limits. Every field has a default so a
/// partial JSON document is accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrillConfig {
    #[serde(default = "DrillConfig::default_spots_per_set")]
    pub spots_per_set: usize,
    #[serde(default = "DrillConfig::default_options_per_spot")]
    pub options_per_spot: usize,
    #[serde(default)]
    pub default_mode: TrainingMode,
    #[serde(default)]
    pub default_tier_mode: TierMode,
    #[serde(default = "DrillConfig::default_max_sample_count")]
    pub max_sample_count: usize,
}

impl DrillConfig {
    const fn default_spots_per_set() -> usize {
        SPOTS_PER_SET
    }

    const fn default_options_per_spot() -> usize {
        OPTIONS_PER_SPOT
    }

    const fn default_max_sample_count() -> usize {
        MAX_SAMPLE_COUNT
    }

    /// Parse and validate a JSON config document.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` for malformed JSON or out-of-range values.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let cfg: Self = serde_json::from_str(json)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// # Errors
    ///
    /// Returns `ConfigError::RangeViolation` when any field violates its bounds.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_range(
            "spots_per_set",
            self.spots_per_set,
            SPOTS_PER_SET,
            SPOTS_PER_SET,
        )?;
        check_range(
            "options_per_spot",
            self.options_per_spot,
            MIN_OPTIONS_PER_SPOT,
            OPTIONS_PER_SPOT,
        )?;
        check_range("max_sample_count", self.max_sample_count, 1, MAX_SAMPLE_COUNT)?;
        Ok(())
    }

    /// Generation plan for `mode`, falling back to the configured defaults.
    #[must_use]
    pub fn plan(&self, tier_mode: Option<TierMode>, mode: Option<TrainingMode>) -> SetPlan {
        SetPlan {
            tier_mode: tier_mode.unwrap_or(self.default_tier_mode),
            mode: mode.unwrap_or(self.default_mode),
            spots: self.spots_per_set,
            options_per_spot: self.options_per_spot,
        }
    }
}

impl Default for DrillConfig {
    fn default() -> Self {
        Self {
            spots_per_set: Self::default_spots_per_set(),
            options_per_spot: Self::default_options_per_spot(),
            default_mode: TrainingMode::default(),
            default_tier_mode: TierMode::default(),
            max_sample_count: Self::default_max_sample_count(),
        }
    }
}

fn check_range(
    field: &'static str,
    value: usize,
    min: usize,
    max: usize,
) -> Result<(), ConfigError> {
    if value < min || value > max {
        return Err(ConfigError::RangeViolation {
            field,
            min,
            max,
            value,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Tier;

    #[test]
    fn defaults_validate() {
        let cfg = DrillConfig::default();
        cfg.validate().unwrap();
        assert_eq!(cfg.plan(None, None), SetPlan::default());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let cfg = DrillConfig::from_json(r#"{"options_per_spot": 4, "default_mode": "augment_4_2"}"#)
            .unwrap();
        assert_eq!(cfg.options_per_spot, 4);
        assert_eq!(cfg.spots_per_set, SPOTS_PER_SET);
        let plan = cfg.plan(Some(TierMode::Fixed(Tier::Gold)), None);
        assert_eq!(plan.mode, TrainingMode::Augment42);
        assert_eq!(plan.tier_mode, TierMode::Fixed(Tier::Gold));
    }

    #[test]
    fn out_of_range_fields_are_named() {
        let err = DrillConfig::from_json(r#"{"options_per_spot": 2}"#).unwrap_err();
        assert_eq!(
            err.to_string(),
            "options_per_spot must be between 3 and 6 (got 2)"
        );
        assert!(matches!(
            DrillConfig::from_json(r#"{"max_sample_count": 13}"#),
            Err(ConfigError::RangeViolation {
                field: "max_sample_count",
                ..
            })
        ));
        assert!(matches!(
            DrillConfig::from_json(r#"{"spots_per_set": 19}"#),
            Err(ConfigError::RangeViolation {
                field: "spots_per_set",
                min: SPOTS_PER_SET,
                max: SPOTS_PER_SET,
                value: 19,
            })
        ));
        assert!(matches!(
            DrillConfig::from_json("{"),
            Err(ConfigError::Json(_))
        ));
    }
}

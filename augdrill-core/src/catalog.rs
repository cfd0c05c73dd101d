//! Augment catalog: the read-only pool every sampler draws from.
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::Hasher;
use std::str::FromStr;
use thiserror::Error;
use twox_hash::XxHash64;

/// Rarity tier of an augment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Silver,
    Gold,
    Prismatic,
}

impl Tier {
    /// Round-robin order used by mixed sets and batch sampling.
    pub const ALL: [Self; 3] = [Self::Silver, Self::Gold, Self::Prismatic];

    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Silver => "silver",
            Self::Gold => "gold",
            Self::Prismatic => "prismatic",
        }
    }

    /// Lenient parse used for spreadsheet cells: `1/2/3` or any cell
    /// containing the tier name (`prism` is enough for prismatic).
    #[must_use]
    pub fn parse_loose(raw: &str) -> Option<Self> {
        let lowered = raw.trim().to_ascii_lowercase();
        match lowered.as_str() {
            "1" => return Some(Self::Silver),
            "2" => return Some(Self::Gold),
            "3" => return Some(Self::Prismatic),
            _ => {}
        }
        if lowered.contains("silver") {
            Some(Self::Silver)
        } else if lowered.contains("gold") {
            Some(Self::Gold)
        } else if lowered.contains("prism") {
            Some(Self::Prismatic)
        } else {
            None
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Tier {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "silver" => Ok(Self::Silver),
            "gold" => Ok(Self::Gold),
            "prismatic" => Ok(Self::Prismatic),
            other => Err(CatalogError::UnknownTier(other.to_string())),
        }
    }
}

/// Game stage an augment can be offered on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum AugmentStage {
    Two,
    Three,
    Four,
}

impl AugmentStage {
    pub const ALL: [Self; 3] = [Self::Two, Self::Three, Self::Four];

    #[must_use]
    pub const fn number(self) -> u8 {
        match self {
            Self::Two => 2,
            Self::Three => 3,
            Self::Four => 4,
        }
    }

    #[must_use]
    pub const fn from_number(value: u8) -> Option<Self> {
        match value {
            2 => Some(Self::Two),
            3 => Some(Self::Three),
            4 => Some(Self::Four),
            _ => None,
        }
    }
}

impl TryFrom<u8> for AugmentStage {
    type Error = CatalogError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::from_number(value).ok_or(CatalogError::UnknownStage(value))
    }
}

impl From<AugmentStage> for u8 {
    fn from(value: AugmentStage) -> Self {
        value.number()
    }
}

impl fmt::Display for AugmentStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.number())
    }
}

/// Per-stage availability flags. Missing keys deserialize to `false`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct StageAvailability {
    #[serde(rename = "2", default)]
    pub stage2: bool,
    #[serde(rename = "3", default)]
    pub stage3: bool,
    #[serde(rename = "4", default)]
    pub stage4: bool,
}

impl StageAvailability {
    /// Available on every stage.
    #[must_use]
    pub const fn all() -> Self {
        Self {
            stage2: true,
            stage3: true,
            stage4: true,
        }
    }

    #[must_use]
    pub const fn only(stage: AugmentStage) -> Self {
        let mut flags = Self {
            stage2: false,
            stage3: false,
            stage4: false,
        };
        match stage {
            AugmentStage::Two => flags.stage2 = true,
            AugmentStage::Three => flags.stage3 = true,
            AugmentStage::Four => flags.stage4 = true,
        }
        flags
    }

    #[must_use]
    pub const fn allows(self, stage: AugmentStage) -> bool {
        match stage {
            AugmentStage::Two => self.stage2,
            AugmentStage::Three => self.stage3,
            AugmentStage::Four => self.stage4,
        }
    }
}

/// A single catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Augment {
    pub name: String,
    pub tier: Tier,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub stages: StageAvailability,
}

impl Augment {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        tier: Tier,
        description: impl Into<String>,
        stages: StageAvailability,
    ) -> Self {
        Self {
            name: name.into(),
            tier,
            description: description.into(),
            stages,
        }
    }

    /// Whether the augment may be offered on `stage`.
    #[must_use]
    pub const fn available_at(&self, stage: AugmentStage) -> bool {
        self.stages.allows(stage)
    }
}

/// Errors raised while loading or importing a catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to read catalog at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("sheet header must include {0}")]
    MissingColumn(&'static str),
    #[error("sheet has no header row")]
    EmptySheet,
    #[error("unknown tier '{0}'")]
    UnknownTier(String),
    #[error("unknown stage {0} (expected 2, 3 or 4)")]
    UnknownStage(u8),
}

/// Container for every augment known to the drill.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AugmentCatalog {
    augments: Vec<Augment>,
}

impl AugmentCatalog {
    /// Create an empty catalog (useful for tests)
    #[must_use]
    pub fn empty() -> Self {
        Self {
            augments: Vec::new(),
        }
    }

    #[must_use]
    pub fn from_augments(augments: Vec<Augment>) -> Self {
        Self { augments }
    }

    /// Load a catalog from a JSON array of augments.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is not an array of augment records.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Import spreadsheet rows. The first row is the header and must name
    /// `name`, `tier` and `description`; `stage2`..`stage4` are optional.
    /// Rows with a blank name or an unrecognized tier are skipped and the
    /// result is sorted by name.
    ///
    /// # Errors
    ///
    /// Returns an error when the header row is missing or lacks a required
    /// column.
    pub fn from_sheet_rows<S: AsRef<str>>(rows: &[Vec<S>]) -> Result<Self, CatalogError> {
        let (header, body) = rows.split_first().ok_or(CatalogError::EmptySheet)?;
        let column = |name: &str| {
            header
                .iter()
                .position(|cell| normalize_header(cell.as_ref()) == name)
        };
        let name_col = column("name").ok_or(CatalogError::MissingColumn("name"))?;
        let tier_col = column("tier").ok_or(CatalogError::MissingColumn("tier"))?;
        let desc_col = column("description").ok_or(CatalogError::MissingColumn("description"))?;
        let stage_cols = [column("stage2"), column("stage3"), column("stage4")];

        let mut augments: Vec<Augment> = body
            .iter()
            .filter_map(|row| {
                let row = row.as_slice();
                let name = sheet_cell(row, name_col);
                if name.is_empty() {
                    return None;
                }
                let Some(tier) = Tier::parse_loose(sheet_cell(row, tier_col)) else {
                    log::debug!("skipping sheet row {name:?}: unknown tier");
                    return None;
                };
                Some(Augment {
                    name: name.to_string(),
                    tier,
                    description: sheet_cell(row, desc_col).to_string(),
                    stages: StageAvailability {
                        stage2: sheet_flag(row, stage_cols[0]),
                        stage3: sheet_flag(row, stage_cols[1]),
                        stage4: sheet_flag(row, stage_cols[2]),
                    },
                })
            })
            .collect();
        augments.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(Self { augments })
    }

    #[must_use]
    pub fn augments(&self) -> &[Augment] {
        &self.augments
    }

    pub fn iter(&self) -> impl Iterator<Item = &Augment> {
        self.augments.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.augments.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.augments.is_empty()
    }

    /// Count augments of `tier`, optionally restricted to a stage.
    #[must_use]
    pub fn eligible_count(&self, tier: Tier, stage: Option<AugmentStage>) -> usize {
        self.augments
            .iter()
            .filter(|a| a.tier == tier && stage.is_none_or(|s| a.available_at(s)))
            .count()
    }

    /// Look up an augment by tier and name.
    #[must_use]
    pub fn find(&self, tier: Tier, name: &str) -> Option<&Augment> {
        self.augments
            .iter()
            .find(|a| a.tier == tier && a.name == name)
    }

    /// Order-independent XxHash64 fingerprint of the catalog contents.
    /// Sets record it so a later reader can tell which catalog produced them.
    #[must_use]
    pub fn fingerprint(&self) -> u64 {
        let mut keys: Vec<String> = self
            .augments
            .iter()
            .map(|a| {
                format!(
                    "{}|{}|{}|{}{}{}",
                    a.tier,
                    a.name,
                    a.description,
                    u8::from(a.stages.stage2),
                    u8::from(a.stages.stage3),
                    u8::from(a.stages.stage4)
                )
            })
            .collect();
        keys.sort();
        let mut hasher = XxHash64::with_seed(0);
        for key in keys {
            hasher.write(key.as_bytes());
            hasher.write_u8(0xFF);
        }
        hasher.finish()
    }
}

impl<'a> IntoIterator for &'a AugmentCatalog {
    type Item = &'a Augment;
    type IntoIter = std::slice::Iter<'a, Augment>;

    fn into_iter(self) -> Self::IntoIter {
        self.augments.iter()
    }
}

fn sheet_cell<S: AsRef<str>>(row: &[S], idx: usize) -> &str {
    row.get(idx).map_or("", |c| c.as_ref().trim())
}

fn sheet_flag<S: AsRef<str>>(row: &[S], idx: Option<usize>) -> bool {
    idx.is_some_and(|i| is_truthy(sheet_cell(row, i)))
}

fn normalize_header(raw: &str) -> String {
    raw.chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

fn is_truthy(raw: &str) -> bool {
    let lowered = raw.trim().to_ascii_lowercase();
    !(lowered.is_empty() || matches!(lowered.as_str(), "0" | "false" | "no" | "n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_from_json_defaults_missing_stages() {
        let json = r#"[
            {"name": "Cybernetic Uplink", "tier": "gold", "description": "Mana regen",
             "stages": {"2": true, "4": true}},
            {"name": "Pandora's Items", "tier": "prismatic"}
        ]"#;
        let catalog = AugmentCatalog::from_json(json).unwrap();
        assert_eq!(catalog.len(), 2);
        let uplink = &catalog.augments()[0];
        assert!(uplink.available_at(AugmentStage::Two));
        assert!(!uplink.available_at(AugmentStage::Three));
        assert!(uplink.available_at(AugmentStage::Four));
        let pandora = &catalog.augments()[1];
        assert_eq!(pandora.description, "");
        assert!(AugmentStage::ALL.iter().all(|s| !pandora.available_at(*s)));
    }

    #[test]
    fn catalog_json_rejects_unknown_tier() {
        let json = r#"[{"name": "X", "tier": "bronze"}]"#;
        assert!(matches!(
            AugmentCatalog::from_json(json),
            Err(CatalogError::Json(_))
        ));
    }

    #[test]
    fn sheet_rows_import_normalizes_and_sorts() {
        let rows = vec![
            vec!["Name", "Tier", "Description", "Stage 2", "Stage-3", "STAGE4"],
            vec!["Zeta", "3", "last", "yes", "0", ""],
            vec!["Alpha", "Silver Tier", "first", "1", "n", "true"],
            vec!["", "gold", "blank name", "1", "1", "1"],
            vec!["Ghost", "bronze", "unknown tier", "1", "1", "1"],
            vec!["Mid", "prism", "short row"],
        ];
        let catalog = AugmentCatalog::from_sheet_rows(&rows).unwrap();
        let names: Vec<_> = catalog.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["Alpha", "Mid", "Zeta"]);

        let alpha = catalog.find(Tier::Silver, "Alpha").unwrap();
        assert_eq!(
            alpha.stages,
            StageAvailability {
                stage2: true,
                stage3: false,
                stage4: true
            }
        );
        let mid = catalog.find(Tier::Prismatic, "Mid").unwrap();
        assert_eq!(mid.stages, StageAvailability::default());
        let zeta = catalog.find(Tier::Prismatic, "Zeta").unwrap();
        assert!(zeta.available_at(AugmentStage::Two));
        assert!(!zeta.available_at(AugmentStage::Three));
    }

    #[test]
    fn sheet_rows_require_core_columns() {
        let rows = vec![vec!["name", "tier"], vec!["A", "gold"]];
        assert!(matches!(
            AugmentCatalog::from_sheet_rows(&rows),
            Err(CatalogError::MissingColumn("description"))
        ));
        let empty: Vec<Vec<&str>> = Vec::new();
        assert!(matches!(
            AugmentCatalog::from_sheet_rows(&empty),
            Err(CatalogError::EmptySheet)
        ));
    }

    #[test]
    fn fingerprint_ignores_order_but_not_content() {
        let a = Augment::new("A", Tier::Gold, "d", StageAvailability::all());
        let b = Augment::new("B", Tier::Gold, "d", StageAvailability::all());
        let forward = AugmentCatalog::from_augments(vec![a.clone(), b.clone()]);
        let reversed = AugmentCatalog::from_augments(vec![b.clone(), a.clone()]);
        assert_eq!(forward.fingerprint(), reversed.fingerprint());

        let mut changed = b;
        changed.stages = StageAvailability::only(AugmentStage::Three);
        let edited = AugmentCatalog::from_augments(vec![a, changed]);
        assert_ne!(forward.fingerprint(), edited.fingerprint());
    }

    #[test]
    fn tier_parsing_variants() {
        assert_eq!("Gold".parse::<Tier>().unwrap(), Tier::Gold);
        assert!("bronze".parse::<Tier>().is_err());
        assert_eq!(Tier::parse_loose("2"), Some(Tier::Gold));
        assert_eq!(Tier::parse_loose("Prismatic!"), Some(Tier::Prismatic));
        assert_eq!(Tier::parse_loose("4"), None);
    }

    #[test]
    fn stage_serializes_as_number() {
        let json = serde_json::to_string(&AugmentStage::Three).unwrap();
        assert_eq!(json, "3");
        assert!(serde_json::from_str::<AugmentStage>("5").is_err());
    }
}

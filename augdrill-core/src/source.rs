//! Catalog sources: where the augment pool comes from.
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::catalog::{AugmentCatalog, CatalogError};

const BUNDLED_AUGMENTS: &str = include_str!("../assets/augments.json");

/// Anything that can hand the engine an augment catalog, such as a JSON
/// file or data already in memory.
pub trait CatalogSource {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load the full augment list.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog cannot be read or parsed.
    fn load_catalog(&self) -> Result<AugmentCatalog, Self::Error>;
}

/// Catalog already in memory.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    catalog: AugmentCatalog,
}

impl StaticCatalog {
    #[must_use]
    pub const fn new(catalog: AugmentCatalog) -> Self {
        Self { catalog }
    }

    /// The augment list shipped with the crate.
    ///
    /// # Errors
    ///
    /// Returns an error if the bundled JSON fails to parse.
    pub fn bundled() -> Result<Self, CatalogError> {
        AugmentCatalog::from_json(BUNDLED_AUGMENTS).map(Self::new)
    }

    #[must_use]
    pub fn status(&self) -> CatalogSourceStatus {
        CatalogSourceStatus {
            source: CatalogSourceKind::Static,
            path: None,
            exists: true,
            ok: true,
            count: self.catalog.len(),
            error: None,
        }
    }
}

impl CatalogSource for StaticCatalog {
    type Error = std::convert::Infallible;

    fn load_catalog(&self) -> Result<AugmentCatalog, Self::Error> {
        Ok(self.catalog.clone())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CatalogSourceKind {
    File,
    Static,
}

/// Health report for a catalog source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogSourceStatus {
    pub source: CatalogSourceKind,
    pub path: Option<String>,
    pub exists: bool,
    pub ok: bool,
    pub count: usize,
    pub error: Option<String>,
}

/// JSON array of augments on disk.
#[derive(Debug, Clone)]
pub struct JsonFileCatalog {
    path: PathBuf,
}

impl JsonFileCatalog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Try to load the file and describe the outcome without failing.
    #[must_use]
    pub fn status(&self) -> CatalogSourceStatus {
        let exists = self.path.is_file();
        let loaded = self.load_catalog();
        CatalogSourceStatus {
            source: CatalogSourceKind::File,
            path: Some(self.path.display().to_string()),
            exists,
            ok: loaded.is_ok(),
            count: loaded.as_ref().map_or(0, AugmentCatalog::len),
            error: loaded.err().map(|err| err.to_string()),
        }
    }
}

impl CatalogSource for JsonFileCatalog {
    type Error = CatalogError;

    fn load_catalog(&self) -> Result<AugmentCatalog, Self::Error> {
        let raw = std::fs::read_to_string(&self.path).map_err(|source| CatalogError::Io {
            path: self.path.display().to_string(),
            source,
        })?;
        let catalog = AugmentCatalog::from_json(&raw)?;
        log::debug!(
            "loaded {} augments from {}",
            catalog.len(),
            self.path.display()
        );
        Ok(catalog)
    }
}

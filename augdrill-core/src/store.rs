//! Persistence boundary for training sets.
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;
use thiserror::Error;

use crate::set::TrainingSet;

/// Trait for abstracting set persistence.
/// Implementations must write a set all-or-nothing.
pub trait SetStore {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Persist a new set.
    ///
    /// # Errors
    ///
    /// Returns an error if the id is taken or the write fails; nothing is
    /// stored in that case.
    fn insert_set(&self, set: &TrainingSet) -> Result<(), Self::Error>;

    /// Load a set by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    fn load_set(&self, id: &str) -> Result<Option<TrainingSet>, Self::Error>;

    /// Overwrite an existing set.
    ///
    /// # Errors
    ///
    /// Returns an error if the set does not exist or the write fails.
    fn update_set(&self, set: &TrainingSet) -> Result<(), Self::Error>;

    /// Every stored set id.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    fn set_ids(&self) -> Result<Vec<String>, Self::Error>;
}

#[derive(Debug, Error)]
pub enum MemoryStoreError {
    #[error("set {0} already exists")]
    Duplicate(String),
    #[error("set {0} does not exist")]
    Missing(String),
    #[error("set serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}

/// Single-threaded in-memory store keeping sets as JSON documents, the
/// same shape a database row would hold. Clones share storage.
#[derive(Debug, Clone, Default)]
pub struct MemorySetStore {
    rows: Rc<RefCell<BTreeMap<String, String>>>,
}

impl MemorySetStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.borrow().is_empty()
    }
}

impl SetStore for MemorySetStore {
    type Error = MemoryStoreError;

    fn insert_set(&self, set: &TrainingSet) -> Result<(), Self::Error> {
        let row = serde_json::to_string(set)?;
        let mut rows = self.rows.borrow_mut();
        if rows.contains_key(&set.id) {
            return Err(MemoryStoreError::Duplicate(set.id.clone()));
        }
        rows.insert(set.id.clone(), row);
        Ok(())
    }

    fn load_set(&self, id: &str) -> Result<Option<TrainingSet>, Self::Error> {
        self.rows
            .borrow()
            .get(id)
            .map(|row| serde_json::from_str(row))
            .transpose()
            .map_err(MemoryStoreError::from)
    }

    fn update_set(&self, set: &TrainingSet) -> Result<(), Self::Error> {
        let row = serde_json::to_string(set)?;
        let mut rows = self.rows.borrow_mut();
        let slot = rows
            .get_mut(&set.id)
            .ok_or_else(|| MemoryStoreError::Missing(set.id.clone()))?;
        *slot = row;
        Ok(())
    }

    fn set_ids(&self) -> Result<Vec<String>, Self::Error> {
        Ok(self.rows.borrow().keys().cloned().collect())
    }
}

//! In-memory reference store for tests and transient repositories.

use std::collections::BTreeMap;
use std::sync::RwLock;

use ferry_types::ObjectId;
use tracing::debug;

use crate::error::{RefError, Result};
use crate::traits::{apply_edits, collect_prefix, RefStore};
use crate::types::RefEdit;

/// An in-memory implementation of [`RefStore`].
///
/// All data lives in a `BTreeMap` behind a `RwLock`. Data is lost when the
/// store is dropped.
#[derive(Debug, Default)]
pub struct InMemoryRefStore {
    refs: RwLock<BTreeMap<String, ObjectId>>,
}

impl InMemoryRefStore {
    /// Create a new empty ref store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of refs currently stored.
    pub fn len(&self) -> usize {
        self.refs.read().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl RefStore for InMemoryRefStore {
    fn read_ref(&self, name: &str) -> Result<Option<ObjectId>> {
        let refs = self
            .refs
            .read()
            .map_err(|e| RefError::Serialization(format!("lock poisoned: {e}")))?;
        Ok(refs.get(name).copied())
    }

    fn list_refs(&self, prefix: &str) -> Result<Vec<(String, ObjectId)>> {
        let refs = self
            .refs
            .read()
            .map_err(|e| RefError::Serialization(format!("lock poisoned: {e}")))?;
        Ok(collect_prefix(&refs, prefix))
    }

    fn transaction(&self, edits: &[RefEdit]) -> Result<()> {
        let mut refs = self
            .refs
            .write()
            .map_err(|e| RefError::Serialization(format!("lock poisoned: {e}")))?;
        apply_edits(&mut refs, edits)?;
        debug!(edits = edits.len(), "ref transaction committed");
        Ok(())
    }
}

//! File-backed reference store.
//!
//! All refs live in one JSON object (`{"refs/heads/main": "<hex>"}`). Every
//! committed transaction rewrites the file through a temporary file that is
//! renamed into place, so a crash never leaves a half-written ref table.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use ferry_types::ObjectId;
use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::{RefError, Result};
use crate::traits::{apply_edits, collect_prefix, RefStore};
use crate::types::RefEdit;

/// A [`RefStore`] persisted to a single JSON file.
#[derive(Debug)]
pub struct FileRefStore {
    path: PathBuf,
    refs: RwLock<BTreeMap<String, ObjectId>>,
}

impl FileRefStore {
    /// Open the ref table at `path`. A missing file is an empty table.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let refs = if path.exists() {
            load(&path)?
        } else {
            BTreeMap::new()
        };
        Ok(Self {
            path,
            refs: RwLock::new(refs),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RefStore for FileRefStore {
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

        // Stage on a copy so a failed write leaves the cached table intact.
        let mut staged = refs.clone();
        apply_edits(&mut staged, edits)?;
        store(&self.path, &staged)?;
        *refs = staged;

        debug!(path = %self.path.display(), edits = edits.len(), "ref table written");
        Ok(())
    }
}

fn load(path: &Path) -> Result<BTreeMap<String, ObjectId>> {
    let raw = fs::read(path)?;
    let table: BTreeMap<String, String> =
        serde_json::from_slice(&raw).map_err(|e| RefError::Serialization(e.to_string()))?;
    table
        .into_iter()
        .map(|(name, hex)| {
            let oid = ObjectId::from_hex(&hex)
                .map_err(|e| RefError::Serialization(format!("{name}: {e}")))?;
            Ok((name, oid))
        })
        .collect()
}

fn store(path: &Path, refs: &BTreeMap<String, ObjectId>) -> Result<()> {
    let table: BTreeMap<&str, String> = refs.iter().map(|(k, v)| (k.as_str(), v.to_hex())).collect();
    let data =
        serde_json::to_vec_pretty(&table).map_err(|e| RefError::Serialization(e.to_string()))?;

    let dir = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(&data)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| RefError::Io(e.error))?;
    Ok(())
}

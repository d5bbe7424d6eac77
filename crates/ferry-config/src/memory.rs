use std::sync::RwLock;

use crate::error::{ConfigError, ConfigResult};
use crate::remote::{ConfigDocument, RemoteConfig};
use crate::traits::ConfigStore;

/// A [`ConfigStore`] that keeps the document in memory.
#[derive(Debug, Default)]
pub struct InMemoryConfigStore {
    doc: RwLock<ConfigDocument>,
}

impl InMemoryConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(doc: ConfigDocument) -> Self {
        Self { doc: RwLock::new(doc) }
    }
}

impl ConfigStore for InMemoryConfigStore {
    fn read_remote(&self, name: &str) -> ConfigResult<Option<RemoteConfig>> {
        let doc = self.doc.read().map_err(|_| ConfigError::LockPoisoned)?;
        Ok(doc.remote(name).cloned())
    }

    fn write_remote(&self, remote: &RemoteConfig) -> ConfigResult<()> {
        let mut doc = self.doc.write().map_err(|_| ConfigError::LockPoisoned)?;
        doc.upsert(remote.clone());
        Ok(())
    }

    fn rename_remote(&self, old: &str, new: &str) -> ConfigResult<()> {
        let mut doc = self.doc.write().map_err(|_| ConfigError::LockPoisoned)?;
        doc.rename(old, new)
    }

    fn remove_remote(&self, name: &str) -> ConfigResult<RemoteConfig> {
        let mut doc = self.doc.write().map_err(|_| ConfigError::LockPoisoned)?;
        doc.remove(name)
    }

    fn remote_names(&self) -> ConfigResult<Vec<String>> {
        let doc = self.doc.read().map_err(|_| ConfigError::LockPoisoned)?;
        Ok(doc.names())
    }
}

//! TOML-file configuration store.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::{ConfigError, ConfigResult};
use crate::remote::{ConfigDocument, RemoteConfig};
use crate::traits::ConfigStore;

/// A [`ConfigStore`] backed by one TOML file.
///
/// The document is loaded once on open and cached. Each mutation is staged
/// on a copy of the cache, written to a temporary file next to the target
/// and renamed over it; the cache only changes once the rename succeeded.
#[derive(Debug)]
pub struct FileConfigStore {
    path: PathBuf,
    doc: RwLock<ConfigDocument>,
}

impl FileConfigStore {
    /// Open the configuration at `path`. A missing file is an empty
    /// configuration.
    pub fn open(path: impl Into<PathBuf>) -> ConfigResult<Self> {
        let path = path.into();
        let doc = match fs::read_to_string(&path) {
            Ok(text) => ConfigDocument::from_toml(&text)?,
            Err(e) if e.kind() == ErrorKind::NotFound => ConfigDocument::default(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self {
            path,
            doc: RwLock::new(doc),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn modify<T>(&self, f: impl FnOnce(&mut ConfigDocument) -> ConfigResult<T>) -> ConfigResult<T> {
        let mut doc = self.doc.write().map_err(|_| ConfigError::LockPoisoned)?;
        let mut staged = doc.clone();
        let out = f(&mut staged)?;
        self.persist(&staged)?;
        *doc = staged;
        Ok(out)
    }

    fn persist(&self, doc: &ConfigDocument) -> ConfigResult<()> {
        let text = doc.to_toml()?;
        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(text.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| ConfigError::Io(e.error))?;
        debug!(path = %self.path.display(), "config written");
        Ok(())
    }
}

impl ConfigStore for FileConfigStore {
    fn read_remote(&self, name: &str) -> ConfigResult<Option<RemoteConfig>> {
        let doc = self.doc.read().map_err(|_| ConfigError::LockPoisoned)?;
        Ok(doc.remote(name).cloned())
    }

    fn write_remote(&self, remote: &RemoteConfig) -> ConfigResult<()> {
        self.modify(|doc| {
            doc.upsert(remote.clone());
            Ok(())
        })
    }

    fn rename_remote(&self, old: &str, new: &str) -> ConfigResult<()> {
        self.modify(|doc| doc.rename(old, new))
    }

    fn remove_remote(&self, name: &str) -> ConfigResult<RemoteConfig> {
        self.modify(|doc| doc.remove(name))
    }

    fn remote_names(&self) -> ConfigResult<Vec<String>> {
        let doc = self.doc.read().map_err(|_| ConfigError::LockPoisoned)?;
        Ok(doc.names())
    }
}

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

/// Persisted settings of one remote.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// Key of the `[remote.<name>]` table; not stored inside it.
    #[serde(skip)]
    pub name: String,
    pub url: String,
    #[serde(rename = "pushurl", default, skip_serializing_if = "Option::is_none")]
    pub push_url: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fetch: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub push: Vec<String>,
}

impl RemoteConfig {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            ..Self::default()
        }
    }
}

/// The whole configuration document.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigDocument {
    #[serde(default, rename = "remote")]
    remotes: BTreeMap<String, RemoteConfig>,
}

impl ConfigDocument {
    pub fn from_toml(text: &str) -> ConfigResult<Self> {
        let mut doc: Self = toml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        for (name, remote) in doc.remotes.iter_mut() {
            remote.name = name.clone();
        }
        Ok(doc)
    }

    pub fn to_toml(&self) -> ConfigResult<String> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))
    }

    pub fn remote(&self, name: &str) -> Option<&RemoteConfig> {
        self.remotes.get(name)
    }

    pub fn names(&self) -> Vec<String> {
        self.remotes.keys().cloned().collect()
    }

    /// Insert or replace the table for `remote.name`.
    pub fn upsert(&mut self, remote: RemoteConfig) {
        self.remotes.insert(remote.name.clone(), remote);
    }

    pub fn rename(&mut self, old: &str, new: &str) -> ConfigResult<()> {
        if self.remotes.contains_key(new) {
            return Err(ConfigError::AlreadyExists { name: new.to_string() });
        }
        let mut remote = self
            .remotes
            .remove(old)
            .ok_or_else(|| ConfigError::NotFound { name: old.to_string() })?;
        remote.name = new.to_string();
        self.remotes.insert(new.to_string(), remote);
        Ok(())
    }

    pub fn remove(&mut self, name: &str) -> ConfigResult<RemoteConfig> {
        self.remotes
            .remove(name)
            .ok_or_else(|| ConfigError::NotFound { name: name.to_string() })
    }
}

use crate::error::ConfigResult;
use crate::remote::RemoteConfig;

/// Durable configuration keyed by remote name.
///
/// Every mutating call either persists completely or fails and leaves the
/// stored configuration as it was.
pub trait ConfigStore: Send + Sync {
    /// Read one remote. `Ok(None)` if it is not configured.
    fn read_remote(&self, name: &str) -> ConfigResult<Option<RemoteConfig>>;

    /// Insert or replace the remote named `remote.name`.
    fn write_remote(&self, remote: &RemoteConfig) -> ConfigResult<()>;

    /// Move a remote's table to a new key.
    fn rename_remote(&self, old: &str, new: &str) -> ConfigResult<()>;

    fn remove_remote(&self, name: &str) -> ConfigResult<RemoteConfig>;

    /// All configured remote names, sorted.
    fn remote_names(&self) -> ConfigResult<Vec<String>>;

    fn contains_remote(&self, name: &str) -> ConfigResult<bool> {
        Ok(self.read_remote(name)?.is_some())
    }
}

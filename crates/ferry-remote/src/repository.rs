use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use ferry_config::{ConfigStore, FileConfigStore, InMemoryConfigStore, RemoteConfig};
use ferry_refs::{validate_remote_name, FileRefStore, InMemoryRefStore, RefEdit, RefStore};
use ferry_refspec::Refspec;
use ferry_store::{FileObjectStore, InMemoryObjectStore, ObjectStore};
use ferry_transfer::{PeerEndpoint, TransportFactory, TransportRegistry};
use tracing::{info, warn};

use crate::error::{RemoteError, RemoteResult};
use crate::remote::Remote;
use crate::transport::FileTransport;

pub const CONFIG_FILE: &str = "config.toml";
pub const REFS_FILE: &str = "refs.json";
pub const OBJECTS_DIR: &str = "objects";

/// A repository: object storage, ref storage, remote configuration and the
/// transports used to reach peers.
///
/// On disk a repository is a directory holding `config.toml`, `refs.json`
/// and an `objects/` tree.
pub struct Repository {
    root: Option<PathBuf>,
    objects: Arc<dyn ObjectStore>,
    refs: Arc<dyn RefStore>,
    config: Box<dyn ConfigStore>,
    transports: TransportRegistry,
}

impl Repository {
    /// A repository that lives only in memory. No transports are
    /// registered.
    pub fn in_memory() -> Self {
        Self::from_parts(
            Arc::new(InMemoryObjectStore::new()),
            Arc::new(InMemoryRefStore::new()),
            Box::new(InMemoryConfigStore::new()),
        )
    }

    /// Assemble a repository from existing collaborators.
    pub fn from_parts(objects: Arc<dyn ObjectStore>, refs: Arc<dyn RefStore>, config: Box<dyn ConfigStore>) -> Self {
        Self {
            root: None,
            objects,
            refs,
            config,
            transports: TransportRegistry::new(),
        }
    }

    /// Create the on-disk layout at `path` (if missing) and open it.
    pub fn init(path: impl AsRef<Path>) -> RemoteResult<Self> {
        let root = path.as_ref();
        fs::create_dir_all(root.join(OBJECTS_DIR)).map_err(io)?;
        let config = root.join(CONFIG_FILE);
        if !config.exists() {
            fs::write(&config, "").map_err(io)?;
        }
        info!(path = %root.display(), "initialized repository");
        Self::open(root)
    }

    /// Open an existing repository directory.
    pub fn open(path: impl AsRef<Path>) -> RemoteResult<Self> {
        let root = path.as_ref();
        let config_path = root.join(CONFIG_FILE);
        if !config_path.is_file() {
            return Err(RemoteError::NotFound(format!("no repository at {}", root.display())));
        }
        let objects = FileObjectStore::open(root.join(OBJECTS_DIR))?;
        let refs = FileRefStore::open(root.join(REFS_FILE))?;
        let config = FileConfigStore::open(config_path)?;

        let mut repo = Self::from_parts(Arc::new(objects), Arc::new(refs), Box::new(config));
        repo.root = Some(root.to_path_buf());
        repo.register_transport("file", Arc::new(FileTransport));
        Ok(repo)
    }

    /// Directory of an on-disk repository.
    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    pub fn objects(&self) -> &dyn ObjectStore {
        self.objects.as_ref()
    }

    pub fn refs(&self) -> &dyn RefStore {
        self.refs.as_ref()
    }

    pub fn config(&self) -> &dyn ConfigStore {
        self.config.as_ref()
    }

    pub fn transports(&self) -> &TransportRegistry {
        &self.transports
    }

    pub fn register_transport(&mut self, scheme: impl Into<String>, factory: Arc<dyn TransportFactory>) {
        self.transports.register(scheme, factory);
    }

    /// Serve this repository's stores to another repository.
    pub fn endpoint(&self) -> PeerEndpoint {
        PeerEndpoint::new(Arc::clone(&self.objects), Arc::clone(&self.refs))
    }

    /// Load the remote called `name` from configuration.
    pub fn open_remote(&self, name: &str) -> RemoteResult<Remote<'_>> {
        let config = self
            .config
            .read_remote(name)?
            .ok_or_else(|| RemoteError::NotFound(format!("remote {name}")))?;
        Remote::from_config(self, config)
    }

    /// Configure a new remote with the default fetch refspec and persist it.
    pub fn create_remote(&self, name: &str, url: &str) -> RemoteResult<Remote<'_>> {
        validate_remote_name(name)?;
        if url.is_empty() {
            return Err(RemoteError::InvalidUrl(url.to_string()));
        }
        if self.config.contains_remote(name)? {
            return Err(RemoteError::InvalidName {
                name: name.to_string(),
                reason: "a remote with that name already exists".into(),
            });
        }
        let mut config = RemoteConfig::new(name, url);
        config.fetch.push(Refspec::default_fetch(name)?.as_str().to_string());
        self.config.write_remote(&config)?;
        info!(remote = %name, %url, "remote created");
        Remote::from_config(self, config)
    }

    /// A remote that exists only for the lifetime of the returned value.
    pub fn anonymous_remote(&self, url: &str) -> RemoteResult<Remote<'_>> {
        Remote::anonymous(self, url)
    }

    pub fn remote_names(&self) -> RemoteResult<Vec<String>> {
        Ok(self.config.remote_names()?)
    }

    /// Remove a remote's configuration and every tracking ref its fetch
    /// refspecs map into.
    pub fn delete_remote(&self, name: &str) -> RemoteResult<()> {
        let config = self
            .config
            .read_remote(name)?
            .ok_or_else(|| RemoteError::NotFound(format!("remote {name}")))?;

        let specs: Vec<Refspec> = config
            .fetch
            .iter()
            .filter_map(|text| match Refspec::fetch(text) {
                Ok(spec) => Some(spec),
                Err(e) => {
                    warn!(remote = %name, refspec = %text, error = %e, "ignoring unparsable refspec");
                    None
                }
            })
            .collect();
        let doomed: Vec<RefEdit> = self
            .refs
            .list_refs("")?
            .into_iter()
            .filter(|(ref_name, _)| specs.iter().any(|s| s.destination_matches(ref_name)))
            .map(|(ref_name, oid)| RefEdit::checked(ref_name, oid, ferry_types::ObjectId::ZERO))
            .collect();
        if !doomed.is_empty() {
            self.refs.transaction(&doomed)?;
        }

        self.config.remove_remote(name)?;
        info!(remote = %name, tracking_refs = doomed.len(), "remote deleted");
        Ok(())
    }
}

fn io(e: std::io::Error) -> RemoteError {
    RemoteError::Io(e.to_string())
}

impl fmt::Debug for Repository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Repository")
            .field("root", &self.root)
            .field("transports", &self.transports)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use ferry_types::ObjectId;

    #[test]
    fn create_and_open() {
        let repo = Repository::in_memory();
        repo.create_remote("origin", "file:///srv/a").unwrap();
        let remote = repo.open_remote("origin").unwrap();
        assert_eq!(remote.name(), Some("origin"));
        assert_eq!(remote.url(), "file:///srv/a");
        assert_eq!(remote.fetch_refspecs().len(), 1);
        assert_eq!(repo.remote_names().unwrap(), vec!["origin".to_string()]);
    }

    #[test]
    fn open_missing_remote() {
        let repo = Repository::in_memory();
        assert_eq!(repo.open_remote("nope").unwrap_err().kind(), ErrorKind::NotFound);
    }

    #[test]
    fn create_rejects_bad_input() {
        let repo = Repository::in_memory();
        assert_eq!(repo.create_remote("", "file:///a").unwrap_err().kind(), ErrorKind::InvalidName);
        assert_eq!(repo.create_remote("a/b", "file:///a").unwrap_err().kind(), ErrorKind::InvalidName);
        assert_eq!(repo.create_remote("origin", "").unwrap_err().kind(), ErrorKind::InvalidUrl);
        repo.create_remote("origin", "file:///a").unwrap();
        assert_eq!(repo.create_remote("origin", "file:///b").unwrap_err().kind(), ErrorKind::InvalidName);
    }

    #[test]
    fn delete_removes_config_and_tracking_refs() {
        let repo = Repository::in_memory();
        repo.create_remote("origin", "file:///a").unwrap();
        repo.create_remote("other", "file:///b").unwrap();
        let tip = ObjectId::from_bytes(b"tip");
        repo.refs().write_ref("refs/remotes/origin/main", tip).unwrap();
        repo.refs().write_ref("refs/remotes/other/main", tip).unwrap();
        repo.refs().write_ref("refs/heads/main", tip).unwrap();

        repo.delete_remote("origin").unwrap();
        assert_eq!(repo.remote_names().unwrap(), vec!["other".to_string()]);
        assert!(repo.refs().read_ref("refs/remotes/origin/main").unwrap().is_none());
        assert_eq!(repo.refs().read_ref("refs/remotes/other/main").unwrap(), Some(tip));
        assert_eq!(repo.refs().read_ref("refs/heads/main").unwrap(), Some(tip));

        assert_eq!(repo.delete_remote("origin").unwrap_err().kind(), ErrorKind::NotFound);
    }

    #[test]
    fn init_then_open_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        {
            let repo = Repository::init(dir.path()).unwrap();
            repo.create_remote("origin", "file:///srv/a").unwrap();
            assert!(repo.transports().schemes().any(|s| s == "file"));
        }
        assert!(dir.path().join(CONFIG_FILE).is_file());
        assert!(dir.path().join(OBJECTS_DIR).is_dir());

        let repo = Repository::open(dir.path()).unwrap();
        assert_eq!(repo.root(), Some(dir.path()));
        assert_eq!(repo.open_remote("origin").unwrap().url(), "file:///srv/a");
    }

    #[test]
    fn open_non_repository() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(Repository::open(dir.path()).unwrap_err().kind(), ErrorKind::NotFound);
    }
}

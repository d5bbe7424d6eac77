//! The `file` transport: peers that are repositories on this machine.

use std::path::Path;
use std::sync::Arc;

use ferry_refs::FileRefStore;
use ferry_store::FileObjectStore;
use ferry_transfer::transport::file_url_path;
use ferry_transfer::{Connection, PeerEndpoint, TransportError, TransportFactory};
use ferry_types::Direction;
use tracing::debug;

use crate::repository::{CONFIG_FILE, OBJECTS_DIR, REFS_FILE};

/// Opens `file://<path>` (or a bare path) as a [`PeerEndpoint`] over the
/// repository's on-disk stores.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileTransport;

impl TransportFactory for FileTransport {
    fn open(&self, url: &str, direction: Direction) -> Result<Box<dyn Connection>, TransportError> {
        let root = Path::new(file_url_path(url));
        if !root.join(CONFIG_FILE).is_file() {
            return Err(TransportError::Network(format!(
                "{} does not appear to be a ferry repository",
                root.display()
            )));
        }
        let objects =
            FileObjectStore::open(root.join(OBJECTS_DIR)).map_err(|e| TransportError::Network(e.to_string()))?;
        let refs = FileRefStore::open(root.join(REFS_FILE)).map_err(|e| TransportError::Network(e.to_string()))?;
        debug!(path = %root.display(), %direction, "opened file transport");
        Ok(Box::new(PeerEndpoint::new(Arc::new(objects), Arc::new(refs))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refuses_non_repositories() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("file://{}", dir.path().display());
        let err = FileTransport.open(&url, Direction::Fetch).err().unwrap();
        assert!(matches!(err, TransportError::Network(msg) if msg.contains("ferry repository")));
    }

    #[test]
    fn opens_initialized_repository() {
        let dir = tempfile::tempdir().unwrap();
        crate::Repository::init(dir.path()).unwrap();
        let mut conn = FileTransport
            .open(&dir.path().display().to_string(), Direction::Fetch)
            .ok()
            .unwrap();
        assert!(conn.advertised_refs().unwrap().is_empty());
    }
}

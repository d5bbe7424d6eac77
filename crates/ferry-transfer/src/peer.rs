//! Serving a local repository's stores as a [`Connection`].

use std::fmt;
use std::sync::Arc;

use ferry_refs::RefStore;
use ferry_store::{ObjectStore, StoredObject};
use ferry_types::{Direction, ObjectId};
use tracing::{debug, info};

use crate::error::TransportError;
use crate::transport::{Connection, FetchSink, PushObserver, TransportFactory};
use crate::types::{AdvertisedRef, PushReport, PushStatus, RefUpdateCommand};

/// The receiving end of fetch and push for a repository on this machine.
///
/// On push, objects are stored first, then checked for completeness (every
/// link resolves and every new tip exists), then ref updates are applied
/// one at a time. An update whose expected old tip no longer matches is
/// rejected with `"stale info"`; a non-forced update that does not descend
/// from the current tip is rejected with `"non-fast-forward"`.
#[derive(Clone)]
pub struct PeerEndpoint {
    objects: Arc<dyn ObjectStore>,
    refs: Arc<dyn RefStore>,
}

impl PeerEndpoint {
    pub fn new(objects: Arc<dyn ObjectStore>, refs: Arc<dyn RefStore>) -> Self {
        Self { objects, refs }
    }

    fn unpack_error(&self, received: &[ObjectId], commands: &[RefUpdateCommand]) -> Result<Option<String>, TransportError> {
        for id in received {
            let missing = self.objects.missing_links(id).map_err(network)?;
            if let Some(first) = missing.first() {
                return Ok(Some(format!("missing object {first} referenced by {id}")));
            }
        }
        for cmd in commands.iter().filter(|c| !c.is_delete()) {
            if !self.objects.exists(&cmd.new).map_err(network)? {
                return Ok(Some(format!("missing object {} for {}", cmd.new, cmd.name)));
            }
        }
        Ok(None)
    }

    fn apply(&self, cmd: &RefUpdateCommand) -> Result<PushStatus, TransportError> {
        let current = self.refs.tip_or_zero(&cmd.name).map_err(network)?;
        if current != cmd.old {
            return Ok(PushStatus::rejected(&cmd.name, "stale info"));
        }
        if !cmd.is_delete()
            && !cmd.old.is_null()
            && !cmd.force
            && !self.objects.is_descendant_of(&cmd.new, &cmd.old).map_err(network)?
        {
            return Ok(PushStatus::rejected(&cmd.name, "non-fast-forward"));
        }
        match self.refs.update_ref(&cmd.name, cmd.old, cmd.new) {
            Ok(()) => {
                debug!(ref_name = %cmd.name, old = %cmd.old.short_hex(), new = %cmd.new.short_hex(), "ref updated by push");
                Ok(PushStatus::accepted(&cmd.name))
            }
            Err(e) => Ok(PushStatus::rejected(&cmd.name, e.to_string())),
        }
    }
}

fn network(e: impl fmt::Display) -> TransportError {
    TransportError::Network(e.to_string())
}

impl Connection for PeerEndpoint {
    fn advertised_refs(&mut self) -> Result<Vec<AdvertisedRef>, TransportError> {
        let refs = self.refs.list_refs("").map_err(network)?;
        Ok(refs
            .into_iter()
            .map(|(name, oid)| AdvertisedRef { name, oid })
            .collect())
    }

    fn fetch_pack(
        &mut self,
        wants: &[ObjectId],
        haves: &[ObjectId],
        sink: &mut dyn FetchSink,
    ) -> Result<(), TransportError> {
        let ids = self.objects.objects_between(wants, haves).map_err(network)?;
        sink.progress(&format!("Counting objects: {}\n", ids.len()))?;
        for id in &ids {
            let object = self.objects.require(id).map_err(network)?;
            let size = object.size();
            sink.receive(object, size)?;
        }
        sink.progress(&format!("Total {} objects\n", ids.len()))?;
        Ok(())
    }

    fn send_pack(
        &mut self,
        objects: Vec<StoredObject>,
        commands: &[RefUpdateCommand],
        observer: &mut dyn PushObserver,
    ) -> Result<PushReport, TransportError> {
        let total = objects.len() as u64;
        let mut bytes = 0u64;
        let mut received = Vec::with_capacity(objects.len());
        for (i, object) in objects.into_iter().enumerate() {
            bytes += object.size();
            received.push(self.objects.write(&object).map_err(network)?);
            observer.sent(i as u64 + 1, total, bytes)?;
        }

        if let Some(message) = self.unpack_error(&received, commands)? {
            info!(%message, "push unpack failed");
            return Ok(PushReport {
                unpack_ok: false,
                unpack_message: Some(message),
                statuses: commands
                    .iter()
                    .map(|c| PushStatus::rejected(&c.name, "unpacker error"))
                    .collect(),
            });
        }

        let statuses = commands
            .iter()
            .map(|c| self.apply(c))
            .collect::<Result<Vec<_>, _>>()?;
        observer.progress(&format!("Received {total} objects\n"))?;
        Ok(PushReport {
            unpack_ok: true,
            unpack_message: None,
            statuses,
        })
    }
}

/// Serves every URL with the same endpoint.
impl TransportFactory for PeerEndpoint {
    fn open(&self, _url: &str, _direction: Direction) -> Result<Box<dyn Connection>, TransportError> {
        Ok(Box::new(self.clone()))
    }
}

impl fmt::Debug for PeerEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PeerEndpoint").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::Interrupted;
    use ferry_refs::InMemoryRefStore;
    use ferry_store::InMemoryObjectStore;

    #[derive(Default)]
    struct Collect {
        objects: Vec<StoredObject>,
        text: Vec<String>,
        stop_after: Option<usize>,
    }

    impl FetchSink for Collect {
        fn progress(&mut self, text: &str) -> Result<(), Interrupted> {
            self.text.push(text.to_string());
            Ok(())
        }

        fn receive(&mut self, object: StoredObject, _: u64) -> Result<(), Interrupted> {
            self.objects.push(object);
            match self.stop_after {
                Some(n) if self.objects.len() >= n => Err(Interrupted),
                _ => Ok(()),
            }
        }
    }

    #[derive(Default)]
    struct Quiet;

    impl PushObserver for Quiet {
        fn progress(&mut self, _: &str) -> Result<(), Interrupted> {
            Ok(())
        }

        fn sent(&mut self, _: u64, _: u64, _: u64) -> Result<(), Interrupted> {
            Ok(())
        }
    }

    struct Repo {
        objects: Arc<InMemoryObjectStore>,
        refs: Arc<InMemoryRefStore>,
        tree: ObjectId,
    }

    impl Repo {
        fn new() -> Self {
            let objects = Arc::new(InMemoryObjectStore::new());
            let tree = objects.write(&StoredObject::tree(vec![])).unwrap();
            Self {
                objects,
                refs: Arc::new(InMemoryRefStore::new()),
                tree,
            }
        }

        fn commit(&self, parents: &[ObjectId], msg: &str) -> ObjectId {
            self.objects.write(&StoredObject::commit(parents, self.tree, msg)).unwrap()
        }

        fn endpoint(&self) -> PeerEndpoint {
            PeerEndpoint::new(self.objects.clone(), self.refs.clone())
        }
    }

    #[test]
    fn advertises_all_refs() {
        let repo = Repo::new();
        let c = repo.commit(&[], "one");
        repo.refs.write_ref("refs/heads/main", c).unwrap();
        repo.refs.write_ref("refs/tags/v1", c).unwrap();
        let adv = repo.endpoint().advertised_refs().unwrap();
        assert_eq!(adv.len(), 2);
        assert_eq!(adv[0], AdvertisedRef::new("refs/heads/main", c));
    }

    #[test]
    fn fetch_pack_sends_only_new_objects() {
        let repo = Repo::new();
        let one = repo.commit(&[], "one");
        let two = repo.commit(&[one], "two");
        let mut sink = Collect::default();
        repo.endpoint().fetch_pack(&[two], &[one], &mut sink).unwrap();
        assert_eq!(sink.objects.len(), 1);
        assert_eq!(sink.objects[0].compute_id(), two);
        assert!(sink.text[0].starts_with("Counting objects: 1"));
    }

    #[test]
    fn fetch_pack_stops_when_interrupted() {
        let repo = Repo::new();
        let one = repo.commit(&[], "one");
        let mut sink = Collect {
            stop_after: Some(1),
            ..Collect::default()
        };
        let err = repo.endpoint().fetch_pack(&[one], &[], &mut sink).unwrap_err();
        assert_eq!(err, TransportError::Interrupted);
        assert_eq!(sink.objects.len(), 1);
        assert_eq!(sink.text.len(), 1);
    }

    #[test]
    fn push_fast_forward_accepted() {
        let repo = Repo::new();
        let one = repo.commit(&[], "one");
        repo.refs.write_ref("refs/heads/main", one).unwrap();

        let two = StoredObject::commit(&[one], repo.tree, "two");
        let two_id = two.compute_id();
        let cmd = RefUpdateCommand {
            name: "refs/heads/main".into(),
            old: one,
            new: two_id,
            force: false,
        };
        let report = repo.endpoint().send_pack(vec![two], &[cmd], &mut Quiet).unwrap();
        assert!(report.unpack_ok);
        assert_eq!(report.statuses, vec![PushStatus::accepted("refs/heads/main")]);
        assert_eq!(repo.refs.read_ref("refs/heads/main").unwrap(), Some(two_id));
    }

    #[test]
    fn push_non_fast_forward_rejected() {
        let repo = Repo::new();
        let base = repo.commit(&[], "base");
        let theirs = repo.commit(&[base], "theirs");
        repo.refs.write_ref("refs/heads/feature", theirs).unwrap();

        let ours = StoredObject::commit(&[base], repo.tree, "ours");
        let cmd = RefUpdateCommand {
            name: "refs/heads/feature".into(),
            old: theirs,
            new: ours.compute_id(),
            force: false,
        };
        let report = repo.endpoint().send_pack(vec![ours.clone()], &[cmd.clone()], &mut Quiet).unwrap();
        assert_eq!(
            report.statuses,
            vec![PushStatus::rejected("refs/heads/feature", "non-fast-forward")]
        );
        assert_eq!(repo.refs.read_ref("refs/heads/feature").unwrap(), Some(theirs));

        let forced = RefUpdateCommand { force: true, ..cmd };
        let report = repo.endpoint().send_pack(vec![ours], &[forced], &mut Quiet).unwrap();
        assert!(!report.statuses[0].is_rejected());
    }

    #[test]
    fn push_stale_expectation_rejected() {
        let repo = Repo::new();
        let one = repo.commit(&[], "one");
        repo.refs.write_ref("refs/heads/main", one).unwrap();
        let cmd = RefUpdateCommand {
            name: "refs/heads/main".into(),
            old: ObjectId::ZERO,
            new: one,
            force: true,
        };
        let report = repo.endpoint().send_pack(vec![], &[cmd], &mut Quiet).unwrap();
        assert_eq!(report.statuses[0].message.as_deref(), Some("stale info"));
    }

    #[test]
    fn push_with_dangling_link_fails_unpack() {
        let repo = Repo::new();
        let orphan = StoredObject::commit(&[ObjectId::from_bytes(b"unknown parent")], repo.tree, "orphan");
        let cmd = RefUpdateCommand {
            name: "refs/heads/main".into(),
            old: ObjectId::ZERO,
            new: orphan.compute_id(),
            force: false,
        };
        let report = repo.endpoint().send_pack(vec![orphan], &[cmd], &mut Quiet).unwrap();
        assert!(!report.unpack_ok);
        assert!(report.unpack_message.unwrap().contains("missing object"));
        assert!(repo.refs.read_ref("refs/heads/main").unwrap().is_none());
    }

    #[test]
    fn push_delete() {
        let repo = Repo::new();
        let one = repo.commit(&[], "one");
        repo.refs.write_ref("refs/heads/old", one).unwrap();
        let cmd = RefUpdateCommand {
            name: "refs/heads/old".into(),
            old: one,
            new: ObjectId::ZERO,
            force: false,
        };
        let report = repo.endpoint().send_pack(vec![], &[cmd], &mut Quiet).unwrap();
        assert!(!report.statuses[0].is_rejected());
        assert!(repo.refs.read_ref("refs/heads/old").unwrap().is_none());
    }
}

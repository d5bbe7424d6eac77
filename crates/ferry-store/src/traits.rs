use std::collections::{HashSet, VecDeque};

use ferry_types::ObjectId;

use crate::error::{StoreError, StoreResult};
use crate::object::{ObjectKind, StoredObject};

/// Content-addressed object store.
///
/// All implementations must satisfy these invariants:
/// - Objects are immutable once written; the same object always produces
///   the same id.
/// - Writing an object that already exists is a no-op.
/// - Concurrent reads are always safe.
/// - All I/O errors are propagated, never silently ignored.
pub trait ObjectStore: Send + Sync {
    /// Read an object by id. Returns `Ok(None)` if it does not exist.
    fn read(&self, id: &ObjectId) -> StoreResult<Option<StoredObject>>;

    /// Write an object and return its id.
    fn write(&self, object: &StoredObject) -> StoreResult<ObjectId>;

    fn exists(&self, id: &ObjectId) -> StoreResult<bool>;

    /// Read an object that must exist.
    fn require(&self, id: &ObjectId) -> StoreResult<StoredObject> {
        self.read(id)?.ok_or(StoreError::NotFound(*id))
    }

    /// Every object reachable from `roots` (roots included) that is not
    /// reachable from `known`, in breadth-first order.
    ///
    /// Ids in `known` that this store does not have are ignored. A missing
    /// object on the `roots` side is an error.
    fn objects_between(&self, roots: &[ObjectId], known: &[ObjectId]) -> StoreResult<Vec<ObjectId>> {
        let mut excluded = HashSet::new();
        let mut queue: VecDeque<ObjectId> = VecDeque::new();
        for id in known {
            if !id.is_null() && self.exists(id)? && excluded.insert(*id) {
                queue.push_back(*id);
            }
        }
        while let Some(id) = queue.pop_front() {
            if let Some(obj) = self.read(&id)? {
                for link in obj.links {
                    if excluded.insert(link) {
                        queue.push_back(link);
                    }
                }
            }
        }

        let mut seen = HashSet::new();
        let mut order = Vec::new();
        for id in roots {
            if !id.is_null() && !excluded.contains(id) && seen.insert(*id) {
                queue.push_back(*id);
            }
        }
        while let Some(id) = queue.pop_front() {
            let obj = self.require(&id)?;
            order.push(id);
            for link in obj.links {
                if !excluded.contains(&link) && seen.insert(link) {
                    queue.push_back(link);
                }
            }
        }
        Ok(order)
    }

    /// Whether `ancestor` is reachable from `descendant` through commit
    /// links. Every commit is its own descendant.
    fn is_descendant_of(&self, descendant: &ObjectId, ancestor: &ObjectId) -> StoreResult<bool> {
        if descendant == ancestor {
            return Ok(true);
        }
        if descendant.is_null() || ancestor.is_null() {
            return Ok(false);
        }
        let mut seen = HashSet::new();
        let mut queue = VecDeque::from([*descendant]);
        while let Some(id) = queue.pop_front() {
            let Some(obj) = self.read(&id)? else {
                continue;
            };
            if obj.kind != ObjectKind::Commit {
                continue;
            }
            for link in obj.links {
                if link == *ancestor {
                    return Ok(true);
                }
                if seen.insert(link) {
                    queue.push_back(link);
                }
            }
        }
        Ok(false)
    }

    /// Links of `id` that are not in this store. An absent `id` is itself
    /// reported.
    fn missing_links(&self, id: &ObjectId) -> StoreResult<Vec<ObjectId>> {
        let Some(obj) = self.read(id)? else {
            return Ok(vec![*id]);
        };
        let mut missing = Vec::new();
        for link in obj.links {
            if !self.exists(&link)? {
                missing.push(link);
            }
        }
        Ok(missing)
    }
}

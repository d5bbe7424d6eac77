use std::collections::HashMap;
use std::sync::RwLock;

use ferry_types::ObjectId;

use crate::error::{StoreError, StoreResult};
use crate::object::StoredObject;
use crate::traits::ObjectStore;

/// In-memory, HashMap-based object store.
///
/// Intended for tests and transient repositories. Objects are cloned on
/// read and write.
#[derive(Default)]
pub struct InMemoryObjectStore {
    objects: RwLock<HashMap<ObjectId, StoredObject>>,
}

impl InMemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of objects currently stored.
    pub fn len(&self) -> usize {
        self.objects.read().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sorted list of all object ids in the store.
    pub fn all_ids(&self) -> Vec<ObjectId> {
        let mut ids: Vec<ObjectId> = self
            .objects
            .read()
            .map(|m| m.keys().copied().collect())
            .unwrap_or_default();
        ids.sort();
        ids
    }
}

fn poisoned<E: std::fmt::Display>(e: E) -> StoreError {
    StoreError::Serialization(format!("lock poisoned: {e}"))
}

impl ObjectStore for InMemoryObjectStore {
    fn read(&self, id: &ObjectId) -> StoreResult<Option<StoredObject>> {
        let map = self.objects.read().map_err(poisoned)?;
        Ok(map.get(id).cloned())
    }

    fn write(&self, object: &StoredObject) -> StoreResult<ObjectId> {
        let id = object.compute_id();
        let mut map = self.objects.write().map_err(poisoned)?;
        map.entry(id).or_insert_with(|| object.clone());
        Ok(id)
    }

    fn exists(&self, id: &ObjectId) -> StoreResult<bool> {
        let map = self.objects.read().map_err(poisoned)?;
        Ok(map.contains_key(id))
    }
}

impl std::fmt::Debug for InMemoryObjectStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryObjectStore")
            .field("object_count", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_and_read() {
        let store = InMemoryObjectStore::new();
        let obj = StoredObject::blob("hello world");
        let id = store.write(&obj).unwrap();
        assert_eq!(store.read(&id).unwrap(), Some(obj));
        assert!(store.exists(&id).unwrap());
    }

    #[test]
    fn write_is_idempotent() {
        let store = InMemoryObjectStore::new();
        let obj = StoredObject::blob("same");
        assert_eq!(store.write(&obj).unwrap(), store.write(&obj).unwrap());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn missing_object() {
        let store = InMemoryObjectStore::new();
        let id = ObjectId::from_bytes(b"missing");
        assert!(store.read(&id).unwrap().is_none());
        assert!(matches!(store.require(&id), Err(StoreError::NotFound(_))));
    }

    #[test]
    fn all_ids_is_sorted() {
        let store = InMemoryObjectStore::new();
        for data in ["a", "b", "c"] {
            store.write(&StoredObject::blob(data)).unwrap();
        }
        let ids = store.all_ids();
        assert_eq!(ids.len(), 3);
        assert!(ids.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn kind_and_links_change_the_id() {
        let store = InMemoryObjectStore::new();
        let blob = store.write(&StoredObject::blob("x")).unwrap();
        let tree = store.write(&StoredObject::tree(vec![blob])).unwrap();
        let first = store.write(&StoredObject::commit(&[], tree, "x")).unwrap();
        let second = store.write(&StoredObject::commit(&[first], tree, "x")).unwrap();

        assert_ne!(first, second);
        assert_ne!(blob, first);
        assert_eq!(store.read(&second).unwrap().unwrap().links, vec![first, tree]);
        assert_eq!(store.len(), 4);
    }
}

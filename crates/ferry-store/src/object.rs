use serde::{Deserialize, Serialize};

use ferry_types::ObjectId;

/// The kind of object stored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectKind {
    /// A snapshot with parents. Ancestry follows commit links.
    Commit,
    /// Directory listing.
    Tree,
    /// Raw content.
    Blob,
    /// Annotated tag pointing at another object.
    Tag,
}

impl ObjectKind {
    /// Domain tag prepended to every hash of this kind, so identical bytes
    /// of different kinds never share an id.
    fn domain(self) -> &'static str {
        match self {
            Self::Commit => "ferry-commit-v1",
            Self::Tree => "ferry-tree-v1",
            Self::Blob => "ferry-blob-v1",
            Self::Tag => "ferry-tag-v1",
        }
    }
}

impl std::fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Commit => write!(f, "commit"),
            Self::Tree => write!(f, "tree"),
            Self::Blob => write!(f, "blob"),
            Self::Tag => write!(f, "tag"),
        }
    }
}

/// The unit of storage: kind tag, outgoing links, opaque payload.
///
/// For a commit the links are its parents followed by its tree; for a tree
/// they are its entries; for a tag the tagged object. Blobs have none.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredObject {
    pub kind: ObjectKind,
    pub links: Vec<ObjectId>,
    pub data: Vec<u8>,
}

impl StoredObject {
    pub fn new(kind: ObjectKind, links: Vec<ObjectId>, data: Vec<u8>) -> Self {
        Self { kind, links, data }
    }

    pub fn blob(data: impl Into<Vec<u8>>) -> Self {
        Self::new(ObjectKind::Blob, Vec::new(), data.into())
    }

    pub fn tree(entries: Vec<ObjectId>) -> Self {
        Self::new(ObjectKind::Tree, entries, Vec::new())
    }

    /// A commit with the given parents and tree, carrying `message` as its
    /// payload.
    pub fn commit(parents: &[ObjectId], tree: ObjectId, message: impl Into<Vec<u8>>) -> Self {
        let mut links = parents.to_vec();
        links.push(tree);
        Self::new(ObjectKind::Commit, links, message.into())
    }

    pub fn tag(target: ObjectId, name: impl Into<Vec<u8>>) -> Self {
        Self::new(ObjectKind::Tag, vec![target], name.into())
    }

    /// Size on the wire: payload plus links.
    pub fn size(&self) -> u64 {
        (self.data.len() + self.links.len() * ferry_types::object::OID_LEN) as u64
    }

    /// Compute the content-addressed id of this object.
    pub fn compute_id(&self) -> ObjectId {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.kind.domain().as_bytes());
        hasher.update(b":");
        hasher.update(&(self.links.len() as u32).to_le_bytes());
        for link in &self.links {
            hasher.update(link.as_bytes());
        }
        hasher.update(&self.data);
        ObjectId::from_hash(*hasher.finalize().as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_is_part_of_identity() {
        let blob = StoredObject::new(ObjectKind::Blob, vec![], b"x".to_vec());
        let tag = StoredObject::new(ObjectKind::Tag, vec![], b"x".to_vec());
        assert_ne!(blob.compute_id(), tag.compute_id());
    }

    #[test]
    fn links_are_part_of_identity() {
        let tree = StoredObject::tree(vec![]).compute_id();
        let a = StoredObject::commit(&[], tree, "msg");
        let b = StoredObject::commit(&[a.compute_id()], tree, "msg");
        assert_ne!(a.compute_id(), b.compute_id());
    }

    #[test]
    fn id_is_deterministic_and_not_null() {
        let a = StoredObject::blob("hello");
        assert_eq!(a.compute_id(), StoredObject::blob("hello").compute_id());
        assert!(!a.compute_id().is_null());
    }

    #[test]
    fn commit_links_parents_then_tree() {
        let p = ObjectId::from_bytes(b"p");
        let t = ObjectId::from_bytes(b"t");
        let c = StoredObject::commit(&[p], t, "m");
        assert_eq!(c.links, vec![p, t]);
        assert_eq!(c.size(), 1 + 64);
    }
}

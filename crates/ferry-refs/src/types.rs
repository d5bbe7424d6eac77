//! Ref transaction types.

use ferry_types::ObjectId;

/// One change to a ref, applied as part of a [`RefStore::transaction`].
///
/// `expected` guards the change: `None` applies unconditionally,
/// `Some(ObjectId::ZERO)` requires that the ref does not exist yet, and any
/// other value requires the current tip to be exactly that id. A `new` value
/// of [`ObjectId::ZERO`] deletes the ref.
///
/// [`RefStore::transaction`]: crate::traits::RefStore::transaction
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RefEdit {
    pub name: String,
    pub expected: Option<ObjectId>,
    pub new: ObjectId,
}

impl RefEdit {
    /// Unconditionally point `name` at `new`.
    pub fn force(name: impl Into<String>, new: ObjectId) -> Self {
        Self {
            name: name.into(),
            expected: None,
            new,
        }
    }

    /// Move `name` from `old` to `new`; fails if the ref has moved meanwhile.
    pub fn checked(name: impl Into<String>, old: ObjectId, new: ObjectId) -> Self {
        Self {
            name: name.into(),
            expected: Some(old),
            new,
        }
    }

    /// Delete `name` unconditionally.
    pub fn delete(name: impl Into<String>) -> Self {
        Self::force(name, ObjectId::ZERO)
    }

    pub fn is_delete(&self) -> bool {
        self.new.is_null()
    }
}

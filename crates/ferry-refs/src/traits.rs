//! The [`RefStore`] trait defining the reference storage interface.
//!
//! Any backend (in-memory, file, database) implements this trait to give a
//! transfer session the tips it compares against and the atomic update it
//! commits with.

use std::collections::{BTreeMap, HashSet};

use ferry_types::ObjectId;

use crate::error::{RefError, Result};
use crate::names::validate_ref_name;
use crate::types::RefEdit;

/// Storage backend for named references.
///
/// Implementations must be thread-safe (`Send + Sync`). `transaction` is the
/// only mutating primitive and must be all-or-nothing: either every edit is
/// applied or the store is left exactly as it was.
pub trait RefStore: Send + Sync {
    /// Read the tip of a ref by its full name (e.g. "refs/heads/main").
    ///
    /// Returns `Ok(None)` if the ref does not exist.
    fn read_ref(&self, name: &str) -> Result<Option<ObjectId>>;

    /// List all refs whose name starts with `prefix`, sorted by name.
    ///
    /// Pass `""` to list all refs.
    fn list_refs(&self, prefix: &str) -> Result<Vec<(String, ObjectId)>>;

    /// Apply every edit or none of them.
    fn transaction(&self, edits: &[RefEdit]) -> Result<()>;

    /// Point a ref at `new` regardless of its current tip.
    fn write_ref(&self, name: &str, new: ObjectId) -> Result<()> {
        self.transaction(&[RefEdit::force(name, new)])
    }

    /// Move a ref from `old` to `new` (compare-and-swap).
    fn update_ref(&self, name: &str, old: ObjectId, new: ObjectId) -> Result<()> {
        self.transaction(&[RefEdit::checked(name, old, new)])
    }

    /// Delete a ref. Returns `true` if it existed.
    fn delete_ref(&self, name: &str) -> Result<bool> {
        let existed = self.read_ref(name)?.is_some();
        if existed {
            self.transaction(&[RefEdit::delete(name)])?;
        }
        Ok(existed)
    }

    /// Tip of a ref, or the zero id if it does not exist.
    fn tip_or_zero(&self, name: &str) -> Result<ObjectId> {
        Ok(self.read_ref(name)?.unwrap_or(ObjectId::ZERO))
    }

    /// List all local branches.
    fn branches(&self) -> Result<Vec<(String, ObjectId)>> {
        self.list_refs("refs/heads/")
    }

    /// List the tracking refs of one remote.
    fn remote_tracking(&self, remote: &str) -> Result<Vec<(String, ObjectId)>> {
        self.list_refs(&format!("refs/remotes/{remote}/"))
    }
}

/// Validate `edits` against `refs` and apply them.
///
/// Every check runs before the first mutation, so on error `refs` is
/// untouched.
pub(crate) fn apply_edits(refs: &mut BTreeMap<String, ObjectId>, edits: &[RefEdit]) -> Result<()> {
    let mut seen = HashSet::with_capacity(edits.len());
    for edit in edits {
        validate_ref_name(&edit.name)?;
        if !seen.insert(edit.name.as_str()) {
            return Err(RefError::DuplicateEdit {
                name: edit.name.clone(),
            });
        }
        if let Some(expected) = edit.expected {
            let actual = refs.get(&edit.name).copied().unwrap_or(ObjectId::ZERO);
            if actual != expected {
                return Err(RefError::Stale {
                    name: edit.name.clone(),
                    expected,
                    actual,
                });
            }
        }
    }

    for edit in edits {
        if edit.is_delete() {
            refs.remove(&edit.name);
        } else {
            refs.insert(edit.name.clone(), edit.new);
        }
    }
    Ok(())
}

pub(crate) fn collect_prefix(refs: &BTreeMap<String, ObjectId>, prefix: &str) -> Vec<(String, ObjectId)> {
    refs.range(prefix.to_string()..)
        .take_while(|(k, _)| k.starts_with(prefix))
        .map(|(k, v)| (k.clone(), *v))
        .collect()
}

use serde::{Deserialize, Serialize};

use ferry_types::ObjectId;

/// A ref as the peer advertises it at the start of a session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdvertisedRef {
    pub name: String,
    pub oid: ObjectId,
}

impl AdvertisedRef {
    pub fn new(name: impl Into<String>, oid: ObjectId) -> Self {
        Self { name: name.into(), oid }
    }
}

/// One ref update requested of the peer during push.
///
/// `old` is the tip the pusher believes the peer has (zero if the ref is
/// new); `new` is zero for a delete.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefUpdateCommand {
    pub name: String,
    pub old: ObjectId,
    pub new: ObjectId,
    pub force: bool,
}

impl RefUpdateCommand {
    pub fn is_delete(&self) -> bool {
        self.new.is_null()
    }
}

/// The peer's verdict on one ref of a push. `message` is `None` when the
/// update was accepted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushStatus {
    pub ref_name: String,
    pub message: Option<String>,
}

impl PushStatus {
    pub fn accepted(ref_name: impl Into<String>) -> Self {
        Self {
            ref_name: ref_name.into(),
            message: None,
        }
    }

    pub fn rejected(ref_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            ref_name: ref_name.into(),
            message: Some(message.into()),
        }
    }

    pub fn is_rejected(&self) -> bool {
        self.message.is_some()
    }
}

/// Everything the peer reports back after receiving a push.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushReport {
    pub unpack_ok: bool,
    pub unpack_message: Option<String>,
    pub statuses: Vec<PushStatus>,
}

/// Running counters of a fetch.
///
/// During push the same structure reports packing progress: objects packed
/// so far in `indexed_objects`, objects sent in `received_objects`, bytes
/// sent in `received_bytes`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferStats {
    pub indexed_objects: u64,
    pub received_objects: u64,
    pub received_bytes: u64,
}

/// A tip change applied (or about to be applied) to a local ref.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TipUpdate {
    pub name: String,
    pub old: ObjectId,
    pub new: ObjectId,
}

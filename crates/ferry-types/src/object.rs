use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Length in bytes of an [`ObjectId`].
pub const OID_LEN: usize = 32;

/// Content-addressed identifier of an object, and the value a ref tip holds.
///
/// Identical content always produces the same id. The all-zero id is the
/// sentinel for "no object": a ref that does not exist yet has the zero id as
/// its old tip, and a push that deletes a ref sends the zero id as new tip.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectId([u8; OID_LEN]);

impl ObjectId {
    /// The zero id.
    pub const ZERO: Self = Self([0u8; OID_LEN]);

    /// Hash raw bytes into an id.
    pub fn from_bytes(data: &[u8]) -> Self {
        Self(*blake3::hash(data).as_bytes())
    }

    /// Wrap an already computed hash.
    pub const fn from_hash(hash: [u8; OID_LEN]) -> Self {
        Self(hash)
    }

    /// The zero id. Represents "no object".
    pub const fn null() -> Self {
        Self::ZERO
    }

    pub fn is_null(&self) -> bool {
        self.0 == [0u8; OID_LEN]
    }

    pub fn as_bytes(&self) -> &[u8; OID_LEN] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// First 8 hex characters, for log lines and progress output.
    pub fn short_hex(&self) -> String {
        hex::encode(&self.0[..4])
    }

    pub fn from_hex(s: &str) -> Result<Self, TypeError> {
        let bytes = hex::decode(s).map_err(|e| TypeError::InvalidHex(e.to_string()))?;
        let arr: [u8; OID_LEN] = bytes.as_slice().try_into().map_err(|_| TypeError::InvalidLength {
            expected: OID_LEN,
            actual: bytes.len(),
        })?;
        Ok(Self(arr))
    }
}

impl Default for ObjectId {
    fn default() -> Self {
        Self::ZERO
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectId({})", self.short_hex())
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl FromStr for ObjectId {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl From<[u8; OID_LEN]> for ObjectId {
    fn from(bytes: [u8; OID_LEN]) -> Self {
        Self(bytes)
    }
}

impl From<ObjectId> for [u8; OID_LEN] {
    fn from(id: ObjectId) -> Self {
        id.0
    }
}

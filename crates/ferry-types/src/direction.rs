use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Which way refs and objects move.
///
/// A refspec is parsed for one direction and keeps it for its whole life; a
/// transfer session runs in exactly one direction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Peer to local.
    Fetch,
    /// Local to peer.
    Push,
}

impl Direction {
    pub fn is_fetch(&self) -> bool {
        matches!(self, Self::Fetch)
    }

    pub fn is_push(&self) -> bool {
        matches!(self, Self::Push)
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fetch => write!(f, "fetch"),
            Self::Push => write!(f, "push"),
        }
    }
}

impl FromStr for Direction {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fetch" => Ok(Self::Fetch),
            "push" => Ok(Self::Push),
            other => Err(TypeError::UnknownDirection(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_and_parse_agree() {
        for dir in [Direction::Fetch, Direction::Push] {
            let parsed: Direction = dir.to_string().parse().unwrap();
            assert_eq!(parsed, dir);
        }
    }

    #[test]
    fn unknown_direction_rejected() {
        let err = "pull".parse::<Direction>().unwrap_err();
        assert_eq!(err, TypeError::UnknownDirection("pull".into()));
    }

    #[test]
    fn predicates() {
        assert!(Direction::Fetch.is_fetch());
        assert!(!Direction::Fetch.is_push());
        assert!(Direction::Push.is_push());
    }

    #[test]
    fn serde_uses_lowercase() {
        let json = serde_json::to_string(&Direction::Push).unwrap();
        assert_eq!(json, "\"push\"");
    }
}

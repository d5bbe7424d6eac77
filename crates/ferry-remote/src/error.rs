use std::fmt;

use thiserror::Error;

use ferry_config::ConfigError;
use ferry_refs::RefError;
use ferry_refspec::RefspecError;
use ferry_transfer::{CallbackError, TransferError};

/// The category of a [`RemoteError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    InvalidName,
    InvalidRefspec,
    InvalidUrl,
    NoMatch,
    IndexOutOfRange,
    Callback,
    Network,
    UnpackFailure,
    PushRejected,
    Io,
    OutOfMemory,
    Storage,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::NotFound => "not-found",
            Self::InvalidName => "invalid-name",
            Self::InvalidRefspec => "invalid-refspec",
            Self::InvalidUrl => "invalid-url",
            Self::NoMatch => "no-match",
            Self::IndexOutOfRange => "index-out-of-range",
            Self::Callback => "callback",
            Self::Network => "network",
            Self::UnpackFailure => "unpack-failure",
            Self::PushRejected => "push-rejected",
            Self::Io => "io",
            Self::OutOfMemory => "out-of-memory",
            Self::Storage => "storage",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid name {name:?}: {reason}")]
    InvalidName { name: String, reason: String },

    #[error("invalid refspec {spec:?}{}: {reason}", at_index(.index))]
    InvalidRefspec {
        index: Option<usize>,
        spec: String,
        reason: String,
    },

    #[error("invalid URL {0:?}")]
    InvalidUrl(String),

    #[error("{0}")]
    NoMatch(String),

    #[error("refspec index {index} out of range (count {count})")]
    IndexOutOfRange { index: usize, count: usize },

    #[error("callback error: {0}")]
    Callback(CallbackError),

    #[error("network error: {0}")]
    Network(String),

    #[error("peer failed to unpack: {0}")]
    UnpackFailure(String),

    #[error("push rejected: {ref_name}: {message}")]
    PushRejected { ref_name: String, message: String },

    #[error("I/O error: {0}")]
    Io(String),

    #[error("out of memory: {0}")]
    OutOfMemory(String),

    #[error("storage error: {0}")]
    Storage(String),
}

impl RemoteError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::InvalidName { .. } => ErrorKind::InvalidName,
            Self::InvalidRefspec { .. } => ErrorKind::InvalidRefspec,
            Self::InvalidUrl(_) => ErrorKind::InvalidUrl,
            Self::NoMatch(_) => ErrorKind::NoMatch,
            Self::IndexOutOfRange { .. } => ErrorKind::IndexOutOfRange,
            Self::Callback(_) => ErrorKind::Callback,
            Self::Network(_) => ErrorKind::Network,
            Self::UnpackFailure(_) => ErrorKind::UnpackFailure,
            Self::PushRejected { .. } => ErrorKind::PushRejected,
            Self::Io(_) => ErrorKind::Io,
            Self::OutOfMemory(_) => ErrorKind::OutOfMemory,
            Self::Storage(_) => ErrorKind::Storage,
        }
    }

    pub(crate) fn refspec_at(index: Option<usize>, err: RefspecError) -> Self {
        match err {
            RefspecError::Invalid { spec, reason } => Self::InvalidRefspec { index, spec, reason },
            other => other.into(),
        }
    }
}

impl From<RefspecError> for RemoteError {
    fn from(e: RefspecError) -> Self {
        match e {
            RefspecError::Invalid { spec, reason } => Self::InvalidRefspec {
                index: None,
                spec,
                reason,
            },
            RefspecError::NoMatch { .. } | RefspecError::NoDestination { .. } => Self::NoMatch(e.to_string()),
            RefspecError::BufferTooSmall { .. } | RefspecError::CapacityExceeded { .. } => {
                Self::OutOfMemory(e.to_string())
            }
            RefspecError::Encoding(msg) => Self::Storage(msg),
        }
    }
}

impl From<TransferError> for RemoteError {
    fn from(e: TransferError) -> Self {
        match e {
            TransferError::Callback(cb) => Self::Callback(cb),
            TransferError::Network(msg) => Self::Network(msg),
            TransferError::UnsupportedScheme(scheme) => Self::InvalidUrl(format!("unsupported scheme {scheme}")),
            TransferError::UnpackFailure(msg) => Self::UnpackFailure(msg),
            TransferError::PushRejected { ref_name, message } => Self::PushRejected { ref_name, message },
            TransferError::NoMatchingSource { .. } => Self::NotFound(e.to_string()),
            TransferError::Refspec(inner) => inner.into(),
            TransferError::Refs(inner) => inner.into(),
            TransferError::Store(_) | TransferError::InvalidState { .. } => Self::Storage(e.to_string()),
        }
    }
}

impl From<ConfigError> for RemoteError {
    fn from(e: ConfigError) -> Self {
        match e {
            ConfigError::NotFound { name } => Self::NotFound(format!("remote {name}")),
            ConfigError::AlreadyExists { name } => Self::InvalidName {
                name,
                reason: "a remote with that name already exists".into(),
            },
            other => Self::Io(other.to_string()),
        }
    }
}

impl From<RefError> for RemoteError {
    fn from(e: RefError) -> Self {
        match e {
            RefError::InvalidName { name, reason } => Self::InvalidName { name, reason },
            other => Self::Storage(other.to_string()),
        }
    }
}

impl From<ferry_store::StoreError> for RemoteError {
    fn from(e: ferry_store::StoreError) -> Self {
        Self::Storage(e.to_string())
    }
}

pub type RemoteResult<T> = Result<T, RemoteError>;

fn at_index(index: &Option<usize>) -> String {
    match index {
        Some(i) => format!(" at index {i}"),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transfer_errors_keep_their_kind() {
        let cases: Vec<(TransferError, ErrorKind)> = vec![
            (TransferError::Callback(CallbackError::new("x")), ErrorKind::Callback),
            (TransferError::Network("reset".into()), ErrorKind::Network),
            (TransferError::UnpackFailure("bad".into()), ErrorKind::UnpackFailure),
            (
                TransferError::PushRejected {
                    ref_name: "refs/heads/a".into(),
                    message: "non-fast-forward".into(),
                },
                ErrorKind::PushRejected,
            ),
            (
                TransferError::NoMatchingSource {
                    refspec: "refs/heads/x".into(),
                },
                ErrorKind::NotFound,
            ),
            (TransferError::UnsupportedScheme("ssh".into()), ErrorKind::InvalidUrl),
        ];
        for (err, kind) in cases {
            assert_eq!(RemoteError::from(err).kind(), kind);
        }
    }

    #[test]
    fn refspec_errors() {
        let e: RemoteError = RefspecError::CapacityExceeded { limit: 1, attempts: 1 }.into();
        assert_eq!(e.kind(), ErrorKind::OutOfMemory);
        let e: RemoteError = RefspecError::NoMatch {
            name: "a".into(),
            pattern: "b".into(),
        }
        .into();
        assert_eq!(e.kind(), ErrorKind::NoMatch);

        let e = RemoteError::refspec_at(
            Some(2),
            RefspecError::Invalid {
                spec: "bad spec".into(),
                reason: "whitespace".into(),
            },
        );
        assert!(matches!(e, RemoteError::InvalidRefspec { index: Some(2), .. }));
        assert!(e.to_string().contains("at index 2"));
    }

    #[test]
    fn config_errors() {
        let e: RemoteError = ConfigError::AlreadyExists { name: "origin".into() }.into();
        assert_eq!(e.kind(), ErrorKind::InvalidName);
        let e: RemoteError = ConfigError::Io(std::io::Error::other("disk full")).into();
        assert_eq!(e.kind(), ErrorKind::Io);
    }

    #[test]
    fn kind_display() {
        assert_eq!(ErrorKind::PushRejected.to_string(), "push-rejected");
    }
}

use thiserror::Error;

use ferry_refs::RefError;
use ferry_refspec::RefspecError;
use ferry_store::StoreError;

use crate::callbacks::CallbackError;
use crate::session::SessionState;

/// Failure reported by a [`Connection`](crate::transport::Connection).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("network error: {0}")]
    Network(String),

    /// The local side asked the transport to stop.
    #[error("transfer interrupted")]
    Interrupted,

    #[error("unsupported URL scheme: {0}")]
    UnsupportedScheme(String),
}

#[derive(Debug, Error)]
pub enum TransferError {
    #[error("callback error: {0}")]
    Callback(#[from] CallbackError),

    #[error("network error: {0}")]
    Network(String),

    #[error("unsupported URL scheme: {0}")]
    UnsupportedScheme(String),

    #[error("peer failed to unpack: {0}")]
    UnpackFailure(String),

    #[error("push rejected: {ref_name}: {message}")]
    PushRejected { ref_name: String, message: String },

    #[error("src refspec {refspec} does not match any local ref")]
    NoMatchingSource { refspec: String },

    #[error("invalid session transition from {from} to {to}")]
    InvalidState { from: SessionState, to: SessionState },

    #[error(transparent)]
    Refspec(#[from] RefspecError),

    #[error("object store error: {0}")]
    Store(#[from] StoreError),

    #[error("ref store error: {0}")]
    Refs(#[from] RefError),
}

impl From<TransportError> for TransferError {
    fn from(e: TransportError) -> Self {
        match e {
            TransportError::Network(msg) => Self::Network(msg),
            TransportError::Interrupted => Self::Network("transfer interrupted".into()),
            TransportError::UnsupportedScheme(s) => Self::UnsupportedScheme(s),
        }
    }
}

pub type TransferResult<T> = Result<T, TransferError>;

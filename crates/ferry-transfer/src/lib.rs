//! Fetch and push sessions for Ferry.
//!
//! A [`Controller`] drives one fetch or push from start to finish against a
//! [`Connection`] opened through the [`TransportRegistry`]:
//!
//! ```text
//! Idle -> Negotiating -> Transferring -> UpdatingTips -> Done
//!                                    \-> Finalizing -/        (push)
//! any non-terminal state -> Aborted
//! ```
//!
//! Progress and tip updates are reported through [`RemoteCallbacks`]. A
//! callback that returns an error aborts the session immediately and its
//! error is the result of the call. On push, per-ref results from the peer
//! are collected by a [`PushStatusAggregator`] and the first rejection
//! fails the push.
//!
//! [`PeerEndpoint`] serves a pair of local stores as a [`Connection`], which
//! is how repositories on the same machine talk to each other.

pub mod aggregator;
pub mod callbacks;
pub mod controller;
pub mod error;
pub mod negotiation;
pub mod peer;
pub mod session;
pub mod transport;
pub mod types;

pub use aggregator::PushStatusAggregator;
pub use callbacks::{CallbackError, RemoteCallbacks};
pub use controller::Controller;
pub use error::{TransferError, TransferResult, TransportError};
pub use negotiation::{FetchPlan, NegotiationEngine, PushPlan, RefMapping};
pub use peer::PeerEndpoint;
pub use session::{SessionOutcome, SessionState, TransferSession};
pub use transport::{Connection, FetchSink, Interrupted, PushObserver, TransportFactory, TransportRegistry};
pub use types::{AdvertisedRef, PushReport, PushStatus, RefUpdateCommand, TipUpdate, TransferStats};

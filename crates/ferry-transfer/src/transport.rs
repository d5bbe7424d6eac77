//! Transport interface for peer repositories.
//!
//! The transport owns the wire: handshake, negotiation format and object
//! stream. A session only sees the [`Connection`] surface below.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use ferry_store::StoredObject;
use ferry_types::{Direction, ObjectId};
use thiserror::Error;

use crate::error::TransportError;
use crate::types::{AdvertisedRef, PushReport, RefUpdateCommand};

/// Returned by a [`FetchSink`] or [`PushObserver`] to make the transport
/// stop. The transport must then return [`TransportError::Interrupted`]
/// without further I/O.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("interrupted by receiver")]
pub struct Interrupted;

impl From<Interrupted> for TransportError {
    fn from(_: Interrupted) -> Self {
        TransportError::Interrupted
    }
}

/// Receives the object stream of a fetch.
pub trait FetchSink {
    /// Free-form progress text from the peer.
    fn progress(&mut self, text: &str) -> Result<(), Interrupted>;

    /// One object as it arrives; `wire_bytes` is its size on the wire.
    fn receive(&mut self, object: StoredObject, wire_bytes: u64) -> Result<(), Interrupted>;
}

/// Observes the object stream of a push.
pub trait PushObserver {
    fn progress(&mut self, text: &str) -> Result<(), Interrupted>;

    /// `sent` of `total` objects have been sent, `bytes` in total so far.
    fn sent(&mut self, sent: u64, total: u64, bytes: u64) -> Result<(), Interrupted>;
}

/// An open session with one peer.
pub trait Connection {
    /// Refs the peer offers, with their current tips.
    fn advertised_refs(&mut self) -> Result<Vec<AdvertisedRef>, TransportError>;

    /// Ask for everything reachable from `wants` that is not reachable from
    /// `haves`, delivered to `sink`.
    fn fetch_pack(
        &mut self,
        wants: &[ObjectId],
        haves: &[ObjectId],
        sink: &mut dyn FetchSink,
    ) -> Result<(), TransportError>;

    /// Send `objects` and ask the peer to apply `commands`.
    fn send_pack(
        &mut self,
        objects: Vec<StoredObject>,
        commands: &[RefUpdateCommand],
        observer: &mut dyn PushObserver,
    ) -> Result<PushReport, TransportError>;
}

/// Opens connections for one URL scheme.
pub trait TransportFactory: Send + Sync {
    fn open(&self, url: &str, direction: Direction) -> Result<Box<dyn Connection>, TransportError>;
}

/// Transport factories keyed by URL scheme.
#[derive(Clone, Default)]
pub struct TransportRegistry {
    factories: BTreeMap<String, Arc<dyn TransportFactory>>,
}

impl TransportRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the factory for `scheme`.
    pub fn register(&mut self, scheme: impl Into<String>, factory: Arc<dyn TransportFactory>) {
        self.factories.insert(scheme.into(), factory);
    }

    pub fn schemes(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    pub fn open(&self, url: &str, direction: Direction) -> Result<Box<dyn Connection>, TransportError> {
        let scheme = url_scheme(url);
        let factory = self
            .factories
            .get(scheme)
            .ok_or_else(|| TransportError::UnsupportedScheme(scheme.to_string()))?;
        factory.open(url, direction)
    }
}

impl fmt::Debug for TransportRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportRegistry")
            .field("schemes", &self.factories.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Scheme of a URL. A URL without `://` is a local path (`file`).
pub fn url_scheme(url: &str) -> &str {
    match url.split_once("://") {
        Some((scheme, _)) => scheme,
        None => "file",
    }
}

/// The path part of a `file://` URL, or the URL itself if it is a bare path.
pub fn file_url_path(url: &str) -> &str {
    url.strip_prefix("file://").unwrap_or(url)
}

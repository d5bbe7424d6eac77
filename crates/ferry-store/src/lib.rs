//! Content-addressed object storage for Ferry.
//!
//! This is the object half of the storage collaborator a transfer session
//! talks to. Objects are immutable, identified by a domain-separated BLAKE3
//! hash of their kind, their links and their payload. The store interprets
//! exactly one thing about them: the links, which let it walk reachability
//! (what to send) and commit ancestry (fast-forward checks).
//!
//! # Storage Backends
//!
//! All backends implement the [`ObjectStore`] trait:
//!
//! - [`InMemoryObjectStore`] -- `HashMap`-based store for tests and embedding
//! - [`FileObjectStore`] -- one file per object under `objects/xx/`

pub mod error;
pub mod file;
pub mod memory;
pub mod object;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use file::FileObjectStore;
pub use memory::InMemoryObjectStore;
pub use object::{ObjectKind, StoredObject};
pub use traits::ObjectStore;

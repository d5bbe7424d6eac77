//! Repository handle and named remotes for Ferry.
//!
//! This is the caller-facing crate. A [`Repository`] bundles object
//! storage, ref storage, configuration and the transports it can reach
//! peers with; a [`Remote`] is one configured (or anonymous) peer with its
//! URLs, refspecs and callbacks, and is what fetch and push run on.
//!
//! ```
//! use ferry_remote::Repository;
//!
//! let repo = Repository::in_memory();
//! let mut origin = repo.create_remote("origin", "file:///srv/project").unwrap();
//! assert_eq!(
//!     origin.fetch_refspecs()[0].as_str(),
//!     "+refs/heads/*:refs/remotes/origin/*"
//! );
//! origin.add_push("refs/heads/main:refs/heads/main").unwrap();
//! origin.save().unwrap();
//! assert_eq!(repo.open_remote("origin").unwrap().refspec_count(), 2);
//! ```
//!
//! All failures are a [`RemoteError`]; [`RemoteError::kind`] names the
//! category without the payload.

pub mod error;
pub mod remote;
pub mod repository;
pub mod transport;

pub use error::{ErrorKind, RemoteError, RemoteResult};
pub use remote::Remote;
pub use repository::Repository;
pub use transport::FileTransport;

pub use ferry_refspec::Refspec;
pub use ferry_transfer::{CallbackError, RemoteCallbacks, TransferStats};
pub use ferry_types::{Direction, ObjectId};

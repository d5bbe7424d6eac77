//! Refspec engine for Ferry.
//!
//! A refspec maps ref names on one side of a transfer to ref names on the
//! other: `+refs/heads/*:refs/remotes/origin/*` fetches every branch of the
//! peer into the `origin` tracking namespace, allowing non-fast-forward
//! updates (the leading `+`).
//!
//! Each side is a [`Pattern`]: a ref name with at most one `*` wildcard. The
//! source and destination of one refspec either both carry a wildcard or
//! neither does. [`Refspec::transform`] maps a source-side name to its
//! destination-side name; [`Refspec::reverse_transform`] goes the other way.
//!
//! Transformation output is produced through a bounded-buffer primitive
//! ([`Refspec::transform_into`]) that never writes a partial result, and a
//! growing loop ([`buffer::grow`]) that retries with doubled capacity up to a
//! hard cap.

pub mod buffer;
pub mod error;
pub mod pattern;
pub mod refspec;

pub use buffer::{MAX_TRANSFORM_ATTEMPTS, MAX_TRANSFORM_LEN};
pub use error::{RefspecError, RefspecResult};
pub use pattern::Pattern;
pub use refspec::Refspec;

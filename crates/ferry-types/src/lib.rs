//! Foundation types for Ferry.
//!
//! Every other Ferry crate depends on `ferry-types`. It stays deliberately
//! small: the content address used to name objects and ref tips, and the
//! direction a refspec or a transfer session runs in.
//!
//! # Key Types
//!
//! - [`ObjectId`]: Content-addressed identifier (BLAKE3 hash), with the
//!   all-zero [`ObjectId::null`] sentinel for "no object"
//! - [`Direction`]: Fetch or push

pub mod direction;
pub mod error;
pub mod object;

pub use direction::Direction;
pub use error::TypeError;
pub use object::ObjectId;

//! Reference storage for Ferry.
//!
//! References are named pointers to object ids ("tips"). This crate is the
//! ref half of the storage collaborator a transfer session talks to: it
//! supplies old tips for comparison and applies tip updates atomically.
//!
//! # Namespaces
//!
//! - `refs/heads/*` for local branches
//! - `refs/tags/*` for tags
//! - `refs/remotes/{remote}/*` for remote tracking refs, only moved by fetch
//!   and by the tip update that follows a successful push
//!
//! # Modules
//!
//! - [`error`]: Error types for ref operations
//! - [`names`]: Ref name, ref pattern and remote name validation
//! - [`types`]: [`RefEdit`], one conditional change inside a transaction
//! - [`traits`]: The [`RefStore`] trait
//! - [`memory`]: [`InMemoryRefStore`] for tests and transient repositories
//! - [`file`]: [`FileRefStore`], a single JSON file on disk

pub mod error;
pub mod file;
pub mod memory;
pub mod names;
pub mod traits;
pub mod types;

pub use error::{RefError, Result};
pub use file::FileRefStore;
pub use memory::InMemoryRefStore;
pub use names::{validate_ref_name, validate_ref_pattern, validate_remote_name};
pub use traits::RefStore;
pub use types::RefEdit;

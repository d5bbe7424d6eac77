//! Remote configuration persistence for Ferry.
//!
//! A repository's configuration is a TOML document with one table per
//! remote:
//!
//! ```toml
//! [remote.origin]
//! url = "file:///srv/repos/project"
//! pushurl = "file:///srv/repos/project-push"
//! fetch = ["+refs/heads/*:refs/remotes/origin/*"]
//! push = ["refs/heads/main:refs/heads/main"]
//! ```
//!
//! Refspecs are stored as their text; parsing them is the caller's business.

pub mod error;
pub mod file;
pub mod memory;
pub mod remote;
pub mod traits;

pub use error::{ConfigError, ConfigResult};
pub use file::FileConfigStore;
pub use memory::InMemoryConfigStore;
pub use remote::{ConfigDocument, RemoteConfig};
pub use traits::ConfigStore;

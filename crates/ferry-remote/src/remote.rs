//! Named and anonymous remotes.

use std::fmt;

use ferry_config::RemoteConfig;
use ferry_refs::validate_remote_name;
use ferry_refspec::Refspec;
use ferry_transfer::{Controller, RemoteCallbacks, TransferStats};
use ferry_types::Direction;
use tracing::{debug, info};

use crate::error::{RemoteError, RemoteResult};
use crate::repository::Repository;

const ANONYMOUS: &str = "(anonymous)";

/// One peer repository as seen from a local [`Repository`].
///
/// A `Remote` borrows its repository for lookups and storage; it never
/// outlives it. URL and refspec changes stay in memory until [`save`]
/// writes them out. [`rename`] acts on the configuration immediately.
///
/// [`save`]: Remote::save
/// [`rename`]: Remote::rename
pub struct Remote<'repo> {
    repo: &'repo Repository,
    name: Option<String>,
    url: String,
    push_url: Option<String>,
    fetch: Vec<Refspec>,
    push: Vec<Refspec>,
    callbacks: RemoteCallbacks,
    stats: TransferStats,
}

impl<'repo> Remote<'repo> {
    pub(crate) fn from_config(repo: &'repo Repository, config: RemoteConfig) -> RemoteResult<Self> {
        let fetch = parse_all(&config.fetch, Direction::Fetch)?;
        let push = parse_all(&config.push, Direction::Push)?;
        Ok(Self {
            repo,
            name: Some(config.name),
            url: config.url,
            push_url: config.push_url.filter(|u| !u.is_empty()),
            fetch,
            push,
            callbacks: RemoteCallbacks::new(),
            stats: TransferStats::default(),
        })
    }

    pub(crate) fn anonymous(repo: &'repo Repository, url: &str) -> RemoteResult<Self> {
        if url.is_empty() {
            return Err(RemoteError::InvalidUrl(url.to_string()));
        }
        Ok(Self {
            repo,
            name: None,
            url: url.to_string(),
            push_url: None,
            fetch: Vec::new(),
            push: Vec::new(),
            callbacks: RemoteCallbacks::new(),
            stats: TransferStats::default(),
        })
    }

    /// `None` for an anonymous remote.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Rename this remote in the repository's configuration.
    ///
    /// Refspecs that mention the old name (such as the default
    /// `refs/remotes/<old>/*` destination) are left as they are.
    pub fn rename(&mut self, new_name: &str) -> RemoteResult<()> {
        let old = self.name.as_deref().ok_or_else(|| RemoteError::InvalidName {
            name: new_name.to_string(),
            reason: "an anonymous remote cannot be renamed".into(),
        })?;
        validate_remote_name(new_name)?;
        self.repo.config().rename_remote(old, new_name)?;
        info!(from = %old, to = %new_name, "remote renamed");
        self.name = Some(new_name.to_string());
        Ok(())
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn set_url(&mut self, url: &str) -> RemoteResult<()> {
        if url.is_empty() {
            return Err(RemoteError::InvalidUrl(url.to_string()));
        }
        self.url = url.to_string();
        Ok(())
    }

    /// The explicitly configured push URL, if any.
    pub fn push_url(&self) -> Option<&str> {
        self.push_url.as_deref()
    }

    pub fn set_push_url(&mut self, url: &str) -> RemoteResult<()> {
        if url.is_empty() {
            return Err(RemoteError::InvalidUrl(url.to_string()));
        }
        self.push_url = Some(url.to_string());
        Ok(())
    }

    pub fn clear_push_url(&mut self) {
        self.push_url = None;
    }

    /// The URL pushes go to: the push URL when set, the fetch URL otherwise.
    pub fn effective_push_url(&self) -> &str {
        self.push_url.as_deref().unwrap_or(&self.url)
    }

    pub fn fetch_refspecs(&self) -> &[Refspec] {
        &self.fetch
    }

    pub fn push_refspecs(&self) -> &[Refspec] {
        &self.push
    }

    /// Replace the fetch refspecs. If any entry fails to parse, the error
    /// names its index and the current list is kept.
    pub fn set_fetch_refspecs<S: AsRef<str>>(&mut self, specs: &[S]) -> RemoteResult<()> {
        self.fetch = parse_all(specs, Direction::Fetch)?;
        Ok(())
    }

    /// Replace the push refspecs, with the same all-or-nothing rule as
    /// [`set_fetch_refspecs`](Remote::set_fetch_refspecs).
    pub fn set_push_refspecs<S: AsRef<str>>(&mut self, specs: &[S]) -> RemoteResult<()> {
        self.push = parse_all(specs, Direction::Push)?;
        Ok(())
    }

    pub fn add_fetch(&mut self, spec: &str) -> RemoteResult<()> {
        let spec = Refspec::fetch(spec)?;
        self.fetch.push(spec);
        Ok(())
    }

    pub fn add_push(&mut self, spec: &str) -> RemoteResult<()> {
        let spec = Refspec::push(spec)?;
        self.push.push(spec);
        Ok(())
    }

    /// Number of refspecs, fetch and push together.
    pub fn refspec_count(&self) -> usize {
        self.fetch.len() + self.push.len()
    }

    /// Refspec `index` in fetch-then-push order.
    pub fn get_refspec(&self, index: usize) -> RemoteResult<&Refspec> {
        self.fetch
            .iter()
            .chain(self.push.iter())
            .nth(index)
            .ok_or(RemoteError::IndexOutOfRange {
                index,
                count: self.refspec_count(),
            })
    }

    /// Write the name, URLs and refspecs to configuration. On failure the
    /// in-memory remote is left as it was.
    pub fn save(&self) -> RemoteResult<()> {
        let name = self.name.as_deref().ok_or_else(|| RemoteError::InvalidName {
            name: String::new(),
            reason: "an anonymous remote cannot be saved".into(),
        })?;
        let config = RemoteConfig {
            name: name.to_string(),
            url: self.url.clone(),
            push_url: self.push_url.clone(),
            fetch: self.fetch.iter().map(|s| s.as_str().to_string()).collect(),
            push: self.push.iter().map(|s| s.as_str().to_string()).collect(),
        };
        self.repo
            .config()
            .write_remote(&config)
            .map_err(|e| RemoteError::Io(e.to_string()))?;
        debug!(remote = %name, refspecs = self.refspec_count(), "remote saved");
        Ok(())
    }

    pub fn callbacks_mut(&mut self) -> &mut RemoteCallbacks {
        &mut self.callbacks
    }

    pub fn set_callbacks(&mut self, callbacks: RemoteCallbacks) {
        self.callbacks = callbacks;
    }

    /// Fetch through the configured fetch refspecs.
    pub fn fetch(&mut self) -> RemoteResult<TransferStats> {
        let specs = self.fetch.clone();
        self.run_fetch(&specs)
    }

    /// Fetch through `specs` instead of the configured list. The configured
    /// list is not changed.
    pub fn fetch_with<S: AsRef<str>>(&mut self, specs: &[S]) -> RemoteResult<TransferStats> {
        let specs = parse_all(specs, Direction::Fetch)?;
        self.run_fetch(&specs)
    }

    /// Push `refspec` together with the configured push refspecs.
    ///
    /// Tracking refs that the fetch refspecs map the pushed refs to are
    /// moved once the peer accepts every update.
    pub fn push(&mut self, refspec: &str) -> RemoteResult<()> {
        let mut specs = self.push.clone();
        specs.push(Refspec::push(refspec)?);
        let label = self.name.as_deref().unwrap_or(ANONYMOUS);
        let url = self.push_url.as_deref().unwrap_or(&self.url);
        let repo = self.repo;

        Controller::new(label, repo.objects(), repo.refs(), repo.transports(), &mut self.callbacks).push(
            url,
            &specs,
            &self.fetch,
        )?;
        Ok(())
    }

    /// Counters from the most recent successful fetch.
    pub fn stats(&self) -> &TransferStats {
        &self.stats
    }

    fn run_fetch(&mut self, specs: &[Refspec]) -> RemoteResult<TransferStats> {
        let label = self.name.as_deref().unwrap_or(ANONYMOUS);
        let repo = self.repo;
        let stats = Controller::new(label, repo.objects(), repo.refs(), repo.transports(), &mut self.callbacks)
            .fetch(&self.url, specs)?;
        self.stats = stats;
        Ok(stats)
    }
}

fn parse_all<S: AsRef<str>>(specs: &[S], direction: Direction) -> RemoteResult<Vec<Refspec>> {
    specs
        .iter()
        .enumerate()
        .map(|(i, s)| Refspec::parse(s.as_ref(), direction).map_err(|e| RemoteError::refspec_at(Some(i), e)))
        .collect()
}

impl fmt::Debug for Remote<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Remote")
            .field("name", &self.name)
            .field("url", &self.url)
            .field("push_url", &self.push_url)
            .field("fetch", &self.fetch)
            .field("push", &self.push)
            .finish_non_exhaustive()
    }
}

//! User hooks invoked during a transfer session.

use std::fmt;

use ferry_types::ObjectId;
use thiserror::Error;

use crate::types::TransferStats;

/// Error returned by a callback to abort the running session.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct CallbackError {
    message: String,
}

impl CallbackError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

type ProgressFn = Box<dyn FnMut(&str) -> Result<(), CallbackError>>;
type TransferProgressFn = Box<dyn FnMut(&TransferStats) -> Result<(), CallbackError>>;
type UpdateTipsFn = Box<dyn FnMut(&str, ObjectId, ObjectId) -> Result<(), CallbackError>>;

/// The three optional hooks of a remote.
///
/// All hooks run synchronously on the thread that called fetch or push. An
/// unset hook is a no-op.
///
/// ```
/// use ferry_transfer::RemoteCallbacks;
///
/// let mut callbacks = RemoteCallbacks::new();
/// callbacks
///     .progress(|text| {
///         eprint!("remote: {text}");
///         Ok(())
///     })
///     .update_tips(|name, old, new| {
///         println!("{name}: {} -> {}", old.short_hex(), new.short_hex());
///         Ok(())
///     });
/// ```
#[derive(Default)]
pub struct RemoteCallbacks {
    progress: Option<ProgressFn>,
    transfer_progress: Option<TransferProgressFn>,
    update_tips: Option<UpdateTipsFn>,
}

impl RemoteCallbacks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Textual progress sent by the peer.
    pub fn progress<F>(&mut self, cb: F) -> &mut Self
    where
        F: FnMut(&str) -> Result<(), CallbackError> + 'static,
    {
        self.progress = Some(Box::new(cb));
        self
    }

    /// Object counters, called after every object received (fetch) or sent
    /// (push).
    pub fn transfer_progress<F>(&mut self, cb: F) -> &mut Self
    where
        F: FnMut(&TransferStats) -> Result<(), CallbackError> + 'static,
    {
        self.transfer_progress = Some(Box::new(cb));
        self
    }

    /// Called once per local ref whose tip is about to change, with the old
    /// tip (zero if the ref is new) and the new tip.
    pub fn update_tips<F>(&mut self, cb: F) -> &mut Self
    where
        F: FnMut(&str, ObjectId, ObjectId) -> Result<(), CallbackError> + 'static,
    {
        self.update_tips = Some(Box::new(cb));
        self
    }

    pub(crate) fn emit_progress(&mut self, text: &str) -> Result<(), CallbackError> {
        match self.progress.as_mut() {
            Some(cb) => cb(text),
            None => Ok(()),
        }
    }

    pub(crate) fn emit_transfer_progress(&mut self, stats: &TransferStats) -> Result<(), CallbackError> {
        match self.transfer_progress.as_mut() {
            Some(cb) => cb(stats),
            None => Ok(()),
        }
    }

    pub(crate) fn emit_update_tips(
        &mut self,
        name: &str,
        old: ObjectId,
        new: ObjectId,
    ) -> Result<(), CallbackError> {
        match self.update_tips.as_mut() {
            Some(cb) => cb(name, old, new),
            None => Ok(()),
        }
    }
}

impl fmt::Debug for RemoteCallbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteCallbacks")
            .field("progress", &self.progress.is_some())
            .field("transfer_progress", &self.transfer_progress.is_some())
            .field("update_tips", &self.update_tips.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn unset_hooks_are_no_ops() {
        let mut cb = RemoteCallbacks::new();
        assert!(cb.emit_progress("x").is_ok());
        assert!(cb.emit_transfer_progress(&TransferStats::default()).is_ok());
        assert!(cb.emit_update_tips("refs/heads/main", ObjectId::ZERO, ObjectId::ZERO).is_ok());
    }

    #[test]
    fn hooks_are_invoked() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let mut cb = RemoteCallbacks::new();
        cb.update_tips(move |name, _, _| {
            sink.borrow_mut().push(name.to_string());
            Ok(())
        });
        cb.emit_update_tips("refs/remotes/origin/main", ObjectId::ZERO, ObjectId::ZERO)
            .unwrap();
        assert_eq!(*seen.borrow(), vec!["refs/remotes/origin/main".to_string()]);
    }

    #[test]
    fn hook_errors_propagate() {
        let mut cb = RemoteCallbacks::new();
        cb.progress(|_| Err(CallbackError::new("stop")));
        assert_eq!(cb.emit_progress("hello").unwrap_err().message(), "stop");
    }

    #[test]
    fn debug_shows_which_hooks_are_set() {
        let mut cb = RemoteCallbacks::new();
        cb.progress(|_| Ok(()));
        let dbg = format!("{cb:?}");
        assert!(dbg.contains("progress: true"));
        assert!(dbg.contains("update_tips: false"));
    }
}

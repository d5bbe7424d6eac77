//! State of one fetch or push.

use std::fmt;

use ferry_types::Direction;
use tracing::{debug, warn};

use crate::error::{TransferError, TransferResult};
use crate::types::{TipUpdate, TransferStats};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SessionState {
    Idle,
    Negotiating,
    Transferring,
    /// Push only: peer reports unpack and per-ref status.
    Finalizing,
    UpdatingTips,
    Done,
    Aborted,
}

impl SessionState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Aborted)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::Negotiating => "negotiating",
            Self::Transferring => "transferring",
            Self::Finalizing => "finalizing",
            Self::UpdatingTips => "updating-tips",
            Self::Done => "done",
            Self::Aborted => "aborted",
        };
        f.write_str(s)
    }
}

/// How a session ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionOutcome {
    Success,
    Cancelled,
    NetworkError,
    Rejected,
    Failed,
}

impl SessionOutcome {
    fn of(err: &TransferError) -> Self {
        match err {
            TransferError::Callback(_) => Self::Cancelled,
            TransferError::Network(_) | TransferError::UnsupportedScheme(_) => Self::NetworkError,
            TransferError::UnpackFailure(_) | TransferError::PushRejected { .. } => Self::Rejected,
            _ => Self::Failed,
        }
    }
}

/// One fetch or push, from `Idle` to `Done` or `Aborted`.
///
/// A session dropped in a non-terminal state counts as aborted.
#[derive(Debug)]
pub struct TransferSession {
    direction: Direction,
    state: SessionState,
    outcome: Option<SessionOutcome>,
    stats: TransferStats,
    tips: Vec<TipUpdate>,
}

impl TransferSession {
    pub fn new(direction: Direction) -> Self {
        Self {
            direction,
            state: SessionState::Idle,
            outcome: None,
            stats: TransferStats::default(),
            tips: Vec::new(),
        }
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn outcome(&self) -> Option<SessionOutcome> {
        self.outcome
    }

    pub fn stats(&self) -> &TransferStats {
        &self.stats
    }

    pub(crate) fn stats_mut(&mut self) -> &mut TransferStats {
        &mut self.stats
    }

    /// Tip updates applied by this session.
    pub fn tips(&self) -> &[TipUpdate] {
        &self.tips
    }

    pub(crate) fn set_tips(&mut self, tips: Vec<TipUpdate>) {
        self.tips = tips;
    }

    fn allowed(&self, to: SessionState) -> bool {
        use SessionState::*;
        match (self.state, to) {
            (Idle, Negotiating) | (Negotiating, Transferring) | (UpdatingTips, Done) => true,
            (Transferring, UpdatingTips) => self.direction.is_fetch(),
            (Transferring, Finalizing) | (Finalizing, UpdatingTips) => self.direction.is_push(),
            _ => false,
        }
    }

    /// Move to the next state.
    pub fn advance(&mut self, to: SessionState) -> TransferResult<()> {
        if !self.allowed(to) {
            return Err(TransferError::InvalidState { from: self.state, to });
        }
        debug!(direction = %self.direction, from = %self.state, %to, "session transition");
        self.state = to;
        if to == SessionState::Done {
            self.outcome = Some(SessionOutcome::Success);
        }
        Ok(())
    }

    /// Abort because of `err`. No-op once terminal.
    pub fn abort(&mut self, err: &TransferError) {
        if self.state.is_terminal() {
            return;
        }
        warn!(direction = %self.direction, state = %self.state, error = %err, "session aborted");
        self.state = SessionState::Aborted;
        self.outcome = Some(SessionOutcome::of(err));
    }
}

impl Drop for TransferSession {
    fn drop(&mut self) {
        if !self.state.is_terminal() && self.state != SessionState::Idle {
            warn!(direction = %self.direction, state = %self.state, "session dropped before completion");
            self.state = SessionState::Aborted;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callbacks::CallbackError;

    #[test]
    fn fetch_path() {
        let mut s = TransferSession::new(Direction::Fetch);
        for to in [
            SessionState::Negotiating,
            SessionState::Transferring,
            SessionState::UpdatingTips,
            SessionState::Done,
        ] {
            s.advance(to).unwrap();
        }
        assert_eq!(s.outcome(), Some(SessionOutcome::Success));
    }

    #[test]
    fn push_path_goes_through_finalizing() {
        let mut s = TransferSession::new(Direction::Push);
        s.advance(SessionState::Negotiating).unwrap();
        s.advance(SessionState::Transferring).unwrap();
        assert!(s.advance(SessionState::UpdatingTips).is_err());
        s.advance(SessionState::Finalizing).unwrap();
        s.advance(SessionState::UpdatingTips).unwrap();
        s.advance(SessionState::Done).unwrap();
    }

    #[test]
    fn fetch_has_no_finalizing() {
        let mut s = TransferSession::new(Direction::Fetch);
        s.advance(SessionState::Negotiating).unwrap();
        s.advance(SessionState::Transferring).unwrap();
        let err = s.advance(SessionState::Finalizing).unwrap_err();
        assert!(matches!(
            err,
            TransferError::InvalidState {
                from: SessionState::Transferring,
                to: SessionState::Finalizing
            }
        ));
    }

    #[test]
    fn cannot_skip_states() {
        let mut s = TransferSession::new(Direction::Fetch);
        assert!(s.advance(SessionState::Transferring).is_err());
        assert!(s.advance(SessionState::Done).is_err());
        assert_eq!(s.state(), SessionState::Idle);
    }

    #[test]
    fn abort_records_outcome() {
        let mut s = TransferSession::new(Direction::Fetch);
        s.advance(SessionState::Negotiating).unwrap();
        s.abort(&TransferError::Callback(CallbackError::new("stop")));
        assert_eq!(s.state(), SessionState::Aborted);
        assert_eq!(s.outcome(), Some(SessionOutcome::Cancelled));
        assert!(s.advance(SessionState::Transferring).is_err());

        let mut s = TransferSession::new(Direction::Push);
        s.advance(SessionState::Negotiating).unwrap();
        s.abort(&TransferError::Network("reset".into()));
        assert_eq!(s.outcome(), Some(SessionOutcome::NetworkError));
    }

    #[test]
    fn abort_after_done_is_ignored() {
        let mut s = TransferSession::new(Direction::Fetch);
        for to in [
            SessionState::Negotiating,
            SessionState::Transferring,
            SessionState::UpdatingTips,
            SessionState::Done,
        ] {
            s.advance(to).unwrap();
        }
        s.abort(&TransferError::Network("late".into()));
        assert_eq!(s.state(), SessionState::Done);
        assert_eq!(s.outcome(), Some(SessionOutcome::Success));
    }
}

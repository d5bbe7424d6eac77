use tracing::warn;

use crate::error::TransferError;
use crate::types::PushStatus;

/// Collects per-ref push results in arrival order.
///
/// Every record is kept for inspection, but only the first rejection is
/// ever surfaced as the outcome of a push. Later rejections are logged and
/// otherwise ignored.
#[derive(Clone, Debug, Default)]
pub struct PushStatusAggregator {
    records: Vec<PushStatus>,
    first_failure: Option<usize>,
}

impl PushStatusAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, status: PushStatus) {
        if let Some(message) = &status.message {
            warn!(ref_name = %status.ref_name, %message, "peer rejected ref update");
            if self.first_failure.is_none() {
                self.first_failure = Some(self.records.len());
            }
        }
        self.records.push(status);
    }

    /// The first record with a rejection message.
    pub fn first_failure(&self) -> Option<&PushStatus> {
        self.first_failure.map(|i| &self.records[i])
    }

    pub fn records(&self) -> &[PushStatus] {
        &self.records
    }

    pub fn accepted(&self) -> impl Iterator<Item = &PushStatus> {
        self.records.iter().filter(|s| !s.is_rejected())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// `Err(PushRejected)` for the first failure, if any.
    pub fn check(&self) -> Result<(), TransferError> {
        match self.first_failure() {
            Some(PushStatus {
                ref_name,
                message: Some(message),
            }) => Err(TransferError::PushRejected {
                ref_name: ref_name.clone(),
                message: message.clone(),
            }),
            _ => Ok(()),
        }
    }
}

impl Extend<PushStatus> for PushStatusAggregator {
    fn extend<I: IntoIterator<Item = PushStatus>>(&mut self, iter: I) {
        for status in iter {
            self.record(status);
        }
    }
}

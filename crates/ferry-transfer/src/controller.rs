//! Running fetch and push sessions.

use ferry_refs::{RefEdit, RefStore};
use ferry_refspec::Refspec;
use ferry_store::{ObjectStore, StoredObject};
use ferry_types::{Direction, ObjectId};
use tracing::{debug, info, warn};

use crate::aggregator::PushStatusAggregator;
use crate::callbacks::RemoteCallbacks;
use crate::error::{TransferError, TransferResult};
use crate::negotiation::{NegotiationEngine, RefMapping};
use crate::session::{SessionState, TransferSession};
use crate::transport::{FetchSink, Interrupted, PushObserver, TransportRegistry};
use crate::types::{PushReport, RefUpdateCommand, TipUpdate, TransferStats};

/// Drives fetch and push for one remote against local storage.
///
/// Each call runs one [`TransferSession`] to completion. The connection is
/// opened inside the session and dropped on every exit path.
pub struct Controller<'a> {
    remote: &'a str,
    objects: &'a dyn ObjectStore,
    refs: &'a dyn RefStore,
    transports: &'a TransportRegistry,
    callbacks: &'a mut RemoteCallbacks,
}

impl<'a> Controller<'a> {
    pub fn new(
        remote: &'a str,
        objects: &'a dyn ObjectStore,
        refs: &'a dyn RefStore,
        transports: &'a TransportRegistry,
        callbacks: &'a mut RemoteCallbacks,
    ) -> Self {
        Self {
            remote,
            objects,
            refs,
            transports,
            callbacks,
        }
    }

    /// Fetch from `url` through `specs`.
    ///
    /// Objects land in local storage as they arrive. Tracking refs move only
    /// after every object is present and every update-tips callback has
    /// succeeded, in one ref transaction.
    pub fn fetch(&mut self, url: &str, specs: &[Refspec]) -> TransferResult<TransferStats> {
        let mut session = TransferSession::new(Direction::Fetch);
        match self.run_fetch(&mut session, url, specs) {
            Ok(()) => Ok(*session.stats()),
            Err(e) => {
                session.abort(&e);
                Err(e)
            }
        }
    }

    /// Push to `url` through `specs`, then move the tracking refs that
    /// `tracking` maps the pushed refs to.
    pub fn push(&mut self, url: &str, specs: &[Refspec], tracking: &[Refspec]) -> TransferResult<()> {
        let mut session = TransferSession::new(Direction::Push);
        match self.run_push(&mut session, url, specs, tracking) {
            Ok(()) => Ok(()),
            Err(e) => {
                session.abort(&e);
                Err(e)
            }
        }
    }

    fn run_fetch(&mut self, session: &mut TransferSession, url: &str, specs: &[Refspec]) -> TransferResult<()> {
        session.advance(SessionState::Negotiating)?;
        let mut conn = self.transports.open(url, Direction::Fetch)?;
        let advertised = conn.advertised_refs()?;
        let plan = NegotiationEngine::plan_fetch(&advertised, specs, self.objects, self.refs)?;
        info!(
            remote = %self.remote,
            advertised = advertised.len(),
            mapped = plan.mappings.len(),
            wants = plan.wants.len(),
            haves = plan.haves.len(),
            "fetch negotiated"
        );

        session.advance(SessionState::Transferring)?;
        if !plan.wants.is_empty() {
            let mut sink = StoreSink {
                objects: self.objects,
                callbacks: &mut *self.callbacks,
                stats: session.stats_mut(),
                failure: None,
            };
            let result = conn.fetch_pack(&plan.wants, &plan.haves, &mut sink);
            if let Some(err) = sink.failure.take() {
                return Err(err);
            }
            result?;

            for want in &plan.wants {
                if !self.objects.exists(want)? {
                    return Err(TransferError::Network(format!("peer did not send {want}")));
                }
            }
        }
        drop(conn);

        session.advance(SessionState::UpdatingTips)?;
        let tips = self.fetched_tips(&plan.mappings)?;
        self.commit_tips(&tips)?;
        session.set_tips(tips);

        session.advance(SessionState::Done)?;
        let stats = session.stats();
        info!(
            remote = %self.remote,
            received = stats.received_objects,
            bytes = stats.received_bytes,
            tips = session.tips().len(),
            "fetch complete"
        );
        Ok(())
    }

    fn run_push(
        &mut self,
        session: &mut TransferSession,
        url: &str,
        specs: &[Refspec],
        tracking: &[Refspec],
    ) -> TransferResult<()> {
        session.advance(SessionState::Negotiating)?;
        let mut conn = self.transports.open(url, Direction::Push)?;
        let advertised = conn.advertised_refs()?;
        let plan = NegotiationEngine::plan_push(&advertised, specs, self.refs)?;
        for name in &plan.up_to_date {
            debug!(remote = %self.remote, ref_name = %name, "already up to date");
        }

        let new_tips: Vec<ObjectId> = plan
            .commands
            .iter()
            .filter(|c| !c.is_delete())
            .map(|c| c.new)
            .collect();
        let peer_tips: Vec<ObjectId> = advertised.iter().map(|a| a.oid).collect();
        let objects = self
            .objects
            .objects_between(&new_tips, &peer_tips)?
            .iter()
            .map(|id| self.objects.require(id))
            .collect::<Result<Vec<StoredObject>, _>>()?;
        info!(
            remote = %self.remote,
            commands = plan.commands.len(),
            objects = objects.len(),
            "push negotiated"
        );

        session.advance(SessionState::Transferring)?;
        let report = if plan.commands.is_empty() {
            PushReport {
                unpack_ok: true,
                ..PushReport::default()
            }
        } else {
            let mut observer = CallbackObserver {
                callbacks: &mut *self.callbacks,
                stats: session.stats_mut(),
                failure: None,
            };
            let result = conn.send_pack(objects, &plan.commands, &mut observer);
            if let Some(err) = observer.failure.take() {
                return Err(err);
            }
            result?
        };
        drop(conn);

        session.advance(SessionState::Finalizing)?;
        if !report.unpack_ok {
            return Err(TransferError::UnpackFailure(
                report.unpack_message.unwrap_or_else(|| "unknown unpack error".into()),
            ));
        }
        let mut aggregator = PushStatusAggregator::new();
        aggregator.extend(report.statuses);
        aggregator.check()?;

        session.advance(SessionState::UpdatingTips)?;
        let tips = self.tracking_tips(&plan.commands, tracking)?;
        self.commit_tips(&tips)?;
        session.set_tips(tips);

        session.advance(SessionState::Done)?;
        info!(remote = %self.remote, updated = aggregator.accepted().count(), "push complete");
        Ok(())
    }

    /// Local tip changes for fetched refs. Non-forced updates that would
    /// lose history are skipped.
    fn fetched_tips(&self, mappings: &[RefMapping]) -> TransferResult<Vec<TipUpdate>> {
        let mut tips = Vec::new();
        for m in mappings {
            let Some(local) = &m.local_name else {
                continue;
            };
            let old = self.refs.tip_or_zero(local)?;
            if old == m.oid || m.oid.is_null() {
                continue;
            }
            if !old.is_null() && !m.force && !self.objects.is_descendant_of(&m.oid, &old)? {
                warn!(
                    remote = %self.remote,
                    ref_name = %local,
                    old = %old.short_hex(),
                    new = %m.oid.short_hex(),
                    "non-fast-forward update skipped"
                );
                continue;
            }
            tips.push(TipUpdate {
                name: local.clone(),
                old,
                new: m.oid,
            });
        }
        Ok(tips)
    }

    /// Tracking ref changes after a successful push: each pushed ref goes
    /// through the first fetch refspec whose source matches it.
    fn tracking_tips(&self, commands: &[RefUpdateCommand], tracking: &[Refspec]) -> TransferResult<Vec<TipUpdate>> {
        let mut tips = Vec::new();
        for cmd in commands {
            let Some(spec) = tracking
                .iter()
                .find(|s| s.destination().is_some() && s.source_matches(&cmd.name))
            else {
                continue;
            };
            let local = spec.transform(&cmd.name)?;
            let old = self.refs.tip_or_zero(&local)?;
            if old == cmd.new {
                continue;
            }
            tips.push(TipUpdate {
                name: local,
                old,
                new: cmd.new,
            });
        }
        Ok(tips)
    }

    /// Run update-tips for every change, then apply them all at once. Any
    /// callback failure leaves every ref untouched.
    fn commit_tips(&mut self, tips: &[TipUpdate]) -> TransferResult<()> {
        for tip in tips {
            self.callbacks.emit_update_tips(&tip.name, tip.old, tip.new)?;
        }
        if tips.is_empty() {
            return Ok(());
        }
        let edits: Vec<RefEdit> = tips
            .iter()
            .map(|t| RefEdit::checked(t.name.clone(), t.old, t.new))
            .collect();
        self.refs.transaction(&edits)?;
        debug!(remote = %self.remote, count = tips.len(), "tips updated");
        Ok(())
    }
}

/// Writes fetched objects to local storage and reports progress.
struct StoreSink<'s> {
    objects: &'s dyn ObjectStore,
    callbacks: &'s mut RemoteCallbacks,
    stats: &'s mut TransferStats,
    failure: Option<TransferError>,
}

impl StoreSink<'_> {
    fn fail(&mut self, err: TransferError) -> Interrupted {
        self.failure = Some(err);
        Interrupted
    }
}

impl FetchSink for StoreSink<'_> {
    fn progress(&mut self, text: &str) -> Result<(), Interrupted> {
        let result = self.callbacks.emit_progress(text);
        result.map_err(|e| self.fail(e.into()))
    }

    fn receive(&mut self, object: StoredObject, wire_bytes: u64) -> Result<(), Interrupted> {
        self.stats.received_objects += 1;
        self.stats.received_bytes += wire_bytes;
        if let Err(e) = self.objects.write(&object) {
            return Err(self.fail(e.into()));
        }
        self.stats.indexed_objects += 1;
        let result = self.callbacks.emit_transfer_progress(self.stats);
        result.map_err(|e| self.fail(e.into()))
    }
}

/// Forwards push progress to the callbacks.
struct CallbackObserver<'s> {
    callbacks: &'s mut RemoteCallbacks,
    stats: &'s mut TransferStats,
    failure: Option<TransferError>,
}

impl PushObserver for CallbackObserver<'_> {
    fn progress(&mut self, text: &str) -> Result<(), Interrupted> {
        match self.callbacks.emit_progress(text) {
            Ok(()) => Ok(()),
            Err(e) => {
                self.failure = Some(e.into());
                Err(Interrupted)
            }
        }
    }

    fn sent(&mut self, sent: u64, total: u64, bytes: u64) -> Result<(), Interrupted> {
        self.stats.indexed_objects = total;
        self.stats.received_objects = sent;
        self.stats.received_bytes = bytes;
        match self.callbacks.emit_transfer_progress(self.stats) {
            Ok(()) => Ok(()),
            Err(e) => {
                self.failure = Some(e.into());
                Err(Interrupted)
            }
        }
    }
}

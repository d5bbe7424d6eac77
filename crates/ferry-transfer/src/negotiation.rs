use std::collections::{HashMap, HashSet};

use ferry_refs::RefStore;
use ferry_refspec::Refspec;
use ferry_store::ObjectStore;
use ferry_types::ObjectId;
use tracing::{debug, warn};

use crate::error::{TransferError, TransferResult};
use crate::types::{AdvertisedRef, RefUpdateCommand};

/// An advertised remote ref and where it lands locally.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RefMapping {
    pub remote_name: String,
    /// `None` for a refspec without destination: fetched, not stored.
    pub local_name: Option<String>,
    pub oid: ObjectId,
    pub force: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FetchPlan {
    pub mappings: Vec<RefMapping>,
    pub wants: Vec<ObjectId>,
    pub haves: Vec<ObjectId>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PushPlan {
    pub commands: Vec<RefUpdateCommand>,
    /// Destination refs the peer already has at the right tip.
    pub up_to_date: Vec<String>,
}

/// Decides which refs a session moves and which objects it needs.
pub struct NegotiationEngine;

impl NegotiationEngine {
    /// Map advertised refs through `specs`, in refspec order. When two
    /// mappings claim the same local ref the first one wins.
    pub fn map_advertised(advertised: &[AdvertisedRef], specs: &[Refspec]) -> TransferResult<Vec<RefMapping>> {
        let mut claimed = HashSet::new();
        let mut mappings = Vec::new();
        for spec in specs {
            for adv in advertised.iter().filter(|a| spec.source_matches(&a.name)) {
                let local_name = match spec.destination() {
                    Some(_) => Some(spec.transform(&adv.name)?),
                    None => None,
                };
                if let Some(local) = &local_name {
                    if !claimed.insert(local.clone()) {
                        debug!(refspec = %spec, remote = %adv.name, local = %local, "destination already mapped");
                        continue;
                    }
                }
                mappings.push(RefMapping {
                    remote_name: adv.name.clone(),
                    local_name,
                    oid: adv.oid,
                    force: spec.is_force(),
                });
            }
        }
        Ok(mappings)
    }

    /// Tips the peer has that local storage lacks.
    pub fn compute_wants(mappings: &[RefMapping], objects: &dyn ObjectStore) -> TransferResult<Vec<ObjectId>> {
        let mut seen = HashSet::new();
        let mut wants = Vec::new();
        for m in mappings {
            if m.oid.is_null() || !seen.insert(m.oid) {
                continue;
            }
            if !objects.exists(&m.oid)? {
                wants.push(m.oid);
            }
        }
        Ok(wants)
    }

    /// Every distinct local tip, offered so the peer can skip what we have.
    pub fn compute_haves(local_refs: &[(String, ObjectId)]) -> Vec<ObjectId> {
        let mut seen = HashSet::new();
        local_refs
            .iter()
            .map(|(_, oid)| *oid)
            .filter(|oid| !oid.is_null() && seen.insert(*oid))
            .collect()
    }

    pub fn plan_fetch(
        advertised: &[AdvertisedRef],
        specs: &[Refspec],
        objects: &dyn ObjectStore,
        refs: &dyn RefStore,
    ) -> TransferResult<FetchPlan> {
        let mappings = Self::map_advertised(advertised, specs)?;
        let wants = Self::compute_wants(&mappings, objects)?;
        let haves = if wants.is_empty() {
            Vec::new()
        } else {
            Self::compute_haves(&refs.list_refs("")?)
        };
        Ok(FetchPlan { mappings, wants, haves })
    }

    /// Resolve push refspecs against local refs and the peer's
    /// advertisement.
    ///
    /// A non-wildcard source that names no local ref fails with
    /// [`TransferError::NoMatchingSource`]. Deleting a ref the peer does not
    /// have is skipped.
    pub fn plan_push(advertised: &[AdvertisedRef], specs: &[Refspec], refs: &dyn RefStore) -> TransferResult<PushPlan> {
        let remote: HashMap<&str, ObjectId> = advertised.iter().map(|a| (a.name.as_str(), a.oid)).collect();
        let mut claimed = HashSet::new();
        let mut plan = PushPlan::default();

        for spec in specs {
            if spec.is_delete() {
                let Some(name) = spec.destination() else {
                    continue;
                };
                match remote.get(name) {
                    Some(old) if claimed.insert(name.to_string()) => plan.commands.push(RefUpdateCommand {
                        name: name.to_string(),
                        old: *old,
                        new: ObjectId::ZERO,
                        force: spec.is_force(),
                    }),
                    Some(_) => {}
                    None => warn!(refspec = %spec, "peer has no {name}, nothing to delete"),
                }
                continue;
            }

            let sources: Vec<(String, ObjectId)> = if spec.is_wildcard() {
                refs.list_refs("")?
                    .into_iter()
                    .filter(|(name, _)| spec.source_matches(name))
                    .collect()
            } else {
                let tip = refs
                    .read_ref(spec.source())?
                    .ok_or_else(|| TransferError::NoMatchingSource {
                        refspec: spec.as_str().to_string(),
                    })?;
                vec![(spec.source().to_string(), tip)]
            };

            for (src, tip) in sources {
                let dst = spec.transform(&src)?;
                if !claimed.insert(dst.clone()) {
                    continue;
                }
                let old = remote.get(dst.as_str()).copied().unwrap_or(ObjectId::ZERO);
                if old == tip {
                    plan.up_to_date.push(dst);
                    continue;
                }
                plan.commands.push(RefUpdateCommand {
                    name: dst,
                    old,
                    new: tip,
                    force: spec.is_force(),
                });
            }
        }
        Ok(plan)
    }
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-invocation alternation attempt records
//!
//! An attempt record lives for one alternation invocation and exists only if that
//! invocation offers at least one barrier. The invocation owns the record; barrier bases
//! hold the shared half ([`AttemptShared`]) so that a completing process can resolve the
//! attempt on the owner's behalf and wake it.
//!
//! While the owner is still scanning guards its offers only count towards a completion
//! it proposes itself, or one on the barrier it has picked. Once it has finished
//! scanning and is about to block, it marks the attempt waiting and any peer may claim
//! it, subject to the priority of its pending pick.

use super::base::BarrierBase;
use crate::error::UsageFault;
use crate::id::{AttemptId, BarrierId, HandleId};
use crate::status::{Outcome, Phase};
use crate::sync::{GateCell, GateGuard, Gatekeeper, Slot};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Weak};

/// How an attempt was settled by a barrier
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Resolution {
    pub barrier: BarrierId,
    pub rank: usize,
    pub outcome: Outcome,
}

/// The single barrier an attempt has tentatively chosen
#[derive(Clone, Debug)]
pub(crate) struct Pick {
    pub barrier: BarrierId,
    pub base: Weak<BarrierBase>,
    pub rank: usize,
}

#[derive(Debug, Default)]
pub(crate) struct AttemptState {
    pub resolution: Option<Resolution>,
    pub pick: Option<Pick>,
    /// Lowest-priority rank offered so far
    pub bottom_index: usize,
    /// Owner has finished scanning and is blocked waiting for a guard
    pub waiting: bool,
    /// The invocation has finished; any lingering offers are void
    pub finished: bool,
}

impl AttemptState {
    /// Whether offers made under this attempt can still be completed
    pub fn is_live(&self) -> bool {
        self.resolution.is_none() && !self.finished
    }

    pub fn picked(&self, barrier: BarrierId, rank: usize) -> bool {
        self.pick
            .as_ref()
            .is_some_and(|pick| pick.barrier == barrier && pick.rank == rank)
    }

    /// Whether a peer may claim an offer made at `rank` for its own completion
    pub fn claimable_at(&self, rank: usize) -> bool {
        self.waiting
            && self
                .pick
                .as_ref()
                .map_or(true, |pick| rank <= pick.rank)
    }
}

/// The part of an attempt that barrier bases can see
pub(crate) struct AttemptShared {
    pub id: AttemptId,
    pub state: GateCell<AttemptState>,
    pub schedule: Arc<Slot<()>>,
}

/// Rank range an attempt currently spans
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TraversalWindow {
    /// Rank of the pending pick, if any
    pub top_index: Option<usize>,
    pub bottom_index: usize,
}

/// Bookkeeping for one alternation invocation that offers barriers
pub struct AttemptRecord {
    shared: Arc<AttemptShared>,
    live: BTreeSet<usize>,
    offers: BTreeMap<usize, Vec<(Arc<BarrierBase>, HandleId)>>,
    phase: Phase,
    holds_lock: bool,
    selected_rank: Option<usize>,
}

impl AttemptRecord {
    pub(crate) fn new(schedule: Arc<Slot<()>>) -> Self {
        let id = AttemptId::fresh();
        tracing::trace!(attempt = %id, "attempt created");
        Self {
            shared: Arc::new(AttemptShared {
                id,
                state: GateCell::new(AttemptState::default()),
                schedule,
            }),
            live: BTreeSet::new(),
            offers: BTreeMap::new(),
            phase: Phase::PreGatekeeper,
            holds_lock: false,
            selected_rank: None,
        }
    }

    pub fn id(&self) -> AttemptId {
        self.shared.id
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Whether this record's owner currently holds the gatekeeper
    pub fn holds_lock(&self) -> bool {
        self.holds_lock
    }

    /// Ranks of guard groups that have offered and not yet withdrawn
    pub fn live_groups(&self) -> Vec<usize> {
        self.live.iter().copied().collect()
    }

    pub fn register(&mut self, rank: usize) {
        self.live.insert(rank);
    }

    /// Remove a group and its offers; true once no live groups remain
    pub fn unregister(&mut self, rank: usize) -> bool {
        self.live.remove(&rank);
        self.offers.remove(&rank);
        self.live.is_empty()
    }

    pub fn is_disposable(&self) -> bool {
        self.live.is_empty()
    }

    /// Rank of the guard group whose barrier resolved this attempt
    pub fn selected_rank(&self) -> Option<usize> {
        self.selected_rank
    }

    pub fn window(&self, gate: &GateGuard) -> TraversalWindow {
        let state = self.shared.state.open(gate);
        TraversalWindow {
            top_index: state.pick.as_ref().map(|pick| pick.rank),
            bottom_index: state.bottom_index,
        }
    }

    pub(crate) fn shared(&self) -> &Arc<AttemptShared> {
        &self.shared
    }

    pub(crate) fn note_offer(&mut self, rank: usize, base: Arc<BarrierBase>, handle: HandleId) {
        self.offers.entry(rank).or_default().push((base, handle));
    }

    pub(crate) fn is_resolved(&self, gate: &GateGuard) -> bool {
        self.shared.state.open(gate).resolution.is_some()
    }

    pub(crate) fn mark_selected(&mut self, rank: usize) {
        self.selected_rank = Some(rank);
    }

    pub(crate) fn enter(&mut self, phase: Phase) {
        self.phase = phase;
        tracing::trace!(attempt = %self.shared.id, phase = %phase, "attempt phase");
    }

    pub(crate) fn lock(&mut self) -> Result<GateGuard, UsageFault> {
        self.enter(Phase::WaitForLock);
        let gate = Gatekeeper::acquire()?;
        self.holds_lock = true;
        self.enter(Phase::PostGatekeeper);
        Ok(gate)
    }

    pub(crate) fn unlock(&mut self, gate: GateGuard) {
        drop(gate);
        self.holds_lock = false;
    }

    /// Scanning is over: become claimable, then give each offered barrier, in
    /// priority order, the chance to complete with this attempt as proposer
    pub(crate) fn begin_wait(&mut self) -> Result<(), UsageFault> {
        let gate = self.lock()?;
        self.shared.state.open(&gate).waiting = true;
        let mut failure = None;
        'offers: for (&rank, offers) in &self.offers {
            for (base, handle) in offers {
                if self.is_resolved(&gate) {
                    break 'offers;
                }
                if let Err(fault) = base.reconsider(&gate, *handle, &self.shared, rank) {
                    failure.get_or_insert(fault);
                }
            }
        }
        self.unlock(gate);
        self.enter(Phase::Waiting);
        failure.map_or(Ok(()), Err)
    }

    /// Woken: stop being claimable before disabling guards
    pub(crate) fn end_wait(&mut self) -> Result<(), UsageFault> {
        let gate = self.lock()?;
        self.shared.state.open(&gate).waiting = false;
        self.unlock(gate);
        Ok(())
    }

    /// Close the attempt so no barrier can count its offers any more
    pub(crate) fn dispose(mut self) -> Result<(), UsageFault> {
        if !self.is_disposable() {
            tracing::debug!(
                attempt = %self.shared.id,
                live = self.live.len(),
                "disposing attempt with live guard groups"
            );
        }
        let gate = self.lock()?;
        {
            let mut state = self.shared.state.open(&gate);
            state.finished = true;
            state.waiting = false;
        }
        self.unlock(gate);
        self.enter(Phase::RemoveAttempt);
        Ok(())
    }
}

#[cfg(test)]
#[path = "attempt_tests.rs"]
mod tests;

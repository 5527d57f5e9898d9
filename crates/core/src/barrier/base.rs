// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Barrier base: the shared participant registry of one altable barrier
//!
//! All state lives in a [`GateCell`] and is only read or written while the gatekeeper is
//! held. A participant counts towards completion only while it is ready and is offering
//! the barrier from a live alternation attempt; committed participants count once they
//! are waiting in `sync`.
//!
//! Completion is decided and carried out atomically under the gatekeeper: the completing
//! process resolves every participant's attempt, wakes each one through its handle's slot
//! and bumps the generation. A peer is claimed only if it has picked this barrier, or
//! has finished scanning and is blocked with no pick that outranks this barrier.
//! Otherwise the proposing attempt picks the barrier and leaves the selection pending,
//! and a watchdog bounds how long it may stay that way.

use super::attempt::{AttemptShared, Pick, Resolution};
use super::config::BarrierConfig;
use super::handle::BarrierHandle;
use super::watchdog::{Watchdog, WatchdogState};
use crate::error::{CspError, UsageFault};
use crate::id::{BarrierId, HandleId};
use crate::status::{BarrierStatus, HandleStatus, Outcome};
use crate::sync::{GateCell, GateGuard, Gatekeeper, Slot};
use std::collections::BTreeMap;
use std::sync::{Arc, Weak};

struct Offer {
    attempt: Arc<AttemptShared>,
    rank: usize,
}

struct Participant {
    status: HandleStatus,
    wake: Arc<Slot<Outcome>>,
    offer: Option<Offer>,
    /// Committed participant blocked in `sync`
    waiting: bool,
}

#[derive(Default)]
struct BaseState {
    committed: BTreeMap<HandleId, Participant>,
    altable: BTreeMap<HandleId, Participant>,
    watchdog: Option<Watchdog>,
    generation: u64,
    last_outcome: Option<Outcome>,
}

impl BaseState {
    fn is_empty(&self) -> bool {
        self.committed.is_empty() && self.altable.is_empty()
    }

    fn committed_waiting(&self) -> bool {
        self.committed.values().all(|p| p.waiting)
    }
}

/// How a single altable participant stands with respect to this barrier
enum Standing {
    Absent,
    Picked,
    /// Offering; `claimable` if a peer may complete the barrier on its behalf
    Offering { claimable: bool },
}

/// Point-in-time view of a barrier
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BarrierSnapshot {
    pub status: BarrierStatus,
    pub committed: usize,
    pub altable: usize,
    pub generation: u64,
    pub last_outcome: Option<Outcome>,
    pub watchdog: Option<WatchdogState>,
}

/// Shared state of one altable barrier
pub struct BarrierBase {
    id: BarrierId,
    config: BarrierConfig,
    state: GateCell<BaseState>,
    this: Weak<BarrierBase>,
}

impl BarrierBase {
    pub fn new(config: BarrierConfig) -> Arc<Self> {
        let id = BarrierId::fresh();
        tracing::debug!(barrier = %config.name, id = %id, "barrier created");
        Arc::new_cyclic(|this| Self {
            id,
            config,
            state: GateCell::new(BaseState::default()),
            this: this.clone(),
        })
    }

    pub fn named(name: impl Into<String>) -> Arc<Self> {
        Self::new(BarrierConfig::new(name))
    }

    pub fn id(&self) -> BarrierId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn config(&self) -> &BarrierConfig {
        &self.config
    }

    /// Create a new handle enrolled on this barrier
    pub fn create_handle(self: &Arc<Self>, committed: bool) -> Result<BarrierHandle, CspError> {
        BarrierHandle::new(self, committed)
    }

    /// Re-enrol a resigned handle of this barrier
    pub fn enroll(&self, handle: &BarrierHandle, committed: bool) -> Result<(), CspError> {
        self.check_owner(handle)?;
        handle.enroll(committed)
    }

    /// Remove a handle from the participant set; a no-op if it is not enrolled
    pub fn resign(&self, handle: &BarrierHandle) -> Result<(), CspError> {
        self.check_owner(handle)?;
        handle.resign()
    }

    pub fn aggregate_status(&self) -> Result<BarrierStatus, UsageFault> {
        let gate = Gatekeeper::acquire()?;
        let state = self.state.open(&gate);
        Ok(self.aggregate(&state, &gate))
    }

    pub fn snapshot(&self) -> Result<BarrierSnapshot, UsageFault> {
        let gate = Gatekeeper::acquire()?;
        let state = self.state.open(&gate);
        Ok(BarrierSnapshot {
            status: self.aggregate(&state, &gate),
            committed: state.committed.len(),
            altable: state.altable.len(),
            generation: state.generation,
            last_outcome: state.last_outcome,
            watchdog: state.watchdog.as_ref().map(Watchdog::state),
        })
    }

    /// Completions plus forced timeouts so far
    pub fn generation(&self) -> Result<u64, UsageFault> {
        let gate = Gatekeeper::acquire()?;
        let generation = self.state.open(&gate).generation;
        Ok(generation)
    }

    pub fn last_outcome(&self) -> Result<Option<Outcome>, UsageFault> {
        let gate = Gatekeeper::acquire()?;
        let last_outcome = self.state.open(&gate).last_outcome;
        Ok(last_outcome)
    }

    /// The watchdog currently guarding a pending selection, if any
    pub fn watchdog(&self) -> Result<Option<Watchdog>, UsageFault> {
        let gate = Gatekeeper::acquire()?;
        let state = self.state.open(&gate);
        Ok(state.watchdog.clone())
    }

    /// Force a timeout now, as if the watchdog had fired
    ///
    /// Returns the number of pending attempts that were timed out.
    pub fn timeout(&self) -> Result<usize, UsageFault> {
        let gate = Gatekeeper::acquire()?;
        let mut state = self.state.open(&gate);
        Self::kill_watchdog(&mut state, &gate);
        Ok(self.force_timeout(&mut state, &gate))
    }

    fn check_owner(&self, handle: &BarrierHandle) -> Result<(), UsageFault> {
        if handle.base().id() == self.id {
            Ok(())
        } else {
            Err(UsageFault::ForeignHandle {
                handle: handle.id(),
                barrier: self.config.name.clone(),
            })
        }
    }

    fn resigned(&self, handle: HandleId) -> UsageFault {
        UsageFault::Resigned {
            handle,
            barrier: self.config.name.clone(),
        }
    }

    // -- gatekeeper-held operations --------------------------------------------------

    pub(crate) fn enroll_locked(
        &self,
        gate: &GateGuard,
        handle: HandleId,
        committed: bool,
        wake: Arc<Slot<Outcome>>,
    ) -> Result<(), UsageFault> {
        let mut state = self.state.open(gate);
        if state.committed.contains_key(&handle) || state.altable.contains_key(&handle) {
            return Err(UsageFault::AlreadyEnrolled {
                handle,
                barrier: self.config.name.clone(),
            });
        }
        let participant = Participant {
            status: HandleStatus::default(),
            wake,
            offer: None,
            waiting: false,
        };
        if committed {
            state.committed.insert(handle, participant);
        } else {
            state.altable.insert(handle, participant);
        }
        tracing::debug!(
            barrier = %self.config.name,
            handle = %handle,
            committed,
            participants = state.committed.len() + state.altable.len(),
            "handle enrolled"
        );
        Ok(())
    }

    /// Returns whether the handle was enrolled
    pub(crate) fn resign_locked(&self, gate: &GateGuard, handle: HandleId) -> bool {
        let mut state = self.state.open(gate);
        let removed = match state.committed.remove(&handle) {
            Some(p) => Some(p),
            None => state.altable.remove(&handle),
        };
        let Some(participant) = removed else {
            return false;
        };
        if participant.waiting {
            // Blocked in `sync`; it leaves without the barrier firing
            participant.wake.offer(Outcome::Failure);
        } else {
            participant.wake.disarm();
        }
        if let Some(offer) = &participant.offer {
            let mut attempt = offer.attempt.state.open(gate);
            if attempt.picked(self.id, offer.rank) {
                attempt.pick = None;
            }
            if attempt.is_live() {
                // The alternation finds the resignation when it disables its guards
                offer.attempt.schedule.offer(());
            }
        }
        tracing::debug!(
            barrier = %self.config.name,
            handle = %handle,
            remaining = state.committed.len() + state.altable.len(),
            "handle resigned"
        );

        if self.completable(&state, gate, None) {
            let released = self.commit(&mut state, gate);
            drop(state);
            Self::release_picks(gate, released);
        } else if !self.has_pickers(&state, gate) {
            Self::kill_watchdog(&mut state, gate);
        }
        true
    }

    pub(crate) fn is_enrolled(&self, gate: &GateGuard, handle: HandleId) -> bool {
        let state = self.state.open(gate);
        state.committed.contains_key(&handle) || state.altable.contains_key(&handle)
    }

    pub(crate) fn handle_status(
        &self,
        gate: &GateGuard,
        handle: HandleId,
    ) -> Result<HandleStatus, UsageFault> {
        let state = self.state.open(gate);
        state
            .altable
            .get(&handle)
            .or_else(|| state.committed.get(&handle))
            .map(|p| p.status)
            .ok_or_else(|| self.resigned(handle))
    }

    /// Apply a status change, then re-evaluate completion
    pub(crate) fn update_status(
        &self,
        gate: &GateGuard,
        handle: HandleId,
        update: impl FnOnce(HandleStatus) -> HandleStatus,
    ) -> Result<BarrierStatus, UsageFault> {
        let mut guard = self.state.open(gate);
        let state = &mut *guard;
        let participant = match state.altable.get_mut(&handle) {
            Some(p) => p,
            None => state
                .committed
                .get_mut(&handle)
                .ok_or_else(|| self.resigned(handle))?,
        };
        participant.status = update(participant.status);
        let status = participant.status;

        let mut dropped_pick = false;
        if !status.is_ready() {
            if let Some(offer) = &participant.offer {
                let mut attempt = offer.attempt.state.open(gate);
                if attempt.picked(self.id, offer.rank) {
                    attempt.pick = None;
                    dropped_pick = true;
                }
            }
        }
        tracing::trace!(barrier = %self.config.name, handle = %handle, status = %status, "handle status");

        if self.completable(state, gate, None) {
            let released = self.commit(state, gate);
            drop(guard);
            Self::release_picks(gate, released);
            return Ok(BarrierStatus::Complete);
        }
        if dropped_pick && !self.has_pickers(state, gate) {
            Self::kill_watchdog(state, gate);
        }
        Ok(self.aggregate(state, gate))
    }

    /// A committed participant arrives; true if its arrival completed the barrier
    pub(crate) fn arrive(&self, gate: &GateGuard, handle: HandleId) -> Result<bool, UsageFault> {
        let mut state = self.state.open(gate);
        let participant = state
            .committed
            .get_mut(&handle)
            .ok_or_else(|| self.resigned(handle))?;
        participant.waiting = true;
        participant.wake.arm();

        if self.completable(&state, gate, None) {
            let released = self.commit(&mut state, gate);
            drop(state);
            Self::release_picks(gate, released);
            return Ok(true);
        }
        Ok(false)
    }

    /// Offer this barrier from an alternation attempt at `rank`
    ///
    /// Completes the barrier if the offer makes it completable; otherwise picks it as
    /// the attempt's pending choice when the attempt has none and every participant is
    /// offering. Returns the aggregate status after the offer.
    pub(crate) fn offer(
        &self,
        gate: &GateGuard,
        handle: HandleId,
        attempt: &Arc<AttemptShared>,
        rank: usize,
    ) -> Result<BarrierStatus, UsageFault> {
        let mut state = self.state.open(gate);
        if state.committed.contains_key(&handle) {
            return Err(UsageFault::CommittedInAlternation { handle });
        }
        let participant = state
            .altable
            .get_mut(&handle)
            .ok_or_else(|| self.resigned(handle))?;
        participant.status = HandleStatus::merge(participant.status, HandleStatus::ImplicitReady);
        participant.offer = Some(Offer {
            attempt: Arc::clone(attempt),
            rank,
        });
        participant.wake.arm();
        {
            let mut shared = attempt.state.open(gate);
            shared.bottom_index = shared.bottom_index.max(rank);
        }

        if self.completable(&state, gate, Some(handle)) {
            let released = self.commit(&mut state, gate);
            drop(state);
            Self::release_picks(gate, released);
            return Ok(BarrierStatus::Complete);
        }

        let status = self.aggregate(&state, gate);
        if !status.is_offerable() {
            return Ok(status);
        }
        {
            let mut shared = attempt.state.open(gate);
            if shared.pick.is_some() || !shared.is_live() {
                return Ok(status);
            }
            shared.pick = Some(Pick {
                barrier: self.id,
                base: self.this.clone(),
                rank,
            });
        }
        tracing::debug!(
            barrier = %self.config.name,
            handle = %handle,
            attempt = %attempt.id,
            rank,
            "barrier picked, waiting for peers"
        );
        if state.watchdog.is_none() {
            let delay = self.config.watchdog_delay(state.altable.len());
            match Watchdog::spawn(self.this.clone(), self.id, &self.config.name, delay) {
                Ok(dog) => state.watchdog = Some(dog),
                Err(e) => {
                    tracing::error!(barrier = %self.config.name, error = %e, "failed to start watchdog")
                }
            }
        }
        Ok(self.aggregate(&state, gate))
    }

    /// Retract an offer made at `rank`
    ///
    /// Returns the outcome if this barrier resolved the attempt at that rank.
    pub(crate) fn withdraw(
        &self,
        gate: &GateGuard,
        handle: HandleId,
        attempt: &Arc<AttemptShared>,
        rank: usize,
    ) -> Result<Option<Outcome>, UsageFault> {
        let mut state = self.state.open(gate);
        let participant = state
            .altable
            .get_mut(&handle)
            .ok_or_else(|| self.resigned(handle))?;

        let (resolved, dropped_pick) = {
            let mut shared = attempt.state.open(gate);
            let resolved = shared
                .resolution
                .filter(|r| r.barrier == self.id && r.rank == rank)
                .map(|r| r.outcome);
            let dropped_pick = shared.picked(self.id, rank);
            if dropped_pick {
                shared.pick = None;
            }
            (resolved, dropped_pick)
        };

        let delivered = participant.wake.disarm();
        let same_offer = participant
            .offer
            .as_ref()
            .is_some_and(|o| o.rank == rank && Arc::ptr_eq(&o.attempt, attempt));
        if same_offer {
            participant.offer = None;
        }
        participant.status =
            HandleStatus::merge(participant.status, HandleStatus::ImplicitNotReady);

        if dropped_pick && !self.has_pickers(&state, gate) {
            Self::kill_watchdog(&mut state, gate);
        }
        Ok(resolved.map(|outcome| delivered.unwrap_or(outcome)))
    }

    /// Re-examine an existing offer now that its attempt has finished scanning
    ///
    /// Returns true if the barrier completed.
    pub(crate) fn reconsider(
        &self,
        gate: &GateGuard,
        handle: HandleId,
        attempt: &Arc<AttemptShared>,
        rank: usize,
    ) -> Result<bool, UsageFault> {
        let mut state = self.state.open(gate);
        let offering = state
            .altable
            .get(&handle)
            .ok_or_else(|| self.resigned(handle))?
            .offer
            .as_ref()
            .is_some_and(|o| o.rank == rank && Arc::ptr_eq(&o.attempt, attempt));
        if !offering || !self.completable(&state, gate, Some(handle)) {
            return Ok(false);
        }
        let released = self.commit(&mut state, gate);
        drop(state);
        Self::release_picks(gate, released);
        Ok(true)
    }

    /// Called by a watchdog that won the gatekeeper after its delay
    pub(crate) fn watchdog_fired(&self, gate: &GateGuard, dog: &Watchdog) {
        let mut state = self.state.open(gate);
        let current = state
            .watchdog
            .as_ref()
            .is_some_and(|installed| installed.same(dog));
        if !current {
            return;
        }
        state.watchdog = None;
        self.force_timeout(&mut state, gate);
    }

    /// A pick on this barrier was dropped because another barrier resolved its attempt
    fn pick_released(&self, gate: &GateGuard) {
        let mut state = self.state.open(gate);
        if !self.has_pickers(&state, gate) {
            Self::kill_watchdog(&mut state, gate);
        }
    }

    // -- evaluation -----------------------------------------------------------------

    fn standing(&self, participant: &Participant, gate: &GateGuard) -> Standing {
        if !participant.status.is_ready() {
            return Standing::Absent;
        }
        let Some(offer) = &participant.offer else {
            return Standing::Absent;
        };
        let attempt = offer.attempt.state.open(gate);
        if !attempt.is_live() {
            return Standing::Absent;
        }
        if attempt.picked(self.id, offer.rank) {
            return Standing::Picked;
        }
        Standing::Offering {
            claimable: attempt.claimable_at(offer.rank),
        }
    }

    fn aggregate(&self, state: &BaseState, gate: &GateGuard) -> BarrierStatus {
        if state.is_empty() {
            return BarrierStatus::NotSyncingNow;
        }
        if !state.committed_waiting() {
            return BarrierStatus::NotReady;
        }
        let mut picked = 0;
        for participant in state.altable.values() {
            match self.standing(participant, gate) {
                Standing::Absent => return BarrierStatus::NotSyncingNow,
                Standing::Picked => picked += 1,
                Standing::Offering { .. } => {}
            }
        }
        if picked == state.altable.len() {
            BarrierStatus::Complete
        } else if picked > 0 {
            BarrierStatus::Selected
        } else {
            BarrierStatus::ProbablyReady
        }
    }

    /// Whether every participant can be claimed for a completion right now
    ///
    /// `proposer` is the participant whose offer is being made; it may abandon its own
    /// pending pick. Others must have picked this barrier or be blocked waiting with no
    /// pick that outranks it.
    fn completable(&self, state: &BaseState, gate: &GateGuard, proposer: Option<HandleId>) -> bool {
        if state.is_empty() || !state.committed_waiting() {
            return false;
        }
        state
            .altable
            .iter()
            .all(|(id, participant)| match self.standing(participant, gate) {
                Standing::Absent => false,
                Standing::Picked => true,
                Standing::Offering { claimable } => claimable || proposer == Some(*id),
            })
    }

    fn has_pickers(&self, state: &BaseState, gate: &GateGuard) -> bool {
        state
            .altable
            .values()
            .any(|p| matches!(self.standing(p, gate), Standing::Picked))
    }

    // -- transitions ----------------------------------------------------------------

    /// Synchronise every participant; returns bases whose picks were abandoned
    fn commit(&self, state: &mut BaseState, gate: &GateGuard) -> Vec<Weak<BarrierBase>> {
        let mut released = Vec::new();
        for participant in state.altable.values() {
            let Some(offer) = &participant.offer else {
                continue;
            };
            {
                let mut attempt = offer.attempt.state.open(gate);
                if !attempt.is_live() {
                    continue;
                }
                if let Some(pick) = attempt.pick.take() {
                    if pick.barrier != self.id {
                        released.push(pick.base);
                    }
                }
                attempt.resolution = Some(Resolution {
                    barrier: self.id,
                    rank: offer.rank,
                    outcome: Outcome::Success,
                });
            }
            participant.wake.offer(Outcome::Success);
            offer.attempt.schedule.offer(());
        }
        for participant in state.committed.values_mut() {
            participant.waiting = false;
            participant.wake.offer(Outcome::Success);
        }
        state.generation += 1;
        state.last_outcome = Some(Outcome::Success);
        Self::kill_watchdog(state, gate);
        tracing::debug!(
            barrier = %self.config.name,
            generation = state.generation,
            participants = state.committed.len() + state.altable.len(),
            "barrier synchronised"
        );
        released
    }

    /// Resolve every pending attempt on this barrier with a timeout
    fn force_timeout(&self, state: &mut BaseState, gate: &GateGuard) -> usize {
        if !self.has_pickers(state, gate) {
            tracing::trace!(barrier = %self.config.name, "no pending selection to time out");
            return 0;
        }
        let mut timed_out = 0;
        for participant in state.altable.values() {
            let Some(offer) = &participant.offer else {
                continue;
            };
            {
                let mut attempt = offer.attempt.state.open(gate);
                if !attempt.is_live() {
                    continue;
                }
                if attempt.pick.as_ref().is_some_and(|pick| pick.barrier != self.id) {
                    continue;
                }
                attempt.pick = None;
                attempt.resolution = Some(Resolution {
                    barrier: self.id,
                    rank: offer.rank,
                    outcome: Outcome::Timeout,
                });
            }
            participant.wake.offer(Outcome::Timeout);
            offer.attempt.schedule.offer(());
            timed_out += 1;
        }
        state.generation += 1;
        state.last_outcome = Some(Outcome::Timeout);
        tracing::warn!(
            barrier = %self.config.name,
            timed_out,
            "pending barrier selection timed out"
        );
        timed_out
    }

    fn kill_watchdog(state: &mut BaseState, gate: &GateGuard) {
        if let Some(dog) = state.watchdog.take() {
            dog.kill_locked(gate);
        }
    }

    fn release_picks(gate: &GateGuard, released: Vec<Weak<BarrierBase>>) {
        for base in released.iter().filter_map(Weak::upgrade) {
            base.pick_released(gate);
        }
    }
}

impl std::fmt::Debug for BarrierBase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BarrierBase")
            .field("id", &self.id)
            .field("name", &self.config.name)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "base_tests.rs"]
mod tests;

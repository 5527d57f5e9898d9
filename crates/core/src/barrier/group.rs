// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Guard groups: barriers offered together at one priority level
//!
//! A group is a single guard in an alternation. It may also wrap ordinary guards, which
//! are tried first; a ready ordinary guard wins without offering any barrier. Barriers
//! within a group share the group's rank, so a peer may claim a participant for any of
//! them.

use super::handle::BarrierHandle;
use crate::alt::{AltContext, Guard};
use crate::error::{CspError, UsageFault};
use crate::status::{BarrierStatus, HandleStatus, Outcome, Phase};
use std::sync::{Arc, Mutex, MutexGuard};

/// What a group's last successful disable found
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Selection {
    /// Index into the wrapped ordinary guards
    Guard(usize),
    /// Index into the group's barrier handles
    Barrier(usize),
}

struct GroupState {
    guards: Vec<Box<dyn Guard>>,
    barriers: Vec<BarrierHandle>,
    enabled_guards: usize,
    offered: usize,
    last: Option<Selection>,
    outcome: Option<Outcome>,
    last_synchronised: Option<usize>,
}

/// Barrier handles (and optionally ordinary guards) offered as one alternation guard
///
/// Clones share state, so a process can keep a clone to inspect the selection after
/// handing the group to an [`crate::alt::Alternative`].
#[derive(Clone)]
pub struct GuardGroup {
    state: Arc<Mutex<GroupState>>,
}

impl GuardGroup {
    pub fn new(barriers: Vec<BarrierHandle>) -> Self {
        Self::with_guards(barriers, Vec::new())
    }

    pub fn with_guards(barriers: Vec<BarrierHandle>, guards: Vec<Box<dyn Guard>>) -> Self {
        Self {
            state: Arc::new(Mutex::new(GroupState {
                guards,
                barriers,
                enabled_guards: 0,
                offered: 0,
                last: None,
                outcome: None,
                last_synchronised: None,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, GroupState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn barriers(&self) -> Vec<BarrierHandle> {
        self.lock().barriers.clone()
    }

    /// Which member fired the last time this group was selected
    pub fn last_selected(&self) -> Option<Selection> {
        self.lock().last
    }

    /// Outcome of the barrier that fired, if a barrier fired
    pub fn outcome(&self) -> Option<Outcome> {
        self.lock().outcome
    }

    /// The barrier this group most recently synchronised on successfully
    pub fn last_synchronised(&self) -> Option<BarrierHandle> {
        let state = self.lock();
        state
            .last_synchronised
            .and_then(|index| state.barriers.get(index).cloned())
    }

    /// Set the status of every barrier in the group
    pub fn set_status(&self, status: HandleStatus) -> Result<(), CspError> {
        for handle in self.barriers() {
            handle.set_status(status)?;
        }
        Ok(())
    }
}

impl Guard for GuardGroup {
    fn enable(&mut self, ctx: &mut AltContext<'_>) -> Result<bool, CspError> {
        let mut guard = self.lock();
        let state = &mut *guard;
        state.last = None;
        state.outcome = None;
        state.enabled_guards = 0;
        state.offered = 0;

        for index in 0..state.guards.len() {
            state.enabled_guards = index + 1;
            if state.guards[index].enable(ctx)? {
                return Ok(true);
            }
        }
        if state.barriers.is_empty() {
            return Ok(false);
        }
        if let Some(handle) = state.barriers.iter().find(|h| h.is_committed()) {
            return Err(UsageFault::CommittedInAlternation {
                handle: handle.id(),
            }
            .into());
        }

        let rank = ctx.rank();
        let attempt = ctx.attempt();
        attempt.register(rank);
        let gate = attempt.lock()?;
        let mut fired = false;
        let mut failure = None;
        for handle in &state.barriers {
            if attempt.is_resolved(&gate) {
                fired = true;
                break;
            }
            state.offered += 1;
            attempt.enter(Phase::Stealing);
            handle.attempt_synchronisation();
            let offered = handle.base().offer(&gate, handle.id(), attempt.shared(), rank);
            match offered {
                Ok(BarrierStatus::Complete) => {
                    fired = true;
                    break;
                }
                Ok(_) => attempt.note_offer(rank, Arc::clone(handle.base()), handle.id()),
                Err(fault) => {
                    failure = Some(fault);
                    break;
                }
            }
        }
        if !fired && attempt.is_resolved(&gate) {
            fired = true;
        }
        attempt.unlock(gate);
        attempt.enter(Phase::BetweenGuardGroups);

        match failure {
            Some(fault) => Err(fault.into()),
            None => Ok(fired),
        }
    }

    fn disable(&mut self, ctx: &mut AltContext<'_>) -> Result<bool, CspError> {
        let mut guard = self.lock();
        let state = &mut *guard;
        let mut failure: Option<CspError> = None;

        let mut ready_guard = None;
        for index in (0..state.enabled_guards).rev() {
            match state.guards[index].disable(ctx) {
                Ok(true) => ready_guard = Some(index),
                Ok(false) => {}
                Err(e) => {
                    failure.get_or_insert(e);
                }
            }
        }

        let mut fired: Option<(usize, Outcome)> = None;
        let offered = state.offered;
        let rank = ctx.rank();
        let attempt = if offered > 0 {
            ctx.existing_attempt()
        } else {
            None
        };
        if let Some(attempt) = attempt {
            match attempt.lock() {
                Ok(gate) => {
                    attempt.enter(Phase::InDisable);
                    attempt.enter(Phase::ResetBarriers);
                    for (index, handle) in state.barriers[..offered].iter().enumerate().rev() {
                        match handle
                            .base()
                            .withdraw(&gate, handle.id(), attempt.shared(), rank)
                        {
                            Ok(Some(outcome)) => fired = Some((index, outcome)),
                            Ok(None) => {}
                            Err(fault) => {
                                failure.get_or_insert(fault.into());
                            }
                        }
                    }
                    attempt.enter(Phase::EndDisable);
                    attempt.unlock(gate);
                }
                Err(fault) => {
                    failure.get_or_insert(fault.into());
                }
            }
            if fired.is_some() {
                attempt.mark_selected(rank);
            }
            attempt.unregister(rank);
            attempt.enter(Phase::ReturnDisable);
        }
        state.enabled_guards = 0;
        state.offered = 0;

        if let Some(e) = failure {
            return Err(e);
        }
        if let Some((index, outcome)) = fired {
            state.last = Some(Selection::Barrier(index));
            state.outcome = Some(outcome);
            if outcome == Outcome::Success {
                state.last_synchronised = Some(index);
            }
            tracing::debug!(
                barrier = %state.barriers[index].base().name(),
                handle = %state.barriers[index].id(),
                outcome = %outcome,
                "guard group selected barrier"
            );
            return Ok(true);
        }
        if let Some(index) = ready_guard {
            state.last = Some(Selection::Guard(index));
            return Ok(true);
        }
        Ok(false)
    }

    fn describe(&self) -> &'static str {
        "guard group"
    }
}

#[cfg(test)]
#[path = "group_tests.rs"]
mod tests;

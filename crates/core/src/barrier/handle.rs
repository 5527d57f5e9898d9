// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Barrier handles: one process's membership of a barrier

use super::base::BarrierBase;
use super::group::GuardGroup;
use crate::alt::Alternative;
use crate::error::CspError;
use crate::id::HandleId;
use crate::status::{BarrierStatus, HandleStatus, Outcome};
use crate::sync::{Gatekeeper, Slot};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

struct HandleInner {
    id: HandleId,
    base: Arc<BarrierBase>,
    /// Private wake cell; completing processes deliver the outcome here
    wake: Arc<Slot<Outcome>>,
    committed: AtomicBool,
}

/// A participant's membership of one barrier
///
/// Clones refer to the same membership. A handle is enrolled on creation and resigns
/// when the last clone is dropped.
#[derive(Clone)]
pub struct BarrierHandle {
    inner: Arc<HandleInner>,
}

impl BarrierHandle {
    pub fn new(base: &Arc<BarrierBase>, committed: bool) -> Result<Self, CspError> {
        let gate = Gatekeeper::acquire()?;
        let inner = HandleInner {
            id: HandleId::fresh(),
            base: Arc::clone(base),
            wake: Arc::new(Slot::new()),
            committed: AtomicBool::new(committed),
        };
        let enrolled = base.enroll_locked(&gate, inner.id, committed, Arc::clone(&inner.wake));
        // Release before `inner` can drop, its drop takes the gatekeeper
        drop(gate);
        enrolled?;
        Ok(Self {
            inner: Arc::new(inner),
        })
    }

    pub fn id(&self) -> HandleId {
        self.inner.id
    }

    pub fn base(&self) -> &Arc<BarrierBase> {
        &self.inner.base
    }

    /// Committed handles synchronise unconditionally and may not be offered in an alternation
    pub fn is_committed(&self) -> bool {
        self.inner.committed.load(Ordering::Acquire)
    }

    pub fn is_enrolled(&self) -> Result<bool, CspError> {
        let gate = Gatekeeper::acquire()?;
        Ok(self.inner.base.is_enrolled(&gate, self.inner.id))
    }

    pub fn status(&self) -> Result<HandleStatus, CspError> {
        let gate = Gatekeeper::acquire()?;
        Ok(self.inner.base.handle_status(&gate, self.inner.id)?)
    }

    /// Merge a new status, explicit statuses trumping implicit ones
    ///
    /// Returns the barrier's aggregate status afterwards. The barrier completes if this
    /// change makes it completable.
    pub fn set_status(&self, status: HandleStatus) -> Result<BarrierStatus, CspError> {
        let gate = Gatekeeper::acquire()?;
        Ok(self
            .inner
            .base
            .update_status(&gate, self.inner.id, |current| HandleStatus::merge(current, status))?)
    }

    /// Drop any explicit status, returning to implicit not-ready
    pub fn reset_status(&self) -> Result<BarrierStatus, CspError> {
        let gate = Gatekeeper::acquire()?;
        Ok(self
            .inner
            .base
            .update_status(&gate, self.inner.id, |_| HandleStatus::ImplicitNotReady)?)
    }

    /// Enrol again after resigning
    pub fn enroll(&self, committed: bool) -> Result<(), CspError> {
        let gate = Gatekeeper::acquire()?;
        self.inner
            .base
            .enroll_locked(&gate, self.inner.id, committed, Arc::clone(&self.inner.wake))?;
        self.inner.committed.store(committed, Ordering::Release);
        Ok(())
    }

    /// Leave the barrier; resigning twice is a no-op
    pub fn resign(&self) -> Result<(), CspError> {
        let gate = Gatekeeper::acquire()?;
        self.inner.base.resign_locked(&gate, self.inner.id);
        Ok(())
    }

    /// Hook called each time this handle's barrier is offered
    pub fn attempt_synchronisation(&self) {
        tracing::trace!(handle = %self.inner.id, barrier = %self.inner.base.name(), "attempting synchronisation");
    }

    /// Synchronise on this barrier alone
    ///
    /// A committed handle blocks until every participant has arrived, or comes back with
    /// [`Outcome::Failure`] if it is resigned through a clone while waiting. An altable
    /// handle runs a single-guard alternation and may come back with [`Outcome::Timeout`]
    /// if a peer never turned up.
    pub fn sync(&self) -> Result<Outcome, CspError> {
        self.attempt_synchronisation();
        if !self.is_committed() {
            let group = GuardGroup::new(vec![self.clone()]);
            let mut alt = Alternative::new(vec![Box::new(group.clone())]);
            alt.pri_select()?;
            return Ok(group.outcome().unwrap_or(Outcome::Failure));
        }

        let gate = Gatekeeper::acquire()?;
        let completed = self.inner.base.arrive(&gate, self.inner.id)?;
        drop(gate);
        if completed {
            tracing::trace!(handle = %self.inner.id, "arrived last");
        }
        Ok(self.inner.wake.recv().unwrap_or(Outcome::Failure))
    }
}

impl std::fmt::Debug for BarrierHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BarrierHandle")
            .field("id", &self.inner.id)
            .field("barrier", &self.inner.base.name())
            .field("committed", &self.is_committed())
            .finish()
    }
}

impl Drop for HandleInner {
    fn drop(&mut self) {
        match Gatekeeper::acquire() {
            Ok(gate) => {
                self.base.resign_locked(&gate, self.id);
            }
            Err(_) => {
                // Dropped inside the gatekeeper; resign as soon as it is released
                let base = Arc::clone(&self.base);
                let id = self.id;
                let deferred = Gatekeeper::defer(move |gate| {
                    base.resign_locked(gate, id);
                });
                tracing::trace!(
                    handle = %self.id,
                    barrier = %self.base.name(),
                    deferred,
                    "handle dropped inside the gatekeeper"
                );
            }
        }
    }
}

#[cfg(test)]
#[path = "handle_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Alternation: choosing one ready guard out of many
//!
//! Each invocation enables guards in traversal order until one reports ready, blocks on
//! the invocation's schedule slot if none did, then disables the enabled guards in
//! reverse order. Guards that offer barriers share one [`AttemptRecord`] per invocation;
//! when a barrier resolves the attempt, its rank binds the selection.

mod guards;
mod traversal;

pub use guards::{Skip, TimeoutGuard};
pub use traversal::{FairTraversal, PriorityTraversal, Traversal};

use crate::barrier::AttemptRecord;
use crate::error::{CspError, UsageFault};
use crate::status::Phase;
use crate::sync::Slot;
use std::sync::Arc;

/// Something an alternation can wait on
pub trait Guard: Send {
    /// Register interest; `Ok(true)` if the guard is ready right now
    fn enable(&mut self, ctx: &mut AltContext<'_>) -> Result<bool, CspError>;

    /// Withdraw interest; `Ok(true)` if the guard is ready
    fn disable(&mut self, ctx: &mut AltContext<'_>) -> Result<bool, CspError>;

    /// Real time the alternation may block before this guard becomes ready on its own
    ///
    /// `None` for guards that are made ready by someone else, including timeouts on a
    /// clock that wakes its waiters itself.
    fn remaining(&self) -> Option<std::time::Duration> {
        None
    }

    fn describe(&self) -> &'static str {
        "guard"
    }
}

/// Per-guard view of the running alternation invocation
pub struct AltContext<'a> {
    schedule: &'a Arc<Slot<()>>,
    attempt: &'a mut Option<AttemptRecord>,
    rank: usize,
}

impl<'a> AltContext<'a> {
    pub(crate) fn new(
        schedule: &'a Arc<Slot<()>>,
        attempt: &'a mut Option<AttemptRecord>,
        rank: usize,
    ) -> Self {
        Self {
            schedule,
            attempt,
            rank,
        }
    }

    /// Slot that wakes the invocation when any enabled guard may have become ready
    pub fn schedule(&self) -> &Arc<Slot<()>> {
        self.schedule
    }

    /// Position of the current guard in this invocation's traversal order
    pub fn rank(&self) -> usize {
        self.rank
    }

    /// The invocation's attempt record, created on first use
    pub(crate) fn attempt(&mut self) -> &mut AttemptRecord {
        self.attempt
            .get_or_insert_with(|| AttemptRecord::new(Arc::clone(self.schedule)))
    }

    pub(crate) fn existing_attempt(&mut self) -> Option<&mut AttemptRecord> {
        self.attempt.as_mut()
    }
}

/// A reusable choice over a fixed list of guards
pub struct Alternative {
    guards: Vec<Box<dyn Guard>>,
    schedule: Arc<Slot<()>>,
    fair: FairTraversal,
}

impl Alternative {
    pub fn new(guards: Vec<Box<dyn Guard>>) -> Self {
        Self {
            guards,
            schedule: Arc::new(Slot::new()),
            fair: FairTraversal::default(),
        }
    }

    pub fn len(&self) -> usize {
        self.guards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.guards.is_empty()
    }

    /// Select the first ready guard in declaration order
    pub fn pri_select(&mut self) -> Result<usize, CspError> {
        select_with(&mut self.guards, &self.schedule, &mut PriorityTraversal)
    }

    /// Select with rotating priority so no ready guard is starved
    pub fn fair_select(&mut self) -> Result<usize, CspError> {
        select_with(&mut self.guards, &self.schedule, &mut self.fair)
    }

    /// Arbitrary choice; implemented as a fair select
    pub fn select(&mut self) -> Result<usize, CspError> {
        self.fair_select()
    }

    /// Select using a caller-supplied traversal
    pub fn select_by(&mut self, traversal: &mut dyn Traversal) -> Result<usize, CspError> {
        select_with(&mut self.guards, &self.schedule, traversal)
    }
}

fn select_with(
    guards: &mut [Box<dyn Guard>],
    schedule: &Arc<Slot<()>>,
    traversal: &mut dyn Traversal,
) -> Result<usize, CspError> {
    let len = guards.len();
    if len == 0 {
        return Err(UsageFault::EmptyAlternative.into());
    }

    loop {
        let order = traversal.order(len);
        schedule.arm();
        let mut attempt: Option<AttemptRecord> = None;
        let mut failure: Option<CspError> = None;
        let mut enabled = 0;
        let mut ready = false;

        for (rank, &index) in order.iter().enumerate() {
            enabled = rank + 1;
            let mut ctx = AltContext::new(schedule, &mut attempt, rank);
            match guards[index].enable(&mut ctx) {
                Ok(true) => {
                    ready = true;
                    break;
                }
                Ok(false) => {}
                Err(e) => {
                    failure = Some(e);
                    break;
                }
            }
        }

        if !ready && failure.is_none() {
            if let Some(record) = attempt.as_mut() {
                if let Err(fault) = record.begin_wait() {
                    failure = Some(fault.into());
                }
            }
        }
        if !ready && failure.is_none() {
            if let Some(record) = attempt.as_mut() {
                record.enter(Phase::AltMonitor);
            }
            let timeout = order[..enabled]
                .iter()
                .filter_map(|&index| guards[index].remaining())
                .min();
            match timeout {
                Some(delay) => {
                    schedule.recv_timeout(delay);
                }
                None => {
                    schedule.recv();
                }
            }
            if let Some(record) = attempt.as_mut() {
                record.enter(Phase::PostAltMonitor);
                if let Err(fault) = record.end_wait() {
                    failure = Some(fault.into());
                }
            }
        }

        if let Some(record) = attempt.as_mut() {
            record.enter(Phase::PreDisable);
        }
        let mut selected: Option<usize> = None;
        for rank in (0..enabled).rev() {
            let mut ctx = AltContext::new(schedule, &mut attempt, rank);
            match guards[order[rank]].disable(&mut ctx) {
                Ok(true) => selected = Some(rank),
                Ok(false) => {}
                Err(e) => {
                    failure.get_or_insert(e);
                }
            }
        }
        schedule.disarm();

        if let Some(record) = attempt.take() {
            // A barrier that resolved the attempt binds the choice
            if let Some(rank) = record.selected_rank() {
                selected = Some(rank);
            }
            if let Err(e) = record.dispose() {
                failure.get_or_insert(e.into());
            }
        }

        if let Some(e) = failure {
            return Err(e);
        }
        if let Some(rank) = selected {
            let index = order[rank];
            tracing::trace!(index, rank, guard = guards[index].describe(), "alternation selected");
            traversal.record_selection(index, len);
            return Ok(index);
        }
    }
}

#[cfg(test)]
#[path = "alt_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Watchdog for pending barrier selections
//!
//! A barrier starts a watchdog when an attempt first picks it. If the barrier neither
//! completes nor loses all of its pickers before the delay runs out, the watchdog claims
//! the gatekeeper and forces a timeout, which breaks cycles of processes each waiting
//! on a different barrier.
//!
//! ```text
//! Armed ──delay──► ClaimingLock ──► ForcingTimeout
//!   │                   │
//!   └──kill──► Killed ◄─┘ (killed while queued on the gatekeeper)
//! ```
//!
//! The kill flag is only written while the gatekeeper is held, and the watchdog reads it
//! after acquiring the gatekeeper, so a kill and a timeout can never both happen.

use super::base::BarrierBase;
use crate::error::UsageFault;
use crate::id::BarrierId;
use crate::sync::{GateGuard, Gatekeeper};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, Weak};
use std::thread;
use std::time::Duration;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WatchdogState {
    Armed,
    ClaimingLock,
    ForcingTimeout,
    Killed,
}

#[derive(Debug)]
struct WatchdogShared {
    barrier: BarrierId,
    killed: AtomicBool,
    state: Mutex<WatchdogState>,
    woken: Condvar,
}

/// Handle on a running watchdog thread
#[derive(Clone, Debug)]
pub struct Watchdog {
    shared: Arc<WatchdogShared>,
}

impl Watchdog {
    pub(crate) fn spawn(
        base: Weak<BarrierBase>,
        barrier: BarrierId,
        name: &str,
        delay: Duration,
    ) -> std::io::Result<Self> {
        let dog = Self {
            shared: Arc::new(WatchdogShared {
                barrier,
                killed: AtomicBool::new(false),
                state: Mutex::new(WatchdogState::Armed),
                woken: Condvar::new(),
            }),
        };
        let runner = dog.clone();
        thread::Builder::new()
            .name(format!("watchdog-{name}"))
            .spawn(move || runner.run(base, delay))?;
        tracing::trace!(barrier = %barrier, delay = ?delay, "watchdog armed");
        Ok(dog)
    }

    pub fn barrier(&self) -> BarrierId {
        self.shared.barrier
    }

    pub fn state(&self) -> WatchdogState {
        *self.shared.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn is_killed(&self) -> bool {
        self.shared.killed.load(Ordering::SeqCst)
    }

    /// Stop the watchdog; only legal while holding the gatekeeper
    pub fn kill(&self) -> Result<(), UsageFault> {
        if !Gatekeeper::is_held_by_current_thread() {
            return Err(UsageFault::KillWithoutLock {
                barrier: self.shared.barrier,
            });
        }
        self.mark_killed();
        Ok(())
    }

    pub(crate) fn kill_locked(&self, _gate: &GateGuard) {
        self.mark_killed();
    }

    pub(crate) fn same(&self, other: &Watchdog) -> bool {
        Arc::ptr_eq(&self.shared, &other.shared)
    }

    fn mark_killed(&self) {
        self.shared.killed.store(true, Ordering::SeqCst);
        let mut state = self.shared.state.lock().unwrap_or_else(|e| e.into_inner());
        if *state == WatchdogState::Armed {
            *state = WatchdogState::Killed;
        }
        drop(state);
        self.shared.woken.notify_all();
        tracing::trace!(barrier = %self.shared.barrier, "watchdog killed");
    }

    fn set_state(&self, next: WatchdogState) {
        *self.shared.state.lock().unwrap_or_else(|e| e.into_inner()) = next;
    }

    fn run(&self, base: Weak<BarrierBase>, delay: Duration) {
        let state = self.shared.state.lock().unwrap_or_else(|e| e.into_inner());
        let (mut state, _) = self
            .shared
            .woken
            .wait_timeout_while(state, delay, |_| !self.shared.killed.load(Ordering::SeqCst))
            .unwrap_or_else(|e| e.into_inner());
        if *state == WatchdogState::Killed {
            return;
        }
        *state = WatchdogState::ClaimingLock;
        drop(state);

        let gate = match Gatekeeper::acquire() {
            Ok(gate) => gate,
            Err(fault) => {
                tracing::error!(barrier = %self.shared.barrier, error = %fault, "watchdog could not claim gatekeeper");
                return;
            }
        };
        if self.is_killed() {
            self.set_state(WatchdogState::Killed);
            return;
        }
        self.set_state(WatchdogState::ForcingTimeout);
        if let Some(base) = base.upgrade() {
            tracing::debug!(barrier = %base.name(), "watchdog forcing timeout");
            base.watchdog_fired(&gate, self);
        }
        drop(gate);
    }
}

#[cfg(test)]
#[path = "watchdog_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The gatekeeper: one process-wide lock serialising all barrier protocol state
//!
//! Barrier bases, handles and attempt records keep their mutable state in
//! [`GateCell`]s, which can only be opened with a live [`GateGuard`]. Holding the guard
//! is therefore a compile-time proof that the caller owns the gatekeeper.

use crate::error::UsageFault;
use std::marker::PhantomData;
use std::sync::{Condvar, Mutex, MutexGuard};
use std::thread::{self, ThreadId};

/// Work queued by the owner that must run under the gatekeeper before it is released
type Deferred = Box<dyn FnOnce(&GateGuard) + Send>;

/// Process-wide mutual exclusion with owner tracking
pub struct Gatekeeper {
    owner: Mutex<Option<ThreadId>>,
    released: Condvar,
    deferred: Mutex<Vec<Deferred>>,
}

static GATEKEEPER: Gatekeeper = Gatekeeper {
    owner: Mutex::new(None),
    released: Condvar::new(),
    deferred: Mutex::new(Vec::new()),
};

impl Gatekeeper {
    /// Block until the gatekeeper is free, then take it
    ///
    /// Re-acquiring from the owning thread would deadlock and is reported as a fault.
    pub fn acquire() -> Result<GateGuard, UsageFault> {
        let me = thread::current().id();
        let mut owner = GATEKEEPER.owner.lock().unwrap_or_else(|e| e.into_inner());
        if *owner == Some(me) {
            return Err(UsageFault::ReentrantLock);
        }
        while owner.is_some() {
            owner = GATEKEEPER
                .released
                .wait(owner)
                .unwrap_or_else(|e| e.into_inner());
        }
        *owner = Some(me);
        Ok(GateGuard {
            _not_send: PhantomData,
        })
    }

    /// Whether the calling thread currently owns the gatekeeper
    pub fn is_held_by_current_thread() -> bool {
        let owner = GATEKEEPER.owner.lock().unwrap_or_else(|e| e.into_inner());
        *owner == Some(thread::current().id())
    }

    /// Queue `action` to run when the calling thread releases the gatekeeper
    ///
    /// For cleanup that needs the gatekeeper but is triggered while the owner is already
    /// inside it, such as a handle dropped with the gatekeeper held. Returns false, and
    /// drops `action`, if the calling thread does not own the gatekeeper.
    pub(crate) fn defer(action: impl FnOnce(&GateGuard) + Send + 'static) -> bool {
        if !Self::is_held_by_current_thread() {
            return false;
        }
        GATEKEEPER
            .deferred
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(Box::new(action));
        true
    }

    fn take_deferred() -> Vec<Deferred> {
        std::mem::take(&mut *GATEKEEPER.deferred.lock().unwrap_or_else(|e| e.into_inner()))
    }

    fn release() {
        let mut owner = GATEKEEPER.owner.lock().unwrap_or_else(|e| e.into_inner());
        *owner = None;
        drop(owner);
        GATEKEEPER.released.notify_one();
    }
}

/// Scoped ownership of the gatekeeper; released on drop, including during unwinding
pub struct GateGuard {
    // Ownership is tied to the acquiring thread.
    _not_send: PhantomData<*const ()>,
}

impl Drop for GateGuard {
    fn drop(&mut self) {
        // Deferred work may itself defer more
        loop {
            let deferred = Gatekeeper::take_deferred();
            if deferred.is_empty() {
                break;
            }
            for action in deferred {
                action(self);
            }
        }
        Gatekeeper::release();
    }
}

/// Shared state that may only be touched while the gatekeeper is held
pub(crate) struct GateCell<T> {
    inner: Mutex<T>,
}

impl<T> GateCell<T> {
    pub(crate) fn new(value: T) -> Self {
        Self {
            inner: Mutex::new(value),
        }
    }

    /// Open the cell; the borrow cannot outlive the gate guard
    ///
    /// Callers must not open the same cell twice on one stack.
    pub(crate) fn open<'a>(&'a self, _gate: &'a GateGuard) -> MutexGuard<'a, T> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
#[path = "gatekeeper_tests.rs"]
mod tests;

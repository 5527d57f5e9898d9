// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Single-slot synchronisation cell
//!
//! A receiver arms the slot to say it is listening; senders deposit a value only into
//! an armed slot ("wake whoever is listening, else no-op"). Arming before releasing the
//! gatekeeper and blocking afterwards means no wake-up can fall into the gap.
//!
//! The value travels over a one-place crossbeam channel; the armed flag decides whether
//! a sender may use it. A delivery disarms the slot, so at most one value is in flight.

use crossbeam_channel::{self as cc, Receiver, Sender};
use std::sync::Mutex;
use std::time::Duration;

/// Blocking receive, non-blocking send-if-waiting
#[derive(Debug)]
pub struct Slot<T> {
    armed: Mutex<bool>,
    sender: Sender<T>,
    receiver: Receiver<T>,
}

impl<T> Slot<T> {
    pub fn new() -> Self {
        let (sender, receiver) = cc::bounded(1);
        Self {
            armed: Mutex::new(false),
            sender,
            receiver,
        }
    }

    fn armed(&self) -> std::sync::MutexGuard<'_, bool> {
        self.armed.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Start listening, discarding any stale value
    pub fn arm(&self) {
        let mut armed = self.armed();
        while self.receiver.try_recv().is_ok() {}
        *armed = true;
    }

    /// Stop listening, returning a value that arrived in the meantime
    pub fn disarm(&self) -> Option<T> {
        let mut armed = self.armed();
        *armed = false;
        self.receiver.try_recv().ok()
    }

    /// Deliver `value` if someone is listening and the slot is empty
    pub fn offer(&self, value: T) -> bool {
        let mut armed = self.armed();
        if !*armed {
            return false;
        }
        match self.sender.try_send(value) {
            Ok(()) => {
                *armed = false;
                true
            }
            Err(_) => false,
        }
    }

    /// Take a delivered value without blocking; the slot becomes idle
    pub fn take(&self) -> Option<T> {
        let _armed = self.armed();
        self.receiver.try_recv().ok()
    }

    pub fn is_armed(&self) -> bool {
        *self.armed()
    }

    pub fn is_filled(&self) -> bool {
        !self.receiver.is_empty()
    }

    /// An idle slot is armed first so a sender can reach it
    fn listen(&self) {
        let mut armed = self.armed();
        if !*armed && self.receiver.is_empty() {
            *armed = true;
        }
    }

    /// Block until a value is delivered; the slot becomes idle
    ///
    /// `None` only if the slot's channel has been torn down, which cannot happen while
    /// the slot is alive.
    pub fn recv(&self) -> Option<T> {
        self.listen();
        self.receiver.recv().ok()
    }

    /// Like [`Slot::recv`] but gives up after `timeout`, leaving the slot armed
    pub fn recv_timeout(&self, timeout: Duration) -> Option<T> {
        self.listen();
        self.receiver.recv_timeout(timeout).ok()
    }
}

impl<T> Default for Slot<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "slot_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Synchronous point-to-point channels with poison
//!
//! A write completes only once the reader has taken the value, so every transfer is a
//! rendezvous. `begin_read`/`end_read` stretch the rendezvous: the writer stays blocked
//! until the reader has finished with the value.
//!
//! Poison is strength-gated: a channel ignores poison weaker than or equal to its
//! immunity, except [`MAX_STRENGTH`] which always lands. Once poisoned, every operation
//! at either end fails with the original strength so processes can forward it.

use crate::alt::{AltContext, Guard};
use crate::error::{CspError, Strength};
use crate::sync::Slot;
use crossbeam_channel::{self as cc, Receiver, Sender};
use std::sync::{Arc, Mutex, MutexGuard};

/// Poison that bypasses every immunity level
pub const MAX_STRENGTH: Strength = Strength::MAX;

struct Control {
    poison: Option<Strength>,
    /// Dropped when poison first lands, which wakes every blocked end
    alarm: Option<Sender<()>>,
    /// Reader is inside an extended rendezvous
    extended: bool,
    /// Alternation waiting for this channel to become ready
    alt: Option<Arc<Slot<()>>>,
}

struct Shared<T> {
    /// One-place handoff; writers take turns so it never holds more than one value
    items: (Sender<T>, Receiver<T>),
    /// Reader's acknowledgement that ends a rendezvous
    acks: (Sender<()>, Receiver<()>),
    alarm: Receiver<()>,
    control: Mutex<Control>,
    /// Serialises competing writers on a shared output end
    writers: Mutex<()>,
    immunity: Strength,
}

impl<T> Shared<T> {
    fn new(immunity: Strength) -> Self {
        let (alarm_tx, alarm) = cc::bounded(0);
        Self {
            items: cc::bounded(1),
            acks: cc::bounded(1),
            alarm,
            control: Mutex::new(Control {
                poison: None,
                alarm: Some(alarm_tx),
                extended: false,
                alt: None,
            }),
            writers: Mutex::new(()),
            immunity,
        }
    }

    fn control(&self) -> MutexGuard<'_, Control> {
        self.control.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn poisoned(&self) -> Result<(), CspError> {
        match self.control().poison {
            Some(strength) => Err(CspError::Poisoned { strength }),
            None => Ok(()),
        }
    }

    fn poison_error(&self) -> CspError {
        CspError::Poisoned {
            strength: self.control().poison.unwrap_or(MAX_STRENGTH),
        }
    }

    fn ready(&self, control: &Control) -> bool {
        control.poison.is_some() || !self.items.1.is_empty()
    }

    fn poison(&self, strength: Strength) -> bool {
        if strength <= self.immunity && strength != MAX_STRENGTH {
            return false;
        }
        let mut control = self.control();
        let landed = control.poison.map_or(true, |current| strength > current);
        if landed {
            control.poison = Some(strength);
            control.alarm = None;
            tracing::debug!(strength, "channel poisoned");
        }
        if let Some(alt) = &control.alt {
            alt.offer(());
        }
        landed
    }

    fn read(&self, extended: bool) -> Result<T, CspError> {
        self.poisoned()?;
        crossbeam_channel::select! {
            recv(self.items.1) -> item => match item {
                Ok(value) => {
                    if extended {
                        self.control().extended = true;
                    } else {
                        let _ = self.acks.0.try_send(());
                    }
                    Ok(value)
                }
                Err(_) => Err(self.poison_error()),
            },
            recv(self.alarm) -> _ => Err(self.poison_error()),
        }
    }

    fn write(&self, value: T) -> Result<(), CspError> {
        let _turn = self.writers.lock().unwrap_or_else(|e| e.into_inner());
        self.poisoned()?;
        self.items.0.send(value).map_err(|_| self.poison_error())?;
        if let Some(alt) = &self.control().alt {
            alt.offer(());
        }

        crossbeam_channel::select! {
            recv(self.acks.1) -> _ => Ok(()),
            recv(self.alarm) -> _ => {
                if self.acks.1.try_recv().is_ok() {
                    Ok(())
                } else {
                    // Withdraw the unread value
                    let _ = self.items.1.try_recv();
                    Err(self.poison_error())
                }
            }
        }
    }

    fn end_read(&self) {
        let mut control = self.control();
        if std::mem::replace(&mut control.extended, false) {
            let _ = self.acks.0.try_send(());
        }
    }
}

/// Writing end; clones share the channel and take turns
pub struct ChannelOutput<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Clone for ChannelOutput<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

/// Reading end, usable as an alternation guard via [`AltingChannelInput::guard`]
pub struct AltingChannelInput<T> {
    shared: Arc<Shared<T>>,
}

/// Create an unbuffered channel with no poison immunity
pub fn one2one<T>() -> (ChannelOutput<T>, AltingChannelInput<T>) {
    one2one_with_immunity(0)
}

/// Create a channel whose writing end is shared by several processes
///
/// Clone the output for each writer; competing writes are serialised.
pub fn any2one<T>() -> (ChannelOutput<T>, AltingChannelInput<T>) {
    one2one_with_immunity(0)
}

/// Create an unbuffered channel that ignores poison of `immunity` strength or weaker
pub fn one2one_with_immunity<T>(immunity: Strength) -> (ChannelOutput<T>, AltingChannelInput<T>) {
    let shared = Arc::new(Shared::new(immunity));
    (
        ChannelOutput {
            shared: Arc::clone(&shared),
        },
        AltingChannelInput { shared },
    )
}

impl<T> ChannelOutput<T> {
    /// Block until the reader has taken `value`
    pub fn write(&self, value: T) -> Result<(), CspError> {
        self.shared.write(value)
    }

    pub fn poison(&self, strength: Strength) -> bool {
        self.shared.poison(strength)
    }

    pub fn immunity(&self) -> Strength {
        self.shared.immunity
    }
}

impl<T> AltingChannelInput<T> {
    pub fn read(&self) -> Result<T, CspError> {
        self.shared.read(false)
    }

    /// Take the value but keep the writer blocked until [`AltingChannelInput::end_read`]
    pub fn begin_read(&self) -> Result<T, CspError> {
        self.shared.read(true)
    }

    pub fn end_read(&self) {
        self.shared.end_read();
    }

    /// Whether a read would complete without blocking (a value or poison is waiting)
    pub fn pending(&self) -> bool {
        let control = self.shared.control();
        self.shared.ready(&control)
    }

    pub fn poison(&self, strength: Strength) -> bool {
        self.shared.poison(strength)
    }

    pub fn immunity(&self) -> Strength {
        self.shared.immunity
    }

    /// Guard that is ready while a value or poison is waiting on this channel
    pub fn guard(&self) -> InputGuard<T> {
        InputGuard {
            shared: Arc::clone(&self.shared),
        }
    }
}

/// Alternation guard over a channel's reading end
pub struct InputGuard<T> {
    shared: Arc<Shared<T>>,
}

impl<T: Send> Guard for InputGuard<T> {
    fn enable(&mut self, ctx: &mut AltContext<'_>) -> Result<bool, CspError> {
        let mut control = self.shared.control();
        if self.shared.ready(&control) {
            return Ok(true);
        }
        control.alt = Some(Arc::clone(ctx.schedule()));
        Ok(false)
    }

    fn disable(&mut self, _ctx: &mut AltContext<'_>) -> Result<bool, CspError> {
        let mut control = self.shared.control();
        control.alt = None;
        Ok(self.shared.ready(&control))
    }

    fn describe(&self) -> &'static str {
        "channel"
    }
}

#[cfg(test)]
#[path = "channel_tests.rs"]
mod tests;

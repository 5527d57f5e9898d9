// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! csp-core: communicating sequential processes with multiway altable barriers
//!
//! This crate provides:
//! - Synchronous channels with strength-gated poison
//! - Alternation over channel, timeout, skip and barrier guards
//! - Altable barriers that can be offered in an alternation alongside other guards
//! - Parallel composition of processes on scoped threads

pub mod alt;
pub mod barrier;
pub mod channel;
pub mod clock;
pub mod error;
pub mod id;
pub mod process;
pub mod status;
pub mod sync;

pub use alt::{
    AltContext, Alternative, FairTraversal, Guard, PriorityTraversal, Skip, TimeoutGuard,
    Traversal,
};
pub use barrier::{
    AttemptRecord, BarrierBase, BarrierConfig, BarrierHandle, BarrierSnapshot, GuardGroup,
    Selection, TraversalWindow, Watchdog, WatchdogState,
};
pub use channel::{
    any2one, one2one, one2one_with_immunity, AltingChannelInput, ChannelOutput, InputGuard,
    MAX_STRENGTH,
};
pub use clock::{Clock, FakeClock, SystemClock};
pub use error::{CspError, Strength, UsageFault};
pub use id::{AttemptId, BarrierId, HandleId};
pub use process::{process, FnProcess, Parallel, Process};
pub use status::{BarrierStatus, HandleStatus, Outcome, Phase};
pub use sync::{Gatekeeper, GateGuard, Slot};

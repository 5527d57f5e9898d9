// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Multiway altable barriers
//!
//! A barrier synchronises a fixed set of enrolled processes. Committed participants
//! block in [`BarrierHandle::sync`] until everyone has arrived; altable participants
//! offer the barrier as a guard in an alternation and may choose something else
//! instead. The barrier completes only when every participant is simultaneously
//! willing, and then it completes for all of them at once.

mod attempt;
mod base;
mod config;
mod group;
mod handle;
mod watchdog;

pub use attempt::{AttemptRecord, TraversalWindow};
pub use base::{BarrierBase, BarrierSnapshot};
pub use config::{BarrierConfig, DEFAULT_BASE_DELAY};
pub use group::{GuardGroup, Selection};
pub use handle::BarrierHandle;
pub use watchdog::{Watchdog, WatchdogState};

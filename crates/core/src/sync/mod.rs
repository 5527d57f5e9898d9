// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Low-level synchronisation: the gatekeeper lock and the single-slot wake cell

pub mod gatekeeper;
pub mod slot;

pub(crate) use gatekeeper::GateCell;
pub use gatekeeper::{GateGuard, Gatekeeper};
pub use slot::Slot;

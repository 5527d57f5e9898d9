// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error taxonomy for process networks
//!
//! Usage faults are programming errors and surface from the first call that detects them.
//! Poison is a control-flow signal rather than a fault but travels on the same `Err` path
//! so that `?` tears a process down.

use crate::id::{BarrierId, HandleId};
use thiserror::Error;

/// Poison strength carried by a poisoned channel
pub type Strength = u32;

/// Programming errors in the use of barriers, handles and the gatekeeper
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UsageFault {
    #[error("handle {handle} is already enrolled on barrier '{barrier}'")]
    AlreadyEnrolled { handle: HandleId, barrier: String },

    #[error("handle {handle} has resigned from barrier '{barrier}'")]
    Resigned { handle: HandleId, barrier: String },

    #[error("watchdog for barrier {barrier} killed without holding the gatekeeper")]
    KillWithoutLock { barrier: BarrierId },

    #[error("gatekeeper is already held by this thread")]
    ReentrantLock,

    #[error("committed handle {handle} cannot be offered in an alternation")]
    CommittedInAlternation { handle: HandleId },

    #[error("handle {handle} belongs to a different barrier than '{barrier}'")]
    ForeignHandle { handle: HandleId, barrier: String },

    #[error("alternation has no guards to select from")]
    EmptyAlternative,
}

/// Errors raised by channel, alternation and process operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CspError {
    #[error(transparent)]
    Usage(#[from] UsageFault),

    #[error("channel poisoned with strength {strength}")]
    Poisoned { strength: Strength },

    #[error("process '{name}' panicked while running")]
    ProcessPanicked { name: String },

    #[error("failed to start process '{name}': {reason}")]
    Spawn { name: String, reason: String },
}

impl CspError {
    /// Poison strength, if this error is a poison signal
    pub fn poison_strength(&self) -> Option<Strength> {
        match self {
            CspError::Poisoned { strength } => Some(*strength),
            _ => None,
        }
    }

    pub fn is_poison(&self) -> bool {
        matches!(self, CspError::Poisoned { .. })
    }
}

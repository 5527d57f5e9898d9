// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Protocol vocabulary shared by every part of the barrier subsystem
//!
//! Each state carries a stable integer code so logs and reports compare unambiguously.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Aggregate status of a barrier, computed over all enrolled participants
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum BarrierStatus {
    /// A committed participant has not arrived
    NotReady = 2,
    /// An altable participant is not offering the barrier in a live attempt
    NotSyncingNow = 3,
    /// Every participant is offering, nobody has picked the barrier yet
    ProbablyReady = 4,
    /// At least one participant has tentatively picked the barrier
    Selected = 5,
    /// Every participant is ready at this instant
    Complete = 7,
}

impl BarrierStatus {
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Whether a scanning process may pick the barrier
    pub fn is_offerable(self) -> bool {
        matches!(self, BarrierStatus::ProbablyReady | BarrierStatus::Selected)
    }

    pub fn name(self) -> &'static str {
        match self {
            BarrierStatus::NotReady => "NOT_READY",
            BarrierStatus::NotSyncingNow => "NOT_SYNCING_NOW",
            BarrierStatus::ProbablyReady => "PROBABLY_READY",
            BarrierStatus::Selected => "SELECTED",
            BarrierStatus::Complete => "COMPLETE",
        }
    }
}

impl fmt::Display for BarrierStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Readiness a single handle declares for its barrier
///
/// Writes obey a trump order, see [`HandleStatus::merge`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum HandleStatus {
    ImplicitReady = 8,
    /// Overrides every other write
    ExplicitReady = 9,
    #[default]
    ImplicitNotReady = 10,
    /// Overrides everything except `ExplicitReady`
    ExplicitNotReady = 11,
}

impl HandleStatus {
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn is_ready(self) -> bool {
        matches!(self, HandleStatus::ImplicitReady | HandleStatus::ExplicitReady)
    }

    pub fn is_explicit(self) -> bool {
        matches!(
            self,
            HandleStatus::ExplicitReady | HandleStatus::ExplicitNotReady
        )
    }

    /// Position in the trump lattice; a write lands only if it ranks at least as high
    fn rank(self) -> u8 {
        match self {
            HandleStatus::ExplicitReady => 2,
            HandleStatus::ExplicitNotReady => 1,
            HandleStatus::ImplicitReady | HandleStatus::ImplicitNotReady => 0,
        }
    }

    /// Apply `incoming` on top of `current`
    ///
    /// `ExplicitReady > ExplicitNotReady > {ImplicitReady, ImplicitNotReady}`; implicit
    /// writes replace each other freely but never an explicit status.
    pub fn merge(current: HandleStatus, incoming: HandleStatus) -> HandleStatus {
        if incoming.rank() >= current.rank() {
            incoming
        } else {
            current
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            HandleStatus::ImplicitReady => "IMPLICIT_READY",
            HandleStatus::ExplicitReady => "EXPLICIT_READY",
            HandleStatus::ImplicitNotReady => "IMPLICIT_NOT_READY",
            HandleStatus::ExplicitNotReady => "EXPLICIT_NOT_READY",
        }
    }
}

impl fmt::Display for HandleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Process-local phase of an alternation attempt, recorded for diagnostics
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum Phase {
    WaitForLock = 20,
    Stealing = 21,
    Waiting = 22,
    BetweenGuardGroups = 23,
    AltMonitor = 24,
    PostAltMonitor = 25,
    PreGatekeeper = 26,
    PostGatekeeper = 27,
    PreDisable = 28,
    InDisable = 29,
    EndDisable = 30,
    ResetBarriers = 31,
    RemoveAttempt = 32,
    ReturnDisable = 33,
}

impl Phase {
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn name(self) -> &'static str {
        match self {
            Phase::WaitForLock => "WAIT_FOR_LOCK",
            Phase::Stealing => "STEALING",
            Phase::Waiting => "WAITING",
            Phase::BetweenGuardGroups => "BETWEEN_GUARD_GROUPS",
            Phase::AltMonitor => "ALT_MONITOR",
            Phase::PostAltMonitor => "POST_ALT_MONITOR",
            Phase::PreGatekeeper => "PRE_GATEKEEPER",
            Phase::PostGatekeeper => "POST_GATEKEEPER",
            Phase::PreDisable => "PRE_DISABLE",
            Phase::InDisable => "IN_DISABLE",
            Phase::EndDisable => "END_DISABLE",
            Phase::ResetBarriers => "RESET_BARRIERS",
            Phase::RemoveAttempt => "REMOVE_ATTEMPT",
            Phase::ReturnDisable => "RETURN_DISABLE",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How a barrier synchronisation attempt ended
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum Outcome {
    Success = 40,
    Failure = 41,
    Timeout = 42,
}

impl Outcome {
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn name(self) -> &'static str {
        match self {
            Outcome::Success => "SUCCESS",
            Outcome::Failure => "FAILURE",
            Outcome::Timeout => "TIMEOUT",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Ordinary guards that need no partner process

use super::{AltContext, Guard};
use crate::clock::{Clock, SystemClock};
use crate::error::CspError;
use std::time::{Duration, Instant};

/// Always ready
#[derive(Clone, Copy, Debug, Default)]
pub struct Skip;

impl Guard for Skip {
    fn enable(&mut self, _ctx: &mut AltContext<'_>) -> Result<bool, CspError> {
        Ok(true)
    }

    fn disable(&mut self, _ctx: &mut AltContext<'_>) -> Result<bool, CspError> {
        Ok(true)
    }

    fn describe(&self) -> &'static str {
        "skip"
    }
}

/// Ready once its deadline has passed
#[derive(Clone, Debug)]
pub struct TimeoutGuard<C: Clock = SystemClock> {
    clock: C,
    deadline: Instant,
}

impl TimeoutGuard<SystemClock> {
    pub fn after(delay: Duration) -> Self {
        Self::with_clock(SystemClock, delay)
    }
}

impl<C: Clock> TimeoutGuard<C> {
    pub fn with_clock(clock: C, delay: Duration) -> Self {
        let deadline = clock.now() + delay;
        Self { clock, deadline }
    }

    /// Move the deadline to `delay` from now
    pub fn reset(&mut self, delay: Duration) {
        self.deadline = self.clock.now() + delay;
    }

    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    /// Time left on the guard's own clock
    pub fn time_left(&self) -> Duration {
        self.deadline.saturating_duration_since(self.clock.now())
    }

    fn expired(&self) -> bool {
        self.clock.now() >= self.deadline
    }
}

impl<C: Clock + 'static> Guard for TimeoutGuard<C> {
    fn enable(&mut self, ctx: &mut AltContext<'_>) -> Result<bool, CspError> {
        if self.expired() {
            return Ok(true);
        }
        self.clock.wake_at(self.deadline, ctx.schedule());
        Ok(false)
    }

    fn disable(&mut self, _ctx: &mut AltContext<'_>) -> Result<bool, CspError> {
        Ok(self.expired())
    }

    fn remaining(&self) -> Option<Duration> {
        self.clock.real_wait(self.deadline)
    }

    fn describe(&self) -> &'static str {
        "timeout"
    }
}

#[cfg(test)]
#[path = "guards_tests.rs"]
mod tests;

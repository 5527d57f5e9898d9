// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Barrier configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default per-participant watchdog delay
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(500);

fn default_base_delay() -> Duration {
    DEFAULT_BASE_DELAY
}

/// Barrier configuration
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BarrierConfig {
    /// Name used in logs and watchdog thread names
    pub name: String,
    /// Watchdog delay contributed by each altable participant
    #[serde(with = "humantime_serde", default = "default_base_delay")]
    pub base_delay: Duration,
}

impl BarrierConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base_delay: DEFAULT_BASE_DELAY,
        }
    }

    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    /// How long a pending selection may wait before the watchdog forces a timeout
    ///
    /// Larger barriers take longer to assemble, so the delay scales with the number of
    /// altable participants (never less than one base delay).
    pub fn watchdog_delay(&self, altable: usize) -> Duration {
        let factor = u32::try_from(altable.max(1)).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor)
    }
}

impl Default for BarrierConfig {
    fn default() -> Self {
        Self::new("barrier")
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Demo configuration loaded from TOML
//!
//! ```toml
//! base_delay = "500ms"
//!
//! [philosophers]
//! count = 5
//! meals = 3
//! think = "20ms"
//! eat = "10ms"
//!
//! [ring]
//! size = 4
//! rounds = 10
//! ```
//!
//! Every field is optional; command-line flags override the file.

use crate::error::DemoError;
use csp_core::barrier::DEFAULT_BASE_DELAY;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DemoConfig {
    /// Watchdog base delay for every barrier in the network
    #[serde(with = "humantime_serde")]
    pub base_delay: Duration,
    pub philosophers: PhilosophersConfig,
    pub ring: RingConfig,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            base_delay: DEFAULT_BASE_DELAY,
            philosophers: PhilosophersConfig::default(),
            ring: RingConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PhilosophersConfig {
    pub count: usize,
    pub meals: usize,
    /// Longest a philosopher thinks between meals
    #[serde(with = "humantime_serde")]
    pub think: Duration,
    /// Longest a meal lasts
    #[serde(with = "humantime_serde")]
    pub eat: Duration,
}

impl Default for PhilosophersConfig {
    fn default() -> Self {
        Self {
            count: 5,
            meals: 3,
            think: Duration::from_millis(20),
            eat: Duration::from_millis(10),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RingConfig {
    pub size: usize,
    pub rounds: usize,
}

impl Default for RingConfig {
    fn default() -> Self {
        Self { size: 4, rounds: 10 }
    }
}

impl DemoConfig {
    pub fn parse(content: &str) -> Result<Self, DemoError> {
        toml::from_str(content).map_err(|e| DemoError::invalid_config(e.message()).with_source(e))
    }

    /// Load from `path`, or fall back to defaults when no file is given
    pub fn load(path: Option<&Path>) -> Result<Self, DemoError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let content = std::fs::read_to_string(path)
            .map_err(|e| DemoError::config_unreadable(path).with_source(e))?;
        Self::parse(&content).map_err(|e| e.with_context(format!("while reading {}", path.display())))
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;

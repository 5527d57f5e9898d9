// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

pub mod philosophers;
pub mod ring;

use csp_core::{BarrierBase, BarrierConfig, BarrierHandle, CspError, Outcome};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

fn barrier(name: String, base_delay: Duration) -> Arc<BarrierBase> {
    BarrierBase::new(BarrierConfig::new(name).with_base_delay(base_delay))
}

/// Synchronise an altable handle, retrying after a watchdog timeout
fn sync_until_done(handle: &BarrierHandle) -> Result<(), CspError> {
    loop {
        match handle.sync()? {
            Outcome::Success => return Ok(()),
            outcome => {
                tracing::debug!(barrier = %handle.base().name(), %outcome, "retrying sync");
            }
        }
    }
}

fn lock<T>(tallies: &Mutex<T>) -> MutexGuard<'_, T> {
    tallies.lock().unwrap_or_else(|e| e.into_inner())
}

//! Shared helpers for the behavioral specs

#![allow(dead_code)]

pub use csp_core::*;
pub use std::sync::Arc;
pub use std::time::{Duration, Instant};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Condvar, Mutex, Once};

/// Long enough that a watchdog never fires unless a test shortens it
pub const PATIENT: Duration = Duration::from_secs(30);

static LOGGING: Once = Once::new();

/// Route tracing output through the test harness; `RUST_LOG` selects the level
pub fn init_logging() {
    LOGGING.call_once(|| {
        use tracing_subscriber::{fmt, EnvFilter};
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
        let _ = fmt().with_env_filter(filter).with_test_writer().try_init();
    });
}

pub fn barrier(name: &str) -> Arc<BarrierBase> {
    barrier_with_delay(name, PATIENT)
}

pub fn barrier_with_delay(name: &str, base_delay: Duration) -> Arc<BarrierBase> {
    BarrierBase::new(BarrierConfig::new(name).with_base_delay(base_delay))
}

/// Poll `condition` until it holds, failing after five seconds
pub fn eventually(what: &str, mut condition: impl FnMut() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !condition() {
        assert!(Instant::now() < deadline, "timed out waiting for {what}");
        std::thread::sleep(Duration::from_millis(2));
    }
}

/// Run a single-guard-group alternation and return the group's outcome
pub fn select_group(group: &GuardGroup) -> Option<Outcome> {
    let mut alt = Alternative::new(vec![Box::new(group.clone())]);
    alt.pri_select().unwrap();
    group.outcome()
}

#[derive(Default)]
struct StallState {
    entered: AtomicBool,
    released: Mutex<bool>,
    opened: Condvar,
}

/// A guard that holds its alternation mid-scan until released
///
/// Guards before it have already been enabled, so any barriers they offer stay
/// offered while the owner is still scanning.
#[derive(Clone, Default)]
pub struct Stall {
    state: Arc<StallState>,
}

impl Stall {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn wait_until_entered(&self) {
        eventually("stall guard to be entered", || {
            self.state.entered.load(Ordering::Acquire)
        });
    }

    pub fn release(&self) {
        let mut released = self.state.released.lock().unwrap();
        *released = true;
        self.state.opened.notify_all();
    }
}

impl Guard for Stall {
    fn enable(&mut self, _ctx: &mut AltContext<'_>) -> Result<bool, CspError> {
        self.state.entered.store(true, Ordering::Release);
        let mut released = self.state.released.lock().unwrap();
        while !*released {
            released = self.state.opened.wait(released).unwrap();
        }
        Ok(false)
    }

    fn disable(&mut self, _ctx: &mut AltContext<'_>) -> Result<bool, CspError> {
        Ok(false)
    }

    fn describe(&self) -> &'static str {
        "stall"
    }
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Time sources for timeout guards
//!
//! An alternation that holds a timeout guard has to wake up when the guard's deadline
//! passes. On the system clock it simply bounds its blocking wait. A [`FakeClock`] does
//! not move on its own, so instead it remembers which alternation schedules are waiting
//! for which deadline and wakes them from [`FakeClock::advance`].

use crate::sync::Slot;
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::{Duration, Instant};

/// A source of the current time that an alternation can wait on
pub trait Clock: Clone + Send + Sync {
    fn now(&self) -> Instant;

    /// Longest real-time wait before `deadline` is due on this clock
    ///
    /// `None` means the clock wakes the waiter itself through [`Clock::wake_at`].
    fn real_wait(&self, deadline: Instant) -> Option<Duration>;

    /// Ask for `schedule` to be offered a wake-up once this clock reaches `deadline`
    fn wake_at(&self, _deadline: Instant, _schedule: &Arc<Slot<()>>) {}
}

/// Real monotonic clock
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn real_wait(&self, deadline: Instant) -> Option<Duration> {
        Some(deadline.saturating_duration_since(Instant::now()))
    }
}

struct FakeTime {
    now: Instant,
    sleepers: Vec<(Instant, Weak<Slot<()>>)>,
}

/// Clock that only moves when told to
///
/// Clones share the same time and the same set of sleeping alternations.
#[derive(Clone)]
pub struct FakeClock {
    time: Arc<Mutex<FakeTime>>,
}

impl FakeClock {
    pub fn new() -> Self {
        Self {
            time: Arc::new(Mutex::new(FakeTime {
                now: Instant::now(),
                sleepers: Vec::new(),
            })),
        }
    }

    fn time(&self) -> MutexGuard<'_, FakeTime> {
        self.time.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Move time forward and wake every alternation whose deadline has passed
    pub fn advance(&self, duration: Duration) {
        let due: Vec<Arc<Slot<()>>> = {
            let mut time = self.time();
            time.now += duration;
            let now = time.now;
            let mut due = Vec::new();
            time.sleepers.retain(|(deadline, schedule)| {
                let Some(schedule) = schedule.upgrade() else {
                    return false;
                };
                if *deadline <= now {
                    due.push(schedule);
                    false
                } else {
                    true
                }
            });
            due
        };
        for schedule in due {
            schedule.offer(());
        }
    }

    /// Alternation schedules still waiting for a deadline
    pub fn sleepers(&self) -> usize {
        self.time()
            .sleepers
            .iter()
            .filter(|(_, schedule)| schedule.strong_count() > 0)
            .count()
    }
}

impl Default for FakeClock {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for FakeClock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let time = self.time();
        f.debug_struct("FakeClock")
            .field("now", &time.now)
            .field("sleepers", &time.sleepers.len())
            .finish()
    }
}

impl Clock for FakeClock {
    fn now(&self) -> Instant {
        self.time().now
    }

    fn real_wait(&self, _deadline: Instant) -> Option<Duration> {
        None
    }

    fn wake_at(&self, deadline: Instant, schedule: &Arc<Slot<()>>) {
        let mut time = self.time();
        if deadline <= time.now {
            drop(time);
            schedule.offer(());
            return;
        }
        let already = time
            .sleepers
            .iter()
            .any(|(at, s)| *at == deadline && s.as_ptr() == Arc::as_ptr(schedule));
        if !already {
            time.sleepers.push((deadline, Arc::downgrade(schedule)));
        }
    }
}

#[cfg(test)]
#[path = "clock_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Dining philosophers over altable barriers
//!
//! Each philosopher owns a `start` and a `finish` barrier shared with the two forks
//! beside it. Philosophers sync on them unconditionally; forks offer the `start`
//! barriers of both neighbours in a fair alternation, so a philosopher eats only when
//! both forks commit to it at the same instant. The college closes the dinner by
//! poisoning every fork's shutdown channel once each philosopher has had its meals.

use super::{barrier, lock, sync_until_done};
use crate::config::PhilosophersConfig;
use crate::error::DemoError;
use clap::Args;
use csp_core::{
    any2one, one2one, process, AltingChannelInput, Alternative, BarrierHandle, ChannelOutput,
    CspError, GuardGroup, Outcome, Parallel, Process,
};
use serde::Serialize;
use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Args, Debug, Default)]
pub struct PhilosophersArgs {
    /// Number of philosophers (and forks)
    #[arg(long)]
    pub philosophers: Option<usize>,

    /// Meals each philosopher eats before leaving
    #[arg(long)]
    pub meals: Option<usize>,
}

impl PhilosophersArgs {
    pub fn apply(&self, mut config: PhilosophersConfig) -> PhilosophersConfig {
        if let Some(count) = self.philosophers {
            config.count = count;
        }
        if let Some(meals) = self.meals {
            config.meals = meals;
        }
        config
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ForkTally {
    pub fork: usize,
    pub left: usize,
    pub right: usize,
    pub timeouts: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct DinnerReport {
    pub philosophers: usize,
    pub meals: Vec<usize>,
    pub forks: Vec<ForkTally>,
}

impl fmt::Display for DinnerReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} philosophers dined", self.philosophers)?;
        writeln!(f, "{:<12} MEALS", "PHILOSOPHER")?;
        for (id, meals) in self.meals.iter().enumerate() {
            writeln!(f, "{:<12} {}", id, meals)?;
        }
        writeln!(f, "{:<6} {:<6} {:<6} TIMEOUTS", "FORK", "LEFT", "RIGHT")?;
        for tally in &self.forks {
            writeln!(
                f,
                "{:<6} {:<6} {:<6} {}",
                tally.fork, tally.left, tally.right, tally.timeouts
            )?;
        }
        Ok(())
    }
}

/// How long philosopher `id` spends on its `meal`th think or meal
fn pause_for(longest: Duration, id: usize, meal: usize) -> Duration {
    let step = ((id * 7 + meal * 3) % 5 + 1) as u32;
    longest / 5 * step
}

struct Seat {
    start: BarrierHandle,
    finish: BarrierHandle,
}

struct ForkSide {
    philosopher: usize,
    start: BarrierHandle,
    finish: BarrierHandle,
}

fn philosopher(
    id: usize,
    seat: Seat,
    config: &PhilosophersConfig,
    done: ChannelOutput<usize>,
    meals: Arc<Mutex<Vec<usize>>>,
) -> impl FnMut() -> Result<(), CspError> + Send {
    let (think, eat, total) = (config.think, config.eat, config.meals);
    move || {
        for meal in 0..total {
            tracing::debug!(philosopher = id, meal, "thinking");
            std::thread::sleep(pause_for(think, id, meal));

            tracing::debug!(philosopher = id, meal, "hungry");
            seat.start.sync()?;
            // Forks report they are picked up
            seat.start.sync()?;

            tracing::info!(philosopher = id, meal, "eating");
            std::thread::sleep(pause_for(eat, id, meal));

            tracing::debug!(philosopher = id, meal, "leaving the table");
            seat.finish.sync()?;
            seat.finish.sync()?;
            lock(&meals)[id] += 1;
        }
        done.write(id)
    }
}

fn fork(
    id: usize,
    left: ForkSide,
    right: ForkSide,
    shutdown: AltingChannelInput<()>,
    tallies: Arc<Mutex<Vec<ForkTally>>>,
) -> impl FnMut() -> Result<(), CspError> + Send {
    move || {
        let left_group = GuardGroup::new(vec![left.start.clone()]);
        let right_group = GuardGroup::new(vec![right.start.clone()]);
        let mut alt = Alternative::new(vec![
            Box::new(left_group.clone()),
            Box::new(right_group.clone()),
            Box::new(shutdown.guard()),
        ]);

        loop {
            let index = alt.fair_select()?;
            let (group, side) = match index {
                0 => (&left_group, &left),
                1 => (&right_group, &right),
                _ => match shutdown.read() {
                    Err(CspError::Poisoned { strength }) => {
                        tracing::debug!(fork = id, strength, "fork shutting down");
                        break;
                    }
                    Err(e) => return Err(e),
                    Ok(()) => continue,
                },
            };
            if group.outcome() != Some(Outcome::Success) {
                lock(&tallies)[id].timeouts += 1;
                continue;
            }

            tracing::info!(fork = id, philosopher = side.philosopher, "fork picked up");
            sync_until_done(&side.start)?;
            sync_until_done(&side.finish)?;
            tracing::info!(fork = id, philosopher = side.philosopher, "fork put down");
            sync_until_done(&side.finish)?;

            let mut tallies = lock(&tallies);
            if index == 0 {
                tallies[id].left += 1;
            } else {
                tallies[id].right += 1;
            }
        }

        for handle in [&left.start, &left.finish, &right.start, &right.finish] {
            handle.resign()?;
        }
        Ok(())
    }
}

fn college(
    philosophers: usize,
    done: AltingChannelInput<usize>,
    shutdown: Vec<ChannelOutput<()>>,
) -> impl FnMut() -> Result<(), CspError> + Send {
    move || {
        for _ in 0..philosophers {
            let id = done.read()?;
            tracing::info!(philosopher = id, "philosopher has left");
        }
        for output in &shutdown {
            output.poison(1);
        }
        Ok(())
    }
}

/// Run a dinner to completion
pub fn run(config: &PhilosophersConfig, base_delay: Duration) -> anyhow::Result<DinnerReport> {
    let n = config.count;
    if n < 2 {
        return Err(DemoError::too_small("The college", n, 2).into());
    }

    let start: Vec<_> = (0..n)
        .map(|i| barrier(format!("start-{i}"), base_delay))
        .collect();
    let finish: Vec<_> = (0..n)
        .map(|i| barrier(format!("finish-{i}"), base_delay))
        .collect();

    let meals = Arc::new(Mutex::new(vec![0; n]));
    let tallies = Arc::new(Mutex::new(
        (0..n)
            .map(|fork| ForkTally {
                fork,
                ..ForkTally::default()
            })
            .collect::<Vec<_>>(),
    ));
    let (done_out, done_in) = any2one();

    let mut diners = Parallel::named("philosophers");
    let mut forks = Parallel::named("forks");
    let mut shutdown = Vec::with_capacity(n);
    for i in 0..n {
        let seat = Seat {
            start: start[i].create_handle(true)?,
            finish: finish[i].create_handle(true)?,
        };
        diners.push(Box::new(process(
            format!("philosopher-{i}"),
            philosopher(i, seat, config, done_out.clone(), Arc::clone(&meals)),
        )));
    }
    for i in 0..n {
        let right_seat = (i + 1) % n;
        let left = ForkSide {
            philosopher: i,
            start: start[i].create_handle(false)?,
            finish: finish[i].create_handle(false)?,
        };
        let right = ForkSide {
            philosopher: right_seat,
            start: start[right_seat].create_handle(false)?,
            finish: finish[right_seat].create_handle(false)?,
        };
        let (out, input) = one2one();
        shutdown.push(out);
        forks.push(Box::new(process(
            format!("fork-{i}"),
            fork(i, left, right, input, Arc::clone(&tallies)),
        )));
    }
    drop(done_out);

    // Philosophers stay enrolled until the network is dropped, so forks never sync
    // on a seat whose philosopher has left
    let mut network = Parallel::named("college")
        .with(diners)
        .with(forks)
        .with(process("college", college(n, done_in, shutdown)));
    network.run()?;
    drop(network);

    let meals = lock(&meals).clone();
    let forks = lock(&tallies).clone();
    Ok(DinnerReport {
        philosophers: n,
        meals,
        forks,
    })
}

#[cfg(test)]
#[path = "philosophers_tests.rs"]
mod tests;

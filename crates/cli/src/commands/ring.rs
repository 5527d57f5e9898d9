// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! A ring of processes choosing between neighbour barriers
//!
//! Every process offers, in priority order, a `pause` barrier shared by the whole ring
//! and the two barriers it shares with its left and right neighbours. Each round it
//! reports which barrier fired. A process that has done its rounds resigns everything,
//! which leaves its neighbours able to finish on their own.

use super::{barrier, lock};
use crate::config::RingConfig;
use crate::error::DemoError;
use clap::Args;
use csp_core::{
    process, Alternative, BarrierHandle, CspError, Guard, GuardGroup, Outcome, Parallel, Process,
};
use serde::Serialize;
use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Args, Debug, Default)]
pub struct RingArgs {
    /// Number of processes in the ring
    #[arg(long)]
    pub size: Option<usize>,

    /// Alternations each process performs
    #[arg(long)]
    pub rounds: Option<usize>,
}

impl RingArgs {
    pub fn apply(&self, mut config: RingConfig) -> RingConfig {
        if let Some(size) = self.size {
            config.size = size;
        }
        if let Some(rounds) = self.rounds {
            config.rounds = rounds;
        }
        config
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RingTally {
    pub process: usize,
    pub pause: usize,
    pub left: usize,
    pub right: usize,
    pub timeouts: usize,
}

impl RingTally {
    pub fn rounds(&self) -> usize {
        self.pause + self.left + self.right + self.timeouts
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RingReport {
    pub size: usize,
    pub rounds: usize,
    pub processes: Vec<RingTally>,
}

impl fmt::Display for RingReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "ring of {} ran {} rounds each", self.size, self.rounds)?;
        writeln!(
            f,
            "{:<8} {:<6} {:<6} {:<6} TIMEOUTS",
            "PROCESS", "PAUSE", "LEFT", "RIGHT"
        )?;
        for tally in &self.processes {
            writeln!(
                f,
                "{:<8} {:<6} {:<6} {:<6} {}",
                tally.process, tally.pause, tally.left, tally.right, tally.timeouts
            )?;
        }
        Ok(())
    }
}

struct Links {
    pause: BarrierHandle,
    left: BarrierHandle,
    right: BarrierHandle,
}

fn member(
    id: usize,
    links: Links,
    rounds: usize,
    tallies: Arc<Mutex<Vec<RingTally>>>,
) -> impl FnMut() -> Result<(), CspError> + Send {
    move || {
        let groups = [
            GuardGroup::new(vec![links.pause.clone()]),
            GuardGroup::new(vec![links.left.clone()]),
            GuardGroup::new(vec![links.right.clone()]),
        ];
        let mut alt = Alternative::new(
            groups
                .iter()
                .map(|g| Box::new(g.clone()) as Box<dyn Guard>)
                .collect(),
        );

        for round in 0..rounds {
            let index = alt.pri_select()?;
            let outcome = groups[index].outcome();
            let mut tallies = lock(&tallies);
            let tally = &mut tallies[id];
            match (index, outcome) {
                (_, Some(Outcome::Timeout)) => tally.timeouts += 1,
                (0, _) => tally.pause += 1,
                (1, _) => tally.left += 1,
                _ => tally.right += 1,
            }
            tracing::debug!(process = id, round, index, "ring barrier fired");
        }

        for handle in [&links.pause, &links.left, &links.right] {
            handle.resign()?;
        }
        Ok(())
    }
}

/// Run the ring until every process has done its rounds
pub fn run(config: &RingConfig, base_delay: Duration) -> anyhow::Result<RingReport> {
    let n = config.size;
    if n < 2 {
        return Err(DemoError::too_small("A ring", n, 2).into());
    }

    let pause = barrier("pause".to_string(), base_delay);
    // links[i] joins process i to process i + 1
    let links: Vec<_> = (0..n)
        .map(|i| barrier(format!("link-{i}"), base_delay))
        .collect();
    let tallies = Arc::new(Mutex::new(
        (0..n)
            .map(|process| RingTally {
                process,
                ..RingTally::default()
            })
            .collect::<Vec<_>>(),
    ));

    let mut ring = Parallel::named("ring");
    for i in 0..n {
        let member_links = Links {
            pause: pause.create_handle(false)?,
            left: links[(i + n - 1) % n].create_handle(false)?,
            right: links[i].create_handle(false)?,
        };
        ring.push(Box::new(process(
            format!("ring-{i}"),
            member(i, member_links, config.rounds, Arc::clone(&tallies)),
        )));
    }
    ring.run()?;
    drop(ring);

    tracing::info!(generations = pause.generation()?, "pause barrier finished");
    let processes = lock(&tallies).clone();
    Ok(RingReport {
        size: n,
        rounds: config.rounds,
        processes,
    })
}

#[cfg(test)]
#[path = "ring_tests.rs"]
mod tests;

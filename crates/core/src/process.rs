// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Processes and parallel composition
//!
//! A process is a unit of sequential behaviour that talks to the rest of the network
//! only through channels and barriers. [`Parallel`] runs several processes on their own
//! threads and returns when all of them have finished.

use crate::error::CspError;

pub trait Process: Send {
    fn run(&mut self) -> Result<(), CspError>;

    fn name(&self) -> &str {
        "process"
    }
}

/// A process built from a closure
pub struct FnProcess<F> {
    name: String,
    body: F,
}

/// Wrap a closure as a named process
pub fn process<F>(name: impl Into<String>, body: F) -> FnProcess<F>
where
    F: FnMut() -> Result<(), CspError> + Send,
{
    FnProcess {
        name: name.into(),
        body,
    }
}

impl<F> Process for FnProcess<F>
where
    F: FnMut() -> Result<(), CspError> + Send,
{
    fn run(&mut self) -> Result<(), CspError> {
        (self.body)()
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Runs its members concurrently
pub struct Parallel {
    name: String,
    members: Vec<Box<dyn Process>>,
}

impl Parallel {
    pub fn new() -> Self {
        Self::named("parallel")
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            members: Vec::new(),
        }
    }

    pub fn with(mut self, member: impl Process + 'static) -> Self {
        self.members.push(Box::new(member));
        self
    }

    pub fn push(&mut self, member: Box<dyn Process>) {
        self.members.push(member);
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

impl Default for Parallel {
    fn default() -> Self {
        Self::new()
    }
}

impl Process for Parallel {
    /// Run every member to completion; the first failure in member order is returned
    ///
    /// Poison is an expected way for a network to shut down and is only logged at debug
    /// level. A member that panics is reported as [`CspError::ProcessPanicked`].
    fn run(&mut self) -> Result<(), CspError> {
        tracing::debug!(parallel = %self.name, members = self.members.len(), "starting");
        let results: Vec<Result<(), CspError>> = std::thread::scope(|scope| {
            let handles: Vec<_> = self
                .members
                .iter_mut()
                .map(|member| {
                    let name = member.name().to_string();
                    let spawned = std::thread::Builder::new()
                        .name(name.clone())
                        .spawn_scoped(scope, move || member.run());
                    (name, spawned)
                })
                .collect();

            handles
                .into_iter()
                .map(|(name, spawned)| match spawned {
                    Ok(handle) => handle
                        .join()
                        .unwrap_or(Err(CspError::ProcessPanicked { name })),
                    Err(e) => Err(CspError::Spawn {
                        name,
                        reason: e.to_string(),
                    }),
                })
                .collect()
        });

        let mut first = None;
        for (member, result) in self.members.iter().zip(results) {
            let Err(e) = result else { continue };
            if e.is_poison() {
                tracing::debug!(process = %member.name(), error = %e, "process stopped by poison");
            } else {
                tracing::error!(process = %member.name(), error = %e, "process failed");
            }
            first.get_or_insert(e);
        }
        match first {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
#[path = "process_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Guard traversal orders
//!
//! A traversal turns an alternation's guard list into the order guards are enabled in.
//! The position of a guard in that order is its rank: rank 0 is the most preferred.

/// Produces the enable order for one alternation invocation
pub trait Traversal {
    /// Guard indices in enable order
    fn order(&self, len: usize) -> Vec<usize>;

    /// Told which guard index the invocation selected
    fn record_selection(&mut self, _index: usize, _len: usize) {}
}

/// Declaration order, every time
#[derive(Clone, Copy, Debug, Default)]
pub struct PriorityTraversal;

impl Traversal for PriorityTraversal {
    fn order(&self, len: usize) -> Vec<usize> {
        (0..len).collect()
    }
}

/// Rotating order: the guard after the last selection goes first next time
#[derive(Clone, Copy, Debug, Default)]
pub struct FairTraversal {
    favourite: usize,
}

impl FairTraversal {
    pub fn favourite(&self) -> usize {
        self.favourite
    }
}

impl Traversal for FairTraversal {
    fn order(&self, len: usize) -> Vec<usize> {
        if len == 0 {
            return Vec::new();
        }
        let start = self.favourite % len;
        (0..len).map(|offset| (start + offset) % len).collect()
    }

    fn record_selection(&mut self, index: usize, len: usize) {
        if len > 0 {
            self.favourite = (index + 1) % len;
        }
    }
}

#[cfg(test)]
#[path = "traversal_tests.rs"]
mod tests;

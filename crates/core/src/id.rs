// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Object identities for barriers, handles and alternation attempts
//!
//! Identities are process-wide sequence numbers; they are immutable and may be read
//! without holding the gatekeeper.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

fn next_global() -> u64 {
    NEXT_ID.fetch_add(1, Ordering::Relaxed)
}

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(pub u64);

        impl $name {
            /// Allocate a fresh process-wide identity
            pub fn fresh() -> Self {
                Self(next_global())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "-{}"), self.0)
            }
        }
    };
}

define_id!(
    /// Identity of a barrier base
    BarrierId,
    "bar"
);
define_id!(
    /// Identity of a barrier handle
    HandleId,
    "hdl"
);
define_id!(
    /// Identity of one alternation invocation
    AttemptId,
    "alt"
);

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;

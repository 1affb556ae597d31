// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! The classic non-blocking "work in progress" drain serializer.
//!
//! Any number of threads may call [`Wip::enter`] concurrently. Exactly one of
//! them becomes the drainer (the one that observes the counter transition
//! from `0`); the rest increment the counter and return immediately, trusting
//! the drainer to observe their contribution before it stops looping.

use std::sync::atomic::{AtomicUsize, Ordering};

/// An atomic drain-serialization counter.
#[derive(Debug, Default)]
pub struct Wip {
    counter: AtomicUsize,
}

impl Wip {
    /// Create a counter at rest (no drain in progress).
    #[must_use]
    pub fn new() -> Self {
        Self {
            counter: AtomicUsize::new(0),
        }
    }

    /// Request entry into the drain loop. Returns `true` if the caller is the
    /// thread that must run the loop (the counter transitioned from 0 to 1).
    #[must_use]
    pub fn enter(&self) -> bool {
        self.counter.fetch_add(1, Ordering::AcqRel) == 0
    }

    /// Called by the drainer after a pass: subtracts `1` and returns `true` if
    /// more work arrived while draining (so the loop must run again).
    #[must_use]
    pub fn leave(&self) -> bool {
        self.counter.fetch_sub(1, Ordering::AcqRel) != 1
    }
}

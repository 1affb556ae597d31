// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Cancellation coordinator: upstream is cancelled exactly once, when every
//! outstanding reference to it — the main operator's own `+1`, plus one per
//! window that hasn't yet released its share — has been released.

use std::sync::atomic::{AtomicUsize, Ordering};

/// Tracks how many parties (the main operator, plus each live `WindowFlux`)
/// still have a claim on the upstream subscription.
#[derive(Debug)]
pub(crate) struct WindowCount {
    count: AtomicUsize,
}

impl WindowCount {
    /// Starts at `1`: the main operator's own claim.
    pub(crate) fn new() -> Self {
        Self {
            count: AtomicUsize::new(1),
        }
    }

    /// A new `WindowFlux` was created; it holds a claim until released.
    pub(crate) fn increment(&self) {
        self.count.fetch_add(1, Ordering::AcqRel);
    }

    /// Release one claim. Returns `true` if this was the last one, meaning
    /// the caller must cancel the upstream subscription.
    pub(crate) fn decrement(&self) -> bool {
        let previous = self.count.fetch_sub(1, Ordering::AcqRel);
        debug_assert!(previous > 0, "windowCount underflow");
        previous == 1
    }

    #[cfg(test)]
    pub(crate) fn get(&self) -> usize {
        self.count.load(Ordering::Acquire)
    }
}

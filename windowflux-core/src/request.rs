// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Non-saturating-until-MAX additive request counter, the Reactive-Streams
//! "how many more items may I push downstream" credit.

use std::sync::atomic::{AtomicU64, Ordering};

/// Sentinel meaning "unbounded demand", matching `Long.MAX_VALUE` semantics
/// from the Reactive-Streams specification.
pub const UNBOUNDED: u64 = u64::MAX;

/// An atomic, saturating-at-[`UNBOUNDED`] request counter.
///
/// Once a request counter reaches `UNBOUNDED` it is considered terminal:
/// further `add`s are no-ops (a MAX value already satisfies any demand a
/// well-behaved drain loop could have).
#[derive(Debug, Default)]
pub struct RequestState {
    requested: AtomicU64,
}

impl RequestState {
    /// Create a request counter starting at zero demand.
    #[must_use]
    pub fn new() -> Self {
        Self {
            requested: AtomicU64::new(0),
        }
    }

    /// Add `n` to the outstanding demand, saturating at [`UNBOUNDED`].
    ///
    /// Returns the current amount after the reservation.
    pub fn add(&self, n: u64) -> u64 {
        let mut current = self.requested.load(Ordering::Acquire);
        loop {
            if current == UNBOUNDED {
                return UNBOUNDED;
            }
            let next = current.saturating_add(n);
            match self.requested.compare_exchange_weak(
                current,
                next,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return next,
                Err(observed) => current = observed,
            }
        }
    }

    /// Consume one unit of demand if available. Returns `true` if a unit was
    /// consumed (i.e. the drain loop may emit one more item).
    pub fn try_consume_one(&self) -> bool {
        let mut current = self.requested.load(Ordering::Acquire);
        loop {
            if current == 0 {
                return false;
            }
            let next = if current == UNBOUNDED {
                UNBOUNDED
            } else {
                current - 1
            };
            match self.requested.compare_exchange_weak(
                current,
                next,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return true,
                Err(observed) => current = observed,
            }
        }
    }

    /// Current outstanding demand (non-authoritative under concurrent mutation,
    /// useful for introspection and tests).
    #[must_use]
    pub fn current(&self) -> u64 {
        self.requested.load(Ordering::Acquire)
    }
}

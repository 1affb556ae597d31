// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Construction entry points for [`PredicateWindowOp`], mirroring the
//! parameter-table style this operator family already uses for its other
//! multi-argument constructors.

use crate::discard::{self, DiscardHook};
use crate::main_operator::PredicateWindowOp;
use crate::mode::{until_changed_eq, DynPredicate, FnPredicate, Mode, Predicate, TryFnPredicate};
use crate::window_flux::WindowFlux;
use std::sync::Arc;
use windowflux_core::Publisher;

/// Default batch size requested from the upstream when none is specified.
pub const DEFAULT_PREFETCH: u64 = 128;

/// Builds a [`PredicateWindowOp`] from an upstream source, a boundary mode,
/// a predicate, and optional tuning knobs.
pub struct PredicateWindowOpBuilder<T> {
    source: Arc<dyn Publisher<T>>,
    mode: Mode,
    predicate: DynPredicate<T>,
    prefetch: u64,
    discard_hook: DiscardHook<T>,
}

impl<T: Send + Sync + 'static> PredicateWindowOpBuilder<T> {
    fn new(source: Arc<dyn Publisher<T>>, mode: Mode, predicate: DynPredicate<T>) -> Self {
        Self {
            source,
            mode,
            predicate,
            prefetch: DEFAULT_PREFETCH,
            discard_hook: discard::noop(),
        }
    }

    /// Batch size requested from the upstream at a time. `u64::MAX` requests
    /// unbounded demand once and never replenishes.
    #[must_use]
    pub fn prefetch(mut self, prefetch: u64) -> Self {
        assert!(prefetch >= 1, "prefetch must be at least 1");
        self.prefetch = prefetch;
        self
    }

    /// Callback invoked for every element the operator discards instead of
    /// delivering to a live subscriber.
    #[must_use]
    pub fn discard_hook(mut self, hook: DiscardHook<T>) -> Self {
        self.discard_hook = hook;
        self
    }

    /// Build the operator. Nothing happens upstream until a downstream
    /// subscribes to the returned publisher.
    #[must_use]
    pub fn build(self) -> Arc<PredicateWindowOp<T>> {
        PredicateWindowOp::new(self.source, self.mode, self.predicate, self.prefetch, self.discard_hook)
    }
}

impl<T: Send + Sync + 'static> PredicateWindowOp<T> {
    /// Start building an operator with `Mode::Until`: the window closes
    /// right after the element for which `predicate` returns `true`.
    pub fn until<F>(source: Arc<dyn Publisher<T>>, predicate: F) -> PredicateWindowOpBuilder<T>
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        PredicateWindowOpBuilder::new(source, Mode::Until, Arc::new(FnPredicate::new(predicate)))
    }

    /// Same as [`Self::until`], but `predicate` may fail; a failure routes to
    /// `on_error` on both the open window and the main operator.
    pub fn try_until<F>(source: Arc<dyn Publisher<T>>, predicate: F) -> PredicateWindowOpBuilder<T>
    where
        F: Fn(&T) -> windowflux_core::Result<bool> + Send + Sync + 'static,
    {
        PredicateWindowOpBuilder::new(source, Mode::Until, Arc::new(TryFnPredicate::new(predicate)))
    }

    /// Start building an operator with `Mode::UntilCutBefore`: the boundary
    /// element starts the next window instead of ending the current one.
    pub fn until_cut_before<F>(source: Arc<dyn Publisher<T>>, predicate: F) -> PredicateWindowOpBuilder<T>
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        PredicateWindowOpBuilder::new(source, Mode::UntilCutBefore, Arc::new(FnPredicate::new(predicate)))
    }

    /// Start building an operator with `Mode::While`: the window stays open
    /// while `predicate` holds; the first element for which it doesn't is a
    /// separator, dropped from every window.
    pub fn while_matching<F>(source: Arc<dyn Publisher<T>>, predicate: F) -> PredicateWindowOpBuilder<T>
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        PredicateWindowOpBuilder::new(source, Mode::While, Arc::new(FnPredicate::new(predicate)))
    }

    /// Start building a `window_until_changed` operator: a new window opens
    /// whenever `key_fn`'s result differs (by `==`) from the previous
    /// element's key.
    pub fn until_changed<K, KeyFn>(source: Arc<dyn Publisher<T>>, key_fn: KeyFn) -> PredicateWindowOpBuilder<T>
    where
        K: PartialEq + Send + Sync + 'static,
        KeyFn: Fn(&T) -> K + Send + Sync + 'static,
    {
        let predicate = until_changed_eq(key_fn);
        PredicateWindowOpBuilder::new(source, Mode::UntilCutBefore, Arc::new(predicate))
    }

    /// Start building a builder directly from an arbitrary [`Predicate`] and
    /// [`Mode`], for callers with a custom predicate implementation (e.g. one
    /// that isn't just `window_until_changed`'s key comparison).
    pub fn with_predicate(
        source: Arc<dyn Publisher<T>>,
        mode: Mode,
        predicate: impl Predicate<T> + 'static,
    ) -> PredicateWindowOpBuilder<T> {
        PredicateWindowOpBuilder::new(source, mode, Arc::new(predicate))
    }
}

/// Alias surfaced in the public API: every window the operator emits is a
/// publisher of its own buffered elements.
pub type Window<T> = Arc<WindowFlux<T>>;

// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Boundary policy: maps a predicate's verdict on an element to the action
//! the main operator takes for that element.

use std::sync::Arc;
use windowflux_core::{Mutex, Result};

/// Window boundary policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Closes the window *after* including the boundary element.
    Until,
    /// Closes the window *before* the boundary element; the boundary element
    /// starts the next window.
    UntilCutBefore,
    /// Keeps the window open while the predicate holds; the first element
    /// for which it doesn't is a separator, dropped from every window.
    While,
}

/// What the main operator should do with the current element, derived once
/// per element from `Mode` and the predicate's verdict. Dispatched via a
/// single match per `on_next` call rather than per-element dynamic dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BoundaryAction {
    /// Push the element into the currently open window, then close it.
    PushAndClose,
    /// Push the element into the currently open window; keep it open.
    PushAndContinue,
    /// Close the currently open window, open a new one, push the element
    /// into the new window.
    CloseAndOpenThenPush,
    /// Close the currently open window; the element is a separator and is
    /// not placed in any window.
    CloseOnly,
}

impl Mode {
    pub(crate) fn action(self, boundary: bool) -> BoundaryAction {
        match (self, boundary) {
            (Mode::Until, true) => BoundaryAction::PushAndClose,
            (Mode::Until, false) => BoundaryAction::PushAndContinue,
            (Mode::UntilCutBefore, true) => BoundaryAction::CloseAndOpenThenPush,
            (Mode::UntilCutBefore, false) => BoundaryAction::PushAndContinue,
            (Mode::While, true) => BoundaryAction::PushAndContinue,
            (Mode::While, false) => BoundaryAction::CloseOnly,
        }
    }
}

/// A (possibly stateful) boundary test, invoked exactly once per element.
///
/// Implementations may hold interior-mutable state (e.g. `window_until_changed`'s
/// last-seen key); `clear` is called once the operator reaches a terminal
/// state or is cancelled, so any retained user objects become reclaimable.
pub trait Predicate<T>: Send + Sync {
    /// Evaluate the predicate for `value`.
    fn test(&self, value: &T) -> Result<bool>;

    /// Release any retained state. Called on terminal/cancel.
    fn clear(&self) {}
}

/// Adapts a plain infallible closure into a [`Predicate`].
pub struct FnPredicate<F> {
    f: F,
}

impl<F> FnPredicate<F> {
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<T, F> Predicate<T> for FnPredicate<F>
where
    F: Fn(&T) -> bool + Send + Sync,
{
    fn test(&self, value: &T) -> Result<bool> {
        Ok((self.f)(value))
    }
}

/// Adapts a fallible closure into a [`Predicate`].
pub struct TryFnPredicate<F> {
    f: F,
}

impl<F> TryFnPredicate<F> {
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<T, F> Predicate<T> for TryFnPredicate<F>
where
    F: Fn(&T) -> Result<bool> + Send + Sync,
{
    fn test(&self, value: &T) -> Result<bool> {
        (self.f)(value)
    }
}

/// The stateful predicate behind `window_until_changed`: a boundary fires
/// whenever `key_fn(v)` differs (per `eq_fn`) from the key of the previous
/// element.
pub struct UntilChangedPredicate<T, K, KeyFn, EqFn> {
    key_fn: KeyFn,
    eq_fn: EqFn,
    last_key: Mutex<Option<K>>,
    _marker: std::marker::PhantomData<fn(&T)>,
}

impl<T, K, KeyFn, EqFn> UntilChangedPredicate<T, K, KeyFn, EqFn>
where
    KeyFn: Fn(&T) -> K + Send + Sync,
    EqFn: Fn(&K, &K) -> bool + Send + Sync,
{
    pub fn new(key_fn: KeyFn, eq_fn: EqFn) -> Self {
        Self {
            key_fn,
            eq_fn,
            last_key: Mutex::new(None),
            _marker: std::marker::PhantomData,
        }
    }
}

impl<T, K, KeyFn, EqFn> Predicate<T> for UntilChangedPredicate<T, K, KeyFn, EqFn>
where
    T: Send + Sync,
    K: Send + Sync,
    KeyFn: Fn(&T) -> K + Send + Sync,
    EqFn: Fn(&K, &K) -> bool + Send + Sync,
{
    fn test(&self, value: &T) -> Result<bool> {
        let key = (self.key_fn)(value);
        let mut slot = self.last_key.lock();
        let changed = match slot.as_ref() {
            None => false,
            Some(prev) => !(self.eq_fn)(prev, &key),
        };
        *slot = Some(key);
        Ok(changed)
    }

    fn clear(&self) {
        *self.last_key.lock() = None;
    }
}

/// Convenience: equality-keyed `window_until_changed` using `PartialEq`.
pub fn until_changed_eq<T, K, KeyFn>(
    key_fn: KeyFn,
) -> UntilChangedPredicate<T, K, KeyFn, fn(&K, &K) -> bool>
where
    KeyFn: Fn(&T) -> K + Send + Sync,
    K: PartialEq + Send + Sync,
{
    UntilChangedPredicate::new(key_fn, |a: &K, b: &K| a == b)
}

pub(crate) type DynPredicate<T> = Arc<dyn Predicate<T>>;

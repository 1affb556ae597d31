// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Fluent `.window_until(...)` style entry points for any `Arc<dyn Publisher<T>>`.

use crate::builder::PredicateWindowOpBuilder;
use crate::main_operator::PredicateWindowOp;
use std::sync::Arc;
use windowflux_core::Publisher;

/// Adds windowing combinators to any reference-counted `Publisher<T>`.
pub trait WindowExt<T>: Publisher<T> {
    /// See [`PredicateWindowOp::until`].
    fn window_until<F>(self: Arc<Self>, predicate: F) -> PredicateWindowOpBuilder<T>
    where
        Self: Sized + 'static,
        T: Send + Sync + 'static,
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        PredicateWindowOp::until(self, predicate)
    }

    /// See [`PredicateWindowOp::until_cut_before`].
    fn window_until_cut_before<F>(self: Arc<Self>, predicate: F) -> PredicateWindowOpBuilder<T>
    where
        Self: Sized + 'static,
        T: Send + Sync + 'static,
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        PredicateWindowOp::until_cut_before(self, predicate)
    }

    /// See [`PredicateWindowOp::while_matching`].
    fn window_while<F>(self: Arc<Self>, predicate: F) -> PredicateWindowOpBuilder<T>
    where
        Self: Sized + 'static,
        T: Send + Sync + 'static,
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        PredicateWindowOp::while_matching(self, predicate)
    }

    /// See [`PredicateWindowOp::until_changed`].
    fn window_until_changed<K, KeyFn>(self: Arc<Self>, key_fn: KeyFn) -> PredicateWindowOpBuilder<T>
    where
        Self: Sized + 'static,
        T: Send + Sync + 'static,
        K: PartialEq + Send + Sync + 'static,
        KeyFn: Fn(&T) -> K + Send + Sync + 'static,
    {
        PredicateWindowOp::until_changed(self, key_fn)
    }
}

impl<T, P: Publisher<T> + ?Sized> WindowExt<T> for P {}

// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! The Reactive-Streams-shaped contract this operator is built against.
//!
//! No crate in this project's dependency graph already provides
//! `Subscriber`/`Subscription`/`Publisher`, so they're defined here: a
//! minimal, synchronous, push-based contract with pull-based backpressure.

use crate::error::WindowError;
use std::sync::Arc;

/// A consumer of a `Publisher<T>`'s signals.
///
/// Implementations must tolerate `on_next` being called zero or more times
/// after `on_subscribe`, followed by at most one of `on_error`/`on_complete`.
pub trait Subscriber<T>: Send + Sync {
    /// Called exactly once, before any other signal, with a handle the
    /// subscriber uses to pull elements (`request`) or give up (`cancel`).
    fn on_subscribe(&self, subscription: Arc<dyn Subscription>);

    /// Delivers the next element. Never called after `on_error`/`on_complete`.
    fn on_next(&self, value: T);

    /// Terminal error signal. Never followed by any other signal.
    fn on_error(&self, error: WindowError);

    /// Terminal completion signal. Never followed by any other signal.
    fn on_complete(&self);
}

/// The demand/cancel side of a subscription, handed to a `Subscriber` via
/// `on_subscribe`.
pub trait Subscription: Send + Sync {
    /// Request up to `n` more elements. `n <= 0` is a protocol violation
    /// (Reactive-Streams rule 3.9) and is reported back to the subscriber as
    /// a terminal [`WindowError::InvalidRequest`] rather than panicking,
    /// since the caller may be arbitrary user code. `n` is signed to let
    /// implementations detect and reject negative requests explicitly.
    fn request(&self, n: i64);

    /// Stop delivery. Idempotent; safe to call more than once or after
    /// termination.
    fn cancel(&self);
}

/// A source of `T` that can be subscribed to exactly once per subscriber
/// value (some publishers, like `WindowFlux`, additionally enforce a single
/// subscription total).
pub trait Publisher<T>: Send + Sync {
    /// Subscribe `subscriber` to this publisher's signals.
    fn subscribe(&self, subscriber: Arc<dyn Subscriber<T>>);
}

/// How a publisher executes its signal delivery. This operator is always
/// `Synchronous`: every signal handler returns without suspending, and
/// progress is made only by the cooperating drain loops re-entering on the
/// calling thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStyle {
    /// Signals are delivered synchronously on the calling thread.
    Synchronous,
}

/// Read-only observable state, exposed by both `PredicateWindowOp` and
/// `WindowFlux` for diagnostics and tests.
pub trait Introspectable {
    /// A short, human-readable description of the upstream/parent, for logs.
    fn parent(&self) -> &'static str;

    /// The configured prefetch/batch size, if any.
    fn prefetch(&self) -> Option<u64>;

    /// Outstanding demand from the downstream subscriber.
    fn requested_from_downstream(&self) -> u64;

    /// Number of elements currently buffered awaiting delivery.
    fn buffered(&self) -> usize;

    /// The terminal error, if this publisher has failed.
    fn error(&self) -> Option<WindowError>;

    /// `true` once a terminal signal (`on_complete`/`on_error`) has fired.
    fn terminated(&self) -> bool;

    /// `true` once cancellation has been observed.
    fn cancelled(&self) -> bool;

    /// Always [`RunStyle::Synchronous`] for this operator family.
    fn run_style(&self) -> RunStyle {
        RunStyle::Synchronous
    }
}

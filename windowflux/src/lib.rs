// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

#![allow(clippy::multiple_crate_versions)]
//! A predicate-driven windowing operator for pull-based reactive streams.
//!
//! [`PredicateWindowOp`] subscribes to an upstream [`Publisher`] and splits
//! its elements into windows — themselves [`Publisher`]s of their window's
//! elements — according to a [`Mode`] and a boundary [`mode::Predicate`]:
//!
//! - [`Mode::Until`] closes a window right after the element the predicate
//!   matches.
//! - [`Mode::UntilCutBefore`] closes a window right before the matching
//!   element, which starts the next window.
//! - [`Mode::While`] keeps a window open while the predicate holds; the
//!   first non-matching element is a separator, dropped from every window.
//!
//! Backpressure is strict Reactive-Streams pull: nothing is delivered to a
//! subscriber — a window's contents, or a window itself — ahead of that
//! subscriber's own `request(n)`. Cancelling a window or the outer operator
//! discards whatever was buffered for it through a user-visible
//! [`discard::DiscardHook`] instead of silently dropping it.
//!
//! ```ignore
//! use std::sync::Arc;
//! use windowflux::PredicateWindowOp;
//!
//! let windows = PredicateWindowOp::until(source, |n: &i32| n % 5 == 0)
//!     .prefetch(32)
//!     .build();
//! ```

mod builder;
mod discard;
mod ext;
mod into_stream;
mod main_operator;
mod mode;
mod window_count;
mod window_flux;

pub use builder::{PredicateWindowOpBuilder, Window, DEFAULT_PREFETCH};
pub use discard::{noop as noop_discard, DiscardHook};
pub use ext::WindowExt;
pub use into_stream::{into_stream, IntoStream};
pub use main_operator::{PredicateWindowOp, UNBOUNDED_PREFETCH};
pub use mode::{until_changed_eq, FnPredicate, Mode, Predicate, TryFnPredicate, UntilChangedPredicate};
pub use window_flux::WindowFlux;

pub use windowflux_core::{
    Introspectable, Publisher, Result, RunStyle, Subscriber, Subscription, WindowError,
};

/// Common imports for crates consuming `windowflux`.
pub mod prelude {
    pub use crate::{
        DiscardHook, Mode, PredicateWindowOp, Publisher, Subscriber, Subscription, Window,
        WindowError, WindowExt, WindowFlux,
    };
}

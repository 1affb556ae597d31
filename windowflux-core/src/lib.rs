// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

#![allow(clippy::multiple_crate_versions)]
//! Core primitives shared by the windowflux predicate-windowing operator:
//! the Reactive-Streams-shaped `Subscriber`/`Subscription`/`Publisher`
//! contract, its error type, and the small atomic/lock building blocks the
//! operator's drain loops are built from.

pub mod error;
pub mod reactive;
pub mod request;
pub mod sync;
pub mod wip;

pub use error::{Result, WindowError};
pub use reactive::{Introspectable, Publisher, RunStyle, Subscriber, Subscription};
pub use request::RequestState;
pub use sync::Mutex;
pub use wip::Wip;

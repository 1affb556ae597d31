// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Synchronization primitive used for the element/window queues.
//!
//! A single import path keeps the mutex implementation swappable without
//! touching call sites, mirroring how this codebase isolates its lock choice.

pub use parking_lot::Mutex;

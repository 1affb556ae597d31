// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! The user-visible hook elements pass through when the operator discards
//! them rather than delivering them to any live subscriber.

use std::sync::Arc;

/// Called once per discarded element: a separator element under
/// [`crate::Mode::While`], or an element pushed into a window that has
/// already been cancelled by its own subscriber.
pub type DiscardHook<T> = Arc<dyn Fn(T) + Send + Sync>;

/// The default hook: drop the element silently.
pub fn noop<T>() -> DiscardHook<T>
where
    T: 'static,
{
    Arc::new(|_| {})
}

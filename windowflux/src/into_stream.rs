// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Optional ergonomic bridge from a `Publisher<T>` to a `futures_core::Stream`.
//!
//! The operator itself never awaits anything; this adapter exists purely so
//! callers already living in an async context don't have to hand-roll a
//! `Subscriber` to pull windows (or a window's own elements) with `.await`.

use futures_core::Stream;
use std::collections::VecDeque;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll, Waker};
use windowflux_core::{Mutex, Publisher, Result, Subscriber, Subscription, WindowError};

struct Shared<T> {
    buffered: Mutex<VecDeque<T>>,
    waker: Mutex<Option<Waker>>,
    done: AtomicBool,
    error: Mutex<Option<WindowError>>,
    subscription: Mutex<Option<Arc<dyn Subscription>>>,
}

impl<T> Shared<T> {
    fn wake(&self) {
        if let Some(waker) = self.waker.lock().take() {
            waker.wake();
        }
    }
}

struct BridgeSubscriber<T> {
    shared: Arc<Shared<T>>,
}

impl<T: Send + Sync + 'static> Subscriber<T> for BridgeSubscriber<T> {
    fn on_subscribe(&self, subscription: Arc<dyn Subscription>) {
        subscription.request(1);
        *self.shared.subscription.lock() = Some(subscription);
    }

    fn on_next(&self, value: T) {
        self.shared.buffered.lock().push_back(value);
        self.shared.wake();
    }

    fn on_error(&self, error: WindowError) {
        *self.shared.error.lock() = Some(error);
        self.shared.done.store(true, Ordering::Release);
        self.shared.wake();
    }

    fn on_complete(&self) {
        self.shared.done.store(true, Ordering::Release);
        self.shared.wake();
    }
}

/// A `Stream` adapter over a `Publisher<T>`, requesting one element at a time.
pub struct IntoStream<T> {
    shared: Arc<Shared<T>>,
}

impl<T: Send + Sync + 'static> IntoStream<T> {
    /// Subscribe to `publisher` and expose its signals as a `Stream`.
    pub fn new(publisher: &(impl Publisher<T> + ?Sized)) -> Self {
        let shared = Arc::new(Shared {
            buffered: Mutex::new(VecDeque::new()),
            waker: Mutex::new(None),
            done: AtomicBool::new(false),
            error: Mutex::new(None),
            subscription: Mutex::new(None),
        });
        publisher.subscribe(Arc::new(BridgeSubscriber {
            shared: shared.clone(),
        }));
        Self { shared }
    }
}

impl<T> IntoStream<T> {
    fn try_take(&self) -> Option<Result<T>> {
        if let Some(value) = self.shared.buffered.lock().pop_front() {
            if let Some(subscription) = self.shared.subscription.lock().as_ref() {
                subscription.request(1);
            }
            return Some(Ok(value));
        }
        if self.shared.done.load(Ordering::Acquire) {
            if let Some(error) = self.shared.error.lock().take() {
                return Some(Err(error));
            }
        }
        None
    }
}

impl<T> Stream for IntoStream<T> {
    type Item = Result<T>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if let Some(item) = self.try_take() {
            return Poll::Ready(Some(item));
        }

        // Register before the second check so an `on_next`/`on_complete` that
        // races in between still observes a waker to notify.
        *self.shared.waker.lock() = Some(cx.waker().clone());

        if let Some(item) = self.try_take() {
            return Poll::Ready(Some(item));
        }
        if self.shared.done.load(Ordering::Acquire) {
            return Poll::Ready(None);
        }
        Poll::Pending
    }
}

/// Adapt any `Publisher<T>` into a `futures_core::Stream`.
pub fn into_stream<T: Send + Sync + 'static>(publisher: &(impl Publisher<T> + ?Sized)) -> IntoStream<T> {
    IntoStream::new(publisher)
}

// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Minimal Reactive-Streams test doubles shared by the windowflux integration
//! tests: a replaying `Publisher<T>` source and recording subscribers.

#![allow(dead_code)]

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::{Arc, Weak};
use windowflux::{Publisher, Subscriber, Subscription, WindowError, WindowFlux};
use windowflux_core::{RequestState, Wip};

struct SourceState<T> {
    queue: VecDeque<T>,
    subscriber: Option<Arc<dyn Subscriber<T>>>,
    cancelled: bool,
    completed: bool,
    request_log: Vec<i64>,
    delivered: usize,
    fail_after: Option<(usize, WindowError)>,
}

/// A `Publisher<T>` that replays a fixed sequence, honoring `request(n)`
/// exactly: it never pushes more than the outstanding demand allows.
///
/// `request` is reentrancy-safe the same way every drain loop in this crate
/// is: a `request()` call that arrives from inside this source's own
/// `on_next` (a downstream replenishing mid-emission) just adds demand and
/// returns, trusting the in-progress drain to observe it — see `Wip`.
pub struct TestSource<T> {
    weak_self: Weak<TestSource<T>>,
    state: Mutex<SourceState<T>>,
    requested: RequestState,
    wip: Wip,
}

impl<T: Send + Sync + 'static> TestSource<T> {
    pub fn new(items: impl IntoIterator<Item = T>) -> Arc<Self> {
        Self::new_inner(items, None)
    }

    /// Like [`Self::new`], but after delivering the `fail_after`th element the
    /// source calls `on_error(error)` instead of continuing to drain its
    /// queue — for tests that need a genuinely live, still-open window when
    /// an upstream failure arrives.
    pub fn new_failing_after(
        items: impl IntoIterator<Item = T>,
        fail_after: usize,
        error: WindowError,
    ) -> Arc<Self> {
        Self::new_inner(items, Some((fail_after, error)))
    }

    fn new_inner(items: impl IntoIterator<Item = T>, fail_after: Option<(usize, WindowError)>) -> Arc<Self> {
        Arc::new_cyclic(|weak_self| Self {
            weak_self: weak_self.clone(),
            state: Mutex::new(SourceState {
                queue: items.into_iter().collect(),
                subscriber: None,
                cancelled: false,
                completed: false,
                request_log: Vec::new(),
                delivered: 0,
                fail_after,
            }),
            requested: RequestState::new(),
            wip: Wip::new(),
        })
    }

    fn arc(&self) -> Arc<Self> {
        self.weak_self.upgrade().unwrap()
    }

    pub fn request_log(&self) -> Vec<i64> {
        self.state.lock().request_log.clone()
    }

    pub fn is_cancelled(&self) -> bool {
        self.state.lock().cancelled
    }

    pub fn remaining(&self) -> usize {
        self.state.lock().queue.len()
    }
}

impl<T: Send + Sync + 'static> Publisher<T> for TestSource<T> {
    fn subscribe(&self, subscriber: Arc<dyn Subscriber<T>>) {
        self.state.lock().subscriber = Some(subscriber.clone());
        subscriber.on_subscribe(self.arc() as Arc<dyn Subscription>);
    }
}

impl<T: Send + Sync + 'static> Subscription for TestSource<T> {
    fn request(&self, n: i64) {
        self.state.lock().request_log.push(n);
        if n <= 0 {
            return;
        }
        self.requested.add(n as u64);
        self.drain();
    }

    fn cancel(&self) {
        self.state.lock().cancelled = true;
    }
}

impl<T: Send + Sync + 'static> TestSource<T> {
    fn drain(&self) {
        if !self.wip.enter() {
            return;
        }
        loop {
            self.drain_once();
            if !self.wip.leave() {
                break;
            }
        }
    }

    fn drain_once(&self) {
        let subscriber = {
            let state = self.state.lock();
            if state.cancelled || state.completed {
                return;
            }
            state.subscriber.clone()
        };
        let Some(subscriber) = subscriber else { return };

        loop {
            let value = {
                let mut state = self.state.lock();
                if state.cancelled || state.completed {
                    return;
                }
                if state.queue.is_empty() {
                    None
                } else if self.requested.try_consume_one() {
                    state.queue.pop_front()
                } else {
                    None
                }
            };
            match value {
                Some(value) => {
                    subscriber.on_next(value);
                    let failure = {
                        let mut state = self.state.lock();
                        state.delivered += 1;
                        let reached =
                            matches!(&state.fail_after, Some((n, _)) if state.delivered >= *n);
                        if reached {
                            state.completed = true;
                            state.fail_after.take().map(|(_, error)| error)
                        } else {
                            None
                        }
                    };
                    if let Some(error) = failure {
                        subscriber.on_error(error);
                        return;
                    }
                }
                None => break,
            }
        }

        let mut state = self.state.lock();
        if state.queue.is_empty() && !state.cancelled && !state.completed {
            state.completed = true;
            drop(state);
            subscriber.on_complete();
        }
    }
}

#[derive(Debug, Clone)]
pub enum Terminal {
    Complete,
    Error(WindowError),
}

/// Records every signal a `Subscriber<T>` receives; optionally auto-requests
/// on subscribe, and exposes the `Subscription` handle for manual `request`/
/// `cancel` calls from the test body.
pub struct Recorder<T> {
    pub items: Mutex<Vec<T>>,
    pub terminal: Mutex<Option<Terminal>>,
    pub subscription: Mutex<Option<Arc<dyn Subscription>>>,
    initial_request: i64,
}

impl<T: Send + Sync + 'static> Recorder<T> {
    /// `initial_request <= 0` means "don't auto-request"; the test drives
    /// `request`/`cancel` itself once subscribed.
    pub fn new(initial_request: i64) -> Arc<Self> {
        Arc::new(Self {
            items: Mutex::new(Vec::new()),
            terminal: Mutex::new(None),
            subscription: Mutex::new(None),
            initial_request,
        })
    }

    pub fn unbounded() -> Arc<Self> {
        Self::new(i64::MAX)
    }

    pub fn items(&self) -> Vec<T>
    where
        T: Clone,
    {
        self.items.lock().clone()
    }

    pub fn request(&self, n: i64) {
        if let Some(subscription) = self.subscription.lock().as_ref() {
            subscription.request(n);
        }
    }

    pub fn cancel(&self) {
        if let Some(subscription) = self.subscription.lock().as_ref() {
            subscription.cancel();
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(*self.terminal.lock(), Some(Terminal::Complete))
    }

    pub fn error(&self) -> Option<WindowError> {
        match &*self.terminal.lock() {
            Some(Terminal::Error(error)) => Some(error.clone()),
            _ => None,
        }
    }
}

impl<T: Send + Sync + 'static> Subscriber<T> for Recorder<T> {
    fn on_subscribe(&self, subscription: Arc<dyn Subscription>) {
        if self.initial_request > 0 {
            subscription.request(self.initial_request);
        }
        *self.subscription.lock() = Some(subscription);
    }

    fn on_next(&self, value: T) {
        self.items.lock().push(value);
    }

    fn on_error(&self, error: WindowError) {
        *self.terminal.lock() = Some(Terminal::Error(error));
    }

    fn on_complete(&self) {
        *self.terminal.lock() = Some(Terminal::Complete);
    }
}

/// Subscribes to the outer window stream and, for every window it receives,
/// immediately subscribes a fresh `Recorder` to it with `per_window_request`
/// (or unbounded, if `<= 0`) so the test can assert each window's contents.
pub struct WindowCollector<T> {
    pub windows: Mutex<Vec<Arc<Recorder<T>>>>,
    pub terminal: Mutex<Option<Terminal>>,
    pub subscription: Mutex<Option<Arc<dyn Subscription>>>,
    initial_request: i64,
    per_window_request: i64,
}

impl<T: Send + Sync + 'static> WindowCollector<T> {
    pub fn new(initial_request: i64, per_window_request: i64) -> Arc<Self> {
        Arc::new(Self {
            windows: Mutex::new(Vec::new()),
            terminal: Mutex::new(None),
            subscription: Mutex::new(None),
            initial_request,
            per_window_request,
        })
    }

    pub fn unbounded() -> Arc<Self> {
        Self::new(i64::MAX, i64::MAX)
    }

    pub fn request(&self, n: i64) {
        if let Some(subscription) = self.subscription.lock().as_ref() {
            subscription.request(n);
        }
    }

    pub fn cancel(&self) {
        if let Some(subscription) = self.subscription.lock().as_ref() {
            subscription.cancel();
        }
    }

    pub fn window_contents(&self) -> Vec<Vec<T>>
    where
        T: Clone,
    {
        self.windows.lock().iter().map(|w| w.items()).collect()
    }

    pub fn is_complete(&self) -> bool {
        matches!(*self.terminal.lock(), Some(Terminal::Complete))
    }

    pub fn error(&self) -> Option<WindowError> {
        match &*self.terminal.lock() {
            Some(Terminal::Error(error)) => Some(error.clone()),
            _ => None,
        }
    }
}

/// `take(n)` semantics: requests `n`, then cancels its subscription the
/// instant the `n`th item arrives.
pub struct TakeN<T> {
    pub items: Mutex<Vec<T>>,
    limit: i64,
    subscription: Mutex<Option<Arc<dyn Subscription>>>,
}

impl<T: Send + Sync + 'static> TakeN<T> {
    pub fn new(limit: i64) -> Arc<Self> {
        Arc::new(Self {
            items: Mutex::new(Vec::new()),
            limit,
            subscription: Mutex::new(None),
        })
    }

    pub fn items(&self) -> Vec<T>
    where
        T: Clone,
    {
        self.items.lock().clone()
    }
}

impl<T: Send + Sync + 'static> Subscriber<T> for TakeN<T> {
    fn on_subscribe(&self, subscription: Arc<dyn Subscription>) {
        subscription.request(self.limit);
        *self.subscription.lock() = Some(subscription);
    }

    fn on_next(&self, value: T) {
        let mut items = self.items.lock();
        items.push(value);
        if items.len() as i64 >= self.limit {
            drop(items);
            if let Some(subscription) = self.subscription.lock().as_ref() {
                subscription.cancel();
            }
        }
    }

    fn on_error(&self, _error: WindowError) {}

    fn on_complete(&self) {}
}

/// Like [`WindowCollector`], but subscribes each window with a [`TakeN`]
/// instead of a greedy [`Recorder`].
pub struct TakeNPerWindow<T> {
    pub windows: Mutex<Vec<Arc<TakeN<T>>>>,
    per_window_limit: i64,
    subscription: Mutex<Option<Arc<dyn Subscription>>>,
}

impl<T: Send + Sync + 'static> TakeNPerWindow<T> {
    pub fn new(per_window_limit: i64) -> Arc<Self> {
        Arc::new(Self {
            windows: Mutex::new(Vec::new()),
            per_window_limit,
            subscription: Mutex::new(None),
        })
    }

    pub fn window_contents(&self) -> Vec<Vec<T>>
    where
        T: Clone,
    {
        self.windows.lock().iter().map(|w| w.items()).collect()
    }
}

impl<T: Send + Sync + 'static> Subscriber<Arc<WindowFlux<T>>> for TakeNPerWindow<T> {
    fn on_subscribe(&self, subscription: Arc<dyn Subscription>) {
        subscription.request(i64::MAX);
        *self.subscription.lock() = Some(subscription);
    }

    fn on_next(&self, window: Arc<WindowFlux<T>>) {
        let taker = TakeN::new(self.per_window_limit);
        window.subscribe(taker.clone());
        self.windows.lock().push(taker);
    }

    fn on_error(&self, _error: WindowError) {}

    fn on_complete(&self) {}
}

impl<T: Send + Sync + 'static> Subscriber<Arc<WindowFlux<T>>> for WindowCollector<T> {
    fn on_subscribe(&self, subscription: Arc<dyn Subscription>) {
        if self.initial_request > 0 {
            subscription.request(self.initial_request);
        }
        *self.subscription.lock() = Some(subscription);
    }

    fn on_next(&self, window: Arc<WindowFlux<T>>) {
        let recorder = Recorder::new(self.per_window_request);
        window.subscribe(recorder.clone());
        self.windows.lock().push(recorder);
    }

    fn on_error(&self, error: WindowError) {
        *self.terminal.lock() = Some(Terminal::Error(error));
    }

    fn on_complete(&self) {
        *self.terminal.lock() = Some(Terminal::Complete);
    }
}

// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! `PredicateWindowOp<T>`: the operator itself. Subscribes to the upstream
//! `Publisher<T>`, splits its elements into windows per [`crate::Mode`] and a
//! user [`Predicate`], and publishes each window, itself a `Publisher<T>`, to
//! a single downstream subscriber.

use crate::discard::DiscardHook;
use crate::mode::{BoundaryAction, DynPredicate, Mode};
use crate::window_count::WindowCount;
use crate::window_flux::WindowFlux;
use std::collections::VecDeque;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tracing::{debug, trace};
use windowflux_core::{
    Introspectable, Mutex, Publisher, RequestState, RunStyle, Subscriber, Subscription,
    WindowError, Wip,
};

/// Encodes `prefetch == u64::MAX` as "request unbounded once, never replenish".
pub const UNBOUNDED_PREFETCH: u64 = u64::MAX;

/// State shared between `PredicateWindowOp` and every `WindowFlux` it creates:
/// the upstream subscription handle and the cancellation coordinator.
pub(crate) struct MainShared<T> {
    upstream: Mutex<Option<Arc<dyn Subscription>>>,
    window_count: WindowCount,
    prefetch: u64,
    limit: u64,
    consumed_since_replenish: AtomicU64,
    requested_unbounded: AtomicBool,
    _marker: std::marker::PhantomData<fn(&T)>,
}

impl<T> MainShared<T> {
    fn new(prefetch: u64) -> Self {
        // `prefetch - (prefetch >> 2)`, floored at 1 so small prefetch values
        // still make progress.
        let limit = if prefetch == UNBOUNDED_PREFETCH {
            UNBOUNDED_PREFETCH
        } else {
            (prefetch - (prefetch >> 2)).max(1)
        };
        Self {
            upstream: Mutex::new(None),
            window_count: WindowCount::new(),
            prefetch,
            limit,
            consumed_since_replenish: AtomicU64::new(0),
            requested_unbounded: AtomicBool::new(false),
            _marker: std::marker::PhantomData,
        }
    }

    /// Called by a `WindowFlux` the first time it releases its claim.
    pub(crate) fn release_window(&self) {
        if self.window_count.decrement() {
            self.cancel_upstream();
        }
    }

    fn cancel_upstream(&self) {
        if let Some(subscription) = self.upstream.lock().take() {
            trace!("windowCount reached zero; cancelling upstream");
            subscription.cancel();
        }
    }

    fn set_upstream(&self, subscription: Arc<dyn Subscription>) {
        *self.upstream.lock() = Some(subscription);
    }

    fn initial_request(&self) {
        let Some(subscription) = self.upstream.lock().clone() else {
            return;
        };
        if self.prefetch == UNBOUNDED_PREFETCH {
            self.requested_unbounded.store(true, Ordering::Release);
            subscription.request(i64::MAX);
        } else {
            subscription.request(self.prefetch as i64);
        }
    }

    fn replenish(&self) {
        if self.prefetch == UNBOUNDED_PREFETCH {
            return;
        }
        let consumed = self.consumed_since_replenish.fetch_add(1, Ordering::AcqRel) + 1;
        if consumed >= self.limit {
            self.consumed_since_replenish.fetch_sub(self.limit, Ordering::AcqRel);
            if let Some(subscription) = self.upstream.lock().clone() {
                subscription.request(self.prefetch as i64);
            }
        }
    }
}

struct MainState<T> {
    queue: VecDeque<Arc<WindowFlux<T>>>,
    downstream: Option<Arc<dyn Subscriber<Arc<WindowFlux<T>>>>>,
    done: bool,
    error: Option<WindowError>,
}

/// The predicate-driven windowing operator.
pub struct PredicateWindowOp<T> {
    weak_self: Weak<PredicateWindowOp<T>>,
    shared: Arc<MainShared<T>>,
    mode: Mode,
    predicate: DynPredicate<T>,
    discard_hook: DiscardHook<T>,
    source: Arc<dyn Publisher<T>>,

    current: Mutex<Option<Arc<WindowFlux<T>>>>,
    state: Mutex<MainState<T>>,
    requested: RequestState,
    wip: Wip,
    subscribed: AtomicBool,
    cancelled: AtomicBool,
    terminal_delivered: AtomicBool,
}

impl<T: Send + Sync + 'static> PredicateWindowOp<T> {
    pub(crate) fn new(
        source: Arc<dyn Publisher<T>>,
        mode: Mode,
        predicate: DynPredicate<T>,
        prefetch: u64,
        discard_hook: DiscardHook<T>,
    ) -> Arc<Self> {
        assert!(prefetch >= 1, "prefetch must be at least 1");
        Arc::new_cyclic(|weak_self| Self {
            weak_self: weak_self.clone(),
            shared: Arc::new(MainShared::new(prefetch)),
            mode,
            predicate,
            discard_hook,
            source,
            current: Mutex::new(None),
            state: Mutex::new(MainState {
                queue: VecDeque::new(),
                downstream: None,
                done: false,
                error: None,
            }),
            requested: RequestState::new(),
            wip: Wip::new(),
            subscribed: AtomicBool::new(false),
            cancelled: AtomicBool::new(false),
            terminal_delivered: AtomicBool::new(false),
        })
    }

    fn arc(&self) -> Arc<Self> {
        self.weak_self
            .upgrade()
            .expect("PredicateWindowOp always holds a strong reference to itself while reachable")
    }

    fn ensure_open_window(&self) -> Arc<WindowFlux<T>> {
        let existing = self.current.lock().clone();
        match existing {
            Some(window) => window,
            None => self.open_new_window(),
        }
    }

    fn open_new_window(&self) -> Arc<WindowFlux<T>> {
        let window = WindowFlux::new(self.discard_hook.clone(), Arc::downgrade(&self.shared));
        self.shared.window_count.increment();
        self.state.lock().queue.push_back(window.clone());
        *self.current.lock() = Some(window.clone());
        self.drain_main();
        window
    }

    fn close_current(&self) {
        if let Some(window) = self.current.lock().take() {
            window.complete();
        }
    }

    fn terminate(&self, error: WindowError) {
        if let Some(window) = self.current.lock().take() {
            window.fail(error.clone());
        }
        self.predicate.clear();
        {
            let mut state = self.state.lock();
            state.done = true;
            state.error = Some(error);
        }
        self.drain_main();
    }

    fn complete(&self) {
        self.close_current();
        self.predicate.clear();
        self.state.lock().done = true;
        self.drain_main();
    }

    fn cancel_impl(&self) {
        if self.cancelled.swap(true, Ordering::AcqRel) {
            return;
        }
        self.predicate.clear();
        let pending: Vec<Arc<WindowFlux<T>>> = self.state.lock().queue.drain(..).collect();
        for window in pending {
            window.cancel();
        }
        if let Some(current) = self.current.lock().take() {
            if !current.is_subscribed() {
                current.cancel();
            }
        }
        self.shared.release_window();
    }

    fn drain_main(&self) {
        if !self.wip.enter() {
            return;
        }
        loop {
            self.drain_main_once();
            if !self.wip.leave() {
                break;
            }
        }
    }

    fn drain_main_once(&self) {
        if self.cancelled.load(Ordering::Acquire) {
            let discarded: Vec<Arc<WindowFlux<T>>> = self.state.lock().queue.drain(..).collect();
            for window in discarded {
                window.cancel();
            }
            return;
        }

        let Some(downstream) = self.state.lock().downstream.clone() else {
            return;
        };

        loop {
            if self.cancelled.load(Ordering::Acquire) {
                return;
            }
            let window = {
                let mut state = self.state.lock();
                if state.queue.is_empty() {
                    None
                } else if self.requested.try_consume_one() {
                    state.queue.pop_front()
                } else {
                    None
                }
            };
            match window {
                Some(window) => downstream.on_next(window),
                None => break,
            }
        }

        if self.cancelled.load(Ordering::Acquire) {
            return;
        }

        let (ready, error) = {
            let mut state = self.state.lock();
            let ready = state.done && state.queue.is_empty();
            (ready, if ready { state.error.take() } else { None })
        };

        if ready && !self.terminal_delivered.swap(true, Ordering::AcqRel) {
            match error {
                Some(error) => downstream.on_error(error),
                None => downstream.on_complete(),
            }
        }
    }
}

impl<T: Send + Sync + 'static> Subscriber<T> for PredicateWindowOp<T> {
    fn on_subscribe(&self, subscription: Arc<dyn Subscription>) {
        self.shared.set_upstream(subscription);
        self.shared.initial_request();
    }

    fn on_next(&self, value: T) {
        if self.cancelled.load(Ordering::Acquire) || self.terminal_delivered.load(Ordering::Acquire) {
            return;
        }

        let window = self.ensure_open_window();

        let outcome = catch_unwind(AssertUnwindSafe(|| self.predicate.test(&value)));
        let boundary = match outcome {
            Ok(Ok(boundary)) => boundary,
            Ok(Err(error)) => {
                self.terminate(error);
                return;
            }
            Err(payload) => {
                self.terminate(WindowError::from_panic(payload));
                return;
            }
        };

        match self.mode.action(boundary) {
            BoundaryAction::PushAndClose => {
                window.push(value);
                self.close_current();
            }
            BoundaryAction::PushAndContinue => {
                window.push(value);
            }
            BoundaryAction::CloseAndOpenThenPush => {
                self.close_current();
                let next = self.open_new_window();
                next.push(value);
            }
            BoundaryAction::CloseOnly => {
                self.close_current();
                (self.discard_hook)(value);
            }
        }

        self.shared.replenish();
    }

    fn on_error(&self, error: WindowError) {
        debug!("upstream error: {error}");
        self.terminate(error);
    }

    fn on_complete(&self) {
        self.complete();
    }
}

impl<T: Send + Sync + 'static> Publisher<Arc<WindowFlux<T>>> for PredicateWindowOp<T> {
    fn subscribe(&self, subscriber: Arc<dyn Subscriber<Arc<WindowFlux<T>>>>) {
        if self.subscribed.swap(true, Ordering::AcqRel) {
            subscriber.on_error(WindowError::AlreadySubscribed);
            return;
        }
        self.state.lock().downstream = Some(subscriber.clone());
        subscriber.on_subscribe(self.arc() as Arc<dyn Subscription>);
        self.source.subscribe(self.arc() as Arc<dyn Subscriber<T>>);
    }
}

impl<T: Send + Sync + 'static> Subscription for PredicateWindowOp<T> {
    fn request(&self, n: i64) {
        if n <= 0 {
            self.terminate(WindowError::InvalidRequest { requested: n });
            return;
        }
        self.requested.add(n as u64);
        self.drain_main();
    }

    fn cancel(&self) {
        self.cancel_impl();
    }
}

impl<T> Introspectable for PredicateWindowOp<T> {
    fn parent(&self) -> &'static str {
        "upstream"
    }

    fn prefetch(&self) -> Option<u64> {
        Some(self.shared.prefetch)
    }

    fn requested_from_downstream(&self) -> u64 {
        self.requested.current()
    }

    fn buffered(&self) -> usize {
        self.state.lock().queue.len()
    }

    fn error(&self) -> Option<WindowError> {
        self.state.lock().error.clone()
    }

    fn terminated(&self) -> bool {
        self.terminal_delivered.load(Ordering::Acquire)
    }

    fn cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    fn run_style(&self) -> RunStyle {
        RunStyle::Synchronous
    }
}

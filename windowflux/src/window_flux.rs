// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! `WindowFlux<T>`: the per-window publisher handed downstream. Each one is
//! its own small Reactive-Streams publisher: it buffers the elements placed
//! into it by the main operator and drains them to whichever subscriber
//! eventually subscribes, honoring that subscriber's own `request(n)`.

use crate::discard::DiscardHook;
use crate::main_operator::MainShared;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use tracing::trace;
use windowflux_core::{
    Introspectable, Mutex, Publisher, RequestState, RunStyle, Subscriber, Subscription,
    WindowError, Wip,
};

struct State<T> {
    queue: VecDeque<T>,
    subscriber: Option<Arc<dyn Subscriber<T>>>,
    done: bool,
    error: Option<WindowError>,
}

/// A single window's contents, exposed as its own `Publisher<T>`.
pub struct WindowFlux<T> {
    weak_self: Weak<WindowFlux<T>>,
    state: Mutex<State<T>>,
    requested: RequestState,
    wip: Wip,
    subscribed: AtomicBool,
    cancelled: AtomicBool,
    terminal_delivered: AtomicBool,
    released: AtomicBool,
    discard_hook: DiscardHook<T>,
    parent: Weak<MainShared<T>>,
}

impl<T: Send + 'static> WindowFlux<T> {
    pub(crate) fn new(discard_hook: DiscardHook<T>, parent: Weak<MainShared<T>>) -> Arc<Self> {
        Arc::new_cyclic(|weak_self| Self {
            weak_self: weak_self.clone(),
            state: Mutex::new(State {
                queue: VecDeque::new(),
                subscriber: None,
                done: false,
                error: None,
            }),
            requested: RequestState::new(),
            wip: Wip::new(),
            subscribed: AtomicBool::new(false),
            cancelled: AtomicBool::new(false),
            terminal_delivered: AtomicBool::new(false),
            released: AtomicBool::new(false),
            discard_hook,
            parent,
        })
    }

    fn arc(&self) -> Arc<Self> {
        self.weak_self
            .upgrade()
            .expect("WindowFlux always holds a strong reference to itself while reachable")
    }

    /// `true` once a subscriber has attached to this window.
    pub(crate) fn is_subscribed(&self) -> bool {
        self.subscribed.load(Ordering::Acquire)
    }

    /// Place an element in this window's buffer and attempt delivery.
    pub(crate) fn push(&self, value: T) {
        self.state.lock().queue.push_back(value);
        self.drain();
    }

    /// Mark this window as normally completed (no more elements coming).
    pub(crate) fn complete(&self) {
        self.state.lock().done = true;
        self.drain();
    }

    /// Mark this window as failed; delivered once buffered elements drain.
    pub(crate) fn fail(&self, error: WindowError) {
        {
            let mut state = self.state.lock();
            state.done = true;
            state.error = Some(error);
        }
        self.drain();
    }

    /// Cancel this window from within the operator (e.g. an outer cancel
    /// reaching a window that was never subscribed to).
    pub(crate) fn cancel(&self) {
        if !self.cancelled.swap(true, Ordering::AcqRel) {
            self.drain();
        }
    }

    fn release_once(&self) {
        if !self.released.swap(true, Ordering::AcqRel) {
            if let Some(parent) = self.parent.upgrade() {
                parent.release_window();
            }
        }
    }

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
        if self.cancelled.load(Ordering::Acquire) {
            let discarded: Vec<T> = self.state.lock().queue.drain(..).collect();
            for item in discarded {
                (self.discard_hook)(item);
            }
            self.release_once();
            return;
        }

        let Some(subscriber) = self.state.lock().subscriber.clone() else {
            return;
        };

        loop {
            if self.cancelled.load(Ordering::Acquire) {
                return;
            }
            let value = {
                let mut state = self.state.lock();
                if state.queue.is_empty() {
                    None
                } else if self.requested.try_consume_one() {
                    state.queue.pop_front()
                } else {
                    None
                }
            };
            match value {
                Some(value) => subscriber.on_next(value),
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
                Some(error) => subscriber.on_error(error),
                None => subscriber.on_complete(),
            }
        }
    }
}

impl<T: Send + 'static> Publisher<T> for WindowFlux<T> {
    fn subscribe(&self, subscriber: Arc<dyn Subscriber<T>>) {
        if self.subscribed.swap(true, Ordering::AcqRel) {
            trace!("rejecting second subscriber to WindowFlux");
            subscriber.on_error(WindowError::AlreadySubscribed);
            return;
        }
        self.state.lock().subscriber = Some(subscriber.clone());
        subscriber.on_subscribe(self.arc() as Arc<dyn Subscription>);
        self.drain();
    }
}

impl<T: Send + 'static> Subscription for WindowFlux<T> {
    fn request(&self, n: i64) {
        if n <= 0 {
            self.fail(WindowError::InvalidRequest { requested: n });
            return;
        }
        self.requested.add(n as u64);
        self.drain();
    }

    fn cancel(&self) {
        WindowFlux::cancel(self);
    }
}

impl<T> Introspectable for WindowFlux<T> {
    fn parent(&self) -> &'static str {
        "PredicateWindowOp"
    }

    fn prefetch(&self) -> Option<u64> {
        None
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

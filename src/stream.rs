// ABOUTME: Bounded latest-wins queue used to deliver progress snapshots to a single consumer
// ABOUTME: When full the oldest unread item is evicted; dropping the sender closes the stream
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 dravr.ai

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::stream::{self, Stream};
use tokio::sync::Notify;

struct QueueState<T> {
    items: VecDeque<T>,
    capacity: usize,
    closed: bool,
    evicted: u64,
}

struct Shared<T> {
    state: Mutex<QueueState<T>>,
    notify: Notify,
}

impl<T> Shared<T> {
    fn lock(&self) -> MutexGuard<'_, QueueState<T>> {
        // A panic while holding the lock cannot leave the deque half-updated
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Producer half of a latest-wins queue
pub struct LatestSender<T> {
    shared: Arc<Shared<T>>,
}

/// Consumer half of a latest-wins queue
pub struct LatestReceiver<T> {
    shared: Arc<Shared<T>>,
}

/// Create a queue that retains at most `capacity` unread items
///
/// Pushing never blocks: once `capacity` items are pending, the oldest is
/// discarded to make room. A `capacity` of zero is treated as one.
#[must_use]
pub fn latest_channel<T>(capacity: usize) -> (LatestSender<T>, LatestReceiver<T>) {
    let capacity = capacity.max(1);
    let shared = Arc::new(Shared {
        state: Mutex::new(QueueState {
            items: VecDeque::with_capacity(capacity),
            capacity,
            closed: false,
            evicted: 0,
        }),
        notify: Notify::new(),
    });
    (
        LatestSender {
            shared: Arc::clone(&shared),
        },
        LatestReceiver { shared },
    )
}

impl<T> LatestSender<T> {
    /// Enqueue an item, returning the evicted item if the queue was full
    pub fn push(&self, item: T) -> Option<T> {
        let evicted = {
            let mut state = self.shared.lock();
            let evicted = if state.items.len() >= state.capacity {
                state.evicted += 1;
                state.items.pop_front()
            } else {
                None
            };
            state.items.push_back(item);
            evicted
        };
        self.shared.notify.notify_one();
        evicted
    }

    /// Total items evicted so far, reported when the reader finishes
    #[must_use]
    pub fn evicted(&self) -> u64 {
        self.shared.lock().evicted
    }
}

impl<T> Drop for LatestSender<T> {
    fn drop(&mut self) {
        self.shared.lock().closed = true;
        self.shared.notify.notify_one();
    }
}

impl<T> LatestReceiver<T> {
    /// Receive the oldest retained item, or `None` once the sender is gone
    /// and the queue is empty
    pub async fn recv(&mut self) -> Option<T> {
        loop {
            {
                let mut state = self.shared.lock();
                if let Some(item) = state.items.pop_front() {
                    return Some(item);
                }
                if state.closed {
                    return None;
                }
            }
            // notify_one stores a permit when nobody is waiting, so a push
            // between the unlock above and this await is not lost
            self.shared.notify.notified().await;
        }
    }

    /// Convert into a `Stream` that ends when the sender is dropped
    pub fn into_stream(self) -> impl Stream<Item = T> + Send
    where
        T: Send + 'static,
    {
        stream::unfold(self, |mut rx| async move { rx.recv().await.map(|item| (item, rx)) })
    }
}

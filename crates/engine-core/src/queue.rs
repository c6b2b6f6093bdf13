use std::{
    collections::VecDeque,
    sync::{Condvar, Mutex, MutexGuard, PoisonError},
};

/// Fixed-capacity FIFO hand-off between one producer and a pool of consumers.
///
/// Every blocking call can be released without data through
/// [`HandoffQueue::wakeup`]. The wake-up is sticky: once issued, any call
/// that would otherwise park (insert on a full queue, pop on an empty queue,
/// waiting for the queue to drain) returns straight away. Items already queued
/// can still be popped afterwards.
pub struct HandoffQueue<T> {
    state: Mutex<QueueState<T>>,
    not_empty: Condvar,
    not_full: Condvar,
    drained: Condvar,
    capacity: usize,
}

struct QueueState<T> {
    items: VecDeque<T>,
    woken: bool,
}

impl<T> HandoffQueue<T> {
    /// A capacity of zero is bumped to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            state: Mutex::new(QueueState {
                items: VecDeque::with_capacity(capacity),
                woken: false,
            }),
            not_empty: Condvar::new(),
            not_full: Condvar::new(),
            drained: Condvar::new(),
            capacity,
        }
    }

    /// Stores `item`, blocking while the queue is full.
    ///
    /// If the queue is (or gets) woken while full, the item is handed back
    /// instead of being stored.
    pub fn insert(&self, item: T) -> Result<(), T> {
        let mut state = self.lock();
        while state.items.len() >= self.capacity {
            if state.woken {
                return Err(item);
            }
            state = self
                .not_full
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }

        state.items.push_back(item);
        drop(state);

        self.not_empty.notify_one();
        Ok(())
    }

    /// Takes the oldest item, blocking while the queue is empty.
    ///
    /// `None` means the queue was woken with nothing to hand out; callers are
    /// expected to re-check their own termination state.
    pub fn interruptible_pop(&self) -> Option<T> {
        let mut state = self.lock();
        while state.items.is_empty() {
            if state.woken {
                return None;
            }
            state = self
                .not_empty
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }

        let item = state.items.pop_front();
        let drained = state.items.is_empty();
        drop(state);

        self.not_full.notify_one();
        if drained {
            self.drained.notify_all();
        }
        item
    }

    /// Blocks until every queued item has been taken.
    ///
    /// Returns `false` if the wait was cut short by a wake-up with items
    /// still queued.
    pub fn wait_until_empty(&self) -> bool {
        let mut state = self.lock();
        while !state.items.is_empty() {
            if state.woken {
                return false;
            }
            state = self
                .drained
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
        true
    }

    /// Releases every blocked and future waiter. Idempotent, never blocks on
    /// anything but the internal lock.
    pub fn wakeup(&self) {
        self.lock().woken = true;

        self.not_empty.notify_all();
        self.not_full.notify_all();
        self.drained.notify_all();
    }

    pub fn is_woken(&self) -> bool {
        self.lock().woken
    }

    pub fn len(&self) -> usize {
        self.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // The protected state is a plain deque plus a flag; a panic while holding
    // the lock cannot leave it half-updated.
    fn lock(&self) -> MutexGuard<'_, QueueState<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

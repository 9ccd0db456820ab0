/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use std::{collections::VecDeque, sync::Arc};

use parking_lot::Mutex;
use tokio::sync::Notify;

/// Bounded pool of backend resources. Slots are created empty and built
/// lazily by the consumer; a resource that broke mid-call is returned as
/// an empty slot and rebuilt on next checkout. `bump()` invalidates every
/// pooled resource so the next user reconnects, without touching resources
/// currently checked out.
pub struct Pool<T> {
    inner: Arc<PoolInner<T>>,
}

struct PoolInner<T> {
    state: Mutex<PoolState<T>>,
    notify: Notify,
}

struct PoolState<T> {
    idle: VecDeque<Slot<T>>,
    capacity: usize,
    checked_out: usize,
    generation: u64,
}

struct Slot<T> {
    value: Option<T>,
    generation: u64,
}

pub struct PoolToken<T> {
    pub value: Option<T>,
    inner: Arc<PoolInner<T>>,
}

impl<T> Pool<T> {
    pub fn new(capacity: usize) -> Self {
        let mut idle = VecDeque::with_capacity(capacity);
        for _ in 0..capacity {
            idle.push_back(Slot {
                value: None,
                generation: 0,
            });
        }
        Pool {
            inner: Arc::new(PoolInner {
                state: Mutex::new(PoolState {
                    idle,
                    capacity,
                    checked_out: 0,
                    generation: 0,
                }),
                notify: Notify::new(),
            }),
        }
    }

    pub fn size(&self) -> usize {
        self.inner.state.lock().capacity
    }

    /// Check out a slot, waiting for one to be returned when every slot is
    /// in use. Stale resources (older than the last `bump`) are dropped
    /// here so the caller always starts from a usable or empty slot.
    pub async fn get_wait(&self) -> PoolToken<T> {
        loop {
            {
                let mut state = self.inner.state.lock();
                if let Some(mut slot) = state.idle.pop_front() {
                    state.checked_out += 1;
                    if slot.generation != state.generation {
                        slot.value = None;
                    }
                    return PoolToken {
                        value: slot.value,
                        inner: self.inner.clone(),
                    };
                }
            }
            self.inner.notify.notified().await;
        }
    }

    /// Reload capacity. Surplus empty slots are dropped immediately;
    /// surplus live ones as they come back.
    pub fn resize(&self, capacity: usize) {
        let mut state = self.inner.state.lock();
        state.capacity = capacity;
        while state.idle.len() + state.checked_out < capacity {
            let generation = state.generation;
            state.idle.push_back(Slot {
                value: None,
                generation,
            });
        }
        while state.idle.len() + state.checked_out > capacity && !state.idle.is_empty() {
            state.idle.pop_back();
        }
        drop(state);
        self.inner.notify.notify_waiters();
    }

    /// Drop every pooled resource, keeping capacity.
    pub fn clear(&self) {
        let mut state = self.inner.state.lock();
        for slot in state.idle.iter_mut() {
            slot.value = None;
        }
    }

    /// Mark pooled resources stale; each reconnects on next use.
    pub fn bump(&self) {
        self.inner.state.lock().generation += 1;
    }
}

impl<T> Clone for Pool<T> {
    fn clone(&self) -> Self {
        Pool {
            inner: self.inner.clone(),
        }
    }
}

impl<T> Drop for PoolToken<T> {
    fn drop(&mut self) {
        let mut state = self.inner.state.lock();
        state.checked_out -= 1;
        if state.idle.len() + state.checked_out < state.capacity {
            let generation = state.generation;
            state.idle.push_back(Slot {
                value: self.value.take(),
                generation,
            });
        }
        drop(state);
        self.inner.notify.notify_one();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn checkout_blocks_until_return() {
        let pool = Pool::<u32>::new(1);
        let mut token = pool.get_wait().await;
        token.value = Some(42);

        let waiter = {
            let pool = pool.clone();
            tokio::spawn(async move { pool.get_wait().await.value })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        drop(token);
        assert_eq!(waiter.await.unwrap(), Some(42));
    }

    #[tokio::test]
    async fn bump_invalidates_pooled_resources() {
        let pool = Pool::<u32>::new(2);
        {
            let mut token = pool.get_wait().await;
            token.value = Some(1);
        }
        pool.bump();
        assert_eq!(pool.get_wait().await.value, None);
    }

    #[tokio::test]
    async fn broken_resources_come_back_empty() {
        let pool = Pool::<u32>::new(1);
        {
            let mut token = pool.get_wait().await;
            token.value = Some(7);
            token.value = None; // connection broke mid-call
        }
        assert_eq!(pool.get_wait().await.value, None);
    }

    #[tokio::test]
    async fn resize_and_clear() {
        let pool = Pool::<u32>::new(2);
        pool.resize(4);
        assert_eq!(pool.size(), 4);
        {
            let mut token = pool.get_wait().await;
            token.value = Some(9);
        }
        pool.clear();
        assert_eq!(pool.get_wait().await.value, None);
        pool.resize(1);
        assert_eq!(pool.size(), 1);
    }
}

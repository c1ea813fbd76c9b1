//! Keyed one-shot timers with cancel-before-reschedule.
//!
//! A [`DebounceTimer`] never runs callbacks itself. When a timer elapses, its
//! sleeping task posts an [`Expiry`] onto the owner's queue, and the owner
//! calls [`DebounceTimer::accept`] before acting on it. `accept` only succeeds
//! for the generation that is currently armed, so an expiry that was already
//! in flight when the key got cancelled or re-armed is rejected.

use std::collections::HashMap;
use std::hash::Hash;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};

/// Keys for every timer the chat session runs.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TimerKey {
    /// Local typing indicator decays to "stopped".
    TypingDecay,
    /// A remote participant's typing flag clears after the grace window.
    TypingGrace(String),
    /// A transient notice leaves the screen.
    NoticeExpiry(String),
}

/// An elapsed timer, waiting to be accepted by its owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expiry<K> {
    pub key: K,
    generation: u64,
}

struct Armed {
    generation: u64,
    task: JoinHandle<()>,
}

/// At most one pending timer per key.
pub struct DebounceTimer<K> {
    armed: HashMap<K, Armed>,
    next_generation: u64,
    expiry_tx: mpsc::UnboundedSender<Expiry<K>>,
}

impl<K> DebounceTimer<K>
where
    K: Clone + Eq + Hash + Send + 'static,
{
    pub fn new(expiry_tx: mpsc::UnboundedSender<Expiry<K>>) -> Self {
        Self {
            armed: HashMap::new(),
            next_generation: 0,
            expiry_tx,
        }
    }

    /// Arm `key` to expire after `delay`, replacing any timer already armed
    /// on the same key.
    pub fn schedule(&mut self, key: K, delay: Duration) {
        self.cancel(&key);

        self.next_generation += 1;
        let generation = self.next_generation;
        // Deadline is fixed here, not when the task first gets polled.
        let deadline = Instant::now() + delay;
        let tx = self.expiry_tx.clone();
        let fired = key.clone();
        let task = tokio::spawn(async move {
            time::sleep_until(deadline).await;
            let _ = tx.send(Expiry {
                key: fired,
                generation,
            });
        });

        self.armed.insert(key, Armed { generation, task });
    }

    /// Disarm `key`. Returns whether a timer was armed.
    pub fn cancel(&mut self, key: &K) -> bool {
        match self.armed.remove(key) {
            Some(armed) => {
                armed.task.abort();
                true
            }
            None => false,
        }
    }

    pub fn cancel_all(&mut self) {
        for (_, armed) in self.armed.drain() {
            armed.task.abort();
        }
    }

    /// Claim an expiry. Returns `true` exactly once per armed timer, and
    /// `false` for anything cancelled or superseded in the meantime.
    pub fn accept(&mut self, expiry: &Expiry<K>) -> bool {
        match self.armed.get(&expiry.key) {
            Some(armed) if armed.generation == expiry.generation => {
                self.armed.remove(&expiry.key);
                true
            }
            _ => false,
        }
    }

    pub fn is_armed(&self, key: &K) -> bool {
        self.armed.contains_key(key)
    }

    pub fn armed_count(&self) -> usize {
        self.armed.len()
    }
}

impl<K> Drop for DebounceTimer<K> {
    fn drop(&mut self) {
        for (_, armed) in self.armed.drain() {
            armed.task.abort();
        }
    }
}

//! Durable message log collaborator.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use huddle_common::SyncError;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::message::{Message, MessageDraft, MessageId};

/// Handle for a live store subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

/// The durable, authoritative message log.
///
/// Subscribers receive the full ordered message set right away and again
/// after every change.
#[async_trait]
pub trait MessageStore: Send + Sync {
    fn subscribe(&self, tx: mpsc::Sender<Vec<Message>>) -> SubscriptionId;

    fn unsubscribe(&self, id: SubscriptionId);

    /// Persist a draft and return the canonical record, with the id and
    /// timestamp the store assigned.
    async fn append(&self, draft: MessageDraft) -> Result<Message, SyncError>;
}

#[derive(Default)]
struct StoreInner {
    messages: Vec<Message>,
    subscribers: Vec<(SubscriptionId, mpsc::Sender<Vec<Message>>)>,
    last_stamp: Option<DateTime<Utc>>,
}

/// Process-local store. Assigns uuid ids and strictly ascending timestamps.
#[derive(Default)]
pub struct InMemoryStore {
    inner: Mutex<StoreInner>,
    next_subscription: AtomicU64,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with existing history.
    pub fn with_history(mut history: Vec<Message>) -> Self {
        history.sort_by_key(Message::order_key);
        let last_stamp = history.last().map(|m| m.sent_at);
        Self {
            inner: Mutex::new(StoreInner {
                messages: history,
                subscribers: Vec::new(),
                last_stamp,
            }),
            next_subscription: AtomicU64::new(0),
        }
    }

    pub fn snapshot(&self) -> Vec<Message> {
        match self.inner.lock() {
            Ok(inner) => inner.messages.clone(),
            Err(_) => Vec::new(),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.lock().map(|i| i.subscribers.len()).unwrap_or(0)
    }

    fn broadcast(inner: &mut StoreInner) {
        let snapshot = inner.messages.clone();
        inner.subscribers.retain(|(id, tx)| match tx.try_send(snapshot.clone()) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!(subscription = id.0, "Store subscriber lagging, snapshot dropped");
                true
            }
            Err(mpsc::error::TrySendError::Closed(_)) => false,
        });
    }
}

#[async_trait]
impl MessageStore for InMemoryStore {
    fn subscribe(&self, tx: mpsc::Sender<Vec<Message>>) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription.fetch_add(1, Ordering::Relaxed));
        if let Ok(mut inner) = self.inner.lock() {
            let _ = tx.try_send(inner.messages.clone());
            inner.subscribers.push((id, tx));
        }
        debug!(subscription = id.0, "Store subscription opened");
        id
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.subscribers.retain(|(sid, _)| *sid != id);
        }
        debug!(subscription = id.0, "Store subscription closed");
    }

    async fn append(&self, draft: MessageDraft) -> Result<Message, SyncError> {
        let mut inner = self
            .inner
            .lock()
            .map_err(|_| SyncError::Persistence("store lock poisoned".to_string()))?;

        let mut stamp = Utc::now();
        if let Some(last) = inner.last_stamp {
            if stamp <= last {
                stamp = last + Duration::milliseconds(1);
            }
        }
        inner.last_stamp = Some(stamp);

        let message = Message::new(
            MessageId::new(huddle_common::new_id()),
            draft.content,
            draft.sender_id,
            draft.sender_display_name,
            stamp,
        );
        inner.messages.push(message.clone());
        Self::broadcast(&mut inner);
        Ok(message)
    }
}

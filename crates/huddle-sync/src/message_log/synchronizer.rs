//! Ordered message store with id-based de-duplication and optimistic sends.

use std::collections::{BTreeMap, HashMap};

use chrono::Utc;
use tracing::debug;

use crate::identity::LocalIdentity;
use crate::message::{Attachment, Message, MessageContent, MessageDraft, MessageId, OrderKey};

/// Whether the durable store has acknowledged an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Shown optimistically under a temporary id.
    Pending,
    Confirmed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub message: Message,
    pub delivery: Delivery,
}

/// The merged message view.
#[derive(Debug, Default)]
pub struct MessageLog {
    entries: BTreeMap<OrderKey, LogEntry>,
    /// Every id currently in the view, pointing at its position.
    seen: HashMap<MessageId, OrderKey>,
}

impl MessageLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge a batch from either producer. Returns how many were new.
    pub fn merge<I>(&mut self, messages: I) -> usize
    where
        I: IntoIterator<Item = Message>,
    {
        let mut inserted = 0;
        let mut duplicates = 0;
        for message in messages {
            if self.insert(message, Delivery::Confirmed) {
                inserted += 1;
            } else {
                duplicates += 1;
            }
        }
        if duplicates > 0 {
            debug!(inserted, duplicates, "Merged message batch");
        }
        inserted
    }

    /// Insert one message at its ordered position unless its id was seen.
    ///
    /// A confirmed record that matches a pending local send by sender and
    /// content takes that entry's place, so the sender never sees their
    /// message twice while the append acknowledgement is still in flight.
    pub fn insert(&mut self, message: Message, delivery: Delivery) -> bool {
        if self.seen.contains_key(&message.id) {
            return false;
        }
        if delivery == Delivery::Confirmed {
            if let Some(local_id) = self.matching_pending(&message) {
                self.remove(&local_id);
                debug!(
                    local_id = %local_id,
                    message_id = %message.id,
                    "Canonical record replaced pending send"
                );
            }
        }
        self.place(message, delivery)
    }

    fn place(&mut self, message: Message, delivery: Delivery) -> bool {
        if self.seen.contains_key(&message.id) {
            return false;
        }
        let key = message.order_key();
        self.seen.insert(message.id.clone(), key.clone());
        self.entries.insert(key, LogEntry { message, delivery });
        true
    }

    /// Start a local send: show the message as pending under `local_id`.
    ///
    /// Returns the draft to persist, or `None` when there is nothing to send.
    pub fn begin_send(
        &mut self,
        local_id: MessageId,
        sender: &LocalIdentity,
        body: Option<String>,
        attachment: Option<Attachment>,
    ) -> Option<MessageDraft> {
        let content = MessageContent::new(body, attachment)?;
        let draft = MessageDraft {
            content,
            sender_id: sender.user_id.clone(),
            sender_display_name: sender.display_name.clone(),
            composed_at: Utc::now(),
        };
        let pending = Message::new(
            local_id,
            draft.content.clone(),
            draft.sender_id.clone(),
            draft.sender_display_name.clone(),
            draft.composed_at,
        );
        self.insert(pending, Delivery::Pending);
        Some(draft)
    }

    /// Replace a pending entry with the store's canonical record.
    ///
    /// If the durable subscription already delivered the canonical record,
    /// the pending entry is simply dropped. Returns whether the canonical
    /// record was newly inserted by this call.
    pub fn confirm(&mut self, local_id: &MessageId, canonical: Message) -> bool {
        self.remove(local_id);
        self.place(canonical, Delivery::Confirmed)
    }

    /// Drop a pending entry whose send failed.
    pub fn reject(&mut self, local_id: &MessageId) -> Option<Message> {
        self.remove(local_id).map(|entry| entry.message)
    }

    /// Drop every entry still waiting for the store.
    pub fn discard_pending(&mut self) -> usize {
        let pending: Vec<MessageId> = self
            .entries
            .values()
            .filter(|e| e.delivery == Delivery::Pending)
            .map(|e| e.message.id.clone())
            .collect();
        for id in &pending {
            self.remove(id);
        }
        pending.len()
    }

    /// Oldest pending entry with the same sender and content as `canonical`.
    fn matching_pending(&self, canonical: &Message) -> Option<MessageId> {
        self.entries
            .values()
            .find(|e| {
                e.delivery == Delivery::Pending
                    && e.message.sender_id == canonical.sender_id
                    && e.message.content() == canonical.content()
            })
            .map(|e| e.message.id.clone())
    }

    fn remove(&mut self, id: &MessageId) -> Option<LogEntry> {
        let key = self.seen.remove(id)?;
        self.entries.remove(&key)
    }

    // -- projections --------------------------------------------------------

    /// Entries in ascending `(sent_at, id)` order.
    pub fn entries(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.values()
    }

    pub fn messages(&self) -> impl Iterator<Item = &Message> {
        self.entries.values().map(|e| &e.message)
    }

    pub fn get(&self, id: &MessageId) -> Option<&LogEntry> {
        self.seen.get(id).and_then(|key| self.entries.get(key))
    }

    pub fn contains(&self, id: &MessageId) -> bool {
        self.seen.contains_key(id)
    }

    pub fn pending_count(&self) -> usize {
        self.entries
            .values()
            .filter(|e| e.delivery == Delivery::Pending)
            .count()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.seen.clear();
    }
}

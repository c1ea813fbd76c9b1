//! Auto-expiring system notices ("Ana joined the chat").
//!
//! Notices live only in memory and never touch the message log. Each one
//! arms its own expiry timer; the queue policy decides whether a new notice
//! replaces the visible one or stacks next to it.

use std::collections::VecDeque;
use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tracing::debug;

use crate::debounce::{DebounceTimer, Expiry, TimerKey};

/// Name shown when a leave event does not carry one.
pub const UNKNOWN_PARTICIPANT: &str = "Someone";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Joined,
    Left,
}

/// How many notices may be visible at once.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NoticePolicy {
    /// A new notice replaces whatever is showing.
    #[default]
    Single,
    /// Notices stack; the oldest is evicted beyond `max_visible`.
    Stack { max_visible: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransientNotice {
    pub id: String,
    pub kind: NoticeKind,
    pub display_name: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl TransientNotice {
    pub fn text(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for TransientNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            NoticeKind::Joined => write!(f, "{} joined the chat", self.display_name),
            NoticeKind::Left => write!(f, "{} left the chat", self.display_name),
        }
    }
}

pub struct NoticeQueue {
    visible: VecDeque<TransientNotice>,
    ttl: Duration,
    policy: NoticePolicy,
    timers: DebounceTimer<TimerKey>,
}

impl NoticeQueue {
    pub fn new(
        ttl: Duration,
        policy: NoticePolicy,
        expiry_tx: mpsc::UnboundedSender<Expiry<TimerKey>>,
    ) -> Self {
        Self {
            visible: VecDeque::new(),
            ttl,
            policy,
            timers: DebounceTimer::new(expiry_tx),
        }
    }

    /// Show a notice and arm its expiry.
    pub fn add(&mut self, kind: NoticeKind, display_name: &str) -> TransientNotice {
        match self.policy {
            NoticePolicy::Single => self.clear(),
            NoticePolicy::Stack { max_visible } => {
                while self.visible.len() >= max_visible.max(1) {
                    if let Some(oldest) = self.visible.pop_front() {
                        self.timers.cancel(&TimerKey::NoticeExpiry(oldest.id));
                    }
                }
            }
        }

        let created_at = Utc::now();
        let ttl = chrono::Duration::from_std(self.ttl).unwrap_or(chrono::Duration::zero());
        let notice = TransientNotice {
            id: format!("notice-{}", huddle_common::new_id()),
            kind,
            display_name: display_name.to_string(),
            created_at,
            expires_at: created_at + ttl,
        };

        self.timers
            .schedule(TimerKey::NoticeExpiry(notice.id.clone()), self.ttl);
        debug!(id = %notice.id, text = %notice, "Notice shown");
        self.visible.push_back(notice.clone());
        notice
    }

    /// Handle an elapsed expiry timer. Returns the removed notice id.
    pub fn on_expiry(&mut self, expiry: &Expiry<TimerKey>) -> Option<String> {
        let TimerKey::NoticeExpiry(id) = &expiry.key else {
            return None;
        };
        if !self.timers.accept(expiry) {
            return None;
        }
        let position = self.visible.iter().position(|n| &n.id == id)?;
        self.visible.remove(position).map(|n| n.id)
    }

    /// Remove a notice early, cancelling its timer.
    pub fn dismiss(&mut self, id: &str) -> bool {
        self.timers.cancel(&TimerKey::NoticeExpiry(id.to_string()));
        match self.visible.iter().position(|n| n.id == id) {
            Some(position) => {
                self.visible.remove(position);
                true
            }
            None => false,
        }
    }

    /// Remove every notice and cancel every timer.
    pub fn clear(&mut self) {
        self.timers.cancel_all();
        self.visible.clear();
    }

    /// Notices currently on screen, oldest first.
    pub fn visible(&self) -> impl Iterator<Item = &TransientNotice> {
        self.visible.iter()
    }

    pub fn len(&self) -> usize {
        self.visible.len()
    }

    pub fn is_empty(&self) -> bool {
        self.visible.is_empty()
    }

    pub fn policy(&self) -> NoticePolicy {
        self.policy
    }
}

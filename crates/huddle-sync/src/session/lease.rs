//! Ownership of everything a joined session registered with its
//! collaborators.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::debug;

use crate::message::Message;
use crate::protocol::EventKind;
use crate::realtime::{ChannelFrame, ListenerId, RealtimeChannel};
use crate::store::{MessageStore, SubscriptionId};

/// Listener registrations, the store subscription and the open channel.
///
/// Releasing the lease undoes all of them, once. Dropping it releases it.
pub(crate) struct ChannelLease {
    channel: Arc<dyn RealtimeChannel>,
    store: Arc<dyn MessageStore>,
    listeners: Vec<ListenerId>,
    subscription: Option<SubscriptionId>,
    released: bool,
}

impl ChannelLease {
    pub(crate) fn new(channel: Arc<dyn RealtimeChannel>, store: Arc<dyn MessageStore>) -> Self {
        Self {
            channel,
            store,
            listeners: Vec::new(),
            subscription: None,
            released: false,
        }
    }

    pub(crate) fn listen(&mut self, kind: EventKind, tx: mpsc::Sender<ChannelFrame>) {
        self.listeners.push(self.channel.on(kind, tx));
    }

    pub(crate) fn follow_store(&mut self, tx: mpsc::Sender<Vec<Message>>) {
        if let Some(previous) = self.subscription.replace(self.store.subscribe(tx)) {
            self.store.unsubscribe(previous);
        }
    }

    /// Listeners and subscription go first, then the channel closes.
    pub(crate) fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        for id in self.listeners.drain(..) {
            self.channel.off(id);
        }
        if let Some(subscription) = self.subscription.take() {
            self.store.unsubscribe(subscription);
        }
        self.channel.disconnect();
        debug!("Channel lease released");
    }
}

impl Drop for ChannelLease {
    fn drop(&mut self) {
        self.release();
    }
}

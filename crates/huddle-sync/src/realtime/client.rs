//! Public handle for the room WebSocket connection.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use huddle_common::SyncError;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info};

use super::connection::{connection_loop, open_socket};
use super::handler::{Listener, ListenerTable};
use super::types::{
    ChannelFrame, LinkStatus, ListenerId, RealtimeChannel, RealtimeCommand, RealtimeConfig,
};
use crate::protocol::EventKind;

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// [`RealtimeChannel`] over a WebSocket carrying JSON envelopes.
///
/// Emits are queued to a background connection task, which also keeps the
/// link alive with pings and reconnects with backoff when it drops. Once
/// disconnected, a `WsChannel` cannot be reopened.
pub struct WsChannel {
    config: RealtimeConfig,
    command_tx: mpsc::Sender<RealtimeCommand>,
    /// Taken by the connection task on first successful connect.
    command_rx: Mutex<Option<mpsc::Receiver<RealtimeCommand>>>,
    listeners: ListenerTable,
    next_listener: AtomicU64,
    link_tx: Arc<watch::Sender<LinkStatus>>,
    shutdown_tx: watch::Sender<bool>,
}

impl WsChannel {
    pub fn new(config: RealtimeConfig) -> Self {
        let (command_tx, command_rx) = mpsc::channel(64);
        let (link_tx, _) = watch::channel(LinkStatus::Down);
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            config,
            command_tx,
            command_rx: Mutex::new(Some(command_rx)),
            listeners: Arc::new(Mutex::new(HashMap::new())),
            next_listener: AtomicU64::new(1),
            link_tx: Arc::new(link_tx),
            shutdown_tx,
        }
    }

    pub fn config(&self) -> &RealtimeConfig {
        &self.config
    }

    pub fn is_connected(&self) -> bool {
        *self.link_tx.borrow() == LinkStatus::Up
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.lock().map(|t| t.len()).unwrap_or(0)
    }

    fn is_shut_down(&self) -> bool {
        *self.shutdown_tx.borrow()
    }

    fn is_running(&self) -> bool {
        self.command_rx.lock().map(|rx| rx.is_none()).unwrap_or(true)
    }
}

#[async_trait]
impl RealtimeChannel for WsChannel {
    async fn connect(&self) -> Result<(), SyncError> {
        if self.is_shut_down() {
            return Err(SyncError::Transport("channel was disconnected".to_string()));
        }
        if self.is_running() {
            return Ok(());
        }

        let ws_stream = open_socket(&self.config).await?;

        let taken = self.command_rx.lock().ok().and_then(|mut rx| rx.take());
        let Some(command_rx) = taken else {
            // Lost a race with a concurrent connect; its socket wins.
            return Ok(());
        };

        self.link_tx.send_replace(LinkStatus::Up);
        tokio::spawn(connection_loop(
            self.config.clone(),
            ws_stream,
            Arc::clone(&self.listeners),
            Arc::clone(&self.link_tx),
            command_rx,
            self.shutdown_tx.subscribe(),
        ));
        info!(url = %self.config.display_url(), "Connected to room server");
        Ok(())
    }

    fn disconnect(&self) {
        if self.shutdown_tx.send_replace(true) {
            return;
        }
        info!("Disconnecting from room server");
    }

    async fn emit(&self, kind: EventKind, payload: serde_json::Value) -> Result<(), SyncError> {
        if !self.is_connected() {
            return Err(SyncError::Transport(format!("cannot emit {kind}: not connected")));
        }
        self.command_tx
            .send(RealtimeCommand::Emit { kind, payload })
            .await
            .map_err(|_| SyncError::Transport("connection task stopped".to_string()))
    }

    fn on(&self, kind: EventKind, tx: mpsc::Sender<ChannelFrame>) -> ListenerId {
        let id = self.next_listener.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut table) = self.listeners.lock() {
            table.insert(id, Listener { kind, tx });
        }
        debug!(listener = id, event = %kind, "Listener registered");
        ListenerId(id)
    }

    fn off(&self, id: ListenerId) {
        if let Ok(mut table) = self.listeners.lock() {
            table.remove(&id.0);
        }
    }

    fn link_status(&self) -> watch::Receiver<LinkStatus> {
        self.link_tx.subscribe()
    }
}

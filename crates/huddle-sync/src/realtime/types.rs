//! Configuration, wire envelope, and the channel trait.

use async_trait::async_trait;
use huddle_common::SyncError;
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, watch};

use crate::protocol::EventKind;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Configuration for the WebSocket room connection.
#[derive(Debug, Clone)]
pub struct RealtimeConfig {
    /// Room endpoint, e.g. `ws://localhost:3001/room`.
    pub url: String,
    /// Heartbeat ping interval in seconds (default: 25).
    pub heartbeat_interval_secs: u64,
    /// Reconnect base delay in seconds.
    pub reconnect_delay_secs: u64,
    /// Maximum reconnect delay in seconds.
    pub max_reconnect_delay_secs: u64,
    /// Give up on a single connection attempt after this many seconds.
    pub connect_timeout_secs: u64,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            url: "ws://localhost:3001/room".to_string(),
            heartbeat_interval_secs: 25,
            reconnect_delay_secs: 1,
            max_reconnect_delay_secs: 30,
            connect_timeout_secs: 15,
        }
    }
}

impl RealtimeConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    /// The URL without any query string, for logging.
    pub(crate) fn display_url(&self) -> &str {
        self.url.split('?').next().unwrap_or("")
    }
}

// ---------------------------------------------------------------------------
// Wire envelope
// ---------------------------------------------------------------------------

/// Every frame on the socket: `{"event": <kind>, "payload": <value>}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    pub event: String,
    #[serde(default)]
    pub payload: serde_json::Value,
}

/// An inbound frame handed to a listener.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelFrame {
    pub kind: EventKind,
    pub payload: serde_json::Value,
}

// ---------------------------------------------------------------------------
// Link state & listeners
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LinkStatus {
    Up,
    #[default]
    Down,
}

/// Handle returned by [`RealtimeChannel::on`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

// ---------------------------------------------------------------------------
// Channel trait
// ---------------------------------------------------------------------------

/// Bidirectional named-event channel to the shared room.
#[async_trait]
pub trait RealtimeChannel: Send + Sync {
    /// Open the connection. Connecting an open channel is a no-op.
    async fn connect(&self) -> Result<(), SyncError>;

    /// Close the connection and stop reconnecting.
    fn disconnect(&self);

    async fn emit(&self, kind: EventKind, payload: serde_json::Value) -> Result<(), SyncError>;

    /// Deliver every inbound frame of `kind` to `tx` until [`off`](Self::off).
    fn on(&self, kind: EventKind, tx: mpsc::Sender<ChannelFrame>) -> ListenerId;

    fn off(&self, id: ListenerId);

    fn link_status(&self) -> watch::Receiver<LinkStatus>;
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

/// Commands sent to the connection task from [`super::WsChannel`].
#[derive(Debug)]
pub(crate) enum RealtimeCommand {
    Emit {
        kind: EventKind,
        payload: serde_json::Value,
    },
}

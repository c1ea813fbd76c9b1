//! WebSocket transport for the shared room.
//!
//! Every frame is a JSON envelope naming an event kind. The connection task
//! handles heartbeats and auto-reconnect with backoff, and fans inbound
//! frames out to per-kind listeners.

mod client;
mod connection;
mod handler;
mod types;


pub use client::WsChannel;
pub use types::{
    ChannelFrame, Envelope, LinkStatus, ListenerId, RealtimeChannel, RealtimeConfig,
};

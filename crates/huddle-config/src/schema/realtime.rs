//! Realtime room connection settings.

use serde::{Deserialize, Serialize};

/// WebSocket room endpoint and keepalive tuning. Durations are in seconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RealtimeSection {
    pub url: String,
    /// Valid range: 5-300.
    pub heartbeat_interval: u32,
    /// Valid range: 1-60.
    pub reconnect_delay: u32,
    /// Valid range: 1-600, and not below `reconnect_delay`.
    pub max_reconnect_delay: u32,
    /// Valid range: 1-120.
    pub connect_timeout: u32,
}

impl Default for RealtimeSection {
    fn default() -> Self {
        Self {
            url: "ws://localhost:3001/room".to_string(),
            heartbeat_interval: 25,
            reconnect_delay: 1,
            max_reconnect_delay: 30,
            connect_timeout: 15,
        }
    }
}

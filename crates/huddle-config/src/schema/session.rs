//! Session timing and notice display settings.

use serde::{Deserialize, Serialize};

/// How join/leave notices share the screen.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
#[derive(Default)]
pub enum NoticeMode {
    /// A new notice replaces the visible one.
    #[default]
    Single,
    /// Notices stack up to `max_visible_notices`.
    Stack,
}

/// Timers that drive typing indicators and notices.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Quiet period in ms after the last keystroke (valid range: 250-30000).
    pub typing_decay_ms: u32,
    /// Delay in ms before a remote stop takes effect (valid range: 0-10000).
    pub typing_grace_ms: u32,
    /// Notice lifetime in ms (valid range: 500-60000).
    pub notice_ttl_ms: u32,
    pub notice_policy: NoticeMode,
    /// Only used with `notice_policy = "stack"` (valid range: 1-20).
    pub max_visible_notices: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            typing_decay_ms: 2000,
            typing_grace_ms: 1000,
            notice_ttl_ms: 5000,
            notice_policy: NoticeMode::Single,
            max_visible_notices: 3,
        }
    }
}

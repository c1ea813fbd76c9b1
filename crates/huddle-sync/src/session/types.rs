//! Session state, timings, and the updates a session reports.

use std::time::Duration;

use huddle_common::SyncError;

use crate::message::{Attachment, Message, MessageId};
use crate::notices::{NoticePolicy, TransientNotice};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SessionState {
    #[default]
    Disconnected,
    Connecting,
    Joined,
}

/// Timer durations for one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionTimings {
    /// Quiet period after the last keystroke before typing stops.
    pub typing_decay: Duration,
    /// Delay before a remote "stopped typing" takes effect.
    pub typing_grace: Duration,
    /// How long join/leave notices stay visible.
    pub notice_ttl: Duration,
    pub notice_policy: NoticePolicy,
}

impl Default for SessionTimings {
    fn default() -> Self {
        Self {
            typing_decay: Duration::from_millis(2000),
            typing_grace: Duration::from_millis(1000),
            notice_ttl: Duration::from_millis(5000),
            notice_policy: NoticePolicy::Single,
        }
    }
}

/// A visible change produced by [`super::ChatSession::next_update`].
#[derive(Debug, Clone, PartialEq)]
pub enum SessionUpdate {
    /// New entries entered the message log.
    MessagesChanged { inserted: usize },
    RosterChanged,
    /// A remote participant started or stopped typing.
    TypingChanged,
    NoticeShown(TransientNotice),
    NoticeExpired(String),
    /// The store accepted a local send under its canonical id.
    SendConfirmed {
        local_id: MessageId,
        message_id: MessageId,
    },
    SendFailed {
        local_id: MessageId,
        error: SyncError,
    },
    LinkLost,
    LinkRestored,
}

/// Result of a spawned send step.
#[derive(Debug)]
pub(crate) enum SendOutcome {
    Uploaded {
        local_id: MessageId,
        body: Option<String>,
        result: Result<Attachment, SyncError>,
    },
    Persisted {
        local_id: MessageId,
        result: Result<Message, SyncError>,
    },
}

//! Realtime event kinds and payloads for the shared room.
//!
//! Every inbound frame goes through [`InboundEvent::decode`] exactly once.
//! Payloads that do not match their kind's shape are rejected there with
//! [`SyncError::MalformedEvent`], so the rest of the session only ever
//! sees well-formed, typed events.

use huddle_common::SyncError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::message::Message;

// ---------------------------------------------------------------------------
// Event kinds
// ---------------------------------------------------------------------------

/// Named event kinds multiplexed over the realtime channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Join,
    HistorySnapshot,
    Message,
    Roster,
    Typing,
    Connected,
    Disconnected,
}

impl EventKind {
    /// Every kind the session listens for.
    pub const INBOUND: [EventKind; 6] = [
        EventKind::HistorySnapshot,
        EventKind::Message,
        EventKind::Roster,
        EventKind::Typing,
        EventKind::Connected,
        EventKind::Disconnected,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::Join => "join",
            EventKind::HistorySnapshot => "historySnapshot",
            EventKind::Message => "message",
            EventKind::Roster => "roster",
            EventKind::Typing => "typing",
            EventKind::Connected => "connected",
            EventKind::Disconnected => "disconnected",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "join" => Some(EventKind::Join),
            "historySnapshot" => Some(EventKind::HistorySnapshot),
            "message" => Some(EventKind::Message),
            "roster" => Some(EventKind::Roster),
            "typing" => Some(EventKind::Typing),
            "connected" => Some(EventKind::Connected),
            "disconnected" => Some(EventKind::Disconnected),
            _ => None,
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Payloads
// ---------------------------------------------------------------------------

/// Presence status announced on join.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PresenceStatus {
    #[default]
    Online,
    Away,
}

/// Announcement sent when the local user enters the room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinPayload {
    pub user_id: String,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub status: PresenceStatus,
}

/// One entry of a roster snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterEntry {
    pub user_id: String,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypingPayload {
    pub user_id: String,
    pub display_name: String,
    pub is_typing: bool,
}

/// Payload of `connected` and `disconnected`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionPayload {
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

// ---------------------------------------------------------------------------
// Inbound events
// ---------------------------------------------------------------------------

/// A validated inbound event.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundEvent {
    HistorySnapshot(Vec<Message>),
    Message(Message),
    Roster(Vec<RosterEntry>),
    Typing(TypingPayload),
    Connected {
        user_id: String,
        display_name: String,
    },
    Disconnected {
        user_id: String,
        display_name: Option<String>,
    },
}

impl InboundEvent {
    /// Validate a raw frame.
    ///
    /// A history snapshot must be an array; individual entries that fail
    /// validation are skipped so one bad record cannot hide the rest.
    pub fn decode(kind: &str, payload: serde_json::Value) -> Result<Self, SyncError> {
        let Some(event_kind) = EventKind::parse(kind) else {
            return Err(SyncError::malformed(kind, "unknown event kind"));
        };

        match event_kind {
            EventKind::HistorySnapshot => {
                let entries: Vec<serde_json::Value> = parse(event_kind, payload)?;
                let total = entries.len();
                let messages: Vec<Message> = entries
                    .into_iter()
                    .filter_map(|entry| serde_json::from_value(entry).ok())
                    .collect();
                if messages.len() < total {
                    debug!(
                        skipped = total - messages.len(),
                        "Dropped malformed history entries"
                    );
                }
                Ok(InboundEvent::HistorySnapshot(messages))
            }
            EventKind::Message => Ok(InboundEvent::Message(parse(event_kind, payload)?)),
            EventKind::Roster => {
                let entries: Vec<RosterEntry> = parse(event_kind, payload)?;
                if entries.iter().any(|e| e.user_id.is_empty()) {
                    return Err(SyncError::malformed(kind, "roster entry without userId"));
                }
                Ok(InboundEvent::Roster(entries))
            }
            EventKind::Typing => {
                let typing: TypingPayload = parse(event_kind, payload)?;
                require_user_id(event_kind, &typing.user_id)?;
                Ok(InboundEvent::Typing(typing))
            }
            EventKind::Connected => {
                let p: ConnectionPayload = parse(event_kind, payload)?;
                require_user_id(event_kind, &p.user_id)?;
                let display_name = p
                    .display_name
                    .filter(|n| !n.is_empty())
                    .ok_or_else(|| SyncError::malformed(kind, "missing displayName"))?;
                Ok(InboundEvent::Connected {
                    user_id: p.user_id,
                    display_name,
                })
            }
            EventKind::Disconnected => {
                let p: ConnectionPayload = parse(event_kind, payload)?;
                require_user_id(event_kind, &p.user_id)?;
                Ok(InboundEvent::Disconnected {
                    user_id: p.user_id,
                    display_name: p.display_name.filter(|n| !n.is_empty()),
                })
            }
            EventKind::Join => Err(SyncError::malformed(kind, "join is outbound only")),
        }
    }
}

fn parse<T: DeserializeOwned>(kind: EventKind, payload: serde_json::Value) -> Result<T, SyncError> {
    serde_json::from_value(payload).map_err(|e| SyncError::malformed(kind.as_str(), e.to_string()))
}

fn require_user_id(kind: EventKind, user_id: &str) -> Result<(), SyncError> {
    if user_id.is_empty() {
        Err(SyncError::malformed(kind.as_str(), "empty userId"))
    } else {
        Ok(())
    }
}

//! Chat message model.
//!
//! A message always carries content: text, an attachment, or both. The
//! content enum makes an empty message unrepresentable, so every producer
//! (local composer, durable store, realtime echo) goes through the same
//! check when it builds one.

use std::fmt;

use chrono::{DateTime, Utc};
use huddle_common::LOCAL_ID_PREFIX;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

/// Opaque message identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(String);

impl MessageId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Mint a temporary id for a message not yet confirmed by the store.
    pub fn local() -> Self {
        Self(huddle_common::new_local_id())
    }

    pub fn is_local(&self) -> bool {
        self.0.starts_with(LOCAL_ID_PREFIX)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Attachments
// ---------------------------------------------------------------------------

/// An uploaded file referenced by a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub url: String,
    pub name: String,
    pub mime_type: String,
    pub byte_size: u64,
    pub is_image: bool,
}

impl Attachment {
    /// Human readable size, e.g. `"1.5 KB"`.
    pub fn display_size(&self) -> String {
        format_byte_size(self.byte_size)
    }
}

/// Format a byte count with binary units, trimming trailing zeros.
pub fn format_byte_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    if bytes == 0 {
        return "0 Bytes".to_string();
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    let rounded = format!("{value:.2}");
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    format!("{trimmed} {}", UNITS[unit])
}

// ---------------------------------------------------------------------------
// Content
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageContent {
    Text(String),
    Attachment(Attachment),
    TextWithAttachment { text: String, attachment: Attachment },
}

impl MessageContent {
    /// Build content from optional parts. Whitespace-only text counts as
    /// absent; returns `None` when nothing is left.
    pub fn new(body: Option<String>, attachment: Option<Attachment>) -> Option<Self> {
        let body = body
            .map(|b| b.trim().to_string())
            .filter(|b| !b.is_empty());
        match (body, attachment) {
            (Some(text), Some(attachment)) => Some(Self::TextWithAttachment { text, attachment }),
            (Some(text), None) => Some(Self::Text(text)),
            (None, Some(attachment)) => Some(Self::Attachment(attachment)),
            (None, None) => None,
        }
    }

    pub fn body(&self) -> Option<&str> {
        match self {
            Self::Text(text) | Self::TextWithAttachment { text, .. } => Some(text),
            Self::Attachment(_) => None,
        }
    }

    pub fn attachment(&self) -> Option<&Attachment> {
        match self {
            Self::Attachment(a) | Self::TextWithAttachment { attachment: a, .. } => Some(a),
            Self::Text(_) => None,
        }
    }

    fn into_parts(self) -> (Option<String>, Option<Attachment>) {
        match self {
            Self::Text(text) => (Some(text), None),
            Self::Attachment(a) => (None, Some(a)),
            Self::TextWithAttachment { text, attachment } => (Some(text), Some(attachment)),
        }
    }
}

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

/// A chat message. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "MessageRecord", into = "MessageRecord")]
pub struct Message {
    pub id: MessageId,
    content: MessageContent,
    pub sender_id: String,
    pub sender_display_name: String,
    pub sent_at: DateTime<Utc>,
}

impl Message {
    pub fn new(
        id: MessageId,
        content: MessageContent,
        sender_id: impl Into<String>,
        sender_display_name: impl Into<String>,
        sent_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            content,
            sender_id: sender_id.into(),
            sender_display_name: sender_display_name.into(),
            sent_at,
        }
    }

    pub fn content(&self) -> &MessageContent {
        &self.content
    }

    pub fn body(&self) -> Option<&str> {
        self.content.body()
    }

    pub fn attachment(&self) -> Option<&Attachment> {
        self.content.attachment()
    }

    /// Position of this message in the merged view.
    pub fn order_key(&self) -> OrderKey {
        OrderKey {
            sent_at: self.sent_at,
            id: self.id.clone(),
        }
    }
}

/// Sort key: send time, with the id breaking ties.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OrderKey {
    pub sent_at: DateTime<Utc>,
    pub id: MessageId,
}

/// Flat wire form of a message.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MessageRecord {
    id: MessageId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    body: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    attachment: Option<Attachment>,
    sender_id: String,
    sender_display_name: String,
    sent_at: DateTime<Utc>,
}

impl TryFrom<MessageRecord> for Message {
    type Error = String;

    fn try_from(record: MessageRecord) -> Result<Self, Self::Error> {
        if record.id.as_str().is_empty() {
            return Err("message id is empty".to_string());
        }
        if record.sender_id.is_empty() {
            return Err("message senderId is empty".to_string());
        }
        let content = MessageContent::new(record.body, record.attachment)
            .ok_or_else(|| "message has neither body nor attachment".to_string())?;
        Ok(Message {
            id: record.id,
            content,
            sender_id: record.sender_id,
            sender_display_name: record.sender_display_name,
            sent_at: record.sent_at,
        })
    }
}

impl From<Message> for MessageRecord {
    fn from(message: Message) -> Self {
        let (body, attachment) = message.content.into_parts();
        MessageRecord {
            id: message.id,
            body,
            attachment,
            sender_id: message.sender_id,
            sender_display_name: message.sender_display_name,
            sent_at: message.sent_at,
        }
    }
}

/// A message as composed locally, before the store assigns its id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageDraft {
    pub content: MessageContent,
    pub sender_id: String,
    pub sender_display_name: String,
    pub composed_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn photo() -> Attachment {
        Attachment {
            url: "https://cdn.example/p.png".into(),
            name: "p.png".into(),
            mime_type: "image/png".into(),
            byte_size: 2048,
            is_image: true,
        }
    }

    #[test]
    fn content_requires_text_or_attachment() {
        assert!(MessageContent::new(None, None).is_none());
        assert!(MessageContent::new(Some("   ".into()), None).is_none());
        assert_eq!(
            MessageContent::new(Some(" hi ".into()), None),
            Some(MessageContent::Text("hi".into()))
        );
        let both = MessageContent::new(Some("look".into()), Some(photo())).unwrap();
        assert_eq!(both.body(), Some("look"));
        assert_eq!(both.attachment(), Some(&photo()));
        let only_file = MessageContent::new(Some("".into()), Some(photo())).unwrap();
        assert_eq!(only_file.body(), None);
    }

    #[test]
    fn deserialize_rejects_empty_message() {
        let json = serde_json::json!({
            "id": "m1",
            "senderId": "u1",
            "senderDisplayName": "Ana",
            "sentAt": "2024-05-01T10:00:00Z"
        });
        let err = serde_json::from_value::<Message>(json).unwrap_err();
        assert!(err.to_string().contains("neither body nor attachment"));
    }

    #[test]
    fn deserialize_camel_case_wire_form() {
        let json = serde_json::json!({
            "id": "m1",
            "body": "hola",
            "attachment": {
                "url": "https://cdn.example/p.png",
                "name": "p.png",
                "mimeType": "image/png",
                "byteSize": 2048,
                "isImage": true
            },
            "senderId": "u1",
            "senderDisplayName": "Ana",
            "sentAt": "2024-05-01T10:00:00Z"
        });
        let msg: Message = serde_json::from_value(json).unwrap();
        assert_eq!(msg.id, MessageId::new("m1"));
        assert_eq!(msg.body(), Some("hola"));
        assert_eq!(msg.attachment().unwrap().byte_size, 2048);
        assert_eq!(msg.sent_at, Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap());
    }

    #[test]
    fn serialize_omits_missing_parts() {
        let msg = Message::new(
            MessageId::new("m2"),
            MessageContent::Text("hi".into()),
            "u1",
            "Ana",
            Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap(),
        );
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["body"], "hi");
        assert_eq!(value["senderDisplayName"], "Ana");
        assert!(value.get("attachment").is_none());
    }

    #[test]
    fn order_key_breaks_ties_by_id() {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();
        let a = Message::new(MessageId::new("a"), MessageContent::Text("x".into()), "u", "U", at);
        let b = Message::new(MessageId::new("b"), MessageContent::Text("y".into()), "u", "U", at);
        assert!(a.order_key() < b.order_key());
    }

    #[test]
    fn local_ids_are_recognised() {
        assert!(MessageId::local().is_local());
        assert!(!MessageId::new("abc").is_local());
    }

    #[test]
    fn byte_sizes_format_like_file_browsers() {
        assert_eq!(format_byte_size(0), "0 Bytes");
        assert_eq!(format_byte_size(512), "512 Bytes");
        assert_eq!(format_byte_size(1536), "1.5 KB");
        assert_eq!(format_byte_size(1024 * 1024), "1 MB");
        assert_eq!(photo().display_size(), "2 KB");
    }
}

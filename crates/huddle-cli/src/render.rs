//! Text rendering of session updates for the terminal.

use std::collections::HashSet;

use chrono::Local;
use huddle_sync::{
    Delivery, LocalIdentity, LogEntry, Message, MessageId, MessageLog, PresenceRegistry,
    SessionUpdate,
};

/// Prints each confirmed message once, in arrival order of confirmation.
///
/// A terminal cannot insert lines above what is already shown, so a late
/// message that sorts before printed ones is printed when it arrives.
#[derive(Debug, Default)]
pub struct Printer {
    printed: HashSet<MessageId>,
}

impl Printer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lines to print for `update`, given the session state after it.
    pub fn render(
        &mut self,
        update: &SessionUpdate,
        log: &MessageLog,
        presence: &PresenceRegistry,
    ) -> Vec<String> {
        match update {
            SessionUpdate::MessagesChanged { .. } | SessionUpdate::SendConfirmed { .. } => {
                self.unprinted(log)
            }
            SessionUpdate::RosterChanged => vec![format!("* {}", presence.online_label())],
            SessionUpdate::TypingChanged => presence
                .typing_summary()
                .map(|summary| format!("  {summary}"))
                .into_iter()
                .collect(),
            SessionUpdate::NoticeShown(notice) => vec![format!("* {notice}")],
            SessionUpdate::NoticeExpired(_) => Vec::new(),
            SessionUpdate::SendFailed { error, .. } => {
                vec![format!("! message not sent: {error}")]
            }
            SessionUpdate::LinkLost => vec!["! connection lost, reconnecting...".to_string()],
            SessionUpdate::LinkRestored => vec!["* reconnected".to_string()],
        }
    }

    fn unprinted(&mut self, log: &MessageLog) -> Vec<String> {
        log.entries()
            .filter(|entry| entry.delivery == Delivery::Confirmed)
            .filter(|entry| self.printed.insert(entry.message.id.clone()))
            .map(format_entry)
            .collect()
    }
}

fn format_entry(entry: &LogEntry) -> String {
    format_message(&entry.message)
}

/// `[14:03] Ana: hello [cat.png, 1.5 KB]`
pub fn format_message(message: &Message) -> String {
    let time = message.sent_at.with_timezone(&Local).format("%H:%M");
    let mut line = format!("[{time}] {}:", message.sender_display_name);
    if let Some(body) = message.body() {
        line.push(' ');
        line.push_str(body);
    }
    if let Some(attachment) = message.attachment() {
        line.push_str(&format!(
            " [{}, {}] {}",
            attachment.name,
            attachment.display_size(),
            attachment.url
        ));
    }
    line
}

/// Output of `/who`.
pub fn format_roster(identity: &LocalIdentity, presence: &PresenceRegistry) -> Vec<String> {
    let mut lines = vec![format!("* {}", presence.online_label())];
    lines.push(format!("  {} (you)", identity.display_name));
    for participant in presence.participants() {
        let typing = if participant.is_typing { " (typing)" } else { "" };
        lines.push(format!("  {}{typing}", participant.display_name));
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use huddle_common::SyncError;
    use huddle_sync::{Attachment, MessageContent};
    use std::time::Duration;
    use tokio::sync::mpsc;

    fn message(id: &str, secs: i64, body: &str) -> Message {
        Message::new(
            MessageId::new(id),
            MessageContent::Text(body.to_string()),
            "u-ana",
            "Ana",
            Utc.timestamp_opt(secs, 0).unwrap(),
        )
    }

    fn registry() -> PresenceRegistry {
        let (tx, _rx) = mpsc::unbounded_channel();
        PresenceRegistry::new("me", Duration::from_secs(1), tx)
    }

    #[tokio::test]
    async fn prints_each_message_once() {
        let mut printer = Printer::new();
        let presence = registry();
        let mut log = MessageLog::new();
        log.merge(vec![message("m1", 10, "one")]);

        let update = SessionUpdate::MessagesChanged { inserted: 1 };
        let lines = printer.render(&update, &log, &presence);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].ends_with("Ana: one"));

        log.merge(vec![message("m0", 5, "zero"), message("m2", 20, "two")]);
        let lines = printer.render(&update, &log, &presence);
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("zero"));
        assert!(lines[1].ends_with("two"));

        assert!(printer.render(&update, &log, &presence).is_empty());
    }

    #[tokio::test]
    async fn pending_sends_wait_for_confirmation() {
        let mut printer = Printer::new();
        let presence = registry();
        let mut log = MessageLog::new();
        let me = LocalIdentity::new("me", "Me");
        let local_id = MessageId::local();
        log.begin_send(local_id.clone(), &me, Some("hi".into()), None)
            .unwrap();

        let update = SessionUpdate::MessagesChanged { inserted: 1 };
        assert!(printer.render(&update, &log, &presence).is_empty());

        let canonical = Message::new(
            MessageId::new("m9"),
            MessageContent::Text("hi".into()),
            "me",
            "Me",
            Utc::now(),
        );
        log.confirm(&local_id, canonical);
        let confirmed = SessionUpdate::SendConfirmed {
            local_id,
            message_id: MessageId::new("m9"),
        };
        let lines = printer.render(&confirmed, &log, &presence);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].ends_with("Me: hi"));
    }

    #[tokio::test]
    async fn status_lines() {
        let mut printer = Printer::new();
        let mut presence = registry();
        let log = MessageLog::new();
        presence.upsert("u-ana", "Ana", None);

        assert_eq!(
            printer.render(&SessionUpdate::RosterChanged, &log, &presence),
            vec!["* 1 user online".to_string()]
        );
        assert!(printer
            .render(&SessionUpdate::TypingChanged, &log, &presence)
            .is_empty());

        presence.apply_typing("u-ana", "Ana", true);
        assert_eq!(
            printer.render(&SessionUpdate::TypingChanged, &log, &presence),
            vec!["  Ana is typing...".to_string()]
        );

        let failed = SessionUpdate::SendFailed {
            local_id: MessageId::local(),
            error: SyncError::Persistence("disk full".into()),
        };
        let lines = printer.render(&failed, &log, &presence);
        assert!(lines[0].contains("disk full"));
        assert!(printer
            .render(&SessionUpdate::NoticeExpired("n1".into()), &log, &presence)
            .is_empty());
    }

    #[test]
    fn attachment_line_shows_name_and_size() {
        let attachment = Attachment {
            url: "http://files/cat.png".into(),
            name: "cat.png".into(),
            mime_type: "image/png".into(),
            byte_size: 1536,
            is_image: true,
        };
        let message = Message::new(
            MessageId::new("m1"),
            MessageContent::TextWithAttachment {
                text: "look".into(),
                attachment,
            },
            "u-ana",
            "Ana",
            Utc::now(),
        );
        let line = format_message(&message);
        assert!(line.contains("Ana: look [cat.png, 1.5 KB] http://files/cat.png"));
    }

    #[tokio::test]
    async fn roster_lists_self_first() {
        let mut presence = registry();
        presence.upsert("u-bo", "Bo", None);
        presence.upsert("u-ana", "Ana", None);
        let lines = format_roster(&LocalIdentity::new("me", "Me"), &presence);
        assert_eq!(
            lines,
            vec![
                "* 2 users online".to_string(),
                "  Me (you)".to_string(),
                "  Ana".to_string(),
                "  Bo".to_string(),
            ]
        );
    }
}

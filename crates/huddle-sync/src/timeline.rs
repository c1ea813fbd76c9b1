//! Interleaves the message log with transient notices for display.

use crate::message_log::LogEntry;
use crate::notices::TransientNotice;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimelineItem<'a> {
    Message(&'a LogEntry),
    Notice(&'a TransientNotice),
}

/// Merge two already-sorted sequences by timestamp. On a tie the message
/// comes first.
pub fn merge_timeline<'a, M, N>(messages: M, notices: N) -> Vec<TimelineItem<'a>>
where
    M: IntoIterator<Item = &'a LogEntry>,
    N: IntoIterator<Item = &'a TransientNotice>,
{
    let mut messages = messages.into_iter().peekable();
    let mut notices = notices.into_iter().peekable();
    let mut merged = Vec::new();

    loop {
        let take_message = match (messages.peek(), notices.peek()) {
            (Some(m), Some(n)) => m.message.sent_at <= n.created_at,
            (Some(_), None) => true,
            (None, Some(_)) => false,
            (None, None) => break,
        };
        if take_message {
            merged.extend(messages.next().map(TimelineItem::Message));
        } else {
            merged.extend(notices.next().map(TimelineItem::Notice));
        }
    }
    merged
}

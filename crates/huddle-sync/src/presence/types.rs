//! Participant and summary types exposed by the presence registry.

use std::fmt;

use crate::protocol::RosterEntry;

// ---------------------------------------------------------------------------
// Participant
// ---------------------------------------------------------------------------

/// A connected remote participant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    pub user_id: String,
    pub display_name: String,
    pub avatar_url: Option<String>,
    pub is_typing: bool,
}

impl Participant {
    pub fn new(user_id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            display_name: display_name.into(),
            avatar_url: None,
            is_typing: false,
        }
    }
}

impl From<RosterEntry> for Participant {
    fn from(entry: RosterEntry) -> Self {
        Self {
            user_id: entry.user_id,
            display_name: entry.display_name,
            avatar_url: entry.avatar_url,
            is_typing: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Typing summary
// ---------------------------------------------------------------------------

/// Header line describing who is typing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypingSummary {
    One(String),
    Two(String, String),
    Several(usize),
}

impl TypingSummary {
    pub(crate) fn from_names(mut names: Vec<String>) -> Option<Self> {
        match names.len() {
            0 => None,
            1 => names.pop().map(TypingSummary::One),
            2 => {
                let second = names.pop()?;
                let first = names.pop()?;
                Some(TypingSummary::Two(first, second))
            }
            n => Some(TypingSummary::Several(n)),
        }
    }
}

impl fmt::Display for TypingSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypingSummary::One(name) => write!(f, "{name} is typing..."),
            TypingSummary::Two(a, b) => write!(f, "{a} and {b} are typing..."),
            TypingSummary::Several(_) => f.write_str("Several people are typing..."),
        }
    }
}

//! The presence registry itself.

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::debug;

use crate::debounce::{DebounceTimer, Expiry, TimerKey};
use crate::protocol::RosterEntry;

use super::types::{Participant, TypingSummary};

/// Connected participants and their typing flags, excluding the local user.
pub struct PresenceRegistry {
    local_user_id: String,
    participants: HashMap<String, Participant>,
    /// How long a "stopped typing" signal waits before it takes effect.
    grace: Duration,
    timers: DebounceTimer<TimerKey>,
}

impl PresenceRegistry {
    pub fn new(
        local_user_id: impl Into<String>,
        grace: Duration,
        expiry_tx: mpsc::UnboundedSender<Expiry<TimerKey>>,
    ) -> Self {
        Self {
            local_user_id: local_user_id.into(),
            participants: HashMap::new(),
            grace,
            timers: DebounceTimer::new(expiry_tx),
        }
    }

    /// Replace the participant set with a roster snapshot.
    ///
    /// Participants present before and after keep their typing flag and any
    /// pending grace timer; everyone else is dropped with their timers.
    pub fn set_roster(&mut self, roster: Vec<RosterEntry>) {
        let mut next = HashMap::with_capacity(roster.len());
        for entry in roster {
            if entry.user_id == self.local_user_id {
                continue;
            }
            let mut participant = Participant::from(entry);
            if let Some(previous) = self.participants.get(&participant.user_id) {
                participant.is_typing = previous.is_typing;
            }
            next.insert(participant.user_id.clone(), participant);
        }

        let dropped: Vec<String> = self
            .participants
            .keys()
            .filter(|id| !next.contains_key(*id))
            .cloned()
            .collect();
        for user_id in dropped {
            self.timers.cancel(&TimerKey::TypingGrace(user_id));
        }

        debug!(online = next.len(), "Roster replaced");
        self.participants = next;
    }

    /// Add or refresh a participant. Returns whether anything visible changed.
    pub fn upsert(
        &mut self,
        user_id: &str,
        display_name: &str,
        avatar_url: Option<String>,
    ) -> bool {
        if user_id == self.local_user_id {
            return false;
        }
        match self.participants.get_mut(user_id) {
            Some(existing) => {
                let mut changed = false;
                if existing.display_name != display_name {
                    existing.display_name = display_name.to_string();
                    changed = true;
                }
                if avatar_url.is_some() && existing.avatar_url != avatar_url {
                    existing.avatar_url = avatar_url;
                    changed = true;
                }
                changed
            }
            None => {
                let mut participant = Participant::new(user_id, display_name);
                participant.avatar_url = avatar_url;
                self.participants.insert(user_id.to_string(), participant);
                true
            }
        }
    }

    /// Remove a participant and any pending typing timer.
    pub fn remove(&mut self, user_id: &str) -> Option<Participant> {
        self.timers.cancel(&TimerKey::TypingGrace(user_id.to_string()));
        self.participants.remove(user_id)
    }

    /// Apply a remote typing signal. Returns whether anything visible changed.
    ///
    /// `true` takes effect immediately and cancels a pending clear. `false`
    /// arms the grace timer; the flag only drops when it elapses. Repeating
    /// the current state changes nothing, and a second `false` does not
    /// extend the window. A stop for someone not present is dropped, so a
    /// late signal cannot bring back a participant who already left.
    pub fn apply_typing(&mut self, user_id: &str, display_name: &str, is_typing: bool) -> bool {
        if user_id == self.local_user_id {
            return false;
        }
        if !is_typing && !self.participants.contains_key(user_id) {
            return false;
        }
        let mut changed = self.upsert(user_id, display_name, None);
        let key = TimerKey::TypingGrace(user_id.to_string());
        let Some(participant) = self.participants.get_mut(user_id) else {
            return changed;
        };

        if is_typing {
            self.timers.cancel(&key);
            if !participant.is_typing {
                participant.is_typing = true;
                changed = true;
            }
        } else if participant.is_typing && !self.timers.is_armed(&key) {
            self.timers.schedule(key, self.grace);
        }
        changed
    }

    /// Handle an elapsed grace timer. Returns whether a typing flag cleared.
    pub fn on_expiry(&mut self, expiry: &Expiry<TimerKey>) -> bool {
        let TimerKey::TypingGrace(user_id) = &expiry.key else {
            return false;
        };
        if !self.timers.accept(expiry) {
            return false;
        }
        match self.participants.get_mut(user_id) {
            Some(participant) if participant.is_typing => {
                participant.is_typing = false;
                true
            }
            _ => false,
        }
    }

    /// Drop every typing flag at once, e.g. when the link goes down.
    pub fn clear_typing(&mut self) -> bool {
        self.timers.cancel_all();
        let mut changed = false;
        for participant in self.participants.values_mut() {
            changed |= std::mem::replace(&mut participant.is_typing, false);
        }
        changed
    }

    /// Forget everyone. Used when the local session ends.
    pub fn clear(&mut self) {
        self.timers.cancel_all();
        self.participants.clear();
    }

    // -- projections --------------------------------------------------------

    pub fn get(&self, user_id: &str) -> Option<&Participant> {
        self.participants.get(user_id)
    }

    pub fn is_typing(&self, user_id: &str) -> bool {
        self.participants
            .get(user_id)
            .is_some_and(|p| p.is_typing)
    }

    /// Participants sorted by display name, then id.
    pub fn participants(&self) -> Vec<&Participant> {
        let mut list: Vec<&Participant> = self.participants.values().collect();
        list.sort_by(|a, b| {
            a.display_name
                .cmp(&b.display_name)
                .then_with(|| a.user_id.cmp(&b.user_id))
        });
        list
    }

    pub fn online_count(&self) -> usize {
        self.participants.len()
    }

    /// `"1 user online"` / `"3 users online"`.
    pub fn online_label(&self) -> String {
        match self.online_count() {
            1 => "1 user online".to_string(),
            n => format!("{n} users online"),
        }
    }

    pub fn typing_summary(&self) -> Option<TypingSummary> {
        let names = self
            .participants()
            .into_iter()
            .filter(|p| p.is_typing)
            .map(|p| p.display_name.clone())
            .collect();
        TypingSummary::from_names(names)
    }

    pub(crate) fn pending_timers(&self) -> usize {
        self.timers.armed_count()
    }
}

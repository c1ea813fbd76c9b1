//! Presence registry for the shared room.
//!
//! Tracks who is connected and who is typing. Mutation goes through a
//! narrow API (`set_roster`, `apply_typing`, `upsert`, `remove`); the
//! rendering layer only reads the projections.

mod registry;
mod types;

#[cfg(test)]
mod tests;

pub use registry::PresenceRegistry;
pub use types::{Participant, TypingSummary};

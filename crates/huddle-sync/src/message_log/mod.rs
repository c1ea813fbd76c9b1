//! Merged, de-duplicated view of the room's message log.
//!
//! Two producers feed the log: the durable store subscription and the
//! realtime channel (history snapshot plus live echoes). Neither is trusted
//! to deliver in an order consistent with the other, so every message is
//! placed by `(sent_at, id)` and identified by id.

mod synchronizer;


pub use synchronizer::{Delivery, LogEntry, MessageLog};

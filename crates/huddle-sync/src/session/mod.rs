//! Session channel manager.
//!
//! [`ChatSession`] ties the transport, the durable store and the uploader to
//! the message log, presence registry, notice queue and typing controller.
//! All of its state lives behind `&mut self`; timers and sends report back
//! through channels that [`ChatSession::next_update`] drains.

mod lease;
mod manager;
mod types;


pub use manager::ChatSession;
pub use types::{SessionState, SessionTimings, SessionUpdate};

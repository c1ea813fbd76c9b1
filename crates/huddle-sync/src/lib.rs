//! Realtime group-chat session synchronization.
//!
//! A [`ChatSession`] keeps a local view of one shared room consistent with
//! two producers: the durable message store and the realtime channel. It
//! owns the merged message log, the presence registry with typing flags,
//! the transient join/leave notices and the local typing indicator.

pub mod debounce;
pub mod identity;
pub mod message;
pub mod message_log;
pub mod notices;
pub mod presence;
pub mod protocol;
pub mod realtime;
pub mod session;
pub mod store;
pub mod timeline;
pub mod typing;
pub mod upload;

pub use debounce::{DebounceTimer, Expiry, TimerKey};
pub use identity::LocalIdentity;
pub use message::{format_byte_size, Attachment, Message, MessageContent, MessageDraft, MessageId};
pub use message_log::{Delivery, LogEntry, MessageLog};
pub use notices::{NoticeKind, NoticePolicy, NoticeQueue, TransientNotice};
pub use presence::{Participant, PresenceRegistry, TypingSummary};
pub use protocol::{EventKind, InboundEvent, PresenceStatus, RosterEntry};
pub use realtime::{LinkStatus, RealtimeChannel, RealtimeConfig, WsChannel};
pub use session::{ChatSession, SessionState, SessionTimings, SessionUpdate};
pub use store::{InMemoryStore, MessageStore, SubscriptionId};
pub use timeline::{merge_timeline, TimelineItem};
pub use typing::{ComposeState, TypingController, TypingSignal};
pub use upload::{AttachmentUploader, FileUpload, HttpUploader, UploadConfig};

//! The chat session: one task owns every piece of state and applies events
//! from the channel, the store, timers and finished sends in turn.

use std::sync::Arc;

use huddle_common::SyncError;
use serde::Serialize;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use super::lease::ChannelLease;
use super::types::{SendOutcome, SessionState, SessionTimings, SessionUpdate};
use crate::debounce::{Expiry, TimerKey};
use crate::identity::LocalIdentity;
use crate::message::{Attachment, Message, MessageId};
use crate::message_log::MessageLog;
use crate::notices::{NoticeKind, NoticeQueue, UNKNOWN_PARTICIPANT};
use crate::presence::PresenceRegistry;
use crate::protocol::{EventKind, InboundEvent, JoinPayload, PresenceStatus, TypingPayload};
use crate::realtime::{ChannelFrame, LinkStatus, RealtimeChannel};
use crate::store::MessageStore;
use crate::timeline::{merge_timeline, TimelineItem};
use crate::typing::{ComposeState, TypingController, TypingSignal};
use crate::upload::{AttachmentUploader, FileUpload};

const INBOUND_CAPACITY: usize = 256;
const SNAPSHOT_CAPACITY: usize = 16;

/// One thing that woke the session up.
enum Step {
    Frame(ChannelFrame),
    Snapshot(Vec<Message>),
    Expiry(Expiry<TimerKey>),
    Send(SendOutcome),
    Link(Option<LinkStatus>),
}

pub struct ChatSession {
    identity: LocalIdentity,
    state: SessionState,

    channel: Arc<dyn RealtimeChannel>,
    store: Arc<dyn MessageStore>,
    uploader: Arc<dyn AttachmentUploader>,
    lease: Option<ChannelLease>,

    log: MessageLog,
    presence: PresenceRegistry,
    notices: NoticeQueue,
    typing: TypingController,
    sends: JoinSet<SendOutcome>,

    inbound_tx: mpsc::Sender<ChannelFrame>,
    inbound_rx: mpsc::Receiver<ChannelFrame>,
    snapshot_tx: mpsc::Sender<Vec<Message>>,
    snapshot_rx: mpsc::Receiver<Vec<Message>>,
    expiry_rx: mpsc::UnboundedReceiver<Expiry<TimerKey>>,
    link_rx: Option<watch::Receiver<LinkStatus>>,
    link_lost: bool,
}

impl ChatSession {
    pub fn new(
        identity: LocalIdentity,
        timings: SessionTimings,
        channel: Arc<dyn RealtimeChannel>,
        store: Arc<dyn MessageStore>,
        uploader: Arc<dyn AttachmentUploader>,
    ) -> Self {
        let (inbound_tx, inbound_rx) = mpsc::channel(INBOUND_CAPACITY);
        let (snapshot_tx, snapshot_rx) = mpsc::channel(SNAPSHOT_CAPACITY);
        let (expiry_tx, expiry_rx) = mpsc::unbounded_channel();

        Self {
            presence: PresenceRegistry::new(
                identity.user_id.clone(),
                timings.typing_grace,
                expiry_tx.clone(),
            ),
            notices: NoticeQueue::new(timings.notice_ttl, timings.notice_policy, expiry_tx.clone()),
            typing: TypingController::new(timings.typing_decay, expiry_tx),
            identity,
            state: SessionState::Disconnected,
            channel,
            store,
            uploader,
            lease: None,
            log: MessageLog::new(),
            sends: JoinSet::new(),
            inbound_tx,
            inbound_rx,
            snapshot_tx,
            snapshot_rx,
            expiry_rx,
            link_rx: None,
            link_lost: false,
        }
    }

    // -- lifecycle ----------------------------------------------------------

    /// Connect, register listeners, follow the store and announce ourselves.
    /// Starting a joined session is a no-op.
    pub async fn start(&mut self) -> Result<(), SyncError> {
        if self.state != SessionState::Disconnected {
            return Ok(());
        }
        self.state = SessionState::Connecting;
        info!(user = %self.identity.user_id, "Joining room");

        if let Err(e) = self.channel.connect().await {
            warn!(error = %e, "Could not connect to room");
            self.state = SessionState::Disconnected;
            return Err(e);
        }

        let mut lease = ChannelLease::new(Arc::clone(&self.channel), Arc::clone(&self.store));
        for kind in EventKind::INBOUND {
            lease.listen(kind, self.inbound_tx.clone());
        }
        lease.follow_store(self.snapshot_tx.clone());
        self.lease = Some(lease);

        let mut link_rx = self.channel.link_status();
        drop(link_rx.borrow_and_update());
        self.link_rx = Some(link_rx);
        self.link_lost = false;

        self.state = SessionState::Joined;
        self.announce().await;
        info!(
            user = %self.identity.user_id,
            name = %self.identity.display_name,
            "Joined room"
        );
        Ok(())
    }

    /// Leave the room and drop everything transient. Safe to call any number
    /// of times; also runs on drop.
    pub fn teardown(&mut self) {
        self.typing.reset();
        self.presence.clear();
        self.notices.clear();
        self.sends.abort_all();
        let discarded = self.log.discard_pending();
        if let Some(mut lease) = self.lease.take() {
            lease.release();
        }
        self.link_rx = None;

        while self.inbound_rx.try_recv().is_ok() {}
        while self.snapshot_rx.try_recv().is_ok() {}
        while self.expiry_rx.try_recv().is_ok() {}

        if self.state != SessionState::Disconnected {
            info!(discarded, "Left room");
        }
        self.state = SessionState::Disconnected;
    }

    // -- local input --------------------------------------------------------

    /// The local user pressed a key in the composer.
    pub async fn on_input(&mut self) -> Result<(), SyncError> {
        self.require_joined()?;
        if let Some(signal) = self.typing.on_keystroke() {
            self.emit_typing(signal).await;
        }
        Ok(())
    }

    /// Send a message. Returns the temporary id it is shown under, or `None`
    /// when there was nothing to send.
    pub async fn send_message(
        &mut self,
        body: &str,
        attachment: Option<Attachment>,
    ) -> Result<Option<MessageId>, SyncError> {
        self.require_joined()?;
        let local_id = MessageId::local();
        let Some(draft) =
            self.log
                .begin_send(local_id.clone(), &self.identity, Some(body.to_string()), attachment)
        else {
            debug!("Nothing to send");
            return Ok(None);
        };

        let signal = self.typing.on_send();
        self.emit_typing(signal).await;

        let store = Arc::clone(&self.store);
        let id = local_id.clone();
        self.sends.spawn(async move {
            let result = store.append(draft).await;
            SendOutcome::Persisted {
                local_id: id,
                result,
            }
        });
        debug!(local_id = %local_id, "Send started");
        Ok(Some(local_id))
    }

    /// Upload a file, then send it with an optional caption. The returned id
    /// names the send in the eventual confirmation or failure.
    pub async fn send_file(&mut self, body: &str, file: FileUpload) -> Result<MessageId, SyncError> {
        self.require_joined()?;
        let signal = self.typing.on_send();
        self.emit_typing(signal).await;

        let local_id = MessageId::local();
        let uploader = Arc::clone(&self.uploader);
        let id = local_id.clone();
        let body = Some(body.to_string());
        debug!(local_id = %local_id, name = %file.name, "Upload started");
        self.sends.spawn(async move {
            let result = uploader.upload(file).await;
            SendOutcome::Uploaded {
                local_id: id,
                body,
                result,
            }
        });
        Ok(local_id)
    }

    // -- event pump ---------------------------------------------------------

    /// Wait for the next visible change. Events without a visible effect are
    /// applied silently. Returns `None` once the session is not joined.
    ///
    /// Safe to race in `select!`: local state is updated before any
    /// outbound emit is awaited, so cancelling can at worst drop one
    /// realtime signal and the update it would have returned.
    pub async fn next_update(&mut self) -> Option<SessionUpdate> {
        loop {
            if self.state != SessionState::Joined {
                return None;
            }
            let step = tokio::select! {
                Some(frame) = self.inbound_rx.recv() => Step::Frame(frame),
                Some(snapshot) = self.snapshot_rx.recv() => Step::Snapshot(snapshot),
                Some(expiry) = self.expiry_rx.recv() => Step::Expiry(expiry),
                Some(done) = self.sends.join_next(), if !self.sends.is_empty() => match done {
                    Ok(outcome) => Step::Send(outcome),
                    Err(e) => {
                        debug!(error = %e, "Send task ended without a result");
                        continue;
                    }
                },
                link = link_change(&mut self.link_rx) => Step::Link(link),
                else => return None,
            };
            if let Some(update) = self.apply(step).await {
                return Some(update);
            }
        }
    }

    async fn apply(&mut self, step: Step) -> Option<SessionUpdate> {
        match step {
            Step::Frame(frame) => match InboundEvent::decode(frame.kind.as_str(), frame.payload) {
                Ok(event) => self.apply_event(event),
                Err(e) => {
                    debug!(error = %e, "Dropped inbound event");
                    None
                }
            },
            Step::Snapshot(messages) => self.merge(messages),
            Step::Expiry(expiry) => self.apply_expiry(expiry).await,
            Step::Send(outcome) => self.apply_send(outcome).await,
            Step::Link(status) => self.apply_link(status).await,
        }
    }

    fn apply_event(&mut self, event: InboundEvent) -> Option<SessionUpdate> {
        match event {
            InboundEvent::HistorySnapshot(messages) => self.merge(messages),
            InboundEvent::Message(message) => self.merge(vec![message]),
            InboundEvent::Roster(entries) => {
                self.presence.set_roster(entries);
                Some(SessionUpdate::RosterChanged)
            }
            InboundEvent::Typing(typing) => self
                .presence
                .apply_typing(&typing.user_id, &typing.display_name, typing.is_typing)
                .then_some(SessionUpdate::TypingChanged),
            InboundEvent::Connected {
                user_id,
                display_name,
            } => {
                if user_id == self.identity.user_id {
                    return None;
                }
                self.presence.upsert(&user_id, &display_name, None);
                let notice = self.notices.add(NoticeKind::Joined, &display_name);
                Some(SessionUpdate::NoticeShown(notice))
            }
            InboundEvent::Disconnected {
                user_id,
                display_name,
            } => {
                if user_id == self.identity.user_id {
                    return None;
                }
                let departed = self.presence.remove(&user_id);
                let name = display_name
                    .or_else(|| departed.map(|p| p.display_name))
                    .unwrap_or_else(|| UNKNOWN_PARTICIPANT.to_string());
                let notice = self.notices.add(NoticeKind::Left, &name);
                Some(SessionUpdate::NoticeShown(notice))
            }
        }
    }

    fn merge(&mut self, messages: Vec<Message>) -> Option<SessionUpdate> {
        let inserted = self.log.merge(messages);
        (inserted > 0).then_some(SessionUpdate::MessagesChanged { inserted })
    }

    async fn apply_expiry(&mut self, expiry: Expiry<TimerKey>) -> Option<SessionUpdate> {
        match &expiry.key {
            TimerKey::TypingDecay => {
                if let Some(signal) = self.typing.on_expiry(&expiry) {
                    self.emit_typing(signal).await;
                }
                None
            }
            TimerKey::TypingGrace(_) => self
                .presence
                .on_expiry(&expiry)
                .then_some(SessionUpdate::TypingChanged),
            TimerKey::NoticeExpiry(_) => self
                .notices
                .on_expiry(&expiry)
                .map(SessionUpdate::NoticeExpired),
        }
    }

    async fn apply_send(&mut self, outcome: SendOutcome) -> Option<SessionUpdate> {
        match outcome {
            SendOutcome::Uploaded {
                local_id,
                body,
                result: Ok(attachment),
            } => {
                let draft =
                    self.log
                        .begin_send(local_id.clone(), &self.identity, body, Some(attachment))?;
                let store = Arc::clone(&self.store);
                self.sends.spawn(async move {
                    let result = store.append(draft).await;
                    SendOutcome::Persisted { local_id, result }
                });
                Some(SessionUpdate::MessagesChanged { inserted: 1 })
            }
            SendOutcome::Uploaded {
                local_id,
                result: Err(error),
                ..
            } => {
                warn!(local_id = %local_id, error = %error, "Upload failed");
                Some(SessionUpdate::SendFailed { local_id, error })
            }
            SendOutcome::Persisted {
                local_id,
                result: Ok(message),
            } => {
                let message_id = message.id.clone();
                self.log.confirm(&local_id, message.clone());
                // The durable write is done; a failed publish only delays
                // other clients until their store subscription catches up.
                self.emit(EventKind::Message, &message).await;
                debug!(local_id = %local_id, message_id = %message_id, "Send confirmed");
                Some(SessionUpdate::SendConfirmed {
                    local_id,
                    message_id,
                })
            }
            SendOutcome::Persisted {
                local_id,
                result: Err(error),
            } => {
                self.log.reject(&local_id);
                warn!(local_id = %local_id, error = %error, "Send failed");
                Some(SessionUpdate::SendFailed { local_id, error })
            }
        }
    }

    async fn apply_link(&mut self, status: Option<LinkStatus>) -> Option<SessionUpdate> {
        match status {
            None => {
                debug!("Link status source closed");
                self.link_rx = None;
                None
            }
            Some(LinkStatus::Down) if !self.link_lost => {
                self.link_lost = true;
                self.presence.clear_typing();
                warn!("Room link lost");
                Some(SessionUpdate::LinkLost)
            }
            Some(LinkStatus::Up) if self.link_lost => {
                self.link_lost = false;
                // The server replays history and roster after a join.
                self.announce().await;
                info!("Room link restored");
                Some(SessionUpdate::LinkRestored)
            }
            Some(_) => None,
        }
    }

    // -- outbound -----------------------------------------------------------

    async fn announce(&self) {
        let join = JoinPayload {
            user_id: self.identity.user_id.clone(),
            display_name: self.identity.display_name.clone(),
            avatar_url: self.identity.avatar_url.clone(),
            status: PresenceStatus::Online,
        };
        self.emit(EventKind::Join, &join).await;
    }

    async fn emit_typing(&self, signal: TypingSignal) {
        let typing = TypingPayload {
            user_id: self.identity.user_id.clone(),
            display_name: self.identity.display_name.clone(),
            is_typing: signal.is_typing(),
        };
        self.emit(EventKind::Typing, &typing).await;
    }

    async fn emit<T: Serialize>(&self, kind: EventKind, payload: &T) {
        let value = match serde_json::to_value(payload) {
            Ok(value) => value,
            Err(e) => {
                warn!(event = %kind, error = %e, "Could not encode event");
                return;
            }
        };
        if let Err(e) = self.channel.emit(kind, value).await {
            warn!(event = %kind, error = %e, "Emit failed");
        }
    }

    fn require_joined(&self) -> Result<(), SyncError> {
        match self.state {
            SessionState::Joined => Ok(()),
            _ => Err(SyncError::Transport("session is not joined".to_string())),
        }
    }

    // -- projections --------------------------------------------------------

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn identity(&self) -> &LocalIdentity {
        &self.identity
    }

    pub fn messages(&self) -> &MessageLog {
        &self.log
    }

    pub fn presence(&self) -> &PresenceRegistry {
        &self.presence
    }

    pub fn notices(&self) -> &NoticeQueue {
        &self.notices
    }

    pub fn compose_state(&self) -> ComposeState {
        self.typing.state()
    }

    /// Messages and visible notices, interleaved by time.
    pub fn timeline(&self) -> Vec<TimelineItem<'_>> {
        merge_timeline(self.log.entries(), self.notices.visible())
    }
}

impl Drop for ChatSession {
    fn drop(&mut self) {
        self.teardown();
    }
}

async fn link_change(link_rx: &mut Option<watch::Receiver<LinkStatus>>) -> Option<LinkStatus> {
    let Some(rx) = link_rx else {
        return std::future::pending().await;
    };
    match rx.changed().await {
        Ok(()) => Some(*rx.borrow_and_update()),
        Err(_) => None,
    }
}

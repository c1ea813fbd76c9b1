//! Inbound frame parsing and listener dispatch.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::types::{ChannelFrame, Envelope};
use crate::protocol::EventKind;

pub(crate) struct Listener {
    pub(crate) kind: EventKind,
    pub(crate) tx: mpsc::Sender<ChannelFrame>,
}

/// Listeners keyed by their [`super::ListenerId`] value.
pub(crate) type ListenerTable = Arc<Mutex<HashMap<u64, Listener>>>;

/// Handle one text frame from the socket.
///
/// Frames that are not an envelope, or that name an unknown event, are
/// dropped here. Payload validation is left to the listener.
pub(crate) fn handle_text_frame(text: &str, listeners: &ListenerTable) -> usize {
    let envelope = match serde_json::from_str::<Envelope>(text) {
        Ok(envelope) => envelope,
        Err(e) => {
            debug!(error = %e, "Unrecognized frame from room server");
            return 0;
        }
    };
    let Some(kind) = EventKind::parse(&envelope.event) else {
        debug!(event = %envelope.event, "Unhandled room event");
        return 0;
    };
    dispatch(
        ChannelFrame {
            kind,
            payload: envelope.payload,
        },
        listeners,
    )
}

/// Hand a frame to every listener registered for its kind. Returns how many
/// listeners took it.
pub(crate) fn dispatch(frame: ChannelFrame, listeners: &ListenerTable) -> usize {
    let Ok(mut table) = listeners.lock() else {
        warn!("Listener table poisoned, frame dropped");
        return 0;
    };

    let mut delivered = 0;
    table.retain(|id, listener| {
        if listener.kind != frame.kind {
            return true;
        }
        match listener.tx.try_send(frame.clone()) {
            Ok(()) => {
                delivered += 1;
                true
            }
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!(listener = id, event = %frame.kind, "Listener lagging, frame dropped");
                true
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                debug!(listener = id, "Listener gone, removing");
                false
            }
        }
    });
    delivered
}

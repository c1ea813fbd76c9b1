//! Background WebSocket connection loop with auto-reconnect.

use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use huddle_common::SyncError;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch, Mutex};
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, error, info, warn};

use super::handler::{handle_text_frame, ListenerTable};
use super::types::{Envelope, LinkStatus, RealtimeCommand, RealtimeConfig};

pub(crate) type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Why a live link ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LinkEnd {
    Dropped,
    Shutdown,
}

/// Open one WebSocket connection, bounded by the connect timeout.
pub(crate) async fn open_socket(config: &RealtimeConfig) -> Result<WsStream, SyncError> {
    let limit = config.connect_timeout_secs;
    info!(url = %config.display_url(), "Connecting to room server");
    match tokio::time::timeout(
        Duration::from_secs(limit),
        tokio_tungstenite::connect_async(config.url.as_str()),
    )
    .await
    {
        Ok(Ok((ws_stream, _))) => Ok(ws_stream),
        Ok(Err(e)) => Err(SyncError::Transport(format!("connection failed: {e}"))),
        Err(_elapsed) => Err(SyncError::Transport(format!(
            "connection timed out after {limit}s"
        ))),
    }
}

// ---------------------------------------------------------------------------
// Connection Loop
// ---------------------------------------------------------------------------

/// Background task owning the socket. Starts from an already open stream
/// and reconnects with exponential backoff until shut down.
pub(crate) async fn connection_loop(
    config: RealtimeConfig,
    first: WsStream,
    listeners: ListenerTable,
    link_tx: Arc<watch::Sender<LinkStatus>>,
    command_rx: mpsc::Receiver<RealtimeCommand>,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let command_rx = Arc::new(Mutex::new(command_rx));
    let mut reconnect_delay = config.reconnect_delay_secs;
    let mut pending = Some(first);

    loop {
        let stream = match pending.take() {
            Some(stream) => Ok(stream),
            None => open_socket(&config).await,
        };

        match stream {
            Ok(ws_stream) => {
                reconnect_delay = config.reconnect_delay_secs;
                let link = huddle_common::new_correlation_id();
                link_tx.send_replace(LinkStatus::Up);
                info!(link = %link, "Room link up");

                let end = run_link(ws_stream, &config, &command_rx, &listeners, &mut shutdown_rx).await;

                link_tx.send_replace(LinkStatus::Down);
                if end == LinkEnd::Shutdown {
                    info!(link = %link, "Room link closed");
                    return;
                }
                warn!(link = %link, "Room link lost");
            }
            Err(e) => {
                error!(error = %e, "Failed to reach room server");
            }
        }

        if *shutdown_rx.borrow() {
            return;
        }

        // Exponential backoff reconnect.
        info!(
            delay = reconnect_delay,
            "Reconnecting in {} seconds", reconnect_delay
        );
        tokio::select! {
            _ = tokio::time::sleep(Duration::from_secs(reconnect_delay)) => {}
            _ = shutdown_rx.changed() => return,
        }
        reconnect_delay = (reconnect_delay * 2).min(config.max_reconnect_delay_secs);
    }
}

/// Pump one open socket until it drops or the channel shuts down.
async fn run_link(
    mut ws_stream: WsStream,
    config: &RealtimeConfig,
    command_rx: &Arc<Mutex<mpsc::Receiver<RealtimeCommand>>>,
    listeners: &ListenerTable,
    shutdown_rx: &mut watch::Receiver<bool>,
) -> LinkEnd {
    // A shutdown sent while the socket was opening can already be marked
    // seen, and `changed()` would then never fire for it.
    if *shutdown_rx.borrow_and_update() {
        let _ = ws_stream.send(WsMessage::Close(None)).await;
        return LinkEnd::Shutdown;
    }

    let (ws_write, mut ws_read) = ws_stream.split();
    let ws_write = Arc::new(Mutex::new(ws_write));

    let heartbeat_handle = tokio::spawn(heartbeat_task(
        Arc::clone(&ws_write),
        config.heartbeat_interval_secs,
    ));
    let cmd_handle = tokio::spawn(command_forwarder(
        Arc::clone(command_rx),
        Arc::clone(&ws_write),
    ));

    let end = loop {
        tokio::select! {
            frame = ws_read.next() => match frame {
                Some(Ok(WsMessage::Text(text))) => {
                    handle_text_frame(&text, listeners);
                }
                Some(Ok(WsMessage::Close(_))) => {
                    info!("Room server closed connection");
                    break LinkEnd::Dropped;
                }
                Some(Err(e)) => {
                    warn!(error = %e, "WebSocket error");
                    break LinkEnd::Dropped;
                }
                None => break LinkEnd::Dropped,
                Some(Ok(_)) => {}
            },
            // The sender only ever flips to `true`, or goes away with the channel.
            _ = shutdown_rx.changed() => break LinkEnd::Shutdown,
        }
    };

    heartbeat_handle.abort();
    cmd_handle.abort();
    if end == LinkEnd::Shutdown {
        let mut writer = ws_write.lock().await;
        let _ = writer.send(WsMessage::Close(None)).await;
    }
    end
}

// ---------------------------------------------------------------------------
// Heartbeat
// ---------------------------------------------------------------------------

async fn heartbeat_task<S>(ws_write: Arc<Mutex<S>>, interval_secs: u64)
where
    S: futures_util::Sink<WsMessage> + Unpin,
{
    let mut interval = tokio::time::interval(Duration::from_secs(interval_secs.max(1)));
    loop {
        interval.tick().await;
        let mut writer = ws_write.lock().await;
        if writer.send(WsMessage::Ping(Vec::new().into())).await.is_err() {
            break;
        }
    }
}

// ---------------------------------------------------------------------------
// Command Forwarder
// ---------------------------------------------------------------------------

async fn command_forwarder<S>(
    cmd_rx: Arc<Mutex<mpsc::Receiver<RealtimeCommand>>>,
    cmd_write: Arc<Mutex<S>>,
) where
    S: futures_util::Sink<WsMessage> + Unpin,
{
    let mut rx = cmd_rx.lock().await;
    while let Some(cmd) = rx.recv().await {
        match cmd {
            RealtimeCommand::Emit { kind, payload } => {
                let envelope = Envelope {
                    event: kind.as_str().to_string(),
                    payload,
                };
                match serde_json::to_string(&envelope) {
                    Ok(json) => {
                        let mut writer = cmd_write.lock().await;
                        if writer.send(WsMessage::Text(json.into())).await.is_err() {
                            warn!(event = %kind, "Emit failed, link is closing");
                            break;
                        }
                        debug!(event = %kind, "Event emitted");
                    }
                    Err(e) => warn!(event = %kind, error = %e, "Could not encode event"),
                }
            }
        }
    }
}

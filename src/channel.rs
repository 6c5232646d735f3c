//! Real-time room channel: one WebSocket connection per room, with bounded
//! reconnection.
//!
//! ## Design
//! - A spawned driver task owns the socket; the [`RoomChannel`] handle only
//!   holds the outbound sender, the shared state, and the task handle.
//! - Inbound frames are parsed into [`Message`] values and surfaced through
//!   an unbounded event channel; a frame that fails to parse is dropped and
//!   logged, never fatal.
//! - Reconnection is an explicit state machine ([`ReconnectPolicy`]): on each
//!   close the driver sleeps the fixed delay and retries, up to a fixed
//!   ceiling of consecutive attempts. A successful open resets the counter.
//! - `disconnect()` (and dropping the handle) aborts the driver task, which
//!   also invalidates any pending reconnect timer — no stale attempt can fire
//!   after the owning session ends.
//! - There is no outbound queue and no delivery acknowledgement: sends while
//!   the socket is not open are dropped with a warning, and frames queued
//!   against a connection that died are flushed before the next connection.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tracing::{error, info, warn};

use crate::models::{Message, OutboundFrame};

/// Ceiling on consecutive reconnect attempts before the channel goes
/// terminally closed.
pub const MAX_RECONNECT_ATTEMPTS: u32 = 5;

/// Fixed delay between a close event and the reconnect attempt it schedules.
pub const RECONNECT_DELAY: Duration = Duration::from_millis(3000);

/// Connection lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    Idle,
    Connecting,
    Open,
    Closed,
}

/// Events surfaced to the owning session, in the order they occurred.
#[derive(Debug)]
pub enum ChannelEvent {
    /// The connection reached the open state.
    Opened,
    /// One parsed inbound frame.
    Inbound(Message),
    /// The connection closed. Emitted exactly once per close, before any
    /// reconnect attempt is scheduled.
    Disconnected,
    /// The reconnect ceiling was reached; the channel is terminally closed.
    Exhausted,
}

// ---------------------------------------------------------------------------
// Reconnect policy
// ---------------------------------------------------------------------------

/// Counts consecutive reconnect attempts against a fixed ceiling.
#[derive(Debug, Clone)]
pub struct ReconnectPolicy {
    attempts: u32,
    max_attempts: u32,
    delay: Duration,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self::new()
    }
}

impl ReconnectPolicy {
    pub fn new() -> Self {
        Self::with_limits(MAX_RECONNECT_ATTEMPTS, RECONNECT_DELAY)
    }

    pub fn with_limits(max_attempts: u32, delay: Duration) -> Self {
        ReconnectPolicy {
            attempts: 0,
            max_attempts,
            delay,
        }
    }

    /// A successful open resets the consecutive-attempt counter.
    pub fn on_open(&mut self) {
        self.attempts = 0;
    }

    /// Register a close event. Returns `Some(delay)` when one reconnect
    /// attempt should be scheduled after `delay`, or `None` when the ceiling
    /// is reached and the channel must stay closed.
    pub fn on_close(&mut self) -> Option<Duration> {
        if self.attempts < self.max_attempts {
            self.attempts += 1;
            Some(self.delay)
        } else {
            None
        }
    }

    /// Consecutive attempts made since the last successful open.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }
}

// ---------------------------------------------------------------------------
// URL derivation
// ---------------------------------------------------------------------------

/// Derive the room channel address from the REST base URL.
///
/// `http` becomes `ws`, `https` becomes `wss`; a bare host is assumed `ws`.
pub fn room_ws_url(base_url: &str, room_id: i64) -> String {
    let base = base_url.trim_end_matches('/');
    let ws_base = if let Some(rest) = base.strip_prefix("https://") {
        format!("wss://{}", rest)
    } else if let Some(rest) = base.strip_prefix("http://") {
        format!("ws://{}", rest)
    } else if base.starts_with("ws://") || base.starts_with("wss://") {
        base.to_string()
    } else {
        format!("ws://{}", base)
    };
    format!("{}/ws/rooms/{}", ws_base, room_id)
}

// ---------------------------------------------------------------------------
// RoomChannel
// ---------------------------------------------------------------------------

struct Shared {
    state: Mutex<ChannelState>,
}

impl Shared {
    fn set(&self, next: ChannelState) {
        if let Ok(mut state) = self.state.lock() {
            *state = next;
        }
    }

    fn get(&self) -> ChannelState {
        self.state
            .lock()
            .map(|state| *state)
            .unwrap_or(ChannelState::Closed)
    }
}

/// Handle to one room's real-time connection.
pub struct RoomChannel {
    shared: Arc<Shared>,
    outbound_tx: mpsc::UnboundedSender<OutboundFrame>,
    driver: JoinHandle<()>,
}

impl RoomChannel {
    /// Open a channel to `url` with the default reconnect policy.
    ///
    /// Never fails: connection errors are handled inside the driver task and
    /// fed into the reconnect policy, surfacing only as [`ChannelEvent`]s.
    pub fn connect(url: impl Into<String>) -> (Self, mpsc::UnboundedReceiver<ChannelEvent>) {
        Self::connect_with_policy(url, ReconnectPolicy::new())
    }

    /// Open a channel with an explicit reconnect policy (tests use short
    /// delays and small ceilings).
    pub fn connect_with_policy(
        url: impl Into<String>,
        policy: ReconnectPolicy,
    ) -> (Self, mpsc::UnboundedReceiver<ChannelEvent>) {
        let url = url.into();
        let shared = Arc::new(Shared {
            state: Mutex::new(ChannelState::Idle),
        });
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();

        let driver = tokio::spawn(drive(
            url,
            Arc::clone(&shared),
            events_tx,
            outbound_rx,
            policy,
        ));

        (
            RoomChannel {
                shared,
                outbound_tx,
                driver,
            },
            events_rx,
        )
    }

    /// Transmit one `{user_id, message}` frame.
    ///
    /// When the channel is not currently open this is a no-op that logs a
    /// warning and returns false — there is no queue and no acknowledgement.
    pub fn send(&self, frame: OutboundFrame) -> bool {
        if !self.is_connected() {
            warn!("channel is not connected, dropping outbound frame");
            return false;
        }
        if self.outbound_tx.send(frame).is_err() {
            warn!("channel driver is gone, dropping outbound frame");
            return false;
        }
        true
    }

    /// Close the connection and suppress any further reconnect attempts,
    /// including one already scheduled.
    pub fn disconnect(&self) {
        self.driver.abort();
        self.shared.set(ChannelState::Closed);
    }

    /// Whether the underlying connection is currently open.
    pub fn is_connected(&self) -> bool {
        self.shared.get() == ChannelState::Open
    }

    pub fn state(&self) -> ChannelState {
        self.shared.get()
    }
}

impl Drop for RoomChannel {
    fn drop(&mut self) {
        // A pending reconnect timer must never outlive the owning session.
        self.driver.abort();
    }
}

// ---------------------------------------------------------------------------
// Driver task
// ---------------------------------------------------------------------------

async fn drive(
    url: String,
    shared: Arc<Shared>,
    events_tx: mpsc::UnboundedSender<ChannelEvent>,
    mut outbound_rx: mpsc::UnboundedReceiver<OutboundFrame>,
    mut policy: ReconnectPolicy,
) {
    loop {
        shared.set(ChannelState::Connecting);

        match connect_async(url.as_str()).await {
            Ok((ws_stream, _response)) => {
                shared.set(ChannelState::Open);
                policy.on_open();
                info!(url = %url, "channel open");
                let _ = events_tx.send(ChannelEvent::Opened);

                // Frames queued against a previous connection are stale; there
                // is no outbound queue across connections.
                while outbound_rx.try_recv().is_ok() {}

                let (mut ws_sink, mut ws_source) = ws_stream.split();

                loop {
                    tokio::select! {
                        frame = ws_source.next() => match frame {
                            Some(Ok(WsMessage::Text(text))) => {
                                match serde_json::from_str::<Message>(&text) {
                                    Ok(msg) => {
                                        let _ = events_tx.send(ChannelEvent::Inbound(msg));
                                    }
                                    Err(e) => {
                                        warn!(error = %e, "dropping unparseable inbound frame");
                                    }
                                }
                            }
                            Some(Ok(WsMessage::Close(_))) | None => break,
                            Some(Ok(_)) => {} // Ignore binary / ping / pong frames
                            Some(Err(e)) => {
                                warn!(error = %e, "websocket read failed");
                                break;
                            }
                        },
                        out = outbound_rx.recv() => match out {
                            Some(frame) => {
                                let text = match serde_json::to_string(&frame) {
                                    Ok(text) => text,
                                    Err(e) => {
                                        warn!(error = %e, "failed to encode outbound frame");
                                        continue;
                                    }
                                };
                                if ws_sink.send(WsMessage::Text(text)).await.is_err() {
                                    break;
                                }
                            }
                            // Handle dropped; the Drop impl aborts us anyway.
                            None => break,
                        },
                    }
                }
            }
            Err(e) => {
                // Construction errors feed the same policy as a close event.
                warn!(error = %e, url = %url, "websocket connect failed");
            }
        }

        shared.set(ChannelState::Closed);
        let _ = events_tx.send(ChannelEvent::Disconnected);

        match policy.on_close() {
            Some(delay) => {
                info!(
                    attempt = policy.attempts(),
                    max = policy.max_attempts(),
                    "scheduling reconnect"
                );
                tokio::time::sleep(delay).await;
            }
            None => {
                error!(url = %url, "reconnect attempts exhausted, channel closed for good");
                let _ = events_tx.send(ChannelEvent::Exhausted);
                return;
            }
        }
    }
}

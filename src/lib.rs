pub mod api;
pub mod channel;
pub mod cli;
pub mod error;
pub mod gradient;
pub mod models;
pub mod ui;
pub mod view;

pub use error::ChatError;

use tokio::sync::mpsc;
use tracing::warn;

use api::ApiClient;
use channel::{room_ws_url, ChannelEvent, RoomChannel};
use gradient::dynamic_gradient;
use models::{Message, OutboundFrame, PersonaDirectory, Room};
use view::RoomView;

/// Longest message the composer will send; longer input is truncated.
pub const MAX_MESSAGE_LEN: usize = 500;

// ---------------------------------------------------------------------------
// Session events
// ---------------------------------------------------------------------------

/// What one channel event did to the session, for the presentation layer.
#[derive(Debug)]
pub enum SessionEvent {
    /// The room channel (re)connected.
    Connected,
    /// An inbound message was appended to the transcript.
    Appended(Message),
    /// An inbound message was dropped as an adjacent duplicate.
    DuplicateDropped,
    /// The channel closed; a reconnect may follow.
    Disconnected,
    /// The channel gave up reconnecting; the session is over.
    ConnectionLost,
}

// ---------------------------------------------------------------------------
// RoomSession — one room's channel wired into its view state
// ---------------------------------------------------------------------------

/// Owns everything scoped to one open room: the transport channel, the view
/// state it feeds, the persona directory, and the local user identity.
pub struct RoomSession {
    room: Room,
    user_id: String,
    personas: PersonaDirectory,
    persona_order: Vec<String>,
    view: RoomView,
    channel: RoomChannel,
    events: mpsc::UnboundedReceiver<ChannelEvent>,
}

impl RoomSession {
    /// Fetch the room's history and the persona directory, then open the
    /// real-time channel. REST failures abort the open; channel failures do
    /// not (they feed the reconnect policy instead).
    pub async fn open(
        api: &ApiClient,
        room: Room,
        user_id: Option<String>,
    ) -> Result<Self, ChatError> {
        let (history, personas) =
            tokio::try_join!(api.fetch_messages(room.id), api.fetch_personas())?;

        let (channel, events) = RoomChannel::connect(room_ws_url(api.base_url(), room.id));
        Ok(Self::assemble(
            room,
            user_id.unwrap_or_else(generate_user_id),
            history,
            personas,
            channel,
            events,
        ))
    }

    fn assemble(
        room: Room,
        user_id: String,
        history: Vec<Message>,
        personas: PersonaDirectory,
        channel: RoomChannel,
        events: mpsc::UnboundedReceiver<ChannelEvent>,
    ) -> Self {
        let mut persona_order: Vec<String> = personas.keys().cloned().collect();
        persona_order.sort();

        RoomSession {
            room,
            user_id,
            personas,
            persona_order,
            view: RoomView::with_history(history),
            channel,
            events,
        }
    }

    /// Wait for the next channel event and fold it into the view state.
    /// Returns `None` once the channel driver is gone for good.
    pub async fn next_event(&mut self) -> Option<SessionEvent> {
        let event = self.events.recv().await?;
        Some(self.apply(event))
    }

    fn apply(&mut self, event: ChannelEvent) -> SessionEvent {
        match event {
            ChannelEvent::Opened => SessionEvent::Connected,
            ChannelEvent::Inbound(msg) => {
                if self.view.apply_inbound(msg.clone()) {
                    SessionEvent::Appended(msg)
                } else {
                    SessionEvent::DuplicateDropped
                }
            }
            ChannelEvent::Disconnected => SessionEvent::Disconnected,
            ChannelEvent::Exhausted => SessionEvent::ConnectionLost,
        }
    }

    /// Send the user's text: one outbound frame plus an immediate optimistic
    /// transcript entry. Returns false (and appends nothing) when the channel
    /// is not open — there is no queue and no delivery guarantee.
    pub fn send(&mut self, text: &str) -> bool {
        let content: String = text.trim().chars().take(MAX_MESSAGE_LEN).collect();
        if content.is_empty() {
            return false;
        }
        if !self.channel.is_connected() {
            warn!("room channel is not connected, message dropped");
            return false;
        }

        let delivered = self.channel.send(OutboundFrame {
            user_id: self.user_id.clone(),
            message: content.clone(),
        });
        if delivered {
            self.view.push_local(&self.user_id, &content);
        }
        delivered
    }

    /// Flip a persona's mute state. Returns the new state, or `None` for ids
    /// not present in the directory — the mute set only ever holds known
    /// personas.
    pub fn toggle_mute(&mut self, persona_id: &str) -> Option<bool> {
        if !self.personas.contains_key(persona_id) {
            return None;
        }
        Some(self.view.toggle_mute(persona_id))
    }

    /// Directory order (sorted ids) with muted personas removed; this is the
    /// gradient's stop order.
    pub fn unmuted_personas(&self) -> Vec<String> {
        self.persona_order
            .iter()
            .filter(|id| !self.view.is_muted(id))
            .cloned()
            .collect()
    }

    /// Current ambient gradient descriptor. Derived fresh on every call.
    pub fn gradient(&self) -> String {
        dynamic_gradient(&self.unmuted_personas(), self.view.activity())
    }

    pub fn room(&self) -> &Room {
        &self.room
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn personas(&self) -> &PersonaDirectory {
        &self.personas
    }

    pub fn persona_order(&self) -> &[String] {
        &self.persona_order
    }

    pub fn view(&self) -> &RoomView {
        &self.view
    }

    pub fn is_connected(&self) -> bool {
        self.channel.is_connected()
    }

    /// Close the channel and cancel any pending reconnect attempt.
    pub fn disconnect(&self) {
        self.channel.disconnect();
    }
}

/// Random local user identity, e.g. `user-k3q9x17ab`.
pub fn generate_user_id() -> String {
    use rand::Rng;
    const CHARS: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
    let mut rng = rand::thread_rng();
    let suffix: String = (0..9)
        .map(|_| CHARS[rng.gen_range(0..CHARS.len())] as char)
        .collect();
    format!("user-{}", suffix)
}

//! Client-side view state for one room session.
//!
//! ## Design
//! - Transcript is append-only, in arrival order; no sequence numbers exist,
//!   so ordering is whatever the channel delivered.
//! - The server echoes user messages back at-least-once, so an inbound frame
//!   is compared against the most recently appended message only and dropped
//!   if identical. Non-adjacent duplicates are intentionally kept.
//! - Muting is a render-time filter; muted personas' messages stay in the
//!   underlying history and reappear when unmuted.
//! - Activity scores decay multiplicatively on every inbound persona message,
//!   then the emitting persona is bumped. The map is rebuilt and swapped
//!   wholesale on each update rather than mutated in place.

use std::collections::{HashMap, HashSet};

use crate::models::{Message, SenderType};

/// Multiplier applied to every persona's score before the sender's bump.
pub const ACTIVITY_DECAY: f64 = 0.8;

/// Added to the emitting persona's score on each of its messages.
pub const ACTIVITY_BOOST: f64 = 1.0;

/// Upper bound on any persona's activity score.
pub const ACTIVITY_MAX: f64 = 5.0;

/// The state behind the transcript, the mute filter, and the activity map.
#[derive(Debug, Default)]
pub struct RoomView {
    messages: Vec<Message>,
    muted: HashSet<String>,
    activity: HashMap<String, f64>,
}

impl RoomView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the view with history fetched from `GET /rooms/{id}/messages`.
    /// History does not contribute to activity scores.
    pub fn with_history(messages: Vec<Message>) -> Self {
        RoomView {
            messages,
            ..Self::default()
        }
    }

    // -- inbound ------------------------------------------------------------

    /// Append an inbound message unless it duplicates the last appended one.
    /// Returns whether the message was appended.
    pub fn apply_inbound(&mut self, msg: Message) -> bool {
        if self.is_adjacent_duplicate(&msg) {
            tracing::debug!(content = %msg.content, "dropping adjacent duplicate");
            return false;
        }

        if msg.sender_type == SenderType::Persona {
            if let Some(persona_id) = msg.persona_id.clone() {
                self.bump_activity(&persona_id);
            }
        }

        self.messages.push(msg);
        true
    }

    /// Optimistically append the local user's outgoing text before the server
    /// confirms it. The adjacent-duplicate check above is what keeps the
    /// server's echo of this message from appearing twice.
    pub fn push_local(&mut self, user_id: &str, content: &str) {
        self.messages.push(Message::local_user(user_id, content));
    }

    fn is_adjacent_duplicate(&self, msg: &Message) -> bool {
        self.messages.last().is_some_and(|last| {
            last.content == msg.content
                && last.sender_type == msg.sender_type
                && last.user_id == msg.user_id
                && last.persona_id == msg.persona_id
        })
    }

    // -- activity -----------------------------------------------------------

    /// Decay every persona's score, then bump the emitting persona's.
    ///
    /// Order matters: the sender's own prior score is decayed before the
    /// boost is added, and the result is clamped to [0, ACTIVITY_MAX].
    fn bump_activity(&mut self, persona_id: &str) {
        let mut next: HashMap<String, f64> = self
            .activity
            .iter()
            .map(|(id, level)| (id.clone(), (level * ACTIVITY_DECAY).max(0.0)))
            .collect();

        let level = next.entry(persona_id.to_string()).or_insert(0.0);
        *level = (*level + ACTIVITY_BOOST).min(ACTIVITY_MAX);

        self.activity = next;
    }

    /// The current activity map (persona id → score in [0, ACTIVITY_MAX]).
    pub fn activity(&self) -> &HashMap<String, f64> {
        &self.activity
    }

    pub fn activity_of(&self, persona_id: &str) -> f64 {
        self.activity.get(persona_id).copied().unwrap_or(0.0)
    }

    // -- muting -------------------------------------------------------------

    pub fn mute(&mut self, persona_id: &str) {
        self.muted.insert(persona_id.to_string());
    }

    pub fn unmute(&mut self, persona_id: &str) {
        self.muted.remove(persona_id);
    }

    /// Flip the mute state; returns the new state (true = now muted).
    pub fn toggle_mute(&mut self, persona_id: &str) -> bool {
        if self.muted.remove(persona_id) {
            false
        } else {
            self.muted.insert(persona_id.to_string());
            true
        }
    }

    pub fn is_muted(&self, persona_id: &str) -> bool {
        self.muted.contains(persona_id)
    }

    pub fn muted(&self) -> &HashSet<String> {
        &self.muted
    }

    // -- rendering ----------------------------------------------------------

    /// Full stored history, including messages from muted personas.
    pub fn history(&self) -> &[Message] {
        &self.messages
    }

    /// The transcript as rendered: persona messages from muted personas are
    /// filtered out; user and error messages always pass.
    pub fn visible(&self) -> Vec<&Message> {
        self.messages
            .iter()
            .filter(|msg| self.is_visible(msg))
            .collect()
    }

    /// Whether one message passes the mute filter.
    pub fn is_visible(&self, msg: &Message) -> bool {
        match (&msg.sender_type, &msg.persona_id) {
            (SenderType::Persona, Some(persona_id)) => !self.muted.contains(persona_id),
            _ => true,
        }
    }
}

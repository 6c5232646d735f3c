use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

// -- Sender and message discriminators --------------------------------------

/// Who produced a message: the local/remote human user, or a persona.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SenderType {
    User,
    Persona,
}

impl Default for SenderType {
    // Error frames omit the sender entirely; treat them as user-side so the
    // mute filter never hides them.
    fn default() -> Self {
        SenderType::User
    }
}

impl std::fmt::Display for SenderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SenderType::User => write!(f, "user"),
            SenderType::Persona => write!(f, "persona"),
        }
    }
}

/// Wire-level message kind, carried in the `type` field of every frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    UserMessage,
    PersonaMessage,
    Error,
}

// -- Directory types --------------------------------------------------------

/// A chat room. Immutable after creation from the client's perspective.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Room {
    pub id: i64,
    pub name: String,
    pub mystery_mode: bool,
    pub created_at: String,
}

/// Reference data for one persona, fetched once per room session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Persona {
    pub name: String,
    pub description: String,
    pub knowledge_areas: Vec<String>,
    pub behavioral_modes: Vec<String>,
    pub response_style: String,
}

/// persona id → Persona, as returned by `GET /personas`.
pub type PersonaDirectory = HashMap<String, Persona>;

// -- Messages ---------------------------------------------------------------

/// One transcript entry, as received over the room channel or the message
/// history endpoint. Append-only; ordering is arrival order.
///
/// Error frames arrive as `{"type": "error", "message": "..."}` — the
/// `message` alias and the defaults below let them parse into the same shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(rename = "type")]
    pub kind: MessageKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persona_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persona_name: Option<String>,
    #[serde(default, alias = "message")]
    pub content: String,
    #[serde(default)]
    pub sender_type: SenderType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl Message {
    /// Locally-synthesized user message for the optimistic echo of a send.
    pub fn local_user(user_id: &str, content: &str) -> Self {
        Message {
            id: None,
            kind: MessageKind::UserMessage,
            user_id: Some(user_id.to_string()),
            persona_id: None,
            persona_name: None,
            content: content.to_string(),
            sender_type: SenderType::User,
            created_at: Some(now_timestamp()),
        }
    }
}

/// Outbound channel frame: `{user_id, message}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutboundFrame {
    pub user_id: String,
    pub message: String,
}

/// Current UTC time as an RFC 3339 string, matching the server's timestamps.
pub fn now_timestamp() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    // -- deserialization of inbound frames -----------------------------------

    #[test]
    fn test_persona_message_deserializes() {
        let json = r#"{
            "type": "persona_message",
            "persona_id": "grandmother",
            "persona_name": "Wise Grandmother",
            "content": "Patience, dear.",
            "sender_type": "persona",
            "created_at": "2024-05-01T12:00:00Z"
        }"#;
        let msg: Message = serde_json::from_str(json).expect("deser failed");
        assert_eq!(msg.kind, MessageKind::PersonaMessage);
        assert_eq!(msg.sender_type, SenderType::Persona);
        assert_eq!(msg.persona_id.as_deref(), Some("grandmother"));
        assert_eq!(msg.persona_name.as_deref(), Some("Wise Grandmother"));
        assert_eq!(msg.content, "Patience, dear.");
        assert!(msg.user_id.is_none());
    }

    #[test]
    fn test_user_message_deserializes() {
        let json = r#"{
            "type": "user_message",
            "user_id": "user-abc123",
            "content": "hello",
            "sender_type": "user"
        }"#;
        let msg: Message = serde_json::from_str(json).expect("deser failed");
        assert_eq!(msg.kind, MessageKind::UserMessage);
        assert_eq!(msg.sender_type, SenderType::User);
        assert_eq!(msg.user_id.as_deref(), Some("user-abc123"));
        assert!(msg.created_at.is_none());
    }

    #[test]
    fn test_error_frame_deserializes_via_message_alias() {
        let json = r#"{"type": "error", "message": "persona engine unavailable"}"#;
        let msg: Message = serde_json::from_str(json).expect("deser failed");
        assert_eq!(msg.kind, MessageKind::Error);
        assert_eq!(msg.content, "persona engine unavailable");
        // Errors default to the user side so they are never mute-filtered.
        assert_eq!(msg.sender_type, SenderType::User);
    }

    #[test]
    fn test_unknown_type_fails_to_deserialize() {
        let json = r#"{"type": "surprise", "content": "?", "sender_type": "user"}"#;
        assert!(serde_json::from_str::<Message>(json).is_err());
    }

    #[test]
    fn test_history_message_with_id_deserializes() {
        let json = r#"{
            "id": 42,
            "type": "persona_message",
            "persona_id": "angel",
            "persona_name": "Angel",
            "content": "You can do this.",
            "sender_type": "persona",
            "created_at": "2024-05-01T09:30:00Z"
        }"#;
        let msg: Message = serde_json::from_str(json).expect("deser failed");
        assert_eq!(msg.id, Some(42));
    }

    // -- serialization --------------------------------------------------------

    #[test]
    fn test_message_none_fields_omitted() {
        let msg = Message::local_user("user-x", "hi");
        let json = serde_json::to_string(&msg).expect("serialize");
        assert!(!json.contains("\"id\""));
        assert!(!json.contains("persona_id"));
        assert!(!json.contains("persona_name"));
        assert!(json.contains("\"type\":\"user_message\""));
        assert!(json.contains("\"sender_type\":\"user\""));
    }

    #[test]
    fn test_outbound_frame_serializes() {
        let frame = OutboundFrame {
            user_id: "user-abc123".to_string(),
            message: "what should I cook?".to_string(),
        };
        let json = serde_json::to_string(&frame).expect("serialize");
        assert!(json.contains("\"user_id\":\"user-abc123\""));
        assert!(json.contains("\"message\":\"what should I cook?\""));
    }

    #[test]
    fn test_room_roundtrip() {
        let json = r#"{"id": 3, "name": "Test", "mystery_mode": true, "created_at": "2024-05-01T08:00:00"}"#;
        let room: Room = serde_json::from_str(json).expect("deser failed");
        assert_eq!(room.id, 3);
        assert_eq!(room.name, "Test");
        assert!(room.mystery_mode);
        let back = serde_json::to_string(&room).expect("serialize");
        let reparsed: Room = serde_json::from_str(&back).expect("reparse");
        assert_eq!(reparsed.created_at, room.created_at);
    }

    #[test]
    fn test_persona_directory_deserializes() {
        let json = r#"{
            "barkeeper": {
                "name": "Medieval Barkeeper",
                "description": "Speaks in lore",
                "knowledge_areas": ["Folk remedies", "Tavern tales"],
                "behavioral_modes": ["jovial"],
                "response_style": "folksy"
            }
        }"#;
        let dir: PersonaDirectory = serde_json::from_str(json).expect("deser failed");
        assert_eq!(dir.len(), 1);
        assert_eq!(dir["barkeeper"].name, "Medieval Barkeeper");
        assert_eq!(dir["barkeeper"].knowledge_areas.len(), 2);
    }

    // -- local_user -----------------------------------------------------------

    #[test]
    fn test_local_user_fields() {
        let msg = Message::local_user("user-abc", "hello room");
        assert_eq!(msg.kind, MessageKind::UserMessage);
        assert_eq!(msg.sender_type, SenderType::User);
        assert_eq!(msg.user_id.as_deref(), Some("user-abc"));
        assert_eq!(msg.content, "hello room");
        assert!(msg.persona_id.is_none());
        assert!(msg.created_at.is_some());
    }

    #[test]
    fn test_now_timestamp_is_rfc3339() {
        let ts = now_timestamp();
        assert!(OffsetDateTime::parse(&ts, &Rfc3339).is_ok(), "bad timestamp: {}", ts);
    }

    #[test]
    fn test_sender_type_display() {
        assert_eq!(SenderType::User.to_string(), "user");
        assert_eq!(SenderType::Persona.to_string(), "persona");
    }
}

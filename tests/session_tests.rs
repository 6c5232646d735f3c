//! Behavior tests for the view reducer, the gradient mapper, and the
//! mystery-mode rendering path.

use std::collections::HashMap;

use proptest::prelude::*;
use rstest::rstest;

use ambient_chat::gradient::{dynamic_gradient, DEFAULT_GRADIENT};
use ambient_chat::models::{Message, MessageKind, Persona, PersonaDirectory, Room, SenderType};
use ambient_chat::ui;
use ambient_chat::view::{RoomView, ACTIVITY_DECAY, ACTIVITY_MAX};

const PERSONA_IDS: [&str; 6] = [
    "grandmother",
    "devils_adv",
    "barkeeper",
    "angel",
    "jacquemus",
    "critical_voice",
];

fn persona_msg(persona_id: &str, content: &str) -> Message {
    Message {
        id: None,
        kind: MessageKind::PersonaMessage,
        user_id: None,
        persona_id: Some(persona_id.to_string()),
        persona_name: Some(persona_id.to_string()),
        content: content.to_string(),
        sender_type: SenderType::Persona,
        created_at: None,
    }
}

fn user_msg(user_id: &str, content: &str) -> Message {
    Message {
        id: None,
        kind: MessageKind::UserMessage,
        user_id: Some(user_id.to_string()),
        persona_id: None,
        persona_name: None,
        content: content.to_string(),
        sender_type: SenderType::User,
        created_at: None,
    }
}

fn shipped_directory() -> PersonaDirectory {
    PERSONA_IDS
        .iter()
        .map(|id| {
            (
                id.to_string(),
                Persona {
                    name: format!("The {}", id),
                    description: format!("{} has opinions", id),
                    knowledge_areas: vec!["one".to_string(), "two".to_string()],
                    behavioral_modes: vec!["mode".to_string()],
                    response_style: "style".to_string(),
                },
            )
        })
        .collect()
}

// -- activity decay ---------------------------------------------------------

#[rstest]
#[case(1, 1.0)]
#[case(2, 1.8)]
#[case(3, 2.44)]
#[case(4, 2.952)]
fn test_activity_after_consecutive_messages(#[case] count: usize, #[case] expected: f64) {
    let mut view = RoomView::new();
    for i in 0..count {
        view.apply_inbound(persona_msg("angel", &format!("message {}", i)));
    }
    assert!(
        (view.activity_of("angel") - expected).abs() < 1e-9,
        "after {} messages expected {}, got {}",
        count,
        expected,
        view.activity_of("angel")
    );
}

#[test]
fn test_decay_applies_to_silent_personas() {
    let mut view = RoomView::new();
    view.apply_inbound(persona_msg("angel", "a"));
    view.apply_inbound(persona_msg("barkeeper", "b"));
    view.apply_inbound(persona_msg("barkeeper", "c"));
    // angel decayed twice with no boost: 1.0 * 0.8 * 0.8
    assert!((view.activity_of("angel") - ACTIVITY_DECAY * ACTIVITY_DECAY).abs() < 1e-9);
}

proptest! {
    /// For every sequence of inbound persona messages, every score stays in
    /// [0, ACTIVITY_MAX] at every step and matches the
    /// decay-then-increment model exactly.
    #[test]
    fn prop_activity_matches_model(seq in proptest::collection::vec(0usize..6, 0..120)) {
        let mut view = RoomView::new();
        let mut model: HashMap<String, f64> = HashMap::new();

        for (i, idx) in seq.iter().enumerate() {
            let persona_id = PERSONA_IDS[*idx];
            // Distinct contents so adjacent de-duplication never interferes.
            view.apply_inbound(persona_msg(persona_id, &format!("m{}", i)));

            for level in model.values_mut() {
                *level = (*level * ACTIVITY_DECAY).max(0.0);
            }
            let level = model.entry(persona_id.to_string()).or_insert(0.0);
            *level = (*level + 1.0).min(ACTIVITY_MAX);

            for (id, score) in view.activity() {
                prop_assert!(*score >= 0.0 && *score <= ACTIVITY_MAX);
                let expected = model.get(id).copied().unwrap_or(0.0);
                prop_assert!((score - expected).abs() < 1e-9,
                    "persona {} diverged: got {}, expected {}", id, score, expected);
            }
        }
    }
}

// -- de-duplication ----------------------------------------------------------

#[test]
fn test_optimistic_echo_suppressed_once() {
    let mut view = RoomView::new();
    view.push_local("user-abc", "dinner ideas?");

    // Server echo of the same send: suppressed.
    assert!(!view.apply_inbound(user_msg("user-abc", "dinner ideas?")));
    assert_eq!(view.history().len(), 1);

    // The user repeating themselves later is a real message again.
    view.apply_inbound(persona_msg("barkeeper", "stew, always stew"));
    assert!(view.apply_inbound(user_msg("user-abc", "dinner ideas?")));
    assert_eq!(view.history().len(), 3);
}

#[test]
fn test_error_frames_append_and_render() {
    let mut view = RoomView::new();
    let error: Message =
        serde_json::from_str(r#"{"type": "error", "message": "persona engine crashed"}"#).unwrap();
    assert!(view.apply_inbound(error));
    view.mute("angel");
    assert_eq!(view.visible().len(), 1, "errors are never mute-filtered");
}

// -- mute filter -------------------------------------------------------------

#[test]
fn test_mute_is_purely_presentational() {
    let mut view = RoomView::new();
    view.apply_inbound(persona_msg("angel", "one"));
    view.apply_inbound(persona_msg("barkeeper", "two"));
    view.apply_inbound(user_msg("user-1", "three"));
    view.apply_inbound(persona_msg("angel", "four"));

    view.mute("angel");
    let visible: Vec<&str> = view.visible().iter().map(|m| m.content.as_str()).collect();
    assert_eq!(visible, ["two", "three"]);
    assert_eq!(view.history().len(), 4);

    view.unmute("angel");
    let restored: Vec<&str> = view.visible().iter().map(|m| m.content.as_str()).collect();
    assert_eq!(restored, ["one", "two", "three", "four"]);
}

// -- gradient ----------------------------------------------------------------

#[test]
fn test_gradient_deterministic_for_same_inputs() {
    let personas: Vec<String> = PERSONA_IDS.iter().map(|s| s.to_string()).collect();
    let mut activity = HashMap::new();
    activity.insert("angel".to_string(), 2.0);
    activity.insert("barkeeper".to_string(), 0.5);

    assert_eq!(
        dynamic_gradient(&personas, &activity),
        dynamic_gradient(&personas, &activity)
    );
}

#[test]
fn test_gradient_empty_list_is_default() {
    let mut activity = HashMap::new();
    activity.insert("angel".to_string(), 3.0);
    assert_eq!(dynamic_gradient(&[], &activity), DEFAULT_GRADIENT);
}

#[test]
fn test_gradient_reflects_view_activity() {
    let mut view = RoomView::new();
    view.apply_inbound(persona_msg("angel", "hello"));
    let personas = vec!["angel".to_string()];

    let lively = dynamic_gradient(&personas, view.activity());
    let idle = dynamic_gradient(&personas, &HashMap::new());
    assert_ne!(lively, idle);
}

// -- mystery mode end to end --------------------------------------------------

#[test]
fn test_mystery_room_sidebar_hides_identities() {
    // The create response for a room named "Test" with mystery mode on.
    let room: Room = serde_json::from_str(
        r#"{"id": 1, "name": "Test", "mystery_mode": true, "created_at": "2024-05-01T08:00:00"}"#,
    )
    .unwrap();

    let personas = shipped_directory();
    let mut order: Vec<String> = personas.keys().cloned().collect();
    order.sort();

    let panel = ui::render_persona_panel(&order, &personas, room.mystery_mode);
    assert!(panel.contains("Hidden Participants"));
    for persona in personas.values() {
        assert!(
            !panel.contains(&persona.description),
            "mystery sidebar leaked a description"
        );
    }

    let heading = ui::room_heading(&room.name, room.mystery_mode);
    assert!(heading.contains("Test"));
    assert!(heading.contains("Mystery Mode"));
}

#[test]
fn test_plain_room_sidebar_shows_identities() {
    let room: Room = serde_json::from_str(
        r#"{"id": 2, "name": "Open House", "mystery_mode": false, "created_at": "2024-05-01T08:00:00"}"#,
    )
    .unwrap();

    let personas = shipped_directory();
    let mut order: Vec<String> = personas.keys().cloned().collect();
    order.sort();

    let panel = ui::render_persona_panel(&order, &personas, room.mystery_mode);
    assert!(panel.contains("Chat Personas"));
    assert!(panel.contains("has opinions"));
}

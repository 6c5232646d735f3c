//! Ambient background gradient derived from persona activity.
//!
//! Pure functions only: given the ordered unmuted persona list and the
//! activity map, produce a CSS-style gradient descriptor. Re-derive on every
//! state change; nothing here is cached.

use std::collections::HashMap;

/// Gradient shown when no personas are active.
pub const DEFAULT_GRADIENT: &str = "linear-gradient(135deg, #667eea 0%, #764ba2 100%)";

/// Hue fallback for personas not in the shipped palette.
pub const FALLBACK_HUE: f64 = 200.0;

/// Fixed hue assigned to each shipped persona.
pub fn persona_hue(persona_id: &str) -> f64 {
    match persona_id {
        "grandmother" => 280.0,
        "devils_adv" => 0.0,
        "barkeeper" => 25.0,
        "angel" => 45.0,
        "jacquemus" => 330.0,
        "critical_voice" => 210.0,
        _ => FALLBACK_HUE,
    }
}

/// Accent color (hex) assigned to each shipped persona, used for avatars
/// and transcript labels.
pub fn persona_color(persona_id: &str) -> &'static str {
    match persona_id {
        "grandmother" => "#9B59B6",
        "devils_adv" => "#E74C3C",
        "barkeeper" => "#D35400",
        "angel" => "#F39C12",
        "jacquemus" => "#E91E63",
        "critical_voice" => "#34495E",
        _ => "#95A5A6",
    }
}

/// Build the gradient descriptor for the given personas and activity scores.
///
/// Each persona contributes one stop, evenly spaced across 0–100% in list
/// order (a single persona pins to 0%). Saturation and lightness grow
/// monotonically and boundedly with that persona's activity score.
pub fn dynamic_gradient(active_personas: &[String], activity: &HashMap<String, f64>) -> String {
    if active_personas.is_empty() {
        return DEFAULT_GRADIENT.to_string();
    }

    let span = active_personas.len().saturating_sub(1).max(1);
    let stops: Vec<String> = active_personas
        .iter()
        .enumerate()
        .map(|(index, persona_id)| {
            let hue = persona_hue(persona_id);
            let level = activity.get(persona_id).copied().unwrap_or(0.0);
            let saturation = 50.0 + (level * 10.0).min(40.0);
            let lightness = 45.0 + (level * 5.0).min(15.0);
            let position = index as f64 / span as f64 * 100.0;
            format!("hsl({}, {}%, {}%) {}%", hue, saturation, lightness, position)
        })
        .collect();

    format!("linear-gradient(135deg, {})", stops.join(", "))
}

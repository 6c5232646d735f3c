//! Terminal rendering for the transcript, the persona sidebar, and the
//! ambient gradient swatch.

use colored::{Color, Colorize};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::models::{Message, MessageKind, Persona, SenderType};
use crate::view::ACTIVITY_MAX;

/// Sidebar heading; mystery mode hides who the participants are.
pub fn sidebar_title(mystery_mode: bool) -> &'static str {
    if mystery_mode {
        "Hidden Participants"
    } else {
        "Chat Personas"
    }
}

/// Terminal color for a persona, approximating its accent color.
pub fn persona_terminal_color(persona_id: &str) -> Color {
    match persona_id {
        "grandmother" => Color::Magenta,
        "devils_adv" => Color::Red,
        "barkeeper" => Color::Yellow,
        "angel" => Color::BrightYellow,
        "jacquemus" => Color::BrightMagenta,
        "critical_voice" => Color::Blue,
        _ => Color::White,
    }
}

/// One transcript line: `[HH:MM:SS] Sender: content`, colored by sender.
pub fn format_message(msg: &Message) -> String {
    let time = msg
        .created_at
        .as_deref()
        .and_then(format_clock)
        .map(|clock| format!("[{}] ", clock.dimmed()))
        .unwrap_or_default();

    match msg.kind {
        MessageKind::Error => format!("{}{} {}", time, "error:".bright_red().bold(), msg.content),
        _ if msg.sender_type == SenderType::Persona => {
            let name = msg
                .persona_name
                .as_deref()
                .or(msg.persona_id.as_deref())
                .unwrap_or("?");
            let color = persona_terminal_color(msg.persona_id.as_deref().unwrap_or(""));
            format!("{}{}: {}", time, name.color(color).bold(), msg.content)
        }
        _ => format!("{}{}: {}", time, "You".bright_cyan().bold(), msg.content),
    }
}

/// One sidebar card. Mystery mode shows the name only — no description, no
/// tags — regardless of what the directory returned.
pub fn format_persona_card(persona_id: &str, persona: &Persona, mystery_mode: bool) -> String {
    let color = persona_terminal_color(persona_id);
    let mut card = format!("{}", persona.name.color(color).bold());

    if !mystery_mode {
        card.push_str(&format!("\n  {}", persona.description.dimmed()));
        if !persona.knowledge_areas.is_empty() {
            let areas: Vec<&str> = persona
                .knowledge_areas
                .iter()
                .take(3)
                .map(String::as_str)
                .collect();
            card.push_str(&format!("\n  Knowledge: {}", areas.join(", ")));
        }
        if !persona.behavioral_modes.is_empty() {
            let modes: Vec<&str> = persona
                .behavioral_modes
                .iter()
                .take(2)
                .map(String::as_str)
                .collect();
            card.push_str(&format!("\n  Style: {}", modes.join(", ")));
        }
    }

    card
}

/// The whole sidebar: heading plus one card per persona, in the given order.
pub fn render_persona_panel(
    order: &[String],
    personas: &std::collections::HashMap<String, Persona>,
    mystery_mode: bool,
) -> String {
    let mut panel = format!("{}\n", sidebar_title(mystery_mode).bold().underline());
    if order.is_empty() {
        panel.push_str("(no personas)\n");
    }
    for persona_id in order {
        if let Some(persona) = personas.get(persona_id) {
            panel.push_str(&format!("- {}\n", format_persona_card(persona_id, persona, mystery_mode)));
        }
    }
    panel
}

/// Activity score rendered as a small bar, e.g. `▮▮▮▯▯`.
pub fn activity_bar(level: f64) -> String {
    let filled = level.round().clamp(0.0, ACTIVITY_MAX) as usize;
    let empty = ACTIVITY_MAX as usize - filled;
    format!("{}{}", "▮".repeat(filled), "▯".repeat(empty))
}

/// Room heading with the mystery-mode indicator.
pub fn room_heading(name: &str, mystery_mode: bool) -> String {
    if mystery_mode {
        format!("{} {}", name.bold(), "[Mystery Mode]".bright_magenta())
    } else {
        name.bold().to_string()
    }
}

fn format_clock(timestamp: &str) -> Option<String> {
    let parsed = OffsetDateTime::parse(timestamp, &Rfc3339).ok()?;
    Some(format!(
        "{:02}:{:02}:{:02}",
        parsed.hour(),
        parsed.minute(),
        parsed.second()
    ))
}

use clap::Parser;

use crate::api::DEFAULT_SERVER;

#[derive(Parser)]
#[command(name = "ambient-chat")]
#[command(version = "0.1.0")]
#[command(about = "Terminal client for real-time multi-persona AI chat rooms")]
pub struct Args {
    /// Room id to join directly (skips the room picker)
    pub room: Option<i64>,

    /// Base URL of the chat server
    #[arg(long, default_value = DEFAULT_SERVER)]
    pub server: String,

    /// List available rooms and exit
    #[arg(long, short)]
    pub list: bool,

    /// Create a room with this name, then join it
    #[arg(long)]
    pub create: Option<String>,

    /// Create the room with mystery mode on (hidden persona identities)
    #[arg(long)]
    pub mystery: bool,

    /// Show the persona directory and exit
    #[arg(long)]
    pub personas: bool,

    /// User identifier to send with messages (random if omitted)
    #[arg(long)]
    pub user: Option<String>,
}

/// Clamp a proposed room name the way the create form does: trimmed, at most
/// 50 characters.
pub fn sanitize_room_name(name: &str) -> String {
    name.trim().chars().take(50).collect()
}

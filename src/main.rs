use clap::Parser;
use colored::Colorize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_stream::wrappers::LinesStream;
use tokio_stream::StreamExt;
use tracing_subscriber::EnvFilter;

use ambient_chat::api::ApiClient;
use ambient_chat::cli::{sanitize_room_name, Args};
use ambient_chat::models::Room;
use ambient_chat::{ui, RoomSession, SessionEvent};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let api = ApiClient::new(args.server.as_str());

    if args.list {
        return list_rooms(&api).await;
    }
    if args.personas {
        return list_personas(&api).await;
    }

    let room = match pick_room(&api, &args).await {
        Ok(Some(room)) => room,
        Ok(None) => {
            println!("No rooms yet. Create one with --create NAME");
            return Ok(());
        }
        Err(e) => {
            // A failed fetch or creation leaves everything as it was.
            eprintln!("{} {}", "error:".bright_red().bold(), e);
            return Ok(());
        }
    };

    run_room(&api, room, args.user).await
}

// ---------------------------------------------------------------------------
// Directory commands
// ---------------------------------------------------------------------------

async fn list_rooms(api: &ApiClient) -> Result<(), Box<dyn std::error::Error>> {
    let rooms = match api.fetch_rooms().await {
        Ok(rooms) => rooms,
        Err(e) => {
            eprintln!("{} failed to load rooms: {}", "error:".bright_red().bold(), e);
            return Ok(());
        }
    };

    if rooms.is_empty() {
        println!("No rooms yet. Create one with --create NAME");
        return Ok(());
    }
    for room in rooms {
        println!(
            "{:>4}  {}",
            room.id.to_string().bright_yellow(),
            ui::room_heading(&room.name, room.mystery_mode)
        );
    }
    Ok(())
}

async fn list_personas(api: &ApiClient) -> Result<(), Box<dyn std::error::Error>> {
    let personas = match api.fetch_personas().await {
        Ok(personas) => personas,
        Err(e) => {
            eprintln!("{} failed to load personas: {}", "error:".bright_red().bold(), e);
            return Ok(());
        }
    };
    let mut order: Vec<String> = personas.keys().cloned().collect();
    order.sort();
    println!("{}", ui::render_persona_panel(&order, &personas, false));
    Ok(())
}

async fn pick_room(api: &ApiClient, args: &Args) -> Result<Option<Room>, ambient_chat::ChatError> {
    if let Some(name) = &args.create {
        let room = api.create_room(&sanitize_room_name(name), args.mystery).await?;
        return Ok(Some(room));
    }

    let rooms = api.fetch_rooms().await?;
    if let Some(id) = args.room {
        return rooms
            .into_iter()
            .find(|room| room.id == id)
            .map(Some)
            .ok_or(ambient_chat::ChatError::RoomNotFound(id));
    }

    // No room given: join the most recently listed one.
    Ok(rooms.into_iter().next())
}

// ---------------------------------------------------------------------------
// Chat loop
// ---------------------------------------------------------------------------

async fn run_room(
    api: &ApiClient,
    room: Room,
    user_id: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = match RoomSession::open(api, room, user_id).await {
        Ok(session) => session,
        Err(e) => {
            eprintln!("{} failed to load room data: {}", "error:".bright_red().bold(), e);
            return Ok(());
        }
    };

    println!("{}", ui::room_heading(&session.room().name, session.room().mystery_mode));
    println!(
        "{}",
        ui::render_persona_panel(
            session.persona_order(),
            session.personas(),
            session.room().mystery_mode,
        )
    );
    for msg in session.view().visible() {
        println!("{}", ui::format_message(msg));
    }
    println!("{}", "Type a message, or /help for commands.".dimmed());

    let mut lines = LinesStream::new(BufReader::new(tokio::io::stdin()).lines());

    loop {
        tokio::select! {
            event = session.next_event() => match event {
                Some(SessionEvent::Connected) => {
                    println!("{}", "connected".bright_green());
                }
                Some(SessionEvent::Appended(msg)) => {
                    if session.view().is_visible(&msg) {
                        println!("{}", ui::format_message(&msg));
                    }
                }
                Some(SessionEvent::DuplicateDropped) => {}
                Some(SessionEvent::Disconnected) => {
                    println!("{}", "disconnected, retrying...".bright_yellow());
                }
                Some(SessionEvent::ConnectionLost) | None => {
                    println!("{}", "connection lost for good, leaving room".bright_red());
                    break;
                }
            },
            line = lines.next() => match line {
                Some(Ok(line)) => {
                    if !handle_line(&mut session, line.trim()) {
                        break;
                    }
                }
                Some(Err(_)) | None => break,
            },
        }
    }

    session.disconnect();
    Ok(())
}

/// Dispatch one line of input. Returns false when the loop should exit.
fn handle_line(session: &mut RoomSession, line: &str) -> bool {
    match line {
        "" => true,
        "/quit" | "/q" => false,
        "/help" => {
            println!("/mute ID    hide a persona's messages");
            println!("/personas   show the persona sidebar");
            println!("/gradient   show the ambient gradient");
            println!("/quit       leave the room");
            true
        }
        "/personas" => {
            println!(
                "{}",
                ui::render_persona_panel(
                    session.persona_order(),
                    session.personas(),
                    session.room().mystery_mode,
                )
            );
            for id in session.persona_order() {
                println!(
                    "  {} {} {}",
                    ui::activity_bar(session.view().activity_of(id)),
                    id,
                    if session.view().is_muted(id) { "(muted)".dimmed().to_string() } else { String::new() },
                );
            }
            true
        }
        "/gradient" => {
            println!("{}", session.gradient());
            true
        }
        _ if line.starts_with("/mute ") => {
            let persona_id = line["/mute ".len()..].trim();
            match session.toggle_mute(persona_id) {
                Some(true) => println!("muted {}", persona_id),
                Some(false) => println!("unmuted {}", persona_id),
                None => println!("no persona named '{}'", persona_id),
            }
            true
        }
        _ if line.starts_with('/') => {
            println!("unknown command, try /help");
            true
        }
        text => {
            if !session.send(text) {
                println!("{}", "not connected, message dropped".bright_yellow());
            } else if let Some(msg) = session.view().history().last() {
                println!("{}", ui::format_message(msg));
            }
            true
        }
    }
}

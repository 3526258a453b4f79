use std::io::{IsTerminal, Write};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use chatline_protocol::{JoinRoomResponse, ListRoomsResponse, Message, MessageType};
use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;

use crate::items::ChatItem;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Pretty
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct ItemOutput<'a> {
    #[serde(flatten)]
    item: &'a ChatItem,
    timestamp: String,
}

pub fn print_item(item: &ChatItem, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = ItemOutput {
                item,
                timestamp: now_unix_seconds(),
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let (from, text) = match item {
                ChatItem::Notice { text } => ("*".to_string(), text.clone()),
                ChatItem::WhisperIn { from, msg } => (format!("{from} (whisper)"), msg.clone()),
                ChatItem::WhisperOut { to, msg } => (format!("-> {to}"), msg.clone()),
                ChatItem::RoomTalk { room, who, msg } => (format!("{who} @ {room}"), msg.clone()),
            };
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["KIND", "FROM", "TEXT"])
                .add_row(vec![item.kind().to_string(), from, text]);
            println!("{table}");
        }
        OutputFormat::Pretty | OutputFormat::Raw => println!("{item}"),
    }
}

/// Print one feed message. Raw prints the frame as received.
pub fn print_feed(message: &Message, format: OutputFormat) {
    if let OutputFormat::Raw = format {
        print_envelope(message);
        return;
    }
    match ChatItem::from_feed(message) {
        Ok(item) => print_item(&item, format),
        Err(err) => tracing::warn!(kind = %message.kind, error = %err, "skipping unreadable feed"),
    }
}

pub fn print_response(message: &Message, format: OutputFormat) {
    match format {
        OutputFormat::Json | OutputFormat::Raw => print_envelope(message),
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic);
            match &message.kind {
                MessageType::ListRoomsRes => {
                    let listing: ListRoomsResponse = message.payload_as().unwrap_or_default();
                    table.set_header(vec!["ROOM"]);
                    for room in listing.rooms {
                        table.add_row(vec![room]);
                    }
                }
                MessageType::JoinRoomRes => {
                    let joined: JoinRoomResponse = message.payload_as().unwrap_or_default();
                    table.set_header(vec!["MEMBER"]);
                    for person in joined.people {
                        table.add_row(vec![person]);
                    }
                }
                other => {
                    table
                        .set_header(vec!["TYPE", "STATUS"])
                        .add_row(vec![other.to_string(), status_text(message)]);
                }
            }
            println!("{table}");
        }
        OutputFormat::Pretty => println!("{}", response_text(message)),
    }
}

#[derive(Serialize)]
struct PingOutput {
    seq: usize,
    round_trip_ms: f64,
    timestamp: String,
}

pub fn print_ping(seq: usize, round_trip: Duration, format: OutputFormat) {
    let millis = round_trip.as_secs_f64() * 1000.0;
    match format {
        OutputFormat::Json => {
            let out = PingOutput {
                seq,
                round_trip_ms: millis,
                timestamp: now_unix_seconds(),
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_header(vec!["SEQ", "RTT"])
                .add_row(vec![seq.to_string(), format!("{millis:.1} ms")]);
            println!("{table}");
        }
        OutputFormat::Pretty | OutputFormat::Raw => {
            println!("pong seq={seq} time={millis:.1} ms");
        }
    }
}

/// One-line summary of a successful response.
pub fn response_text(message: &Message) -> String {
    match &message.kind {
        MessageType::ListRoomsRes => {
            let listing: ListRoomsResponse = message.payload_as().unwrap_or_default();
            if listing.rooms.is_empty() {
                "no rooms".to_string()
            } else {
                format!("rooms: {}", listing.rooms.join(", "))
            }
        }
        MessageType::JoinRoomRes => {
            let joined: JoinRoomResponse = message.payload_as().unwrap_or_default();
            match joined.room {
                Some(room) => format!("joined {room} with {}", joined.people.join(", ")),
                None => format!("joined with {}", joined.people.join(", ")),
            }
        }
        other => format!("{other}: {}", status_text(message)),
    }
}

fn status_text(message: &Message) -> String {
    message
        .payload
        .get("status")
        .and_then(serde_json::Value::as_str)
        .unwrap_or("?")
        .to_string()
}

fn print_envelope(message: &Message) {
    let text = chatline_protocol::encode(message).unwrap_or_else(|_| "{}".to_string());
    let mut out = std::io::stdout();
    let _ = writeln!(out, "{text}");
    let _ = out.flush();
}

fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}

use std::time::Duration;

use chatline_connection::{ChatClient, ChatError, ConnectionStatus};
use chatline_protocol::{JoinRoomResponse, Message, MessageType, SayRequest, WhisperRequest};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::cmd::ChatArgs;
use crate::cmdline::{self, Input, HELP};
use crate::exit::{io_error, CliResult, SUCCESS};
use crate::items::ChatItem;
use crate::output::{print_feed, print_item, response_text, OutputFormat};

/// A request that got its answer.
struct Settled {
    request: Message,
    result: Result<Message, ChatError>,
    elapsed: Duration,
}

/// What the chat session remembers between lines.
#[derive(Debug, Default)]
struct Session {
    room: Option<String>,
}

impl Session {
    /// Turn a settled request into chat items, tracking the current room.
    fn settle(&mut self, settled: Settled) -> Vec<ChatItem> {
        let Settled {
            request,
            result,
            elapsed,
        } = settled;
        let response = match result {
            Ok(response) => response,
            Err(err) => {
                return vec![ChatItem::notice(format!("{} failed: {err}", request.kind))];
            }
        };

        match &request.kind {
            MessageType::LoginReq => {
                let nick = request.payload["nick"].as_str().unwrap_or_default();
                vec![ChatItem::notice(format!("logged in as {nick}"))]
            }
            MessageType::JoinRoomReq => {
                let requested = request.payload["room"].as_str().unwrap_or_default();
                let joined: JoinRoomResponse = response.payload_as().unwrap_or_default();
                let room = joined.room.unwrap_or_else(|| requested.to_string());
                let notice = if joined.people.is_empty() {
                    format!("joined {room}")
                } else {
                    format!("joined {room} with {}", joined.people.join(", "))
                };
                self.room = Some(room);
                vec![ChatItem::notice(notice)]
            }
            MessageType::LeaveRoomReq => {
                let room = request.payload["room"].as_str().unwrap_or_default();
                if self.room.as_deref() == Some(room) {
                    self.room = None;
                }
                vec![ChatItem::notice(format!("left {room}"))]
            }
            // The server echoes our own lines through the room feed.
            MessageType::SayReq => match request.payload_as::<SayRequest>() {
                Ok(_) => Vec::new(),
                Err(err) => vec![ChatItem::notice(err.to_string())],
            },
            MessageType::WhisperReq => match request.payload_as::<WhisperRequest>() {
                Ok(whisper) => vec![ChatItem::WhisperOut {
                    to: whisper.to,
                    msg: whisper.msg,
                }],
                Err(err) => vec![ChatItem::notice(err.to_string())],
            },
            MessageType::PingReq => vec![ChatItem::notice(format!(
                "pong in {:.1} ms",
                elapsed.as_secs_f64() * 1000.0
            ))],
            _ => vec![ChatItem::notice(response_text(&response))],
        }
    }
}

pub async fn run(args: ChatArgs, client: ChatClient, format: OutputFormat) -> CliResult<i32> {
    let mut feeds = client.feeds();
    let mut status = client.status();
    let mut session = Session::default();
    let (settled_tx, mut settled_rx) = mpsc::unbounded_channel::<Settled>();
    let mut in_flight = 0usize;

    let submit = |request: Message| {
        let started = Instant::now();
        let response = client.send(request.clone());
        let settled_tx = settled_tx.clone();
        tokio::spawn(async move {
            let result = response.await;
            let _ = settled_tx.send(Settled {
                request,
                result,
                elapsed: started.elapsed(),
            });
        });
    };

    if let Some(nick) = &args.nick {
        submit(Message::login(nick));
        in_flight += 1;
    }
    if let Some(room) = &args.join {
        submit(Message::join_room(room));
        in_flight += 1;
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut input = InputState::Open;
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    while input.keep_running(in_flight) {
        tokio::select! {
            signal = &mut ctrl_c => {
                signal.map_err(|err| io_error("signal handler failed", err))?;
                break;
            }
            line = lines.next_line(), if input == InputState::Open => {
                let Some(line) = line.map_err(|err| io_error("reading stdin failed", err))? else {
                    input = InputState::Drained;
                    continue;
                };
                match cmdline::parse(&line, session.room.as_deref()) {
                    Ok(Input::Request(request)) => {
                        tracing::debug!(kind = %request.kind, "submitting");
                        submit(request);
                        in_flight += 1;
                    }
                    Ok(Input::Help) => println!("{HELP}"),
                    Ok(Input::Quit) => input = InputState::Quit,
                    Err(cmdline::ParseError::Empty) => {}
                    Err(err) => print_item(&ChatItem::notice(err.to_string()), format),
                }
            }
            Some(settled) = settled_rx.recv() => {
                in_flight = in_flight.saturating_sub(1);
                for item in session.settle(settled) {
                    print_item(&item, format);
                }
            }
            Some(feed) = feeds.recv() => print_feed(&feed, format),
            Some(next) = status.recv() => {
                tracing::info!(status = %next, "connection status");
                if next == ConnectionStatus::Closed {
                    print_item(
                        &ChatItem::notice("disconnected; the next request reconnects"),
                        format,
                    );
                }
            }
        }
    }

    let _ = client.close().await;
    Ok(SUCCESS)
}

/// Where stdin stands for the interactive loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InputState {
    Open,
    /// End of input: outstanding requests still settle.
    Drained,
    /// `/quit`: stop now and let close fail whatever is outstanding.
    Quit,
}

impl InputState {
    fn keep_running(self, in_flight: usize) -> bool {
        match self {
            InputState::Open => true,
            InputState::Drained => in_flight > 0,
            InputState::Quit => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn ok(request: Message, payload: serde_json::Value) -> Settled {
        let kind = request.kind.response_kind().unwrap();
        Settled {
            request,
            result: Ok(Message::from_value(kind, payload)),
            elapsed: Duration::from_millis(12),
        }
    }

    #[test]
    fn join_and_leave_track_the_current_room() {
        let mut session = Session::default();
        let items = session.settle(ok(
            Message::join_room("lobby"),
            json!({ "status": "ok", "people": ["ada", "bob"] }),
        ));
        assert_eq!(items, vec![ChatItem::notice("joined lobby with ada, bob")]);
        assert_eq!(session.room.as_deref(), Some("lobby"));

        session.settle(ok(Message::leave_room("rust"), json!({ "status": "ok" })));
        assert_eq!(session.room.as_deref(), Some("lobby"));

        let items = session.settle(ok(Message::leave_room("lobby"), json!({ "status": "ok" })));
        assert_eq!(items, vec![ChatItem::notice("left lobby")]);
        assert_eq!(session.room, None);
    }

    #[test]
    fn server_named_room_wins() {
        let mut session = Session::default();
        session.settle(ok(
            Message::join_room("Lobby"),
            json!({ "status": "ok", "room": "lobby", "people": [] }),
        ));
        assert_eq!(session.room.as_deref(), Some("lobby"));
    }

    #[test]
    fn says_are_silent_and_whispers_echo() {
        let mut session = Session::default();
        assert!(session
            .settle(ok(Message::say("lobby", "hi"), json!({ "status": "ok" })))
            .is_empty());
        assert_eq!(
            session.settle(ok(Message::whisper("bob", "psst"), json!({ "status": "ok" }))),
            vec![ChatItem::WhisperOut {
                to: "bob".into(),
                msg: "psst".into()
            }]
        );
    }

    #[test]
    fn failures_become_notices() {
        let mut session = Session::default();
        let items = session.settle(Settled {
            request: Message::whisper("crush", "I love you!"),
            result: Err(ChatError::Rejected {
                kind: MessageType::WhisperRes,
                why: "crush is not here".to_string(),
            }),
            elapsed: Duration::ZERO,
        });
        assert_eq!(
            items,
            vec![ChatItem::notice("whisper-req failed: crush is not here")]
        );
        assert_eq!(session.room, None);
    }

    #[test]
    fn ping_reports_round_trip() {
        let mut session = Session::default();
        let items = session.settle(ok(Message::ping(), json!({ "status": "ok" })));
        assert_eq!(items, vec![ChatItem::notice("pong in 12.0 ms")]);
    }

    #[test]
    fn quit_stops_without_waiting_for_in_flight_requests() {
        assert!(!InputState::Quit.keep_running(3));
        assert!(InputState::Drained.keep_running(3));
        assert!(!InputState::Drained.keep_running(0));
        assert!(InputState::Open.keep_running(0));
    }
}

//! Parsing of typed chat lines.
//!
//! | Line | Request |
//! |---|---|
//! | `/login NICK` | `login-req` |
//! | `/join ROOM`, `/j ROOM` | `join-room-req` |
//! | `/leave [ROOM]` | `leave-room-req` (current room by default) |
//! | `/say ROOM TEXT`, `/s ROOM TEXT` | `say-req` |
//! | `/whisper NICK TEXT`, `/w NICK TEXT` | `whisper-req` |
//! | `/rooms` | `list-rooms-req` |
//! | `/ping` | `ping-req` |
//! | `TEXT` | `say-req` to the current room |

use chatline_protocol::Message;

pub const HELP: &str = "\
commands:
  /login NICK            log in
  /join ROOM, /j ROOM    join a room
  /leave [ROOM]          leave a room (default: current room)
  /say ROOM TEXT, /s     talk in a room
  /whisper NICK TEXT, /w whisper to someone
  /rooms                 list rooms
  /ping                  check the connection
  /help                  show this help
  /quit                  leave chatline
  TEXT                   talk in the current room";

/// What a typed line asks for.
#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    Request(Message),
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("nothing to send")]
    Empty,

    #[error("unknown command {0}; try /help")]
    UnknownCommand(String),

    #[error("usage: {0}")]
    Usage(&'static str),

    #[error("not in a room; /join ROOM first or use /say ROOM TEXT")]
    NoRoom,
}

/// Parse one line typed while `current_room` is the active room.
pub fn parse(text: &str, current_room: Option<&str>) -> Result<Input, ParseError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(ParseError::Empty);
    }

    if !text.starts_with('/') {
        let room = current_room.ok_or(ParseError::NoRoom)?;
        return Ok(Input::Request(Message::say(room, text)));
    }

    let (command, rest) = split_word(text).ok_or(ParseError::Empty)?;
    let message = match command {
        "/login" => Message::login(single(rest, "/login NICK")?),
        "/join" | "/j" => Message::join_room(single(rest, "/join ROOM")?),
        "/leave" => match split_word(rest) {
            None => Message::leave_room(current_room.ok_or(ParseError::NoRoom)?),
            Some(_) => Message::leave_room(single(rest, "/leave [ROOM]")?),
        },
        "/say" | "/s" => {
            let (room, msg) = with_text(rest, "/say ROOM TEXT")?;
            Message::say(room, msg)
        }
        "/whisper" | "/w" => {
            let (to, msg) = with_text(rest, "/whisper NICK TEXT")?;
            Message::whisper(to, msg)
        }
        "/rooms" => no_args(rest, "/rooms", Message::list_rooms())?,
        "/ping" => no_args(rest, "/ping", Message::ping())?,
        "/help" => return Ok(Input::Help),
        "/quit" => return Ok(Input::Quit),
        other => return Err(ParseError::UnknownCommand(other.to_string())),
    };
    Ok(Input::Request(message))
}

/// Split off the first whitespace-delimited word.
fn split_word(text: &str) -> Option<(&str, &str)> {
    let text = text.trim_start();
    if text.is_empty() {
        return None;
    }
    match text.find(char::is_whitespace) {
        Some(end) => Some((&text[..end], text[end..].trim_start())),
        None => Some((text, "")),
    }
}

fn single<'a>(rest: &'a str, usage: &'static str) -> Result<&'a str, ParseError> {
    match split_word(rest) {
        Some((word, "")) => Ok(word),
        _ => Err(ParseError::Usage(usage)),
    }
}

/// One word, then free text keeping its inner spacing.
fn with_text<'a>(rest: &'a str, usage: &'static str) -> Result<(&'a str, &'a str), ParseError> {
    match split_word(rest) {
        Some((word, text)) if !text.is_empty() => Ok((word, text)),
        _ => Err(ParseError::Usage(usage)),
    }
}

fn no_args(rest: &str, usage: &'static str, message: Message) -> Result<Message, ParseError> {
    if rest.is_empty() {
        Ok(message)
    } else {
        Err(ParseError::Usage(usage))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(text: &str, room: Option<&str>) -> Message {
        match parse(text, room) {
            Ok(Input::Request(message)) => message,
            other => panic!("expected a request for {text:?}, got {other:?}"),
        }
    }

    #[test]
    fn room_commands_and_aliases() {
        assert_eq!(request("/join lobby", None), Message::join_room("lobby"));
        assert_eq!(request("  /j   lobby ", None), Message::join_room("lobby"));
        assert_eq!(request("/leave rust", Some("lobby")), Message::leave_room("rust"));
        assert_eq!(request("/leave", Some("lobby")), Message::leave_room("lobby"));
        assert_eq!(parse("/leave", None), Err(ParseError::NoRoom));
    }

    #[test]
    fn text_commands_keep_inner_spacing() {
        assert_eq!(
            request("/say lobby Hello   chaps!", None),
            Message::say("lobby", "Hello   chaps!")
        );
        assert_eq!(
            request("/w  crush I love you!", None),
            Message::whisper("crush", "I love you!")
        );
        assert_eq!(
            request("/s lobby hi", None),
            Message::say("lobby", "hi")
        );
    }

    #[test]
    fn plain_text_goes_to_current_room() {
        assert_eq!(
            request("hello everyone", Some("lobby")),
            Message::say("lobby", "hello everyone")
        );
        assert_eq!(parse("hello", None), Err(ParseError::NoRoom));
    }

    #[test]
    fn login_rooms_and_ping() {
        assert_eq!(request("/login ada", None), Message::login("ada"));
        assert_eq!(request("/rooms", None), Message::list_rooms());
        assert_eq!(request("/ping", None), Message::ping());
        assert_eq!(parse("/help", None), Ok(Input::Help));
        assert_eq!(parse("/quit", None), Ok(Input::Quit));
    }

    #[test]
    fn malformed_lines_are_errors() {
        assert_eq!(parse("   ", None), Err(ParseError::Empty));
        assert_eq!(
            parse("/dance", None),
            Err(ParseError::UnknownCommand("/dance".to_string()))
        );
        assert_eq!(parse("/login", None), Err(ParseError::Usage("/login NICK")));
        assert_eq!(
            parse("/login two words", None),
            Err(ParseError::Usage("/login NICK"))
        );
        assert_eq!(
            parse("/whisper bob", None),
            Err(ParseError::Usage("/whisper NICK TEXT"))
        );
        assert_eq!(parse("/rooms now", None), Err(ParseError::Usage("/rooms")));
    }
}

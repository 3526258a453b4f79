//! Chat items: what the user sees in the chat log.

use std::fmt;

use chatline_protocol::{Feed, Message, ProtocolError};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ChatItem {
    /// Presence changes, request outcomes, connection status.
    Notice { text: String },
    WhisperIn { from: String, msg: String },
    WhisperOut { to: String, msg: String },
    /// Room chat, including the user's own lines echoed by the server.
    RoomTalk { room: String, who: String, msg: String },
}

impl ChatItem {
    pub fn notice(text: impl Into<String>) -> Self {
        ChatItem::Notice { text: text.into() }
    }

    /// Render a feed message.
    pub fn from_feed(message: &Message) -> Result<Self, ProtocolError> {
        Ok(match Feed::from_message(message)? {
            Feed::RoomChat(feed) => ChatItem::RoomTalk {
                room: feed.room,
                who: feed.who,
                msg: feed.msg,
            },
            Feed::People(feed) => {
                ChatItem::notice(format!("{} {} {}", feed.who, feed.action, feed.room))
            }
            Feed::Whisper(feed) => ChatItem::WhisperIn {
                from: feed.from,
                msg: feed.whisper,
            },
        })
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ChatItem::Notice { .. } => "notice",
            ChatItem::WhisperIn { .. } => "whisper-in",
            ChatItem::WhisperOut { .. } => "whisper-out",
            ChatItem::RoomTalk { .. } => "room-talk",
        }
    }
}

impl fmt::Display for ChatItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChatItem::Notice { text } => write!(f, "* {text}"),
            ChatItem::WhisperIn { from, msg } => write!(f, "{from} whispers: {msg}"),
            ChatItem::WhisperOut { to, msg } => write!(f, "you whisper to {to}: {msg}"),
            ChatItem::RoomTalk { room, who, msg } => write!(f, "[{room}] {who}: {msg}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use chatline_protocol::MessageType;
    use serde_json::json;

    use super::*;

    #[test]
    fn feeds_become_items() {
        let talk = Message::from_value(
            MessageType::RoomChatFeed,
            json!({ "who": "bob", "msg": "hi all", "room": "lobby" }),
        );
        assert_eq!(ChatItem::from_feed(&talk).unwrap().to_string(), "[lobby] bob: hi all");

        let joined = Message::from_value(
            MessageType::PeopleFeed,
            json!({ "who": "cy", "action": "JOINED ROOM", "room": "lobby" }),
        );
        assert_eq!(
            ChatItem::from_feed(&joined).unwrap(),
            ChatItem::notice("cy joined lobby")
        );

        let whisper = Message::from_value(
            MessageType::WhisperFeed,
            json!({ "from": "bob", "whisper": "psst" }),
        );
        let item = ChatItem::from_feed(&whisper).unwrap();
        assert_eq!(item.kind(), "whisper-in");
        assert_eq!(item.to_string(), "bob whispers: psst");
    }

    #[test]
    fn non_feed_is_an_error() {
        assert!(ChatItem::from_feed(&Message::ping()).is_err());
    }

    #[test]
    fn serializes_with_type_tag() {
        let item = ChatItem::WhisperOut {
            to: "bob".into(),
            msg: "psst".into(),
        };
        assert_eq!(
            serde_json::to_value(&item).unwrap(),
            json!({ "type": "whisper-out", "to": "bob", "msg": "psst" })
        );
    }
}

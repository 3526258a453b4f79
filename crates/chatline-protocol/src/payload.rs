//! Typed payload shapes, one per message type.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ProtocolError, Result};
use crate::message::{Message, MessageType};

/// Failure reason used when a `ko` response carries no `why`.
pub const NO_DETAILS: &str = "no details why request failed";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginRequest {
    pub nick: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListRoomsRequest {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinRoomRequest {
    pub room: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaveRoomRequest {
    pub room: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SayRequest {
    pub room: String,
    pub msg: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WhisperRequest {
    pub to: String,
    pub msg: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PingRequest {}

/// Status fields carried by every response payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseStatus {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub why: Option<String>,
}

/// How a response settles its request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusOutcome {
    Ok,
    Ko(String),
    Unsupported(String),
}

impl ResponseStatus {
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            why: None,
        }
    }

    pub fn ko(why: impl Into<String>) -> Self {
        Self {
            status: "ko".to_string(),
            why: Some(why.into()),
        }
    }

    /// Classify the status. Only lowercase `ok` and `ko` are recognized.
    pub fn outcome(&self) -> StatusOutcome {
        match self.status.as_str() {
            "ok" => StatusOutcome::Ok,
            "ko" => StatusOutcome::Ko(
                self.why
                    .clone()
                    .filter(|why| !why.is_empty())
                    .unwrap_or_else(|| NO_DETAILS.to_string()),
            ),
            other => StatusOutcome::Unsupported(other.to_string()),
        }
    }
}

impl StatusOutcome {
    /// Classify a raw response payload.
    ///
    /// Only `status` decides. A `why` that is not a non-empty string reads as
    /// [`NO_DETAILS`]; a missing `status` is reported as `missing`.
    pub fn from_payload(payload: &Value) -> Self {
        let why = || {
            payload
                .get("why")
                .and_then(Value::as_str)
                .filter(|why| !why.is_empty())
                .unwrap_or(NO_DETAILS)
                .to_string()
        };
        match payload.get("status") {
            Some(Value::String(status)) => match status.as_str() {
                "ok" => StatusOutcome::Ok,
                "ko" => StatusOutcome::Ko(why()),
                other => StatusOutcome::Unsupported(other.to_string()),
            },
            Some(other) => StatusOutcome::Unsupported(other.to_string()),
            None => StatusOutcome::Unsupported("missing".to_string()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListRoomsResponse {
    #[serde(default)]
    pub rooms: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinRoomResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room: Option<String>,
    #[serde(default)]
    pub people: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomChatFeed {
    pub who: String,
    pub msg: String,
    pub room: String,
}

/// What a `people-feed` reports about a room member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PeopleAction {
    JoinedRoom,
    LeftRoom,
    Other(String),
}

impl From<String> for PeopleAction {
    fn from(value: String) -> Self {
        match value.as_str() {
            "JOINED ROOM" => PeopleAction::JoinedRoom,
            "LEFT ROOM" => PeopleAction::LeftRoom,
            _ => PeopleAction::Other(value),
        }
    }
}

impl From<PeopleAction> for String {
    fn from(value: PeopleAction) -> Self {
        match value {
            PeopleAction::JoinedRoom => "JOINED ROOM".to_string(),
            PeopleAction::LeftRoom => "LEFT ROOM".to_string(),
            PeopleAction::Other(other) => other,
        }
    }
}

impl fmt::Display for PeopleAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PeopleAction::JoinedRoom => f.write_str("joined"),
            PeopleAction::LeftRoom => f.write_str("left"),
            PeopleAction::Other(other) => f.write_str(&other.to_lowercase()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeopleFeed {
    pub who: String,
    pub action: PeopleAction,
    pub room: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WhisperFeed {
    pub from: String,
    pub whisper: String,
}

/// A feed message narrowed by its type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Feed {
    RoomChat(RoomChatFeed),
    People(PeopleFeed),
    Whisper(WhisperFeed),
}

impl Feed {
    pub fn from_message(message: &Message) -> Result<Self> {
        match &message.kind {
            MessageType::RoomChatFeed => Ok(Feed::RoomChat(message.payload_as()?)),
            MessageType::PeopleFeed => Ok(Feed::People(message.payload_as()?)),
            MessageType::WhisperFeed => Ok(Feed::Whisper(message.payload_as()?)),
            other => Err(ProtocolError::UnexpectedType(other.clone())),
        }
    }
}

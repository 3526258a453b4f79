use std::fmt;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::category::{category, MessageCategory};
use crate::error::{ProtocolError, Result};
use crate::payload::{ResponseStatus, StatusOutcome};

/// Protocol message type tag.
///
/// Unknown tags are kept verbatim in [`MessageType::Other`] so that they still
/// decode and can be classified.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MessageType {
    LoginReq,
    LoginRes,
    ListRoomsReq,
    ListRoomsRes,
    JoinRoomReq,
    JoinRoomRes,
    LeaveRoomReq,
    LeaveRoomRes,
    SayReq,
    SayRes,
    WhisperReq,
    WhisperRes,
    PingReq,
    PingRes,
    RoomChatFeed,
    PeopleFeed,
    WhisperFeed,
    Other(String),
}

impl MessageType {
    /// Every known type, in protocol order.
    pub const KNOWN: [MessageType; 17] = [
        MessageType::LoginReq,
        MessageType::LoginRes,
        MessageType::ListRoomsReq,
        MessageType::ListRoomsRes,
        MessageType::JoinRoomReq,
        MessageType::JoinRoomRes,
        MessageType::LeaveRoomReq,
        MessageType::LeaveRoomRes,
        MessageType::SayReq,
        MessageType::SayRes,
        MessageType::WhisperReq,
        MessageType::WhisperRes,
        MessageType::PingReq,
        MessageType::PingRes,
        MessageType::RoomChatFeed,
        MessageType::PeopleFeed,
        MessageType::WhisperFeed,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            MessageType::LoginReq => "login-req",
            MessageType::LoginRes => "login-res",
            MessageType::ListRoomsReq => "list-rooms-req",
            MessageType::ListRoomsRes => "list-rooms-res",
            MessageType::JoinRoomReq => "join-room-req",
            MessageType::JoinRoomRes => "join-room-res",
            MessageType::LeaveRoomReq => "leave-room-req",
            MessageType::LeaveRoomRes => "leave-room-res",
            MessageType::SayReq => "say-req",
            MessageType::SayRes => "say-res",
            MessageType::WhisperReq => "whisper-req",
            MessageType::WhisperRes => "whisper-res",
            MessageType::PingReq => "ping-req",
            MessageType::PingRes => "ping-res",
            MessageType::RoomChatFeed => "room-chat-feed",
            MessageType::PeopleFeed => "people-feed",
            MessageType::WhisperFeed => "whisper-feed",
            MessageType::Other(other) => other,
        }
    }

    pub fn category(&self) -> MessageCategory {
        category(self.as_str())
    }

    /// The response type answering this request type.
    pub fn response_kind(&self) -> Option<MessageType> {
        let prefix = self.as_str().strip_suffix(crate::category::REQUEST_SUFFIX)?;
        Some(MessageType::from(format!(
            "{prefix}{}",
            crate::category::RESPONSE_SUFFIX
        )))
    }
}

impl From<&str> for MessageType {
    fn from(value: &str) -> Self {
        MessageType::KNOWN
            .iter()
            .find(|known| known.as_str() == value)
            .cloned()
            .unwrap_or_else(|| MessageType::Other(value.to_string()))
    }
}

impl From<String> for MessageType {
    fn from(value: String) -> Self {
        match MessageType::from(value.as_str()) {
            MessageType::Other(_) => MessageType::Other(value),
            known => known,
        }
    }
}

impl From<MessageType> for String {
    fn from(value: MessageType) -> Self {
        match value {
            MessageType::Other(other) => other,
            known => known.as_str().to_string(),
        }
    }
}

impl FromStr for MessageType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(MessageType::from(s))
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One protocol envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Correlation id. Present on requests and responses only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub kind: MessageType,
    #[serde(default = "empty_payload")]
    pub payload: Value,
}

fn empty_payload() -> Value {
    Value::Object(Map::new())
}

impl Message {
    /// Build a message from any serializable payload.
    pub fn new<P: Serialize>(kind: MessageType, payload: &P) -> Result<Self> {
        let payload = serde_json::to_value(payload)
            .map_err(|source| ProtocolError::Payload {
                kind: kind.clone(),
                source,
            })?;
        Ok(Self {
            id: None,
            kind,
            payload,
        })
    }

    /// Build a message from a raw JSON payload.
    pub fn from_value(kind: MessageType, payload: Value) -> Self {
        Self {
            id: None,
            kind,
            payload,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn login(nick: &str) -> Self {
        Self::from_value(MessageType::LoginReq, json!({ "nick": nick }))
    }

    pub fn list_rooms() -> Self {
        Self::from_value(MessageType::ListRoomsReq, empty_payload())
    }

    pub fn join_room(room: &str) -> Self {
        Self::from_value(MessageType::JoinRoomReq, json!({ "room": room }))
    }

    pub fn leave_room(room: &str) -> Self {
        Self::from_value(MessageType::LeaveRoomReq, json!({ "room": room }))
    }

    pub fn say(room: &str, msg: &str) -> Self {
        Self::from_value(MessageType::SayReq, json!({ "room": room, "msg": msg }))
    }

    pub fn whisper(to: &str, msg: &str) -> Self {
        Self::from_value(MessageType::WhisperReq, json!({ "to": to, "msg": msg }))
    }

    pub fn ping() -> Self {
        Self::from_value(MessageType::PingReq, empty_payload())
    }

    pub fn category(&self) -> MessageCategory {
        self.kind.category()
    }

    /// Narrow the payload to the shape `T`.
    pub fn payload_as<T: DeserializeOwned>(&self) -> Result<T> {
        T::deserialize(&self.payload).map_err(|source| ProtocolError::Payload {
            kind: self.kind.clone(),
            source,
        })
    }

    /// Read the `status`/`why` fields every response payload carries.
    pub fn status(&self) -> Result<ResponseStatus> {
        self.payload_as()
    }

    /// How this response settles its request. See [`StatusOutcome::from_payload`].
    pub fn outcome(&self) -> StatusOutcome {
        StatusOutcome::from_payload(&self.payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::LoginRequest;

    #[test]
    fn type_tags_round_trip_through_strings() {
        for kind in MessageType::KNOWN {
            let text = kind.to_string();
            assert_eq!(MessageType::from(text.as_str()), kind);
        }
        assert_eq!(
            MessageType::from("typing-feed"),
            MessageType::Other("typing-feed".to_string())
        );
    }

    #[test]
    fn response_kind_of_requests() {
        assert_eq!(
            MessageType::JoinRoomReq.response_kind(),
            Some(MessageType::JoinRoomRes)
        );
        assert_eq!(
            MessageType::Other("typing-req".into()).response_kind(),
            Some(MessageType::Other("typing-res".into()))
        );
        assert_eq!(MessageType::RoomChatFeed.response_kind(), None);
    }

    #[test]
    fn constructors_build_request_payloads() {
        let msg = Message::say("lobby", "hello chaps");
        assert_eq!(msg.kind, MessageType::SayReq);
        assert_eq!(msg.id, None);
        assert_eq!(msg.payload, json!({ "room": "lobby", "msg": "hello chaps" }));

        let login: LoginRequest = Message::login("ada").payload_as().unwrap();
        assert_eq!(login.nick, "ada");
    }

    #[test]
    fn new_serializes_typed_payload() {
        let msg = Message::new(
            MessageType::LoginReq,
            &LoginRequest {
                nick: "ada".into(),
            },
        )
        .unwrap();
        assert_eq!(msg, Message::login("ada"));
    }

    #[test]
    fn payload_as_reports_kind_on_mismatch() {
        let msg = Message::from_value(MessageType::LoginReq, json!({ "nick": 42 }));
        let err = msg.payload_as::<LoginRequest>().unwrap_err();
        assert!(matches!(
            err,
            ProtocolError::Payload { kind: MessageType::LoginReq, .. }
        ));
        assert!(err.to_string().starts_with("invalid login-req payload"));
    }

    #[test]
    fn status_reads_response_payload() {
        let msg = Message::from_value(
            MessageType::LoginRes,
            json!({ "status": "ko", "why": "nick taken" }),
        )
        .with_id("0");
        let status = msg.status().unwrap();
        assert_eq!(
            status.outcome(),
            StatusOutcome::Ko("nick taken".to_string())
        );
    }
}

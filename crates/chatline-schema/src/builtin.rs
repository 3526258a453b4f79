//! Schemas for the payloads of the chat protocol.

use chatline_protocol::MessageType;

const EMPTY_OBJECT: &str = r#"{ "type": "object" }"#;

const LOGIN_REQ: &str = r#"{
    "type": "object",
    "properties": { "nick": { "type": "string", "minLength": 1 } },
    "required": ["nick"]
}"#;

const ROOM_REQ: &str = r#"{
    "type": "object",
    "properties": { "room": { "type": "string", "minLength": 1 } },
    "required": ["room"]
}"#;

const SAY_REQ: &str = r#"{
    "type": "object",
    "properties": {
        "room": { "type": "string", "minLength": 1 },
        "msg": { "type": "string" }
    },
    "required": ["room", "msg"]
}"#;

const WHISPER_REQ: &str = r#"{
    "type": "object",
    "properties": {
        "to": { "type": "string", "minLength": 1 },
        "msg": { "type": "string" }
    },
    "required": ["to", "msg"]
}"#;

const STATUS_RES: &str = r#"{
    "type": "object",
    "properties": {
        "status": { "type": "string" },
        "why": { "type": "string" }
    },
    "required": ["status"]
}"#;

const LIST_ROOMS_RES: &str = r#"{
    "type": "object",
    "properties": {
        "status": { "type": "string" },
        "why": { "type": "string" },
        "rooms": { "type": "array", "items": { "type": "string" } }
    },
    "required": ["status"]
}"#;

const JOIN_ROOM_RES: &str = r#"{
    "type": "object",
    "properties": {
        "status": { "type": "string" },
        "why": { "type": "string" },
        "room": { "type": "string" },
        "people": { "type": "array", "items": { "type": "string" } }
    },
    "required": ["status"]
}"#;

const ROOM_CHAT_FEED: &str = r#"{
    "type": "object",
    "properties": {
        "who": { "type": "string" },
        "msg": { "type": "string" },
        "room": { "type": "string" }
    },
    "required": ["who", "msg", "room"]
}"#;

const PEOPLE_FEED: &str = r#"{
    "type": "object",
    "properties": {
        "who": { "type": "string" },
        "action": { "type": "string" },
        "room": { "type": "string" }
    },
    "required": ["who", "action", "room"]
}"#;

const WHISPER_FEED: &str = r#"{
    "type": "object",
    "properties": {
        "from": { "type": "string" },
        "whisper": { "type": "string" }
    },
    "required": ["from", "whisper"]
}"#;

/// Schema text for every known message type.
pub fn schemas() -> Vec<(MessageType, &'static str)> {
    vec![
        (MessageType::LoginReq, LOGIN_REQ),
        (MessageType::LoginRes, STATUS_RES),
        (MessageType::ListRoomsReq, EMPTY_OBJECT),
        (MessageType::ListRoomsRes, LIST_ROOMS_RES),
        (MessageType::JoinRoomReq, ROOM_REQ),
        (MessageType::JoinRoomRes, JOIN_ROOM_RES),
        (MessageType::LeaveRoomReq, ROOM_REQ),
        (MessageType::LeaveRoomRes, STATUS_RES),
        (MessageType::SayReq, SAY_REQ),
        (MessageType::SayRes, STATUS_RES),
        (MessageType::WhisperReq, WHISPER_REQ),
        (MessageType::WhisperRes, STATUS_RES),
        (MessageType::PingReq, EMPTY_OBJECT),
        (MessageType::PingRes, STATUS_RES),
        (MessageType::RoomChatFeed, ROOM_CHAT_FEED),
        (MessageType::PeopleFeed, PEOPLE_FEED),
        (MessageType::WhisperFeed, WHISPER_FEED),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_known_type_has_a_schema() {
        let covered: Vec<MessageType> = schemas().into_iter().map(|(kind, _)| kind).collect();
        for kind in MessageType::KNOWN {
            assert!(covered.contains(&kind), "missing builtin schema for {kind}");
        }
    }

    #[test]
    fn builtin_schemas_are_valid_json() {
        for (kind, text) in schemas() {
            assert!(
                serde_json::from_str::<serde_json::Value>(text).is_ok(),
                "schema for {kind} is not valid JSON"
            );
        }
    }
}

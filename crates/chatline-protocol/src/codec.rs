use crate::error::Result;
use crate::message::Message;

/// Encode a message into its wire text.
///
/// Wire format, one text frame per message:
/// ```text
/// {"id":"0","type":"login-req","payload":{"nick":"ada"}}
/// ```
/// `id` is omitted when absent.
pub fn encode(message: &Message) -> Result<String> {
    Ok(serde_json::to_string(message)?)
}

/// Decode one inbound text frame.
///
/// The payload is kept as raw JSON; narrow it with [`Message::payload_as`].
pub fn decode(text: &str) -> Result<Message> {
    Ok(serde_json::from_str(text)?)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::error::ProtocolError;
    use crate::message::MessageType;

    #[test]
    fn encode_omits_missing_id() {
        let text = encode(&Message::login("ada")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(
            value,
            json!({ "type": "login-req", "payload": { "nick": "ada" } })
        );
    }

    #[test]
    fn encode_includes_id_when_assigned() {
        let text = encode(&Message::ping().with_id("7")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["id"], json!("7"));
        assert_eq!(value["type"], json!("ping-req"));
    }

    #[test]
    fn decode_response() {
        let msg = decode(r#"{"id":"0","type":"login-res","payload":{"status":"ok"}}"#).unwrap();
        assert_eq!(msg.id.as_deref(), Some("0"));
        assert_eq!(msg.kind, MessageType::LoginRes);
        assert_eq!(msg.payload, json!({ "status": "ok" }));
    }

    #[test]
    fn decode_unknown_type_is_kept() {
        let msg = decode(r#"{"type":"ping","payload":{}}"#).unwrap();
        assert_eq!(msg.kind, MessageType::Other("ping".to_string()));
    }

    #[test]
    fn decode_missing_payload_defaults_to_empty_object() {
        let msg = decode(r#"{"type":"people-feed"}"#).unwrap();
        assert_eq!(msg.payload, json!({}));
    }

    #[test]
    fn decode_rejects_malformed_frames() {
        assert!(matches!(decode("not json"), Err(ProtocolError::Json(_))));
        assert!(matches!(
            decode(r#"{"payload":{}}"#),
            Err(ProtocolError::Json(_))
        ));
    }
}

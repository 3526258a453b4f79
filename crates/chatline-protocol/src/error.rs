use crate::message::MessageType;

/// Errors that can occur while encoding, decoding or narrowing messages.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// The frame is not a valid JSON envelope.
    #[error("malformed message: {0}")]
    Json(#[from] serde_json::Error),

    /// The payload does not have the shape its type requires.
    #[error("invalid {kind} payload: {source}")]
    Payload {
        kind: MessageType,
        source: serde_json::Error,
    },

    /// The message type cannot be narrowed to the requested shape.
    #[error("unexpected message type {0}")]
    UnexpectedType(MessageType),
}

pub type Result<T> = std::result::Result<T, ProtocolError>;

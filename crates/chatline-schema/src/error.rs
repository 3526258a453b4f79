use chatline_protocol::MessageType;

/// Errors that can occur during schema loading and validation.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// The schema file could not be loaded.
    #[error("failed to load schema: {0}")]
    LoadFailed(String),

    /// The schema could not be compiled.
    #[error("failed to compile schema for {kind}: {message}")]
    CompileFailed { kind: MessageType, message: String },

    /// The schema text is not valid JSON.
    #[error("schema is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// The payload failed schema validation.
    #[error("{kind} payload failed validation: {message}")]
    ValidationFailed { kind: MessageType, message: String },

    /// No schema registered for the given message type.
    #[error("no schema registered for {0}")]
    NoSchema(MessageType),
}

pub type Result<T> = std::result::Result<T, SchemaError>;

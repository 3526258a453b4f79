use std::time::Duration;

use chatline_protocol::MessageType;
use chatline_transport::CloseInfo;

/// Errors a request or connection operation can end with.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    /// The connection attempt failed, or closed before the request was sent.
    #[error("connection to {url} was closed: {close}")]
    ConnectionClosed { url: String, close: CloseInfo },

    /// The connection went down while the request was waiting for its response.
    #[error("{reason}")]
    ConnectionLost { reason: String },

    /// The server answered with status `ko`.
    #[error("{why}")]
    Rejected { kind: MessageType, why: String },

    /// The server answered with a status that is neither `ok` nor `ko`.
    #[error("unsupported response status: {status}")]
    UnsupportedStatus { status: String },

    /// No response arrived within the configured request timeout.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// The connection driver is gone.
    #[error("connection shut down")]
    Shutdown,

    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(#[from] chatline_transport::TransportError),

    /// Encoding or payload error.
    #[error("protocol error: {0}")]
    Protocol(#[from] chatline_protocol::ProtocolError),

    /// Schema validation error.
    #[cfg(feature = "schema")]
    #[error("schema validation error: {0}")]
    Schema(#[from] chatline_schema::SchemaError),
}

impl ChatError {
    /// True for errors caused by the connection going away rather than by
    /// the server's answer.
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            ChatError::ConnectionClosed { .. }
                | ChatError::ConnectionLost { .. }
                | ChatError::Shutdown
                | ChatError::Transport(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, ChatError>;

/// Errors that can occur in socket transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The endpoint URL is not a usable WebSocket address.
    #[error("invalid endpoint url {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    /// The socket task has gone; nothing more can be sent or received.
    #[error("socket closed")]
    Closed,
}

pub type Result<T> = std::result::Result<T, TransportError>;

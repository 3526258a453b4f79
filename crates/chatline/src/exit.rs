use std::fmt;
use std::io;

use chatline_connection::ChatError;
use chatline_protocol::ProtocolError;
use chatline_schema::SchemaError;
use chatline_transport::TransportError;

pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const TRANSPORT_ERROR: i32 = 3;
pub const PERMISSION_DENIED: i32 = 50;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
/// The server answered `ko`.
pub const REJECTED: i32 = 65;
pub const TIMEOUT: i32 = 124;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn usage(message: impl Into<String>) -> Self {
        Self::new(USAGE, message)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => TIMEOUT,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn transport_error(context: &str, err: TransportError) -> CliError {
    match err {
        TransportError::InvalidUrl { .. } => CliError::new(USAGE, format!("{context}: {err}")),
        other => CliError::new(TRANSPORT_ERROR, format!("{context}: {other}")),
    }
}

pub fn protocol_error(context: &str, err: ProtocolError) -> CliError {
    CliError::new(DATA_INVALID, format!("{context}: {err}"))
}

pub fn schema_error(context: &str, err: SchemaError) -> CliError {
    CliError::new(DATA_INVALID, format!("{context}: {err}"))
}

pub fn chat_error(context: &str, err: ChatError) -> CliError {
    match err {
        ChatError::Transport(err) => transport_error(context, err),
        ChatError::Protocol(err) => protocol_error(context, err),
        ChatError::Schema(err) => schema_error(context, err),
        ChatError::Rejected { .. } => CliError::new(REJECTED, format!("{context}: {err}")),
        ChatError::UnsupportedStatus { .. } => {
            CliError::new(DATA_INVALID, format!("{context}: {err}"))
        }
        ChatError::Timeout(_) => CliError::new(TIMEOUT, format!("{context}: {err}")),
        ChatError::ConnectionClosed { .. }
        | ChatError::ConnectionLost { .. }
        | ChatError::Shutdown => CliError::new(FAILURE, format!("{context}: {err}")),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chatline_protocol::MessageType;
    use chatline_transport::CloseInfo;

    use super::*;

    #[test]
    fn chat_errors_map_to_exit_codes() {
        let rejected = chat_error(
            "login failed",
            ChatError::Rejected {
                kind: MessageType::LoginRes,
                why: "nick taken".to_string(),
            },
        );
        assert_eq!(rejected.code, REJECTED);
        assert_eq!(rejected.message, "login failed: nick taken");

        let closed = chat_error(
            "send failed",
            ChatError::ConnectionClosed {
                url: "ws://localhost:8349/chat".to_string(),
                close: CloseInfo::abnormal("refused"),
            },
        );
        assert_eq!(closed.code, FAILURE);

        let timeout = chat_error("ping failed", ChatError::Timeout(Duration::from_secs(1)));
        assert_eq!(timeout.code, TIMEOUT);

        let unsupported = chat_error(
            "send failed",
            ChatError::UnsupportedStatus {
                status: "maybe".to_string(),
            },
        );
        assert_eq!(unsupported.code, DATA_INVALID);
    }

    #[test]
    fn invalid_url_is_a_usage_error() {
        let err = transport_error(
            "invalid --url",
            TransportError::InvalidUrl {
                url: "http://x".to_string(),
                reason: "scheme must be ws:// or wss://".to_string(),
            },
        );
        assert_eq!(err.code, USAGE);
        assert_eq!(transport_error("send", TransportError::Closed).code, TRANSPORT_ERROR);
    }
}

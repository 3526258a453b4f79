//! WebSocket chat client.
//!
//! chatline keeps one persistent socket to a chat backend and multiplexes
//! concurrent request/response exchanges and a server-push feed over it.
//!
//! # Crate Structure
//!
//! - [`transport`]: event-driven duplex socket (WebSocket, in-memory)
//! - [`protocol`]: message envelope, type taxonomy and JSON codec
//! - [`schema`]: optional JSON Schema validation (behind `schema` feature)
//! - [`connection`]: request correlation, feed fan-out, connection lifecycle

/// Re-export transport types.
pub mod transport {
    pub use chatline_transport::*;
}

/// Re-export protocol types.
pub mod protocol {
    pub use chatline_protocol::*;
}

/// Re-export schema types (requires `schema` feature).
#[cfg(feature = "schema")]
pub mod schema {
    pub use chatline_schema::*;
}

/// Re-export connection types.
pub mod connection {
    pub use chatline_connection::*;
}

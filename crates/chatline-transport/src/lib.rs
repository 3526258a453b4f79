//! Event-driven duplex text socket abstraction.
//!
//! A [`Socket`] is opened without blocking and then reports its lifecycle as
//! [`SocketEvent`]s: `Open`, inbound `Message` frames, `Error` and `Closed`.
//! This mirrors the browser WebSocket model the chat backend was built for.
//!
//! Two [`Connector`] implementations are provided:
//! - [`WsConnector`]: a real WebSocket client on tokio-tungstenite
//! - [`MemoryConnector`]: an in-process transport for tests and demos
//!
//! This is the lowest layer of chatline. Everything else builds on top of it.

pub mod endpoint;
pub mod error;
pub mod memory;
pub mod socket;
pub mod ws;

pub use endpoint::{Endpoint, DEFAULT_PATH, DEFAULT_PORT};
pub use error::{Result, TransportError};
pub use memory::{MemoryConnector, MemoryPeer, MemoryServer};
pub use socket::{CloseInfo, Connector, Outbound, Socket, SocketEvent};
pub use ws::WsConnector;

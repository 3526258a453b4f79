//! Connection and request-correlation layer of chatline.
//!
//! One [`Connection`] multiplexes many concurrent request/response exchanges
//! and the server-push feed over a single socket:
//!
//! - requests get a correlation id and wait for the response echoing it
//! - feed messages fan out to every [`FeedStream`] subscriber
//! - the connection status (`OPENING`, `OPEN`, `CLOSED`) is replayed to late
//!   [`StatusStream`] subscribers
//!
//! The socket is opened lazily by the first `send` and is never reopened on
//! its own. When it goes down every outstanding request fails once; the next
//! `send` starts a fresh attempt.
//!
//! [`ChatClient`] wraps a connection with typed chat operations.

pub mod chat;
pub mod config;
pub mod connection;
mod correlator;
pub mod error;
pub mod feed;
mod lifecycle;
pub mod status;
mod subscription;

pub use chat::{ChatClient, JoinedRoom};
pub use config::{
    ConnectionConfig, DEFAULT_FEED_CAPACITY, DEFAULT_SETTLE_DELAY, DEFAULT_STATUS_CAPACITY,
};
pub use connection::Connection;
pub use error::{ChatError, Result};
pub use feed::FeedStream;
pub use status::{ConnectionStatus, StatusStream};

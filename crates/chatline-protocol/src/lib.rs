//! Chat protocol envelope, message taxonomy and JSON codec.
//!
//! Every frame on the wire is one JSON text envelope:
//! `{ "id"?: string, "type": string, "payload": object }`.
//!
//! The `type` tag carries the category in its suffix:
//! - `-req` requests, sent by the client with a correlation id
//! - `-res` responses, echoing the id of the request they answer
//! - `-feed` server pushes, never carrying an id

pub mod category;
pub mod codec;
pub mod error;
pub mod message;
pub mod payload;

pub use category::{category, MessageCategory};
pub use codec::{decode, encode};
pub use error::{ProtocolError, Result};
pub use message::{Message, MessageType};
pub use payload::{
    Feed, JoinRoomRequest, JoinRoomResponse, LeaveRoomRequest, ListRoomsRequest,
    ListRoomsResponse, LoginRequest, PeopleAction, PeopleFeed, PingRequest, ResponseStatus,
    RoomChatFeed, SayRequest, StatusOutcome, WhisperFeed, WhisperRequest, NO_DETAILS,
};

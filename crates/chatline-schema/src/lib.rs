//! Optional JSON Schema validation of chat payloads.
//!
//! Validators are keyed by message type (`login-req`, `join-room-res`, ...).
//! [`SchemaRegistry::builtin`] covers every payload of the chat protocol;
//! custom schemas can be loaded from a directory of `<type>.schema.json` files.

pub mod builtin;
pub mod config;
pub mod error;
pub mod registry;
pub mod validator;

pub use config::RegistryConfig;
pub use error::{Result, SchemaError};
pub use registry::SchemaRegistry;

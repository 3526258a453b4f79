use std::fmt;

use crate::error::{Result, TransportError};

/// Well-known port of the chat backend.
pub const DEFAULT_PORT: u16 = 8349;

/// Well-known path of the chat backend.
pub const DEFAULT_PATH: &str = "/chat";

/// Resolved backend address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    url: String,
}

impl Endpoint {
    /// Derive the endpoint from the host serving the UI.
    pub fn discover(host: &str) -> Self {
        let host = host.trim();
        let host = if host.contains(':') && !host.starts_with('[') {
            format!("[{host}]")
        } else {
            host.to_string()
        };
        Self {
            url: format!("ws://{host}:{DEFAULT_PORT}{DEFAULT_PATH}"),
        }
    }

    /// Use an explicit `ws://` or `wss://` URL.
    pub fn from_url(url: impl Into<String>) -> Result<Self> {
        let url = url.into();
        let rest = url
            .strip_prefix("ws://")
            .or_else(|| url.strip_prefix("wss://"))
            .ok_or_else(|| TransportError::InvalidUrl {
                url: url.clone(),
                reason: "scheme must be ws:// or wss://".to_string(),
            })?;

        let authority = rest.split('/').next().unwrap_or_default();
        if authority.is_empty() {
            return Err(TransportError::InvalidUrl {
                url,
                reason: "missing host".to_string(),
            });
        }

        Ok(Self { url })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Default for Endpoint {
    fn default() -> Self {
        Self::discover("localhost")
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url)
    }
}

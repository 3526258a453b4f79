use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chatline_connection::{ChatClient, ConnectionConfig};
use chatline_protocol::MessageType;
use chatline_schema::{RegistryConfig, SchemaRegistry};
use chatline_transport::Endpoint;
use clap::{Args, Subcommand};

use crate::exit::{schema_error, transport_error, CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod chat;
pub mod listen;
pub mod ping;
pub mod send;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Interactive chat session reading lines from stdin.
    Chat(ChatArgs),
    /// Send one request and print the response.
    Send(SendArgs),
    /// Join rooms and print feed messages.
    Listen(ListenArgs),
    /// Measure request round trips.
    Ping(PingArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub async fn run(command: Command, connect: ConnectArgs, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Chat(args) => chat::run(args, connect.client()?, format).await,
        Command::Send(args) => send::run(args, connect.client()?, format).await,
        Command::Listen(args) => listen::run(args, connect.client()?, format).await,
        Command::Ping(args) => ping::run(args, connect.client()?, format).await,
        Command::Version(args) => version::run(args),
    }
}

/// Where and how to connect.
#[derive(Args, Debug, Clone)]
pub struct ConnectArgs {
    /// Backend URL (ws:// or wss://). Overrides --host.
    #[arg(long, env = "CHATLINE_URL", global = true)]
    pub url: Option<String>,
    /// Host serving the chat; the backend is ws://HOST:8349/chat.
    #[arg(long, env = "CHATLINE_HOST", default_value = "localhost", global = true)]
    pub host: String,
    /// Pause after the socket opens before requests go out (e.g. 500ms, 0ms).
    #[arg(long, default_value = "500ms", global = true)]
    pub settle_delay: String,
    /// Fail requests without a response after this long (e.g. 5s). Default: wait.
    #[arg(long, global = true)]
    pub request_timeout: Option<String>,
    /// Schema directory for message validation, or `builtin`.
    #[arg(long, value_name = "DIR", global = true)]
    pub validate: Option<PathBuf>,
    /// With --validate: reject undeclared fields and unknown message types.
    #[arg(long, requires = "validate", global = true)]
    pub strict_schemas: bool,
}

impl ConnectArgs {
    pub fn endpoint(&self) -> CliResult<Endpoint> {
        match &self.url {
            Some(url) => {
                Endpoint::from_url(url.as_str()).map_err(|err| transport_error("invalid --url", err))
            }
            None => Ok(Endpoint::discover(&self.host)),
        }
    }

    pub fn config(&self) -> CliResult<ConnectionConfig> {
        let mut config = ConnectionConfig::for_endpoint(self.endpoint()?);
        config.settle_delay = parse_duration(&self.settle_delay)?;
        config.request_timeout = self
            .request_timeout
            .as_deref()
            .map(parse_timeout)
            .transpose()?;
        config.schema_registry = self.schema_registry()?.map(Arc::new);
        Ok(config)
    }

    fn schema_registry(&self) -> CliResult<Option<SchemaRegistry>> {
        let Some(path) = &self.validate else {
            return Ok(None);
        };
        let config = if self.strict_schemas {
            RegistryConfig::strict()
        } else {
            RegistryConfig::default()
        };
        let registry = if path.as_os_str() == "builtin" {
            SchemaRegistry::builtin_with_config(config)
        } else {
            SchemaRegistry::from_directory_with_config(path, config)
        }
        .map_err(|err| schema_error("schema load failed", err))?;

        let unchecked: Vec<String> = MessageType::KNOWN
            .into_iter()
            .filter(|kind| !registry.has_schema(kind))
            .map(String::from)
            .collect();
        tracing::info!(
            schemas = registry.kinds().len(),
            strict = self.strict_schemas,
            "schema validation enabled"
        );
        if !unchecked.is_empty() {
            tracing::debug!(kinds = ?unchecked, "message types without a schema");
        }
        Ok(Some(registry))
    }

    pub fn client(&self) -> CliResult<ChatClient> {
        let config = self.config()?;
        tracing::debug!(endpoint = %config.endpoint, "connecting lazily");
        Ok(ChatClient::websocket(config))
    }
}

#[derive(Args, Debug)]
pub struct ChatArgs {
    /// Log in with this nick before reading input.
    #[arg(long)]
    pub nick: Option<String>,
    /// Join this room after logging in.
    #[arg(long)]
    pub join: Option<String>,
}

#[derive(Args, Debug)]
pub struct SendArgs {
    /// Log in with this nick first.
    #[arg(long)]
    pub nick: Option<String>,
    /// Room plain text is said to.
    #[arg(long)]
    pub room: Option<String>,
    /// The line to send, e.g. `/join lobby` or `/whisper bob hi`.
    #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
    pub line: Vec<String>,
}

#[derive(Args, Debug)]
pub struct ListenArgs {
    /// Nick to log in with.
    #[arg(long)]
    pub nick: String,
    /// Rooms to join (comma-separated).
    #[arg(long, value_delimiter = ',')]
    pub join: Vec<String>,
    /// Exit after printing N feed messages.
    #[arg(long)]
    pub count: Option<usize>,
}

#[derive(Args, Debug)]
pub struct PingArgs {
    /// Number of pings.
    #[arg(long, short = 'c', default_value = "1")]
    pub count: usize,
    /// Pause between pings (e.g. 1s, 250ms).
    #[arg(long, default_value = "1s")]
    pub interval: String,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

/// Parse `150ms`, `2s` or a bare number of seconds. Zero is allowed.
pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, millis) = if let Some(num) = input.strip_suffix("ms") {
        (num, true)
    } else if let Some(num) = input.strip_suffix('s') {
        (num, false)
    } else {
        (input, false)
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    Ok(if millis {
        Duration::from_millis(value)
    } else {
        Duration::from_secs(value)
    })
}

/// Like [`parse_duration`], but zero is rejected.
pub fn parse_timeout(input: &str) -> CliResult<Duration> {
    let duration = parse_duration(input)?;
    if duration.is_zero() {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }
    Ok(duration)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn connect(url: Option<&str>) -> ConnectArgs {
        ConnectArgs {
            url: url.map(str::to_string),
            host: "chat.example.org".to_string(),
            settle_delay: "0ms".to_string(),
            request_timeout: Some("5s".to_string()),
            validate: None,
            strict_schemas: false,
        }
    }

    #[test]
    fn parse_duration_seconds_and_millis() {
        assert_eq!(parse_duration("2s").unwrap(), Duration::from_secs(2));
        assert_eq!(parse_duration("150ms").unwrap(), Duration::from_millis(150));
        assert_eq!(parse_duration("3").unwrap(), Duration::from_secs(3));
        assert_eq!(parse_duration("0ms").unwrap(), Duration::ZERO);
    }

    #[test]
    fn parse_duration_rejects_garbage() {
        assert_eq!(parse_duration("").unwrap_err().code, USAGE);
        assert_eq!(parse_duration("soon").unwrap_err().code, USAGE);
        assert_eq!(parse_duration("-1s").unwrap_err().code, USAGE);
        assert_eq!(parse_timeout("0s").unwrap_err().code, USAGE);
    }

    #[test]
    fn endpoint_from_host_or_url() {
        assert_eq!(
            connect(None).endpoint().unwrap().url(),
            "ws://chat.example.org:8349/chat"
        );
        assert_eq!(
            connect(Some("wss://chat.example.org/ws")).endpoint().unwrap().url(),
            "wss://chat.example.org/ws"
        );
        assert_eq!(connect(Some("http://nope")).endpoint().unwrap_err().code, USAGE);
    }

    #[test]
    fn config_applies_timings() {
        let config = connect(None).config().unwrap();
        assert_eq!(config.settle_delay, Duration::ZERO);
        assert_eq!(config.request_timeout, Some(Duration::from_secs(5)));
        assert!(config.schema_registry.is_none());
    }

    #[test]
    fn builtin_schemas_are_selectable() {
        let mut args = connect(None);
        args.validate = Some(PathBuf::from("builtin"));
        args.strict_schemas = true;
        let config = args.config().unwrap();
        let registry = config.schema_registry.expect("registry should be loaded");
        assert!(registry.config().strict_mode);
    }
}

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use chatline_protocol::{Message, MessageCategory, MessageType};
use jsonschema::Validator;
use serde_json::{Map, Value};
use tracing::debug;

use crate::config::RegistryConfig;
use crate::error::{Result, SchemaError};
use crate::validator::validate_payload;

const SCHEMA_FILE_SUFFIX: &str = ".schema.json";

/// Message-type-keyed registry of compiled JSON Schema validators.
pub struct SchemaRegistry {
    validators: HashMap<MessageType, Validator>,
    config: RegistryConfig,
}

impl SchemaRegistry {
    /// Create an empty registry with default config.
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    /// Create an empty registry with explicit config.
    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            validators: HashMap::new(),
            config,
        }
    }

    /// Registry holding a schema for every payload of the chat protocol.
    pub fn builtin() -> Result<Self> {
        Self::builtin_with_config(RegistryConfig::default())
    }

    pub fn builtin_with_config(config: RegistryConfig) -> Result<Self> {
        let mut registry = Self::with_config(config);
        for (kind, schema) in crate::builtin::schemas() {
            registry.register(kind, schema)?;
        }
        Ok(registry)
    }

    /// Register a schema for a message type from a JSON string.
    ///
    /// Replaces any schema already registered for that type.
    pub fn register(&mut self, kind: MessageType, schema_json: &str) -> Result<()> {
        let schema: Value = serde_json::from_str(schema_json)?;
        self.register_value(kind, &schema)
    }

    /// Register a schema for a message type from a JSON value.
    pub fn register_value(&mut self, kind: MessageType, schema: &Value) -> Result<()> {
        let mut schema = schema.clone();
        if self.config.strict_mode {
            close_object_schemas(&mut schema);
        }

        let compiled =
            jsonschema::validator_for(&schema).map_err(|err| SchemaError::CompileFailed {
                kind: kind.clone(),
                message: err.to_string(),
            })?;

        self.validators.insert(kind, compiled);
        Ok(())
    }

    /// Load schemas from a directory.
    pub fn from_directory(path: &Path) -> Result<Self> {
        Self::from_directory_with_config(path, RegistryConfig::default())
    }

    /// Load schemas from a directory with explicit config.
    ///
    /// Files named `<type>.schema.json` are loaded for `<type>`, which must be a
    /// request, response or feed type. Other files are ignored.
    pub fn from_directory_with_config(path: &Path, config: RegistryConfig) -> Result<Self> {
        let mut registry = Self::with_config(config);
        let entries = std::fs::read_dir(path)
            .map_err(|err| SchemaError::LoadFailed(format!("{}: {err}", path.display())))?;

        for entry in entries {
            let entry = entry.map_err(|err| SchemaError::LoadFailed(err.to_string()))?;
            let file_name = entry.file_name().to_string_lossy().into_owned();
            let Some(kind) = kind_from_file_name(&file_name)? else {
                continue;
            };

            let entry_path = entry.path();
            let metadata = std::fs::symlink_metadata(&entry_path)
                .map_err(|err| SchemaError::LoadFailed(err.to_string()))?;
            if metadata.file_type().is_symlink() {
                return Err(SchemaError::LoadFailed(format!(
                    "refusing to load schema symlink: {file_name}"
                )));
            }
            if !metadata.is_file() {
                continue;
            }

            if registry.validators.len() >= registry.config.max_schemas_from_directory {
                return Err(SchemaError::LoadFailed(format!(
                    "schema count exceeds configured max ({})",
                    registry.config.max_schemas_from_directory
                )));
            }

            let content = read_limited(&entry_path, registry.config.max_schema_file_size)?;
            debug!(%kind, path = %entry_path.display(), "loading schema");
            registry.register(kind, &content)?;
        }

        Ok(registry)
    }

    /// Load from embedded schema strings.
    pub fn from_embedded(schemas: &[(MessageType, &str)]) -> Result<Self> {
        let mut registry = Self::new();
        for (kind, schema) in schemas {
            registry.register(kind.clone(), schema)?;
        }
        Ok(registry)
    }

    /// Validate a payload against the schema of its message type.
    pub fn validate_payload(&self, kind: &MessageType, payload: &Value) -> Result<()> {
        match self.validators.get(kind) {
            Some(validator) => validate_payload(kind, payload, validator),
            None if self.config.fail_on_missing_schema => Err(SchemaError::NoSchema(kind.clone())),
            None => Ok(()),
        }
    }

    /// Validate a message payload against the schema of its type.
    pub fn validate(&self, message: &Message) -> Result<()> {
        self.validate_payload(&message.kind, &message.payload)
    }

    /// Check if a message type has a registered schema.
    pub fn has_schema(&self, kind: &MessageType) -> bool {
        self.validators.contains_key(kind)
    }

    /// Message types that have registered schemas, sorted by name.
    pub fn kinds(&self) -> Vec<MessageType> {
        let mut kinds: Vec<MessageType> = self.validators.keys().cloned().collect();
        kinds.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        kinds
    }

    /// Get registry configuration.
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SchemaRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaRegistry")
            .field("kinds", &self.kinds())
            .field("config", &self.config)
            .finish()
    }
}

/// Map `<type>.schema.json` to its message type.
///
/// Returns `Ok(None)` for files that are not schema files at all.
fn kind_from_file_name(file_name: &str) -> Result<Option<MessageType>> {
    let Some(stem) = file_name.strip_suffix(SCHEMA_FILE_SUFFIX) else {
        return Ok(None);
    };

    let kind = MessageType::from(stem);
    if kind.category() == MessageCategory::Unknown {
        return Err(SchemaError::LoadFailed(format!(
            "unrecognized schema filename: {file_name}"
        )));
    }
    Ok(Some(kind))
}

fn read_limited(path: &Path, max_bytes: usize) -> Result<String> {
    let file = std::fs::File::open(path).map_err(|err| {
        SchemaError::LoadFailed(format!("failed opening schema {}: {err}", path.display()))
    })?;

    let read_limit = u64::try_from(max_bytes.saturating_add(1)).unwrap_or(u64::MAX);
    let mut content = String::new();
    file.take(read_limit)
        .read_to_string(&mut content)
        .map_err(|err| {
            SchemaError::LoadFailed(format!("failed reading schema {}: {err}", path.display()))
        })?;

    if content.len() > max_bytes {
        return Err(SchemaError::LoadFailed(format!(
            "schema file too large (max {max_bytes} bytes): {}",
            path.display()
        )));
    }
    Ok(content)
}

/// Keywords holding a map of subschemas.
const SCHEMA_MAP_KEYWORDS: [&str; 5] = [
    "properties",
    "patternProperties",
    "dependentSchemas",
    "$defs",
    "definitions",
];

/// Keywords holding one subschema or an array of them.
const SUBSCHEMA_KEYWORDS: [&str; 15] = [
    "propertyNames",
    "additionalProperties",
    "unevaluatedProperties",
    "items",
    "contains",
    "additionalItems",
    "unevaluatedItems",
    "not",
    "if",
    "then",
    "else",
    "prefixItems",
    "allOf",
    "anyOf",
    "oneOf",
];

/// Keywords that only make sense on object schemas.
const OBJECT_KEYWORDS: [&str; 8] = [
    "properties",
    "patternProperties",
    "additionalProperties",
    "unevaluatedProperties",
    "required",
    "dependentRequired",
    "dependentSchemas",
    "propertyNames",
];

/// Default `additionalProperties` to `false` on every object schema.
fn close_object_schemas(schema: &mut Value) {
    match schema {
        Value::Array(items) => items.iter_mut().for_each(close_object_schemas),
        Value::Object(map) => {
            if describes_object(map) {
                map.entry("additionalProperties")
                    .or_insert(Value::Bool(false));
            }
            for keyword in SCHEMA_MAP_KEYWORDS {
                if let Some(Value::Object(children)) = map.get_mut(keyword) {
                    children.values_mut().for_each(close_object_schemas);
                }
            }
            for keyword in SUBSCHEMA_KEYWORDS {
                if let Some(child) = map.get_mut(keyword) {
                    close_object_schemas(child);
                }
            }
        }
        _ => {}
    }
}

fn describes_object(map: &Map<String, Value>) -> bool {
    match map.get("type") {
        Some(Value::String(kind)) => kind == "object",
        Some(Value::Array(kinds)) => kinds.iter().any(|kind| kind == "object"),
        _ => OBJECT_KEYWORDS.iter().any(|keyword| map.contains_key(*keyword)),
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use serde_json::json;

    use super::*;

    const LOGIN_SCHEMA: &str = r#"{
        "type": "object",
        "properties": { "nick": { "type": "string" } },
        "required": ["nick"]
    }"#;

    fn make_temp_schema_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "chatline-schema-{tag}-{}-{}",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .expect("time should be after epoch")
                .as_nanos()
        ));
        std::fs::create_dir_all(&dir).expect("temp dir should be creatable");
        dir
    }

    fn write_schema(dir: &Path, file_name: &str, contents: &str) {
        std::fs::write(dir.join(file_name), contents.as_bytes()).expect("schema should be writable");
    }

    #[test]
    fn register_and_validate() {
        let mut registry = SchemaRegistry::new();
        registry.register(MessageType::LoginReq, LOGIN_SCHEMA).unwrap();

        assert!(registry.validate(&Message::login("ada")).is_ok());
        let bad = Message::from_value(MessageType::LoginReq, json!({ "nick": 7 }));
        assert!(matches!(
            registry.validate(&bad),
            Err(SchemaError::ValidationFailed { kind: MessageType::LoginReq, .. })
        ));
    }

    #[test]
    fn missing_schema_permissive_passes() {
        let registry = SchemaRegistry::new();
        assert!(registry.validate(&Message::ping()).is_ok());
    }

    #[test]
    fn missing_schema_strict_fails() {
        let registry = SchemaRegistry::with_config(RegistryConfig {
            fail_on_missing_schema: true,
            ..RegistryConfig::default()
        });
        assert!(matches!(
            registry.validate(&Message::ping()),
            Err(SchemaError::NoSchema(MessageType::PingReq))
        ));
    }

    #[test]
    fn strict_mode_rejects_undeclared_properties() {
        let mut strict = SchemaRegistry::with_config(RegistryConfig {
            strict_mode: true,
            ..RegistryConfig::default()
        });
        strict.register(MessageType::LoginReq, LOGIN_SCHEMA).unwrap();

        let extra = Message::from_value(
            MessageType::LoginReq,
            json!({ "nick": "ada", "password": "hunter2" }),
        );
        assert!(SchemaRegistry::from_embedded(&[(MessageType::LoginReq, LOGIN_SCHEMA)])
            .unwrap()
            .validate(&extra)
            .is_ok());
        assert!(matches!(
            strict.validate(&extra),
            Err(SchemaError::ValidationFailed { .. })
        ));
    }

    #[test]
    fn strict_mode_closes_nested_objects_without_type() {
        let mut schema = json!({
            "properties": {
                "nested": { "properties": { "v": { "type": "integer" } } }
            }
        });
        close_object_schemas(&mut schema);
        assert_eq!(schema["additionalProperties"], json!(false));
        assert_eq!(
            schema["properties"]["nested"]["additionalProperties"],
            json!(false)
        );
    }

    #[test]
    fn invalid_schema_fails_compile() {
        let mut registry = SchemaRegistry::new();
        assert!(matches!(
            registry.register(MessageType::LoginReq, r#"{"type":"not-a-type"}"#),
            Err(SchemaError::CompileFailed { .. })
        ));
    }

    #[test]
    fn builtin_accepts_protocol_messages() {
        let registry = SchemaRegistry::builtin().unwrap();
        assert_eq!(registry.kinds().len(), MessageType::KNOWN.len());

        assert!(registry.validate(&Message::whisper("bob", "psst")).is_ok());
        let feed = Message::from_value(
            MessageType::RoomChatFeed,
            json!({ "who": "ada", "msg": "hi", "room": "lobby" }),
        );
        assert!(registry.validate(&feed).is_ok());

        let broken_feed = Message::from_value(MessageType::PeopleFeed, json!({ "who": "ada" }));
        assert!(registry.validate(&broken_feed).is_err());
        let empty_nick = Message::login("");
        assert!(registry.validate(&empty_nick).is_err());
    }

    #[test]
    fn from_directory_loads_by_type_name() {
        let dir = make_temp_schema_dir("from-directory");
        write_schema(&dir, "login-req.schema.json", LOGIN_SCHEMA);
        write_schema(&dir, "notes.txt", "ignored");

        let registry = SchemaRegistry::from_directory(&dir).unwrap();
        assert_eq!(registry.kinds(), vec![MessageType::LoginReq]);
        assert!(registry.validate(&Message::login("ada")).is_ok());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn from_directory_rejects_unknown_type_names() {
        let dir = make_temp_schema_dir("unknown-name");
        write_schema(&dir, "command.schema.json", LOGIN_SCHEMA);

        let result = SchemaRegistry::from_directory(&dir);
        assert!(matches!(result, Err(SchemaError::LoadFailed(_))));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn from_directory_enforces_limits() {
        let dir = make_temp_schema_dir("limits");
        write_schema(&dir, "login-req.schema.json", LOGIN_SCHEMA);
        write_schema(&dir, "login-res.schema.json", LOGIN_SCHEMA);

        let too_many = SchemaRegistry::from_directory_with_config(
            &dir,
            RegistryConfig {
                max_schemas_from_directory: 1,
                ..RegistryConfig::default()
            },
        );
        assert!(matches!(too_many, Err(SchemaError::LoadFailed(_))));

        let too_large = SchemaRegistry::from_directory_with_config(
            &dir,
            RegistryConfig {
                max_schema_file_size: 8,
                ..RegistryConfig::default()
            },
        );
        assert!(matches!(too_large, Err(SchemaError::LoadFailed(_))));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_schema_is_rejected() {
        let dir = make_temp_schema_dir("symlink");
        let target = dir.join("target.json");
        std::fs::write(&target, LOGIN_SCHEMA.as_bytes()).unwrap();
        std::os::unix::fs::symlink(&target, dir.join("login-req.schema.json")).unwrap();

        let result = SchemaRegistry::from_directory(&dir);
        assert!(matches!(result, Err(SchemaError::LoadFailed(_))));

        let _ = std::fs::remove_dir_all(&dir);
    }
}

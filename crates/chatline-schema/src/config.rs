/// Default cap on `<type>.schema.json` files read from one directory.
///
/// The chat protocol has seventeen message types; the headroom leaves space
/// for server extensions.
pub const DEFAULT_MAX_SCHEMAS: usize = 64;

/// Default cap on the size of one schema file.
pub const DEFAULT_MAX_SCHEMA_FILE_SIZE: usize = 64 * 1024;

/// How a [`SchemaRegistry`](crate::SchemaRegistry) compiles and applies schemas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryConfig {
    /// Object schemas reject properties they do not declare.
    pub strict_mode: bool,
    /// Message types without a schema fail with `SchemaError::NoSchema`
    /// instead of passing unchecked.
    pub fail_on_missing_schema: bool,
    pub max_schemas_from_directory: usize,
    pub max_schema_file_size: usize,
}

impl RegistryConfig {
    /// Closed payloads and no unchecked message types.
    pub fn strict() -> Self {
        Self {
            strict_mode: true,
            fail_on_missing_schema: true,
            ..Self::default()
        }
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            strict_mode: false,
            fail_on_missing_schema: false,
            max_schemas_from_directory: DEFAULT_MAX_SCHEMAS,
            max_schema_file_size: DEFAULT_MAX_SCHEMA_FILE_SIZE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_permissive() {
        let config = RegistryConfig::default();
        assert!(!config.strict_mode);
        assert!(!config.fail_on_missing_schema);
        assert_eq!(config.max_schemas_from_directory, DEFAULT_MAX_SCHEMAS);
    }

    #[test]
    fn strict_keeps_limits() {
        let config = RegistryConfig::strict();
        assert!(config.strict_mode && config.fail_on_missing_schema);
        assert_eq!(config.max_schema_file_size, DEFAULT_MAX_SCHEMA_FILE_SIZE);
    }
}

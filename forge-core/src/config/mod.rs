mod loader;
pub mod secrets;
pub mod typed;
pub mod value;

use std::collections::HashMap;
use std::ops::Deref;
use std::path::Path;

pub use secrets::{DefaultSecretResolver, SecretResolver};
pub use typed::ConfigProperties;
pub use value::{ConfigValue, FromConfigValue};

/// Error type for configuration operations.
#[derive(Debug)]
pub enum ConfigError {
    /// The requested key was not found in the configuration.
    NotFound(String),
    /// The value could not be converted to the requested type.
    TypeMismatch { key: String, expected: &'static str },
    /// An I/O or YAML parsing error occurred while loading config files.
    Load(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::NotFound(key) => write!(f, "config key not found: {key}"),
            ConfigError::TypeMismatch { key, expected } => {
                write!(f, "config type mismatch for '{key}': expected {expected}")
            }
            ConfigError::Load(msg) => write!(f, "config load error: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Layered client configuration: compiled-in defaults, then a profile file,
/// then environment variables, highest priority last.
///
/// `ClientConfig` (= `ClientConfig<()>`) gives raw dotted-key access only.
/// `ClientConfig<T>` adds typed access to a validated settings struct via
/// `Deref<Target = T>`, mirroring the layered config object the rest of the
/// workspace's service crates use.
///
/// Resolution order (lowest to highest priority):
/// 1. Compiled-in defaults passed to [`ClientConfig::load`].
/// 2. `client.yaml` (base profile file, if present in the working directory).
/// 3. `client-{profile}.yaml` (profile override, if present).
/// 4. Environment variables of the form `FORGE_<SCREAMING_SNAKE_KEY>`
///    (`.` in a config key becomes `_`, e.g. `FORGE_RETRY_MAX_ATTEMPTS`
///    overrides `retry.max_attempts`).
///
/// Construction never panics on a missing optional key; missing required
/// keys surface a typed [`ConfigError`] from [`ClientConfig::get`].
#[derive(Debug, Clone)]
pub struct ClientConfig<T = ()> {
    values: HashMap<String, ConfigValue>,
    profile: String,
    typed: T,
}

const ENV_PREFIX: &str = "FORGE_";

impl ClientConfig {
    /// Load layered configuration for `profile`, starting from `defaults`.
    pub fn load(profile: &str, defaults: HashMap<String, ConfigValue>) -> Result<Self, ConfigError> {
        let mut values = defaults;

        loader::load_yaml_file(Path::new("client.yaml"), &mut values)?;
        let profile_path = format!("client-{profile}.yaml");
        loader::load_yaml_file(Path::new(&profile_path), &mut values)?;

        for (env_key, env_val) in std::env::vars() {
            if let Some(suffix) = env_key.strip_prefix(ENV_PREFIX) {
                let config_key = suffix.to_lowercase().replace('_', ".");
                values.insert(config_key, ConfigValue::String(env_val));
            }
        }

        Ok(ClientConfig {
            values,
            profile: profile.to_string(),
            typed: (),
        })
    }

    /// Create a config from a YAML string (useful for testing).
    pub fn from_yaml_str(yaml: &str, profile: &str) -> Result<Self, ConfigError> {
        let mut values = HashMap::new();
        loader::load_yaml_str(yaml, &mut values)?;
        Ok(ClientConfig {
            values,
            profile: profile.to_string(),
            typed: (),
        })
    }

    /// Create an empty config (useful for testing and as a builder base).
    pub fn empty() -> Self {
        ClientConfig {
            values: HashMap::new(),
            profile: "default".to_string(),
            typed: (),
        }
    }

    /// Set a value programmatically, overriding any lower layer.
    pub fn set(&mut self, key: &str, value: ConfigValue) {
        self.values.insert(key.to_string(), value);
    }

    /// Upgrade to a typed config by constructing `T` from the raw values.
    pub fn with_typed<C: ConfigProperties>(self) -> Result<ClientConfig<C>, ConfigError> {
        let typed = C::from_config(&self)?;
        Ok(ClientConfig {
            values: self.values,
            profile: self.profile,
            typed,
        })
    }
}

impl<T> ClientConfig<T> {
    /// Get a typed value for the given dot-separated key (raw access).
    pub fn get<V: FromConfigValue>(&self, key: &str) -> Result<V, ConfigError> {
        let value = self
            .values
            .get(key)
            .ok_or_else(|| ConfigError::NotFound(key.to_string()))?;
        V::from_config_value(value, key)
    }

    /// Get a typed value, returning a default if the key is missing.
    pub fn get_or<V: FromConfigValue>(&self, key: &str, default: V) -> V {
        self.get(key).unwrap_or(default)
    }

    /// Check whether a key exists in the config.
    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// The active profile name.
    pub fn profile(&self) -> &str {
        &self.profile
    }

    /// Get a reference to the typed config layer.
    pub fn typed(&self) -> &T {
        &self.typed
    }

    /// Downgrade to a raw (untyped) config, discarding the typed layer.
    pub fn raw(&self) -> ClientConfig {
        ClientConfig {
            values: self.values.clone(),
            profile: self.profile.clone(),
            typed: (),
        }
    }
}

impl<T> Deref for ClientConfig<T> {
    type Target = T;
    fn deref(&self) -> &T {
        &self.typed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_get_or_falls_back_to_default() {
        let config = ClientConfig::empty();
        assert_eq!(config.get_or::<i64>("retry.max_attempts", 3), 3);
    }

    #[test]
    fn from_yaml_str_parses_nested_keys() {
        let config = ClientConfig::from_yaml_str("retry:\n  max_attempts: 5\n", "test").unwrap();
        assert_eq!(config.get::<i64>("retry.max_attempts").unwrap(), 5);
    }

    struct CwdGuard {
        original: std::path::PathBuf,
    }

    impl CwdGuard {
        fn new(path: &Path) -> Self {
            let original = std::env::current_dir().unwrap();
            std::env::set_current_dir(path).unwrap();
            CwdGuard { original }
        }
    }

    impl Drop for CwdGuard {
        fn drop(&mut self) {
            let _ = std::env::set_current_dir(&self.original);
        }
    }

    #[test]
    #[serial_test::serial]
    fn env_vars_override_yaml_layer() {
        let tmp = tempfile::tempdir().unwrap();
        let _cwd = CwdGuard::new(tmp.path());
        std::fs::write("client.yaml", "region: us-west-2\nretry:\n  max_attempts: 3\n").unwrap();
        std::fs::write("client-prod.yaml", "retry:\n  max_attempts: 5\n").unwrap();
        std::env::set_var("FORGE_REGION", "us-east-1");

        let config = ClientConfig::load("prod", HashMap::new()).unwrap();

        // env layer (highest priority) beats both yaml files.
        assert_eq!(config.get::<String>("region").unwrap(), "us-east-1");
        // profile yaml (client-prod.yaml) beats the base yaml (client.yaml).
        assert_eq!(config.get::<i64>("retry.max_attempts").unwrap(), 5);

        std::env::remove_var("FORGE_REGION");
    }

    #[test]
    fn missing_key_is_a_typed_error() {
        let config = ClientConfig::empty();
        match config.get::<String>("region") {
            Err(ConfigError::NotFound(key)) => assert_eq!(key, "region"),
            other => panic!("expected NotFound, got {other:?}"),
        }
    }
}

// Configuration management for the Waypost router
//
// `ConfigManager` is the settings store the router reads group prefixes
// (`route_files`) and the routes directory (`routes_path`) from.

pub mod env;
pub mod error;
pub mod loader;
pub mod validation;

pub use env::EnvLoader;
pub use error::{ConfigError, Result};
pub use loader::{ConfigLoader, FileFormat};
pub use validation::{RouterConfig, Validate};

use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::debug;
use waypost_core::SettingsStore;

/// Main configuration manager
///
/// ```
/// use std::sync::Arc;
/// use waypost_config::ConfigManager;
/// use waypost_core::{HttpMethod, RouterService};
///
/// let config = ConfigManager::new();
/// config
///     .set("route_files", serde_json::json!({"api": {"use_prefix": true, "prefix": "api"}}))
///     .unwrap();
///
/// let router = RouterService::new().with_settings(Arc::new(config));
/// router.with_origin_group("api", |r| r.get("users", "index")).unwrap();
///
/// let table = router.routes().unwrap();
/// assert!(table.get(HttpMethod::GET, "api/users").is_some());
/// ```
#[derive(Clone, Default)]
pub struct ConfigManager {
    config: Arc<RwLock<HashMap<String, Value>>>,
    env_prefix: Option<String>,
}

impl ConfigManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with environment variable prefix
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            env_prefix: Some(prefix.into()),
            ..Self::default()
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Value>> {
        self.config.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Value>> {
        self.config.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Load configuration from environment variables
    pub fn load_env(&self) -> Result<()> {
        let loader = EnvLoader::new(self.env_prefix.clone());
        let vars = loader.load();
        debug!(count = vars.len(), prefix = ?self.env_prefix, "Loaded environment configuration");

        self.write().extend(vars);
        Ok(())
    }

    /// Load a `.env` file into the process environment, then read it
    pub fn load_dotenv(&self, path: Option<&Path>) -> Result<()> {
        match path {
            Some(path) => {
                dotenvy::from_path(path).map_err(|e| ConfigError::LoadError(e.to_string()))?;
            }
            None => {
                // a missing .env is fine
                dotenvy::dotenv().ok();
            }
        }
        self.load_env()
    }

    /// Load configuration from file. Top-level keys replace existing ones.
    pub fn load_file(&self, path: impl AsRef<Path>, format: FileFormat) -> Result<()> {
        let path = path.as_ref();
        let data = ConfigLoader::new(format).load_file(path)?;
        self.insert_document(data);
        debug!(path = %path.display(), ?format, "Loaded configuration file");
        Ok(())
    }

    /// Load configuration from file, picking the format from its extension.
    pub fn load_auto(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let format = ConfigLoader::auto(path)?.format();
        self.load_file(path, format)
    }

    fn insert_document(&self, data: Value) {
        if let Value::Object(map) = data {
            self.write().extend(map);
        }
    }

    /// Set a configuration value
    pub fn set<T: serde::Serialize>(&self, key: &str, value: T) -> Result<()> {
        let value =
            serde_json::to_value(value).map_err(|e| ConfigError::SerializationError(e.to_string()))?;

        self.write().insert(key.to_string(), value);
        Ok(())
    }

    /// Get a configuration value
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<T> {
        let value = self
            .read()
            .get(key)
            .cloned()
            .ok_or_else(|| ConfigError::KeyNotFound(key.to_string()))?;

        serde_json::from_value(value).map_err(|e| ConfigError::DeserializationError(e.to_string()))
    }

    /// Get a configuration value with default
    pub fn get_or<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        self.get(key).unwrap_or(default)
    }

    pub fn get_string(&self, key: &str) -> Result<String> {
        self.get(key)
    }

    pub fn get_bool(&self, key: &str) -> Result<bool> {
        self.get(key)
    }

    pub fn has(&self, key: &str) -> bool {
        self.read().contains_key(key)
    }

    /// All keys, sorted
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.read().keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Merge configuration from another manager; its values win
    pub fn merge(&self, other: &ConfigManager) {
        if Arc::ptr_eq(&self.config, &other.config) {
            return;
        }
        let other = other.read().clone();
        self.write().extend(other);
    }

    /// Deserialize the whole configuration into `T` and validate it
    pub fn load_validated<T: DeserializeOwned + Validate>(&self) -> Result<T> {
        let document = Value::Object(
            self.read()
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        );

        let validated: T = serde_json::from_value(document)
            .map_err(|e| ConfigError::DeserializationError(e.to_string()))?;
        validated.validate()?;
        Ok(validated)
    }

    /// The router settings, with defaults for anything not configured
    pub fn router_config(&self) -> Result<RouterConfig> {
        self.load_validated()
    }
}

impl std::fmt::Debug for ConfigManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigManager")
            .field("keys", &self.keys())
            .field("env_prefix", &self.env_prefix)
            .finish()
    }
}

impl SettingsStore for ConfigManager {
    fn get(&self, key: &str) -> std::result::Result<Option<Value>, waypost_core::Error> {
        Ok(self.read().get(key).cloned())
    }
}

// Settings consumed by the router

use crate::Error;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Key holding the per-group route file settings.
pub const ROUTE_FILES_KEY: &str = "route_files";

/// Key holding the directory route files are loaded from.
pub const ROUTES_PATH_KEY: &str = "routes_path";

/// Key holding whether registration closes once route files are loaded.
pub const SEAL_AFTER_LOAD_KEY: &str = "seal_after_load";

/// Read-only key/value settings source.
pub trait SettingsStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<Value>, Error>;
}

/// Prefix configuration for one route group (one route file).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupSettings {
    #[serde(default)]
    pub use_prefix: bool,
    #[serde(default)]
    pub prefix: Option<String>,
}

impl GroupSettings {
    pub fn prefixed(prefix: impl Into<String>) -> Self {
        Self {
            use_prefix: true,
            prefix: Some(prefix.into()),
        }
    }
}

/// Per-group settings, read from [`ROUTE_FILES_KEY`]. A missing key means no
/// group uses a prefix.
pub fn group_settings(store: &dyn SettingsStore) -> Result<HashMap<String, GroupSettings>, Error> {
    match store.get(ROUTE_FILES_KEY)? {
        Some(value) => serde_json::from_value(value)
            .map_err(|e| Error::Settings(format!("{}: {}", ROUTE_FILES_KEY, e))),
        None => Ok(HashMap::new()),
    }
}

/// In-memory settings.
#[derive(Debug, Clone, Default)]
pub struct MemorySettings {
    values: HashMap<String, Value>,
}

impl MemorySettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: Value) -> Self {
        self.values.insert(key.into(), value);
        self
    }

    /// Configure the prefix settings of one route group.
    pub fn with_group(mut self, group: &str, settings: GroupSettings) -> Self {
        let entry = self
            .values
            .entry(ROUTE_FILES_KEY.to_string())
            .or_insert_with(|| Value::Object(Default::default()));

        if let Value::Object(map) = entry {
            let value = serde_json::to_value(settings).unwrap_or(Value::Null);
            map.insert(group.to_string(), value);
        }
        self
    }
}

impl SettingsStore for MemorySettings {
    fn get(&self, key: &str) -> Result<Option<Value>, Error> {
        Ok(self.values.get(key).cloned())
    }
}

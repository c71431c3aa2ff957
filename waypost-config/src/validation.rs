// Router configuration and its validation

use crate::{ConfigError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use waypost_core::{GroupSettings, DEFAULT_ROUTES_PATH};

/// Trait for validating configuration
pub trait Validate {
    fn validate(&self) -> Result<()>;
}

/// Router settings as a typed document.
///
/// ```toml
/// routes_path = "routes"
/// seal_after_load = true
///
/// [route_files.api]
/// use_prefix = true
/// prefix = "api/v1"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouterConfig {
    #[serde(default = "default_routes_path")]
    pub routes_path: String,
    #[serde(default = "default_seal")]
    pub seal_after_load: bool,
    #[serde(default)]
    pub route_files: HashMap<String, GroupSettings>,
}

fn default_routes_path() -> String {
    DEFAULT_ROUTES_PATH.to_string()
}

fn default_seal() -> bool {
    true
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            routes_path: default_routes_path(),
            seal_after_load: default_seal(),
            route_files: HashMap::new(),
        }
    }
}

impl Validate for RouterConfig {
    /// Catch prefix misconfiguration before any route file runs.
    fn validate(&self) -> Result<()> {
        if self.routes_path.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "routes_path cannot be empty".to_string(),
            ));
        }

        let mut groups: Vec<&String> = self.route_files.keys().collect();
        groups.sort();

        for group in groups {
            let settings = &self.route_files[group];
            if settings.use_prefix && settings.prefix.is_none() {
                return Err(ConfigError::ValidationError(format!(
                    "route group {} uses a prefix but none is configured",
                    group
                )));
            }
        }

        Ok(())
    }
}

// Environment variable loading

use crate::{ConfigError, Result};
use serde_json::Value;
use std::collections::HashMap;
use std::env;

/// Environment variable loader
///
/// With a prefix, only variables starting with it are read and the prefix is
/// stripped: `WAYPOST_ROUTES_PATH` becomes `routes_path`.
#[derive(Debug, Clone, Default)]
pub struct EnvLoader {
    prefix: Option<String>,
}

impl EnvLoader {
    pub fn new(prefix: Option<String>) -> Self {
        Self { prefix }
    }

    /// Read variables from `vars` into lowercased configuration keys.
    pub fn collect<I>(&self, vars: I) -> HashMap<String, Value>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut config = HashMap::new();

        for (key, value) in vars {
            let key = match &self.prefix {
                Some(prefix) => match key.strip_prefix(prefix.as_str()) {
                    Some(rest) => rest.trim_start_matches('_').to_string(),
                    None => continue,
                },
                None => key,
            };

            if key.is_empty() {
                continue;
            }
            config.insert(key.to_lowercase(), parse_value(&value));
        }

        config
    }

    /// Read the process environment.
    pub fn load(&self) -> HashMap<String, Value> {
        self.collect(env::vars())
    }

    /// Read one variable by its unprefixed name.
    pub fn load_var(&self, key: &str) -> Result<String> {
        let full_key = match &self.prefix {
            Some(prefix) => format!("{}_{}", prefix, key.to_uppercase()),
            None => key.to_uppercase(),
        };

        env::var(&full_key).map_err(ConfigError::EnvError)
    }
}

// Flags arrive as text; everything else stays a string.
fn parse_value(value: &str) -> Value {
    match value {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        other => Value::String(other.to_string()),
    }
}

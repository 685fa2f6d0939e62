//! Configuration manager implementation
//!
//! Values resolve in three layers: built-in defaults, then an optional JSON
//! configuration file, then environment variables. The environment variable
//! for a key is its upper-cased name (`model_base_path` -> `MODEL_BASE_PATH`).

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde_json::Value;
use tracing::debug;

use common::error::{Error, Result};

use crate::defaults::default_values;

/// Layered key/value configuration for the TTS Orchestrator
#[derive(Debug, Clone)]
pub struct ConfigManager {
    /// Resolved configuration values
    values: HashMap<String, Value>,
}

impl ConfigManager {
    /// Creates a configuration manager from defaults and the environment
    pub fn new() -> Result<Self> {
        let mut manager = Self {
            values: default_values(),
        };
        manager.apply_env_overrides();
        Ok(manager)
    }

    /// Creates a configuration manager from defaults, a JSON file, and the environment
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let parsed: HashMap<String, Value> = serde_json::from_str(&raw)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;

        let mut manager = Self {
            values: default_values(),
        };
        manager.values.extend(parsed);
        manager.apply_env_overrides();
        Ok(manager)
    }

    /// Overrides a single value
    pub fn set(&mut self, key: &str, value: Value) {
        self.values.insert(key.to_string(), value);
    }

    fn apply_env_overrides(&mut self) {
        let keys: Vec<String> = self.values.keys().cloned().collect();
        for key in keys {
            let env_name = key.to_uppercase();
            if let Ok(raw) = std::env::var(&env_name) {
                // Numbers and booleans parse as JSON; anything else is a string
                let value = serde_json::from_str(&raw).unwrap_or(Value::String(raw));
                debug!(key = %key, env = %env_name, "configuration overridden from environment");
                self.values.insert(key, value);
            }
        }
    }

    fn get(&self, key: &str) -> Result<&Value> {
        self.values
            .get(key)
            .ok_or_else(|| Error::Config(format!("unknown configuration key: {}", key)))
    }

    /// Gets a string value
    pub fn get_str(&self, key: &str) -> Result<String> {
        match self.get(key)? {
            Value::String(s) => Ok(s.clone()),
            other => Err(Error::Config(format!(
                "configuration key {} is not a string: {}",
                key, other
            ))),
        }
    }

    /// Gets a filesystem path value
    pub fn get_path(&self, key: &str) -> Result<PathBuf> {
        self.get_str(key).map(PathBuf::from)
    }

    /// Gets an unsigned integer value
    pub fn get_u64(&self, key: &str) -> Result<u64> {
        match self.get(key)? {
            Value::Number(n) => n.as_u64().ok_or_else(|| {
                Error::Config(format!("configuration key {} is not a u64: {}", key, n))
            }),
            other => Err(Error::Config(format!(
                "configuration key {} is not a number: {}",
                key, other
            ))),
        }
    }

    /// Gets a boolean value
    pub fn get_bool(&self, key: &str) -> Result<bool> {
        match self.get(key)? {
            Value::Bool(b) => Ok(*b),
            other => Err(Error::Config(format!(
                "configuration key {} is not a boolean: {}",
                key, other
            ))),
        }
    }

    /// Gets a duration from a `*_secs` value
    pub fn get_duration_secs(&self, key: &str) -> Result<Duration> {
        self.get_u64(key).map(Duration::from_secs)
    }
}

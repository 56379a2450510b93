//! Application configuration.
//!
//! [`Config`] is a JSON object addressed by dotted keys: `set("db.host", "localhost")` creates
//! the `db` object when needed, and `get("db.host")` walks back down to it.
//!
//! Keys read by the framework itself:
//!
//! | key              | effect                                                         |
//! |------------------|----------------------------------------------------------------|
//! | `debug`          | failures propagate out of `run`, requests are traced            |
//! | `timezone`       | recorded by the default `run` hook                              |
//! | `error`          | panics inside handlers become failures                          |
//! | `disable_buffer` | no outer capture scope around the chain                         |

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", path.display())]
    Io { path: PathBuf, source: io::Error },

    #[error("invalid config value: {source}")]
    Parse {
        #[from]
        source: serde_json::Error,
    },

    #[error("config root must be a json object, got {kind}")]
    NotAnObject { kind: &'static str },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Config {
    values: Map<String, Value>,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_value(value: Value) -> Result<Self, ConfigError> {
        match value {
            Value::Object(values) => Ok(Self { values }),
            other => Err(ConfigError::NotAnObject { kind: kind_of(&other) }),
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Self::from_value(serde_json::from_str(json)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| ConfigError::Io { path: path.to_owned(), source })?;
        debug!(path = %path.display(), "loading config file");
        Self::from_json_str(&json)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        let mut segments = key.split('.');
        let first = segments.next()?;
        segments.try_fold(self.values.get(first)?, |value, segment| value.as_object()?.get(segment))
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    /// Deserializes the value at `key`; a missing key gives `Ok(None)`.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, ConfigError> {
        match self.get(key) {
            Some(value) => Ok(Some(T::deserialize(value)?)),
            None => Ok(None),
        }
    }

    /// Sets the value at `key`, replacing any non-object found on the way with an object.
    pub fn set(&mut self, key: &str, value: impl Into<Value>) -> &mut Self {
        let (parents, leaf) = match key.rsplit_once('.') {
            Some((parents, leaf)) => (Some(parents), leaf),
            None => (None, key),
        };

        let segments = parents.map(|p| p.split('.').collect::<Vec<_>>()).unwrap_or_default();
        insert_path(&mut self.values, &segments, leaf, value.into());
        self
    }

    /// True only when the value is exactly `true`.
    pub fn enabled(&self, key: &str) -> bool {
        matches!(self.get(key), Some(Value::Bool(true)))
    }

    /// True only when the value is exactly `false`.
    pub fn disabled(&self, key: &str) -> bool {
        matches!(self.get(key), Some(Value::Bool(false)))
    }

    /// Loose truthiness: missing, `null`, `false`, `0`, `""`, `"0"` and empty collections
    /// are false.
    pub fn is_truthy(&self, key: &str) -> bool {
        match self.get(key) {
            None | Some(Value::Null) => false,
            Some(Value::Bool(b)) => *b,
            Some(Value::Number(n)) => n.as_f64().is_some_and(|n| n != 0.0),
            Some(Value::String(s)) => !s.is_empty() && s != "0",
            Some(Value::Array(items)) => !items.is_empty(),
            Some(Value::Object(map)) => !map.is_empty(),
        }
    }

    #[inline]
    pub fn debug(&self) -> bool {
        self.is_truthy("debug")
    }

    pub fn values(&self) -> &Map<String, Value> {
        &self.values
    }
}

impl From<Map<String, Value>> for Config {
    fn from(values: Map<String, Value>) -> Self {
        Self { values }
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn insert_path(target: &mut Map<String, Value>, parents: &[&str], leaf: &str, value: Value) {
    let Some((first, rest)) = parents.split_first() else {
        target.insert(leaf.to_owned(), value);
        return;
    };

    match target.entry(*first).or_insert_with(|| Value::Object(Map::new())) {
        Value::Object(child) => insert_path(child, rest, leaf, value),
        slot => {
            let mut child = Map::new();
            insert_path(&mut child, rest, leaf, value);
            *slot = Value::Object(child);
        }
    }
}

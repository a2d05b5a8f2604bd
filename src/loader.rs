//! Configuration document loading
//!
//! Parses JSON or TOML sources into the nested document shape and tracks
//! provenance for file-backed layers (path plus SHA-256 digest of the raw
//! bytes). Loading is the only fallible surface of the crate; once a store
//! holds a document, every read degrades to a default instead of failing.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;

use crate::store::ConfigStore;

/// Loader errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("Parse error: {0}")]
    Parse(String),
}

/// A contributing file source with provenance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigSource {
    /// File path the layer was loaded from.
    pub path: String,

    /// SHA-256 digest of the raw file bytes, hex encoded.
    pub digest: String,
}

impl ConfigStore {
    /// Load a store from a JSON file.
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let (bytes, digest) = read_with_digest(path)?;
        let doc: Value = serde_json::from_slice(&bytes)
            .map_err(|e| ConfigError::Parse(format!("JSON parse error: {}", e)))?;
        let mut store = Self::from_value(doc);
        store.push_source(ConfigSource {
            path: path.to_string_lossy().to_string(),
            digest,
        });
        Ok(store)
    }

    /// Load a store from a TOML file.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let (bytes, digest) = read_with_digest(path)?;
        let contents = String::from_utf8(bytes)
            .map_err(|e| ConfigError::Parse(format!("Invalid UTF-8: {}", e)))?;
        let mut store = Self::from_toml_str(&contents)?;
        store.push_source(ConfigSource {
            path: path.to_string_lossy().to_string(),
            digest,
        });
        Ok(store)
    }

    /// Parse a store from a JSON string.
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let doc: Value = serde_json::from_str(s)
            .map_err(|e| ConfigError::Parse(format!("JSON parse error: {}", e)))?;
        Ok(Self::from_value(doc))
    }

    /// Parse a store from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let toml_value: toml::Value = toml::from_str(s)
            .map_err(|e| ConfigError::Parse(format!("TOML parse error: {}", e)))?;
        Ok(Self::from_value(toml_to_json(toml_value)))
    }
}

fn read_with_digest(path: &Path) -> Result<(Vec<u8>, String), ConfigError> {
    let bytes = fs::read(path).map_err(|e| ConfigError::Io(e.to_string()))?;

    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    let digest = hex::encode(hasher.finalize());

    Ok((bytes, digest))
}

/// Convert a TOML value into the JSON document shape.
/// Datetimes become their string form so the date getters can parse them.
fn toml_to_json(toml: toml::Value) -> Value {
    match toml {
        toml::Value::String(s) => Value::String(s),
        toml::Value::Integer(i) => Value::Number(i.into()),
        toml::Value::Float(f) => serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        toml::Value::Boolean(b) => Value::Bool(b),
        toml::Value::Datetime(dt) => Value::String(dt.to_string()),
        toml::Value::Array(arr) => Value::Array(arr.into_iter().map(toml_to_json).collect()),
        toml::Value::Table(table) => {
            let map: serde_json::Map<String, Value> = table
                .into_iter()
                .map(|(k, v)| (k, toml_to_json(v)))
                .collect();
            Value::Object(map)
        }
    }
}

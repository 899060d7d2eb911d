//! Layered YAML configuration loading with canonical-JSON audit hashing.
//!
//! Directly grounded on the reference workspace's
//! `load_layered_yaml`/`deep_merge`/`canonicalize_json` — reused near
//! verbatim — plus a secret-key deny-list check grounded on the
//! reference's `secrets.rs` exclusion idiom, generalized from "redact
//! secret values in Debug output" to "refuse to hash a config that
//! contains one at all" since this core never stores credentials.

use std::fs;
use std::path::Path;

use serde_json::Value;
use sha2::{Digest, Sha256};

#[derive(Debug)]
pub enum ConfigError {
    Io { path: String, source: std::io::Error },
    Yaml { path: String, source: serde_yaml::Error },
    YamlToJson { path: String, source: serde_json::Error },
    SecretKeyDetected { key: String },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "read config '{path}': {source}"),
            Self::Yaml { path, source } => write!(f, "parse yaml '{path}': {source}"),
            Self::YamlToJson { path, source } => {
                write!(f, "yaml->json conversion for '{path}': {source}")
            }
            Self::SecretKeyDetected { key } => {
                write!(f, "config contains secret-shaped key '{key}'; refusing to hash")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Key names (case-insensitive substring match) that must never appear in
/// a hashed config — this core is out of scope for credential storage, so
/// their presence is a configuration mistake, not a value to redact.
const SECRET_KEY_DENYLIST: &[&str] = &[
    "api_key",
    "api_secret",
    "password",
    "secret",
    "token",
    "private_key",
    "db_url",
    "database_url",
];

fn is_secret_like(key: &str) -> bool {
    let lower = key.to_ascii_lowercase();
    SECRET_KEY_DENYLIST.iter().any(|d| lower.contains(d))
}

fn find_secret_key(value: &Value) -> Option<String> {
    match value {
        Value::Object(map) => {
            for (k, v) in map {
                if is_secret_like(k) {
                    return Some(k.clone());
                }
                if let Some(found) = find_secret_key(v) {
                    return Some(found);
                }
            }
            None
        }
        Value::Array(items) => items.iter().find_map(find_secret_key),
        _ => None,
    }
}

#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config_json: Value,
    pub canonical_json: String,
    pub config_hash: String,
}

/// Loads and deep-merges YAML files in order (later files override
/// earlier ones), then canonicalizes the result to sorted-key JSON and
/// SHA-256 hashes it.
pub fn load_layered_yaml(paths: &[impl AsRef<Path>]) -> Result<LoadedConfig, ConfigError> {
    let mut merged = Value::Object(Default::default());

    for path in paths {
        let path_str = path.as_ref().display().to_string();
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path_str.clone(),
            source,
        })?;
        let yaml_val: serde_yaml::Value =
            serde_yaml::from_str(&raw).map_err(|source| ConfigError::Yaml {
                path: path_str.clone(),
                source,
            })?;
        let json_val =
            serde_json::to_value(yaml_val).map_err(|source| ConfigError::YamlToJson {
                path: path_str.clone(),
                source,
            })?;
        deep_merge(&mut merged, json_val);
    }

    if let Some(key) = find_secret_key(&merged) {
        return Err(ConfigError::SecretKeyDetected { key });
    }

    let canonical = canonicalize_json(&merged);
    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    let hash = hex::encode(hasher.finalize());

    Ok(LoadedConfig {
        config_json: merged,
        canonical_json: canonical,
        config_hash: hash,
    })
}

/// Deep-merge: objects merge recursively; arrays and scalars are
/// overwritten wholesale by the later source.
fn deep_merge(dst: &mut Value, src: Value) {
    match (dst, src) {
        (Value::Object(dst_map), Value::Object(src_map)) => {
            for (k, v) in src_map {
                match dst_map.get_mut(&k) {
                    Some(existing) => deep_merge(existing, v),
                    None => {
                        dst_map.insert(k, v);
                    }
                }
            }
        }
        (dst_slot, src_val) => {
            *dst_slot = src_val;
        }
    }
}

fn canonicalize_json(v: &Value) -> String {
    let sorted = sort_keys(v);
    serde_json::to_string(&sorted).expect("json serialization must not fail")
}

fn sort_keys(v: &Value) -> Value {
    match v {
        Value::Object(map) => {
            let mut keys: Vec<_> = map.keys().cloned().collect();
            keys.sort();
            let mut new = serde_json::Map::new();
            for k in keys {
                new.insert(k.clone(), sort_keys(&map[&k]));
            }
            Value::Object(new)
        }
        Value::Array(arr) => Value::Array(arr.iter().map(sort_keys).collect()),
        _ => v.clone(),
    }
}

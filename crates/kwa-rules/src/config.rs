use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read rules {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parse rules document: {0}")]
    Parse(String),
    #[error("rules document must be a mapping at the top level")]
    NotAMapping,
    #[error("rule configuration has no required_markers list")]
    MissingRequiredMarkers,
    #[error("invalid pattern in {field}: {pattern}")]
    InvalidPattern {
        field: String,
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DocumentFormat {
    Yaml,
    Json,
}

impl DocumentFormat {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => DocumentFormat::Json,
            _ => DocumentFormat::Yaml,
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RequiredMarkers {
    #[serde(default)]
    pub top: Vec<String>,
    #[serde(default)]
    pub bottom: Vec<String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScriptRules {
    pub open_tag: Option<String>,
    pub close_tag: Option<String>,
    pub requires_iife: bool,
    pub requires_class_name: Option<String>,
    pub requires_constructor_assets_pattern: Option<String>,
    pub requires_build_method: Option<String>,
    pub requires_print: Option<String>,
    pub client_dom_line_pattern: Option<String>,
    pub client_dom_line_must_be_commented: bool,
    pub forbid_globals: Vec<String>,
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    /// A token is known when it starts with any valid prefix.
    #[default]
    Prefix,
    /// A token must also appear, modulo `<id>`, in `known_patterns`.
    Exact,
}

/// `before` must appear ahead of `after` whenever both are in one chain.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct OrderRule {
    pub before: String,
    pub after: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct KeywordRules {
    pub sigil: char,
    pub modifier_prefix: char,
    pub match_mode: MatchMode,
    pub valid_prefixes: Option<Vec<String>>,
    pub known_patterns: Option<Vec<String>>,
    pub modifier_order: Vec<OrderRule>,
    pub examples: Vec<String>,
}

impl Default for KeywordRules {
    fn default() -> Self {
        Self {
            sigil: '%',
            modifier_prefix: '^',
            match_mode: MatchMode::Prefix,
            valid_prefixes: None,
            known_patterns: None,
            modifier_order: vec![],
            examples: vec![],
        }
    }
}

/// The rule configuration document after lenient extraction.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RuleConfig {
    pub required_markers: RequiredMarkers,
    pub script: ScriptRules,
    pub keywords: KeywordRules,
}

impl RuleConfig {
    /// Extract a config from a parsed document. Malformed fields are dropped with a warning;
    /// only a missing marker list is fatal.
    pub fn from_value(doc: &Value) -> Result<Self, ConfigError> {
        let root = doc.as_object().ok_or(ConfigError::NotAMapping)?;

        let markers = root
            .get("required_markers")
            .and_then(Value::as_object)
            .ok_or(ConfigError::MissingRequiredMarkers)?;
        let top: Option<Vec<String>> = field(markers, "top", "required_markers");
        let bottom: Option<Vec<String>> = field(markers, "bottom", "required_markers");
        if top.is_none() && bottom.is_none() {
            return Err(ConfigError::MissingRequiredMarkers);
        }
        let required_markers = RequiredMarkers {
            top: top.unwrap_or_default(),
            bottom: bottom.unwrap_or_default(),
        };

        let empty = Map::new();
        let s = section(root, "script").unwrap_or(&empty);
        let script = ScriptRules {
            open_tag: field(s, "open_tag", "script"),
            close_tag: field(s, "close_tag", "script"),
            requires_iife: field(s, "requires_iife", "script").unwrap_or(false),
            requires_class_name: field(s, "requires_class_name", "script"),
            requires_constructor_assets_pattern: field(s, "requires_constructor_assets_pattern", "script"),
            requires_build_method: field(s, "requires_build_method", "script"),
            requires_print: field(s, "requires_print", "script"),
            client_dom_line_pattern: field(s, "client_dom_line_pattern", "script"),
            client_dom_line_must_be_commented: field(s, "client_dom_line_must_be_commented", "script").unwrap_or(true),
            forbid_globals: field(s, "forbid_globals", "script").unwrap_or_default(),
        };

        let k = section(root, "keywords").unwrap_or(&empty);
        let defaults = KeywordRules::default();
        let keywords = KeywordRules {
            sigil: field(k, "sigil", "keywords").unwrap_or(defaults.sigil),
            modifier_prefix: field(k, "modifier_prefix", "keywords").unwrap_or(defaults.modifier_prefix),
            match_mode: field(k, "match_mode", "keywords").unwrap_or_default(),
            valid_prefixes: field(k, "valid_prefixes", "keywords"),
            known_patterns: field(k, "known_patterns", "keywords"),
            modifier_order: field(k, "modifier_order", "keywords").unwrap_or_default(),
            examples: field(k, "examples", "keywords").unwrap_or_default(),
        };

        Ok(Self {
            required_markers,
            script,
            keywords,
        })
    }
}

fn section<'a>(root: &'a Map<String, Value>, key: &str) -> Option<&'a Map<String, Value>> {
    let v = root.get(key)?;
    if v.is_null() {
        return None;
    }
    match v.as_object() {
        Some(map) => Some(map),
        None => {
            warn!(section = key, "rule section is not a mapping; its checks are disabled");
            None
        }
    }
}

fn field<T: DeserializeOwned>(map: &Map<String, Value>, key: &str, scope: &str) -> Option<T> {
    let v = map.get(key)?;
    if v.is_null() {
        return None;
    }
    match serde_json::from_value(v.clone()) {
        Ok(t) => Some(t),
        Err(e) => {
            warn!(field = %format!("{scope}.{key}"), error = %e, "malformed rule field; check disabled");
            None
        }
    }
}

pub fn parse_document(text: &str, format: DocumentFormat) -> Result<Value, ConfigError> {
    match format {
        DocumentFormat::Yaml => serde_yaml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string())),
        DocumentFormat::Json => serde_json::from_str(text).map_err(|e| ConfigError::Parse(e.to_string())),
    }
}

pub fn read_document(path: &Path) -> Result<Value, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_document(&text, DocumentFormat::from_path(path))
}

/// Recursively sort object keys for stable hashing.
fn sort_json(v: Value) -> Value {
    match v {
        Value::Object(map) => {
            let mut keys: Vec<_> = map.keys().cloned().collect();
            keys.sort();
            let mut new_map = Map::new();
            for k in keys {
                let child = map.get(&k).cloned().unwrap_or(Value::Null);
                new_map.insert(k, sort_json(child));
            }
            Value::Object(new_map)
        }
        Value::Array(arr) => Value::Array(arr.into_iter().map(sort_json).collect()),
        other => other,
    }
}

/// SHA-256 over the canonical JSON form of a rules document.
pub fn fingerprint(doc: &Value) -> String {
    let canonical = sort_json(doc.clone());
    let mut hasher = Sha256::new();
    hasher.update(canonical.to_string().as_bytes());
    hex::encode(hasher.finalize())
}

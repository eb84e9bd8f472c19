//! Source configuration.
//!
//! The configuration file is a JSON object with a `default` object holding
//! shared field values and a `configs` array with one object per source.
//! Each entry is merged over `default` (entry keys win) into a
//! [`SourceConfig`].

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Template used when neither `default` nor the entry names one.
pub const DEFAULT_PATTERN: &str = "{?},{x},{y},{z}";

/// Description of one input file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourceConfig {
    pub file_path: PathBuf,
    #[serde(default)]
    pub source_xyz: [f64; 3],
    #[serde(default = "default_pattern")]
    pub pattern: String,
    #[serde(default = "default_skip_first_line")]
    pub skip_first_line: bool,
}

fn default_pattern() -> String {
    DEFAULT_PATTERN.to_string()
}

fn default_skip_first_line() -> bool {
    true
}

impl SourceConfig {
    /// Config for `file_path` with every other field defaulted.
    pub fn new(file_path: impl Into<PathBuf>) -> Self {
        Self {
            file_path: file_path.into(),
            source_xyz: [0.0; 3],
            pattern: default_pattern(),
            skip_first_line: default_skip_first_line(),
        }
    }

    /// Set the per-source offset.
    pub fn with_source_xyz(mut self, source_xyz: [f64; 3]) -> Self {
        self.source_xyz = source_xyz;
        self
    }

    /// Set the line template.
    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = pattern.into();
        self
    }

    /// Set whether the first line is a header.
    pub fn with_skip_first_line(mut self, skip_first_line: bool) -> Self {
        self.skip_first_line = skip_first_line;
        self
    }

    /// Build a config from an entry merged over shared defaults.
    pub fn from_json(
        entry: &Map<String, JsonValue>,
        defaults: &Map<String, JsonValue>,
    ) -> Result<Self, serde_json::Error> {
        let mut merged = defaults.clone();
        merged.extend(entry.iter().map(|(k, v)| (k.clone(), v.clone())));
        serde_json::from_value(JsonValue::Object(merged))
    }
}

/// Parse the configuration document into the ordered list of sources.
pub fn parse_configs(text: &str) -> Result<Vec<SourceConfig>, ConfigError> {
    let root: JsonValue = serde_json::from_str(text)?;
    let JsonValue::Object(root) = root else {
        return Err(ConfigError::NotAnObject);
    };

    let defaults = match root.get("default") {
        Some(JsonValue::Object(defaults)) => defaults,
        Some(_) => {
            return Err(ConfigError::WrongType {
                key: "default",
                expected: "an object",
            });
        }
        None => return Err(ConfigError::MissingKey("default")),
    };
    let entries = match root.get("configs") {
        Some(JsonValue::Array(entries)) => entries,
        Some(_) => {
            return Err(ConfigError::WrongType {
                key: "configs",
                expected: "an array",
            });
        }
        None => return Err(ConfigError::MissingKey("configs")),
    };

    let empty = Map::new();
    entries
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            let entry = match entry {
                JsonValue::Object(entry) => entry,
                JsonValue::Null => &empty,
                other => {
                    return Err(ConfigError::InvalidEntry {
                        index: i + 1,
                        source: serde::de::Error::custom(format!(
                            "expected an object, found {other}"
                        )),
                    });
                }
            };
            SourceConfig::from_json(entry, defaults)
                .map_err(|source| ConfigError::InvalidEntry { index: i + 1, source })
        })
        .collect()
}

/// Read and parse a configuration file.
#[tracing::instrument(skip_all, fields(path = %path.display()))]
pub fn load_configs(path: &Path) -> Result<Vec<SourceConfig>, ConfigError> {
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let configs = parse_configs(&text)?;
    debug!("Read {} source config(s)", configs.len());
    Ok(configs)
}

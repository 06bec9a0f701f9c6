pub mod backup;
pub mod config;
pub mod defaults;
pub mod definitions;
pub mod source;

use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;

pub use backup::YamlBackup;
pub use config::PluginConfig;
pub use definitions::{CategoryDefinition, TagDefinition};
pub use source::ConfigSource;

pub const CONFIG_FILE: &str = "config.yml";
pub const CATEGORIES_FILE: &str = "categories.yml";
pub const TAGS_FILE: &str = "tags.yml";

#[derive(Debug, thiserror::Error)]
pub enum DataError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Yaml {
        path: String,
        source: serde_yaml::Error,
    },
    #[error("{0}")]
    Validation(String),
}

/// Reads a YAML document. Missing or blank files yield `T::default()`.
pub fn read_yaml_file<T: DeserializeOwned + Default>(path: &Path) -> Result<T, DataError> {
    if !path.exists() {
        return Ok(T::default());
    }
    let raw = fs::read_to_string(path).map_err(|source| DataError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_yaml(&raw, &path.display().to_string())
}

pub(crate) fn parse_yaml<T: DeserializeOwned + Default>(raw: &str, label: &str) -> Result<T, DataError> {
    if raw.trim().is_empty() {
        return Ok(T::default());
    }
    serde_yaml::from_str(raw).map_err(|source| DataError::Yaml {
        path: label.to_string(),
        source,
    })
}

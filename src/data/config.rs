use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::data::{read_yaml_file, DataError, CONFIG_FILE};
use crate::ui::text::PREFIX;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct PluginConfig {
    pub database: DatabaseConfig,
    pub catalog: CatalogConfig,
    pub messages: MessagesConfig,
    pub backups: BackupConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct DatabaseConfig {
    pub path: String,
    pub busy_timeout_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CatalogConfig {
    pub cache_window_seconds: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct MessagesConfig {
    pub prefix: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct BackupConfig {
    pub enabled: bool,
    pub keep: usize,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: "grvtags.db".to_string(),
            busy_timeout_ms: 5000,
        }
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            cache_window_seconds: 30,
        }
    }
}

impl Default for MessagesConfig {
    fn default() -> Self {
        Self {
            prefix: PREFIX.to_string(),
        }
    }
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            keep: 10,
        }
    }
}

impl PluginConfig {
    pub fn load(data_dir: &Path) -> Result<Self, DataError> {
        let config: PluginConfig = read_yaml_file(&data_dir.join(CONFIG_FILE))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), DataError> {
        if self.database.path.trim().is_empty() {
            return Err(DataError::Validation(
                "database.path must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Database location; relative paths resolve against the data folder.
    pub fn database_path(&self, data_dir: &Path) -> PathBuf {
        let path = Path::new(&self.database.path);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            data_dir.join(path)
        }
    }

    pub fn cache_window(&self) -> Duration {
        Duration::from_secs(self.catalog.cache_window_seconds)
    }

    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.database.busy_timeout_ms)
    }
}

use std::fs;
use std::path::{Path, PathBuf};

use bevy_utils::tracing::info;

use crate::data::{DataError, CATEGORIES_FILE, CONFIG_FILE, TAGS_FILE};

const DEFAULT_FILES: &[(&str, &str)] = &[
    (CONFIG_FILE, include_str!("../../assets/defaults/config.yml")),
    (CATEGORIES_FILE, include_str!("../../assets/defaults/categories.yml")),
    (TAGS_FILE, include_str!("../../assets/defaults/tags.yml")),
];

/// Writes the bundled files that are missing from `data_dir`.
pub fn ensure_default_files(data_dir: &Path) -> Result<Vec<PathBuf>, DataError> {
    fs::create_dir_all(data_dir).map_err(|source| DataError::Io {
        path: data_dir.display().to_string(),
        source,
    })?;

    let mut written = Vec::new();
    for (name, contents) in DEFAULT_FILES {
        let path = data_dir.join(name);
        if path.exists() {
            continue;
        }
        fs::write(&path, contents).map_err(|source| DataError::Io {
            path: path.display().to_string(),
            source,
        })?;
        info!(file = %path.display(), "default file created");
        written.push(path);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{ConfigSource, PluginConfig};

    #[test]
    fn bundled_files_parse_and_are_not_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let data_dir = dir.path().join("grvTags");
        assert_eq!(ensure_default_files(&data_dir).unwrap().len(), 3);

        let config = PluginConfig::load(&data_dir).unwrap();
        assert_eq!(config, PluginConfig::default());
        let source = ConfigSource::load(&data_dir).unwrap();
        assert_eq!(source.categories.len(), 3);
        assert_eq!(source.categories["xmas"].slot, Some(15));
        assert_eq!(source.default_tag_template(), "&8[&7Member&8]");

        fs::write(data_dir.join(TAGS_FILE), "tags: {}\n").unwrap();
        assert!(ensure_default_files(&data_dir).unwrap().is_empty());
        assert_eq!(fs::read_to_string(data_dir.join(TAGS_FILE)).unwrap(), "tags: {}\n");
    }
}

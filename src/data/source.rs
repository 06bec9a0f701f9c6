use std::collections::BTreeMap;
use std::path::Path;

use bevy_utils::tracing::warn;

use crate::catalog::model::{catalog_key, is_default, DEFAULT_NAME};
use crate::data::definitions::{CategoriesFile, CategoryDefinition, TagDefinition, TagsFile};
use crate::data::{parse_yaml, read_yaml_file, DataError, CATEGORIES_FILE, TAGS_FILE};
use crate::players::manager::FALLBACK_TAG_TEXT;

/// Declared categories and tags, read once per reload.
#[derive(Debug, Clone, Default)]
pub struct ConfigSource {
    pub categories: BTreeMap<String, CategoryDefinition>,
    pub tags: BTreeMap<String, TagDefinition>,
}

impl ConfigSource {
    pub fn load(data_dir: &Path) -> Result<Self, DataError> {
        let categories: CategoriesFile = read_yaml_file(&data_dir.join(CATEGORIES_FILE))?;
        let tags: TagsFile = read_yaml_file(&data_dir.join(TAGS_FILE))?;
        Ok(Self::from_files(categories, tags))
    }

    pub fn from_yaml(categories_yaml: &str, tags_yaml: &str) -> Result<Self, DataError> {
        let categories: CategoriesFile = parse_yaml(categories_yaml, CATEGORIES_FILE)?;
        let tags: TagsFile = parse_yaml(tags_yaml, TAGS_FILE)?;
        Ok(Self::from_files(categories, tags))
    }

    fn from_files(categories: CategoriesFile, tags: TagsFile) -> Self {
        let mut source = Self {
            categories: dedupe("category", categories.categories.unwrap_or_default()),
            tags: dedupe("tag", tags.tags.unwrap_or_default()),
        };
        source.ensure_defaults();
        source
    }

    /// The `default` category and tag must exist after every sync.
    fn ensure_defaults(&mut self) {
        if !self.categories.keys().any(|name| is_default(name)) {
            warn!("categories.yml does not declare 'default', using built-in definition");
            self.categories
                .insert(DEFAULT_NAME.to_string(), CategoryDefinition::builtin_default());
        }
        if !self.tags.keys().any(|name| is_default(name)) {
            warn!("tags.yml does not declare 'default', using built-in definition");
            self.tags.insert(
                DEFAULT_NAME.to_string(),
                TagDefinition::builtin_default(FALLBACK_TAG_TEXT),
            );
        }
    }

    /// Display text of the declared `default` tag.
    pub fn default_tag_template(&self) -> String {
        self.tags
            .iter()
            .find(|(name, _)| is_default(name))
            .and_then(|(_, definition)| definition.tag.clone())
            .unwrap_or_else(|| FALLBACK_TAG_TEXT.to_string())
    }

    pub fn declares_category(&self, name: &str) -> bool {
        self.categories
            .keys()
            .any(|declared| declared.eq_ignore_ascii_case(name))
    }
}

/// Names are unique ignoring case; the first spelling in key order wins.
fn dedupe<T>(kind: &str, entries: BTreeMap<String, T>) -> BTreeMap<String, T> {
    let mut seen = std::collections::HashSet::new();
    let mut out = BTreeMap::new();
    for (name, definition) in entries {
        if seen.insert(catalog_key(&name)) {
            out.insert(name, definition);
        } else {
            warn!(kind, name = %name, "duplicate name ignoring case, entry skipped");
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_defaults_are_added() {
        let source = ConfigSource::from_yaml(
            "categories:\n  rank: {}\n",
            "tags:\n  vip:\n    category: rank\n",
        )
        .unwrap();
        assert!(source.declares_category("DEFAULT"));
        assert!(source.tags.contains_key("default"));
        assert_eq!(source.default_tag_template(), FALLBACK_TAG_TEXT);
    }

    #[test]
    fn declared_default_tag_drives_template() {
        let source = ConfigSource::from_yaml(
            "",
            "tags:\n  default:\n    tag: \"&7[Member]\"\n",
        )
        .unwrap();
        assert_eq!(source.default_tag_template(), "&7[Member]");
        assert_eq!(source.tags.len(), 1);
    }

    #[test]
    fn case_duplicates_are_dropped() {
        let source = ConfigSource::from_yaml("", "tags:\n  VIP: {}\n  vip: {}\n").unwrap();
        assert!(source.tags.contains_key("VIP"));
        assert!(!source.tags.contains_key("vip"));
    }

    #[test]
    fn files_load_from_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CATEGORIES_FILE),
            "categories:\n  default:\n    slot: 11\n",
        )
        .unwrap();
        let source = ConfigSource::load(dir.path()).unwrap();
        assert_eq!(source.categories["default"].slot, Some(11));
        assert!(source.tags.contains_key("default"));

        std::fs::write(dir.path().join(TAGS_FILE), "tags: [unclosed").unwrap();
        assert!(matches!(
            ConfigSource::load(dir.path()),
            Err(DataError::Yaml { .. })
        ));
    }
}

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use bevy_utils::tracing::{debug, error, info, warn};
use parking_lot::Mutex;

use crate::catalog::cache::{CatalogCache, CatalogSnapshot};
use crate::catalog::categories::CategoryCatalog;
use crate::catalog::model::{is_default, validate_tag_name, Tag};
use crate::catalog::{store_failure, CatalogError, WriteLock};
use crate::store::TagsDb;

/// Live player references that keep a tag from being swept.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TagReferences {
    pub active: i64,
    pub unlocks: i64,
}

impl TagReferences {
    pub fn is_empty(&self) -> bool {
        self.active == 0 && self.unlocks == 0
    }
}

/// Outcome of a cascading tag delete.
#[derive(Debug, Clone)]
pub struct TagDeletion {
    pub tag: Tag,
    pub players_reset: usize,
    pub unlocks_removed: usize,
    /// Cascade steps that failed before the tag row itself was removed.
    pub step_errors: Vec<String>,
}

/// Read-mostly tag lookups backed by the `tags` table.
pub struct TagCatalog {
    store: Arc<TagsDb>,
    categories: Arc<CategoryCatalog>,
    cache: CatalogCache<Tag>,
    reload_lock: Mutex<()>,
    write_lock: WriteLock,
    initialized: AtomicBool,
}

impl TagCatalog {
    pub fn new(
        store: Arc<TagsDb>,
        categories: Arc<CategoryCatalog>,
        write_lock: WriteLock,
        window: Duration,
    ) -> Self {
        Self {
            store,
            categories,
            cache: CatalogCache::new(window),
            reload_lock: Mutex::new(()),
            write_lock,
            initialized: AtomicBool::new(false),
        }
    }

    pub fn categories(&self) -> &CategoryCatalog {
        &self.categories
    }

    pub fn initialize(&self) -> Result<(), CatalogError> {
        if self.initialized.swap(true, Ordering::SeqCst) {
            return Err(CatalogError::AlreadyInitialized);
        }
        self.store
            .ensure_schema()
            .map_err(|err| store_failure("initialize tags", err))?;
        let snapshot = self.reload()?;
        info!(count = snapshot.len(), "tag catalog initialized");
        Ok(())
    }

    pub fn reload(&self) -> Result<Arc<CatalogSnapshot<Tag>>, CatalogError> {
        let _guard = self.reload_lock.lock();
        let tags = self
            .store
            .load_tags()
            .map_err(|err| store_failure("load tags", err))?;
        debug!(count = tags.len(), "tags loaded");
        Ok(self.cache.publish(tags))
    }

    pub fn load_all(&self) -> Arc<CatalogSnapshot<Tag>> {
        if self.cache.is_fresh() {
            return self.cache.load();
        }
        let _guard = self.reload_lock.lock();
        if self.cache.is_fresh() {
            return self.cache.load();
        }
        match self.store.load_tags() {
            Ok(tags) => self.cache.publish(tags),
            Err(err) => {
                error!(error = %err, "tag reload failed, serving previous snapshot");
                self.cache.load()
            }
        }
    }

    pub fn invalidate(&self) {
        self.cache.invalidate();
    }

    pub fn set_window(&self, window: Duration) {
        self.cache.set_window(window);
    }

    pub fn window(&self) -> Duration {
        self.cache.window()
    }

    pub(crate) fn refresh_after_write(&self) {
        self.invalidate();
        if let Err(err) = self.reload() {
            warn!(error = %err, "tag catalog left invalidated after write");
        }
    }

    pub fn exists(&self, name: &str) -> bool {
        self.load_all().contains(name)
    }

    pub fn get(&self, name: &str) -> Option<Tag> {
        self.load_all().get(name).cloned()
    }

    /// All tags ordered by category, then display order.
    pub fn all(&self) -> Vec<Tag> {
        self.load_all().items().to_vec()
    }

    pub fn names(&self) -> Vec<String> {
        self.load_all().names()
    }

    pub fn count(&self) -> usize {
        self.load_all().len()
    }

    pub fn by_category(&self, category: &str) -> Vec<Tag> {
        self.load_all()
            .items()
            .iter()
            .filter(|tag| tag.in_category(category))
            .cloned()
            .collect()
    }

    pub fn count_in_category(&self, category: &str) -> usize {
        self.load_all()
            .items()
            .iter()
            .filter(|tag| tag.in_category(category))
            .count()
    }

    pub fn references(&self, name: &str) -> Result<TagReferences, CatalogError> {
        Ok(TagReferences {
            active: self
                .store
                .count_active_tag_users(name)
                .map_err(|err| store_failure("count active users", err))?,
            unlocks: self
                .store
                .count_tag_unlocks(name)
                .map_err(|err| store_failure("count unlocks", err))?,
        })
    }

    pub fn create(&self, name: &str, category: &str) -> Result<Tag, CatalogError> {
        validate_tag_name(name)?;
        let _writer = self.write_lock.lock();

        let existing = self
            .store
            .find_tag(name)
            .map_err(|err| store_failure("find tag", err))?;
        if let Some(existing) = existing {
            return Err(CatalogError::Duplicate {
                kind: "tag",
                name: existing.name,
            });
        }

        let category = self
            .store
            .find_category(category)
            .map_err(|err| store_failure("find category", err))?
            .ok_or_else(|| CatalogError::UnknownCategory(category.to_string()))?;

        let mut tag = Tag::with_defaults(name, &category.name);
        tag.display_order = self
            .store
            .max_tag_order(&category.name)
            .map_err(|err| store_failure("read tag order", err))?
            .unwrap_or(0)
            + 1;
        tag.id = self
            .store
            .insert_tag(&tag)
            .map_err(|err| store_failure("insert tag", err))?;

        info!(tag = %tag.name, category = %tag.category, order = tag.display_order, "tag created");
        self.refresh_after_write();
        Ok(tag)
    }

    /// Resets active selections, removes unlocks, then removes the tag row.
    ///
    /// Every step runs even when an earlier one changed nothing or failed.
    /// Success is decided by the final delete alone.
    pub fn delete(&self, name: &str) -> Result<TagDeletion, CatalogError> {
        if is_default(name) {
            return Err(CatalogError::Protected { kind: "tag" });
        }
        let _writer = self.write_lock.lock();

        let tag = self
            .store
            .find_tag(name)
            .map_err(|err| store_failure("find tag", err))?
            .ok_or_else(|| CatalogError::NotFound {
                kind: "tag",
                name: name.to_string(),
            })?;

        let mut deletion = TagDeletion {
            tag,
            players_reset: 0,
            unlocks_removed: 0,
            step_errors: Vec::new(),
        };
        let tag_name = deletion.tag.name.clone();

        match self.store.reset_active_tag(&tag_name) {
            Ok(reset) => deletion.players_reset = reset,
            Err(err) => {
                error!(tag = %tag_name, error = %err, "failed to reset active tag selections");
                deletion.step_errors.push(format!("reset active tags: {}", err));
            }
        }
        match self.store.delete_tag_unlocks(&tag_name) {
            Ok(removed) => deletion.unlocks_removed = removed,
            Err(err) => {
                error!(tag = %tag_name, error = %err, "failed to remove tag unlocks");
                deletion.step_errors.push(format!("remove unlocks: {}", err));
            }
        }
        let removed = self.store.delete_tag(&tag_name);
        self.refresh_after_write();

        match removed {
            Ok(0) => Err(CatalogError::NotFound {
                kind: "tag",
                name: tag_name,
            }),
            Ok(_) => {
                info!(
                    tag = %tag_name,
                    players_reset = deletion.players_reset,
                    unlocks_removed = deletion.unlocks_removed,
                    "tag deleted"
                );
                Ok(deletion)
            }
            Err(err) => Err(store_failure("delete tag", err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn catalogs() -> (Arc<TagsDb>, TagCatalog) {
        let store = Arc::new(TagsDb::open_in_memory().unwrap());
        let lock = WriteLock::default();
        let window = Duration::from_secs(30);
        let categories = Arc::new(CategoryCatalog::new(store.clone(), lock.clone(), window));
        categories.initialize().unwrap();
        categories.create("default", None).unwrap();
        categories.create("rank", None).unwrap();
        let tags = TagCatalog::new(store.clone(), categories, lock, window);
        tags.initialize().unwrap();
        (store, tags)
    }

    #[test]
    fn create_requires_existing_category() {
        let (_store, tags) = catalogs();
        assert!(matches!(
            tags.create("vip", "missing"),
            Err(CatalogError::UnknownCategory(_))
        ));
        assert!(!tags.exists("vip"));

        let vip = tags.create("vip", "RANK").unwrap();
        assert_eq!(vip.category, "rank");
        assert!(tags.exists("Vip"));
        assert!(matches!(
            tags.create("VIP", "rank"),
            Err(CatalogError::Duplicate { .. })
        ));
        assert!(matches!(
            tags.create("v", "rank"),
            Err(CatalogError::InvalidName(_))
        ));
    }

    #[test]
    fn display_order_increments_per_category() {
        let (_store, tags) = catalogs();
        assert_eq!(tags.create("vip", "rank").unwrap().display_order, 1);
        assert_eq!(tags.create("mvp", "rank").unwrap().display_order, 2);
        assert_eq!(tags.create("elf", "default").unwrap().display_order, 1);

        let names: Vec<String> = tags.by_category("rank").into_iter().map(|t| t.name).collect();
        assert_eq!(names, vec!["vip", "mvp"]);
        assert_eq!(tags.names(), vec!["elf", "vip", "mvp"]);
        assert_eq!(tags.count_in_category("Rank"), 2);
    }

    #[test]
    fn delete_cascades_to_player_state() {
        let (store, tags) = catalogs();
        tags.create("vip", "rank").unwrap();
        tags.create("mvp", "rank").unwrap();

        let mut holders = Vec::new();
        for index in 0..3 {
            let uuid = Uuid::new_v4();
            store.insert_player_if_absent(uuid, &format!("p{}", index)).unwrap();
            store.insert_unlock(uuid, "vip").unwrap();
            store.insert_unlock(uuid, "mvp").unwrap();
            holders.push(uuid);
        }
        store.set_current_tag(holders[0], Some("vip")).unwrap();
        store.set_current_tag(holders[1], Some("VIP")).unwrap();
        store.set_current_tag(holders[2], Some("mvp")).unwrap();

        let deletion = tags.delete("Vip").unwrap();
        assert_eq!(deletion.players_reset, 2);
        assert_eq!(deletion.unlocks_removed, 3);
        assert!(deletion.step_errors.is_empty());

        assert!(!tags.exists("vip"));
        assert_eq!(store.count_tag_unlocks("vip").unwrap(), 0);
        assert_eq!(store.count_tag_unlocks("mvp").unwrap(), 3);
        assert_eq!(store.find_player(holders[0]).unwrap().unwrap().current_tag, None);
        assert_eq!(
            store.find_player(holders[2]).unwrap().unwrap().current_tag.as_deref(),
            Some("mvp")
        );
    }

    #[test]
    fn delete_without_references_still_succeeds() {
        let (_store, tags) = catalogs();
        tags.create("lonely", "rank").unwrap();
        let deletion = tags.delete("lonely").unwrap();
        assert_eq!(deletion.players_reset, 0);
        assert_eq!(deletion.unlocks_removed, 0);
        assert!(matches!(
            tags.delete("lonely"),
            Err(CatalogError::NotFound { .. })
        ));
    }

    #[test]
    fn default_tag_is_protected() {
        let (_store, tags) = catalogs();
        tags.create("default", "default").unwrap();
        assert!(matches!(
            tags.delete("Default"),
            Err(CatalogError::Protected { kind: "tag" })
        ));
        assert!(tags.exists("default"));
    }

    #[test]
    fn references_count_both_kinds() {
        let (store, tags) = catalogs();
        tags.create("vip", "rank").unwrap();
        let uuid = Uuid::new_v4();
        store.insert_player_if_absent(uuid, "Alex").unwrap();
        assert!(tags.references("vip").unwrap().is_empty());
        store.insert_unlock(uuid, "vip").unwrap();
        store.set_current_tag(uuid, Some("vip")).unwrap();
        assert_eq!(
            tags.references("vip").unwrap(),
            TagReferences {
                active: 1,
                unlocks: 1
            }
        );
    }
}

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use bevy_utils::tracing::{debug, error, info, warn};
use parking_lot::Mutex;

use crate::catalog::cache::{CatalogCache, CatalogSnapshot};
use crate::catalog::model::{is_default, validate_category_name, Category};
use crate::catalog::{store_failure, CatalogError, WriteLock};
use crate::store::TagsDb;

/// Slots below this value are left for hand-placed categories.
const FIRST_GENERATED_SLOT: i32 = 10;
const SLOT_GAP: i32 = 2;

/// Read-mostly category lookups backed by the `categories` table.
pub struct CategoryCatalog {
    store: Arc<TagsDb>,
    cache: CatalogCache<Category>,
    reload_lock: Mutex<()>,
    write_lock: WriteLock,
    initialized: AtomicBool,
}

impl CategoryCatalog {
    pub fn new(store: Arc<TagsDb>, write_lock: WriteLock, window: Duration) -> Self {
        Self {
            store,
            cache: CatalogCache::new(window),
            reload_lock: Mutex::new(()),
            write_lock,
            initialized: AtomicBool::new(false),
        }
    }

    /// Creates missing tables and performs the first load. Runs once.
    pub fn initialize(&self) -> Result<(), CatalogError> {
        if self.initialized.swap(true, Ordering::SeqCst) {
            return Err(CatalogError::AlreadyInitialized);
        }
        self.store
            .ensure_schema()
            .map_err(|err| store_failure("initialize categories", err))?;
        let snapshot = self.reload()?;
        info!(count = snapshot.len(), "category catalog initialized");
        Ok(())
    }

    /// Full table scan, published as a new snapshot regardless of the window.
    pub fn reload(&self) -> Result<Arc<CatalogSnapshot<Category>>, CatalogError> {
        let _guard = self.reload_lock.lock();
        let categories = self
            .store
            .load_categories()
            .map_err(|err| store_failure("load categories", err))?;
        debug!(count = categories.len(), "categories loaded");
        Ok(self.cache.publish(categories))
    }

    /// Current snapshot, reloading first when the cache window has lapsed.
    pub fn load_all(&self) -> Arc<CatalogSnapshot<Category>> {
        if self.cache.is_fresh() {
            return self.cache.load();
        }
        let _guard = self.reload_lock.lock();
        if self.cache.is_fresh() {
            return self.cache.load();
        }
        match self.store.load_categories() {
            Ok(categories) => self.cache.publish(categories),
            Err(err) => {
                error!(error = %err, "category reload failed, serving previous snapshot");
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
            warn!(error = %err, "category catalog left invalidated after write");
        }
    }

    pub fn exists(&self, name: &str) -> bool {
        self.load_all().contains(name)
    }

    pub fn get(&self, name: &str) -> Option<Category> {
        self.load_all().get(name).cloned()
    }

    /// All categories ordered by slot position.
    pub fn all(&self) -> Vec<Category> {
        self.load_all().items().to_vec()
    }

    pub fn names(&self) -> Vec<String> {
        self.load_all().names()
    }

    pub fn count(&self) -> usize {
        self.load_all().len()
    }

    pub fn create(&self, name: &str, display_name: Option<&str>) -> Result<Category, CatalogError> {
        validate_category_name(name)?;
        let _writer = self.write_lock.lock();

        let existing = self
            .store
            .find_category(name)
            .map_err(|err| store_failure("find category", err))?;
        if let Some(existing) = existing {
            return Err(CatalogError::Duplicate {
                kind: "category",
                name: existing.name,
            });
        }

        let mut category = Category::with_defaults(name, display_name);
        let highest = self
            .store
            .max_category_slot()
            .map_err(|err| store_failure("read category slots", err))?
            .unwrap_or(0);
        category.slot_position = highest.max(FIRST_GENERATED_SLOT) + SLOT_GAP;
        category.id = self
            .store
            .insert_category(&category)
            .map_err(|err| store_failure("insert category", err))?;

        info!(category = %category.name, slot = category.slot_position, "category created");
        self.refresh_after_write();
        Ok(category)
    }

    /// Removes an empty category. Fails without side effects while tags reference it.
    pub fn delete(&self, name: &str) -> Result<Category, CatalogError> {
        if is_default(name) {
            return Err(CatalogError::Protected { kind: "category" });
        }
        let _writer = self.write_lock.lock();

        let category = self
            .store
            .find_category(name)
            .map_err(|err| store_failure("find category", err))?
            .ok_or_else(|| CatalogError::NotFound {
                kind: "category",
                name: name.to_string(),
            })?;

        let tags = self
            .store
            .count_tags_in_category(&category.name)
            .map_err(|err| store_failure("count category tags", err))?;
        if tags > 0 {
            warn!(category = %category.name, tags, "refusing to delete category with tags");
            return Err(CatalogError::CategoryInUse {
                name: category.name,
                tags,
            });
        }

        let removed = self
            .store
            .delete_category(&category.name)
            .map_err(|err| store_failure("delete category", err))?;
        self.refresh_after_write();
        if removed == 0 {
            return Err(CatalogError::NotFound {
                kind: "category",
                name: name.to_string(),
            });
        }
        info!(category = %category.name, "category deleted");
        Ok(category)
    }
}

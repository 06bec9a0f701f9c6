use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use arc_swap::ArcSwap;

use crate::catalog::model::{catalog_key, Category, Tag};

pub trait CatalogEntry: Clone {
    fn entry_name(&self) -> &str;
}

impl CatalogEntry for Category {
    fn entry_name(&self) -> &str {
        &self.name
    }
}

impl CatalogEntry for Tag {
    fn entry_name(&self) -> &str {
        &self.name
    }
}

/// Immutable view of one full table scan, indexed by lower-cased name.
#[derive(Debug)]
pub struct CatalogSnapshot<T> {
    ordered: Vec<T>,
    index: HashMap<String, usize>,
    loaded_at: Option<Instant>,
}

impl<T: CatalogEntry> CatalogSnapshot<T> {
    fn empty() -> Self {
        Self {
            ordered: Vec::new(),
            index: HashMap::new(),
            loaded_at: None,
        }
    }

    fn build(items: Vec<T>) -> Self {
        let index = items
            .iter()
            .enumerate()
            .map(|(position, item)| (catalog_key(item.entry_name()), position))
            .collect();
        Self {
            ordered: items,
            index,
            loaded_at: Some(Instant::now()),
        }
    }

    pub fn get(&self, name: &str) -> Option<&T> {
        self.index
            .get(&catalog_key(name))
            .and_then(|position| self.ordered.get(*position))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(&catalog_key(name))
    }

    /// Entries in table order.
    pub fn items(&self) -> &[T] {
        &self.ordered
    }

    pub fn names(&self) -> Vec<String> {
        self.ordered
            .iter()
            .map(|item| item.entry_name().to_string())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }
}

/// Snapshot holder with a freshness window.
///
/// Reloads publish a complete new snapshot in one pointer swap, so readers
/// holding the previous `Arc` keep a consistent view.
pub struct CatalogCache<T> {
    snap: ArcSwap<CatalogSnapshot<T>>,
    window_ms: AtomicU64,
    dirty: AtomicBool,
}

impl<T: CatalogEntry> CatalogCache<T> {
    pub fn new(window: Duration) -> Self {
        Self {
            snap: ArcSwap::from_pointee(CatalogSnapshot::empty()),
            window_ms: AtomicU64::new(window.as_millis() as u64),
            dirty: AtomicBool::new(true),
        }
    }

    pub fn load(&self) -> Arc<CatalogSnapshot<T>> {
        self.snap.load_full()
    }

    pub fn window(&self) -> Duration {
        Duration::from_millis(self.window_ms.load(Ordering::Relaxed))
    }

    pub fn set_window(&self, window: Duration) {
        self.window_ms
            .store(window.as_millis() as u64, Ordering::Relaxed);
    }

    pub fn is_fresh(&self) -> bool {
        if self.dirty.load(Ordering::Acquire) {
            return false;
        }
        match self.snap.load().loaded_at {
            Some(loaded_at) => loaded_at.elapsed() < self.window(),
            None => false,
        }
    }

    pub fn publish(&self, items: Vec<T>) -> Arc<CatalogSnapshot<T>> {
        let snapshot = Arc::new(CatalogSnapshot::build(items));
        self.snap.store(snapshot.clone());
        self.dirty.store(false, Ordering::Release);
        snapshot
    }

    pub fn invalidate(&self) {
        self.dirty.store(true, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tag(name: &str) -> Tag {
        Tag::with_defaults(name, "default")
    }

    #[test]
    fn lookups_are_case_insensitive_and_keep_order() {
        let cache = CatalogCache::new(Duration::from_secs(30));
        let snapshot = cache.publish(vec![tag("Zeta"), tag("alpha")]);
        assert_eq!(snapshot.get("ZETA").map(|t| t.name.as_str()), Some("Zeta"));
        assert!(snapshot.contains("Alpha"));
        assert_eq!(snapshot.names(), vec!["Zeta", "alpha"]);
    }

    #[test]
    fn invalidation_and_window_expire_freshness() {
        let cache: CatalogCache<Tag> = CatalogCache::new(Duration::from_secs(30));
        assert!(!cache.is_fresh());
        cache.publish(vec![tag("vip")]);
        assert!(cache.is_fresh());
        cache.invalidate();
        assert!(!cache.is_fresh());

        cache.set_window(Duration::ZERO);
        cache.publish(Vec::new());
        assert!(!cache.is_fresh());
    }

    #[test]
    fn old_snapshots_survive_publish() {
        let cache = CatalogCache::new(Duration::from_secs(30));
        let before = cache.publish(vec![tag("vip")]);
        cache.publish(Vec::new());
        assert_eq!(before.len(), 1);
        assert!(cache.load().is_empty());
    }
}

use std::sync::Arc;
use std::time::Instant;

use bevy_utils::tracing::{debug, error, info, warn};

use crate::catalog::model::{is_default, validate_category_name, validate_tag_name, DEFAULT_NAME};
use crate::catalog::{Category, CategoryCatalog, Tag, TagCatalog, WriteLock};
use crate::data::ConfigSource;
use crate::store::TagsDb;
use crate::sync::report::{EntityKind, PhaseReport, SkipReason, SkippedEntity, SyncReport};

/// Mirrors the declared categories and tags into the store.
///
/// Each table goes through mark, upsert and sweep. Every row change is its
/// own statement and a failed row never stops the run.
pub struct Reconciler {
    store: Arc<TagsDb>,
    categories: Arc<CategoryCatalog>,
    tags: Arc<TagCatalog>,
    write_lock: WriteLock,
}

impl Reconciler {
    pub fn new(
        store: Arc<TagsDb>,
        categories: Arc<CategoryCatalog>,
        tags: Arc<TagCatalog>,
        write_lock: WriteLock,
    ) -> Self {
        Self {
            store,
            categories,
            tags,
            write_lock,
        }
    }

    pub fn run(&self, source: &ConfigSource) -> SyncReport {
        let _writer = self.write_lock.lock();
        let started = Instant::now();

        let mut categories = self.upsert_categories(source);
        let tags = self.sync_tags(source);
        // Categories are swept last so tags removed in this run no longer hold them.
        self.sweep_categories(&mut categories);

        self.categories.refresh_after_write();
        self.tags.refresh_after_write();

        let report = SyncReport {
            categories,
            tags,
            elapsed: started.elapsed(),
        };
        for line in report.summary_lines() {
            info!("sync {}", line);
        }
        report
    }

    fn upsert_categories(&self, source: &ConfigSource) -> PhaseReport {
        let mut report = PhaseReport::new(EntityKind::Category);

        match self.store.mark_categories_unsynced() {
            Ok(marked) => debug!(marked, "categories marked for sync"),
            Err(err) => {
                error!(error = %err, "failed to mark categories");
                report.fail("*", err);
            }
        }

        for (name, definition) in &source.categories {
            if let Err(err) = validate_category_name(name) {
                warn!(category = %name, error = %err, "invalid category in categories.yml");
                report.fail(name.as_str(), err);
                continue;
            }
            self.upsert_category(&definition.to_category(name), &mut report);
        }
        report
    }

    fn sweep_categories(&self, report: &mut PhaseReport) {
        let stale = match self.store.unsynced_categories() {
            Ok(stale) => stale,
            Err(err) => {
                error!(error = %err, "failed to list undeclared categories");
                report.fail("*", err);
                Vec::new()
            }
        };
        for name in stale {
            if is_default(&name) {
                debug!(category = %name, "default category is exempt from sweep");
                continue;
            }
            self.sweep_category(name, report);
        }
    }

    fn upsert_category(&self, category: &Category, report: &mut PhaseReport) {
        let outcome = match self.store.update_category(category) {
            Ok(0) => self.store.insert_category(category).map(|_| true),
            Ok(_) => Ok(false),
            Err(err) => Err(err),
        };
        match outcome {
            Ok(true) => {
                info!(category = %category.name, "category synchronized (new)");
                report.created.push(category.name.clone());
            }
            Ok(false) => {
                info!(category = %category.name, "category synchronized");
                report.updated.push(category.name.clone());
            }
            Err(err) => {
                error!(category = %category.name, error = %err, "category sync failed");
                report.fail(category.name.as_str(), err);
            }
        }
    }

    fn sweep_category(&self, name: String, report: &mut PhaseReport) {
        let tags = match self.store.count_tags_in_category(&name) {
            Ok(tags) => tags,
            Err(err) => {
                error!(category = %name, error = %err, "failed to count category tags");
                report.fail(name, err);
                return;
            }
        };
        if tags > 0 {
            warn!(
                category = %name,
                tags,
                "category removed from categories.yml but still has tags, keeping it"
            );
            report.skipped.push(SkippedEntity {
                name,
                reason: SkipReason::CategoryInUse { tags },
            });
            return;
        }
        match self.store.delete_category(&name) {
            Ok(removed) if removed > 0 => {
                info!(category = %name, "category deleted (no longer declared)");
                report.deleted.push(name);
            }
            Ok(_) => debug!(category = %name, "category already gone"),
            Err(err) => {
                error!(category = %name, error = %err, "failed to delete category");
                report.fail(name, err);
            }
        }
    }

    fn sync_tags(&self, source: &ConfigSource) -> PhaseReport {
        let mut report = PhaseReport::new(EntityKind::Tag);

        match self.store.mark_tags_unsynced() {
            Ok(marked) => debug!(marked, "tags marked for sync"),
            Err(err) => {
                error!(error = %err, "failed to mark tags");
                report.fail("*", err);
            }
        }

        for (name, definition) in &source.tags {
            if let Err(err) = validate_tag_name(name) {
                warn!(tag = %name, error = %err, "invalid tag in tags.yml");
                report.fail(name.as_str(), err);
                continue;
            }
            let mut tag = definition.to_tag(name);
            if !self.category_available(&tag.category) {
                warn!(
                    tag = %tag.name,
                    category = %tag.category,
                    "tag references an unknown category, placing it in 'default'"
                );
                tag.category = DEFAULT_NAME.to_string();
            }
            self.upsert_tag(&tag, &mut report);
        }

        let stale = match self.store.unsynced_tags() {
            Ok(stale) => stale,
            Err(err) => {
                error!(error = %err, "failed to list undeclared tags");
                report.fail("*", err);
                Vec::new()
            }
        };
        for name in stale {
            if is_default(&name) {
                debug!(tag = %name, "default tag is exempt from sweep");
                continue;
            }
            self.sweep_tag(name, &mut report);
        }

        report
    }

    fn category_available(&self, category: &str) -> bool {
        match self.store.find_category(category) {
            Ok(found) => found.is_some(),
            Err(err) => {
                error!(category, error = %err, "failed to look up category");
                true
            }
        }
    }

    fn upsert_tag(&self, tag: &Tag, report: &mut PhaseReport) {
        let outcome = match self.store.update_tag(tag) {
            Ok(0) => self.store.insert_tag(tag).map(|_| true),
            Ok(_) => Ok(false),
            Err(err) => Err(err),
        };
        match outcome {
            Ok(true) => {
                info!(tag = %tag.name, category = %tag.category, "tag synchronized (new)");
                report.created.push(tag.name.clone());
            }
            Ok(false) => {
                info!(tag = %tag.name, category = %tag.category, "tag synchronized");
                report.updated.push(tag.name.clone());
            }
            Err(err) => {
                error!(tag = %tag.name, error = %err, "tag sync failed");
                report.fail(tag.name.as_str(), err);
            }
        }
    }

    fn sweep_tag(&self, name: String, report: &mut PhaseReport) {
        let active = self.store.count_active_tag_users(&name);
        let unlocks = self.store.count_tag_unlocks(&name);
        let (active, unlocks) = match (active, unlocks) {
            (Ok(active), Ok(unlocks)) => (active, unlocks),
            (Err(err), _) | (_, Err(err)) => {
                error!(tag = %name, error = %err, "failed to count tag references");
                report.fail(name, err);
                return;
            }
        };

        if active > 0 || unlocks > 0 {
            warn!(
                tag = %name,
                active,
                unlocks,
                "tag removed from tags.yml but players still reference it, keeping it"
            );
            report.skipped.push(SkippedEntity {
                name,
                reason: SkipReason::TagReferenced { active, unlocks },
            });
            return;
        }
        match self.store.delete_tag(&name) {
            Ok(removed) if removed > 0 => {
                info!(tag = %name, "tag deleted (no longer declared)");
                report.deleted.push(name);
            }
            Ok(_) => debug!(tag = %name, "tag already gone"),
            Err(err) => {
                error!(tag = %name, error = %err, "failed to delete tag");
                report.fail(name, err);
            }
        }
    }
}

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use arc_swap::ArcSwap;
use bevy_utils::tracing::{error, info, warn};

use crate::catalog::{CatalogError, CategoryCatalog, TagCatalog, WriteLock};
use crate::data::defaults::ensure_default_files;
use crate::data::{ConfigSource, DataError, PluginConfig, YamlBackup, CATEGORIES_FILE, TAGS_FILE};
use crate::players::PlayerDataManager;
use crate::store::{StoreError, StoreStats, TagsDb};
use crate::sync::{Reconciler, SkippedEntity, EntityKind, SyncReport};
use crate::ui::menu::MenuContext;
use crate::ui::PlaceholderResolver;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Failures that keep the plugin from enabling.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("configuration error: {0}")]
    Data(#[from] DataError),
    #[error("database error: {0}")]
    Store(#[from] StoreError),
    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),
}

#[derive(Debug, thiserror::Error)]
pub enum ReloadError {
    #[error("configuration error: {0}")]
    Data(#[from] DataError),
    #[error("database is not reachable: {0}")]
    Store(#[from] StoreError),
}

#[derive(Debug)]
pub struct ReloadReport {
    pub backups: Vec<PathBuf>,
    pub sync: SyncReport,
    pub default_tag: String,
}

#[derive(Debug)]
pub struct CleanupReport {
    pub before: StoreStats,
    pub after: StoreStats,
    pub sync: SyncReport,
    pub elapsed: Duration,
}

impl CleanupReport {
    pub fn categories_removed(&self) -> i64 {
        (self.before.categories - self.after.categories).max(0)
    }

    pub fn tags_removed(&self) -> i64 {
        (self.before.tags - self.after.tags).max(0)
    }

    pub fn orphans(&self) -> Vec<(EntityKind, SkippedEntity)> {
        self.sync
            .orphans()
            .map(|(kind, entry)| (kind, entry.clone()))
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct PluginStatus {
    pub version: &'static str,
    pub database_ok: bool,
    pub database_path: PathBuf,
    pub stats: Option<StoreStats>,
    pub categories_loaded: usize,
    pub tags_loaded: usize,
    pub default_tag: String,
    pub uptime: Duration,
}

/// The enabled plugin: configuration, store, catalogs and managers.
pub struct GrvTags {
    data_dir: PathBuf,
    config: ArcSwap<PluginConfig>,
    store: Arc<TagsDb>,
    categories: Arc<CategoryCatalog>,
    tags: Arc<TagCatalog>,
    players: Arc<PlayerDataManager>,
    placeholders: PlaceholderResolver,
    reconciler: Reconciler,
    enabled_at: Instant,
}

impl GrvTags {
    /// Brings the plugin up. Any error means the host must disable it.
    pub fn enable(data_dir: impl AsRef<Path>) -> Result<Self, StartupError> {
        let data_dir = data_dir.as_ref().to_path_buf();
        info!(dir = %data_dir.display(), "enabling grvTags {}", VERSION);

        let created = ensure_default_files(&data_dir)?;
        if !created.is_empty() {
            info!(files = created.len(), "wrote default configuration files");
        }
        let config = PluginConfig::load(&data_dir)?;
        let source = ConfigSource::load(&data_dir)?;

        let db_path = config.database_path(&data_dir);
        let store = Arc::new(TagsDb::open_with_timeout(&db_path, config.busy_timeout())?);
        store.ping()?;
        info!(path = %db_path.display(), "database connected");

        let write_lock = WriteLock::default();
        let window = config.cache_window();
        let categories = Arc::new(CategoryCatalog::new(store.clone(), write_lock.clone(), window));
        let tags = Arc::new(TagCatalog::new(
            store.clone(),
            categories.clone(),
            write_lock.clone(),
            window,
        ));
        categories.initialize()?;
        tags.initialize()?;

        let players = Arc::new(PlayerDataManager::new(
            store.clone(),
            tags.clone(),
            source.default_tag_template(),
        ));
        let reconciler = Reconciler::new(store.clone(), categories.clone(), tags.clone(), write_lock);
        let report = reconciler.run(&source);
        if report.has_failures() {
            warn!("initial synchronization finished with failures");
        }

        info!(
            categories = categories.count(),
            tags = tags.count(),
            "grvTags enabled"
        );
        Ok(Self {
            data_dir,
            config: ArcSwap::from_pointee(config),
            store,
            categories,
            tags,
            placeholders: PlaceholderResolver::new(players.clone()),
            players,
            reconciler,
            enabled_at: Instant::now(),
        })
    }

    /// Re-reads the configuration and YAML files, then backs up and
    /// reconciles the store. Nothing changes unless every file parses and
    /// the database answers.
    pub fn reload(&self) -> Result<ReloadReport, ReloadError> {
        info!("reloading configuration");
        let config = PluginConfig::load(&self.data_dir)?;
        let source = ConfigSource::load(&self.data_dir)?;
        self.store.ping().map_err(|err| {
            error!(error = %err, "database check failed during reload");
            err
        })?;

        if config.database != self.config.load().database {
            warn!("database settings changed; they take effect after a restart");
        }
        self.categories.set_window(config.cache_window());
        self.tags.set_window(config.cache_window());
        let backups = if config.backups.enabled {
            self.backup_yaml(config.backups.keep)
        } else {
            Vec::new()
        };
        self.config.store(Arc::new(config));

        let default_tag = source.default_tag_template();
        self.players.set_default_tag_text(default_tag.clone());

        let sync = self.reconciler.run(&source);
        info!("reload completed");
        Ok(ReloadReport {
            backups,
            sync,
            default_tag,
        })
    }

    fn backup_yaml(&self, keep: usize) -> Vec<PathBuf> {
        let backup = YamlBackup::new(&self.data_dir, keep);
        let mut written = Vec::new();
        for file in [CATEGORIES_FILE, TAGS_FILE] {
            match backup.backup(&self.data_dir.join(file)) {
                Ok(Some(path)) => written.push(path),
                Ok(None) => {}
                Err(err) => warn!(file, error = %err, "yaml backup failed"),
            }
        }
        written
    }

    /// Reconciles against the YAML files and reports what changed.
    pub fn cleanup(&self) -> Result<CleanupReport, ReloadError> {
        let started = Instant::now();
        let before = self.store.stats()?;
        let source = ConfigSource::load(&self.data_dir)?;
        let sync = self.reconciler.run(&source);
        let after = self.store.stats()?;
        let report = CleanupReport {
            before,
            after,
            sync,
            elapsed: started.elapsed(),
        };
        info!(
            categories_removed = report.categories_removed(),
            tags_removed = report.tags_removed(),
            orphans = report.sync.orphans().count(),
            "cleanup finished"
        );
        Ok(report)
    }

    pub fn status(&self) -> PluginStatus {
        let database_ok = match self.store.ping() {
            Ok(()) => true,
            Err(err) => {
                error!(error = %err, "database ping failed");
                false
            }
        };
        PluginStatus {
            version: VERSION,
            database_ok,
            database_path: self.config.load().database_path(&self.data_dir),
            stats: self.store.stats().ok(),
            categories_loaded: self.categories.count(),
            tags_loaded: self.tags.count(),
            default_tag: self.players.default_tag_text(),
            uptime: self.enabled_at.elapsed(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn config(&self) -> Arc<PluginConfig> {
        self.config.load_full()
    }

    pub fn prefix(&self) -> String {
        self.config.load().messages.prefix.clone()
    }

    pub fn store(&self) -> &TagsDb {
        &self.store
    }

    pub fn categories(&self) -> &CategoryCatalog {
        &self.categories
    }

    pub fn tags(&self) -> &TagCatalog {
        &self.tags
    }

    pub fn players(&self) -> &PlayerDataManager {
        &self.players
    }

    pub fn placeholders(&self) -> &PlaceholderResolver {
        &self.placeholders
    }

    pub fn menu_context(&self) -> MenuContext<'_> {
        MenuContext {
            tags: &self.tags,
            players: &self.players,
            version: VERSION,
        }
    }
}

use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;

use crate::catalog::{CategoryCatalog, TagCatalog, WriteLock};
use crate::data::ConfigSource;
use crate::players::PlayerDataManager;
use crate::store::TagsDb;
use crate::sync::Reconciler;
use crate::ui::menu::MenuContext;

pub const CATEGORIES_YML: &str = "\
categories:
  default:
    slot: 11
  rank:
    slot: 13
    id_display: \"&6&lRank Tags\"
  secret:
    slot: 15
    permission: grvtags.category.secret
    permission-see-category: true
";

pub const TAGS_YML: &str = "\
tags:
  default:
    tag: \"&8[&7Member&8]\"
    permission: \"\"
  vip:
    tag: \"&6[VIP]\"
    category: rank
    order: 1
  mvp:
    tag: \"&b[MVP]\"
    category: rank
    order: 2
    cost: 250
";

/// In-memory services reconciled from the sample YAML above.
pub struct Services {
    pub store: Arc<TagsDb>,
    pub categories: Arc<CategoryCatalog>,
    pub tags: Arc<TagCatalog>,
    pub players: Arc<PlayerDataManager>,
    pub reconciler: Reconciler,
}

impl Services {
    pub fn new() -> Self {
        let store = Arc::new(TagsDb::open_in_memory().unwrap());
        let lock = WriteLock::default();
        let window = Duration::from_secs(30);
        let categories = Arc::new(CategoryCatalog::new(store.clone(), lock.clone(), window));
        let tags = Arc::new(TagCatalog::new(
            store.clone(),
            categories.clone(),
            lock.clone(),
            window,
        ));
        categories.initialize().unwrap();
        tags.initialize().unwrap();
        let reconciler = Reconciler::new(store.clone(), categories.clone(), tags.clone(), lock);
        let source = ConfigSource::from_yaml(CATEGORIES_YML, TAGS_YML).unwrap();
        reconciler.run(&source);
        let players = Arc::new(PlayerDataManager::new(
            store.clone(),
            tags.clone(),
            source.default_tag_template(),
        ));
        Self {
            store,
            categories,
            tags,
            players,
            reconciler,
        }
    }

    pub fn join(&self, name: &str) -> Uuid {
        let uuid = Uuid::new_v4();
        self.players.ensure_exists(uuid, name);
        uuid
    }

    pub fn menu_context(&self) -> MenuContext<'_> {
        MenuContext {
            tags: &self.tags,
            players: &self.players,
            version: "test",
        }
    }
}

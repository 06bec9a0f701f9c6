use std::sync::Arc;

use arc_swap::ArcSwap;
use bevy_utils::tracing::{debug, error, info};
use uuid::Uuid;

use crate::catalog::TagCatalog;
use crate::players::PlayerRecord;
use crate::store::{StoreError, TagsDb};

/// Shown when neither the player nor `tags.yml` provide a tag.
pub const FALLBACK_TAG_TEXT: &str = "&8[&7?&8]";

#[derive(Debug, thiserror::Error)]
pub enum PlayerDataError {
    #[error("player {0} has never joined the server")]
    UnknownPlayer(Uuid),
    #[error("tag '{0}' is not unlocked")]
    NotUnlocked(String),
    #[error("database error: {0}")]
    Store(StoreError),
}

/// Owns player records and their unlocked tags.
pub struct PlayerDataManager {
    store: Arc<TagsDb>,
    tags: Arc<TagCatalog>,
    default_tag: ArcSwap<String>,
}

impl PlayerDataManager {
    pub fn new(store: Arc<TagsDb>, tags: Arc<TagCatalog>, default_tag: impl Into<String>) -> Self {
        Self {
            store,
            tags,
            default_tag: ArcSwap::from_pointee(default_tag.into()),
        }
    }

    pub fn default_tag_text(&self) -> String {
        self.default_tag.load().as_ref().clone()
    }

    pub fn set_default_tag_text(&self, text: impl Into<String>) {
        self.default_tag.store(Arc::new(text.into()));
    }

    /// Creates the player row on first join. Never touches an existing row.
    pub fn ensure_exists(&self, uuid: Uuid, name: &str) -> bool {
        match self.store.insert_player_if_absent(uuid, name) {
            Ok(inserted) => {
                if inserted > 0 {
                    info!(player = %name, %uuid, "created player record");
                }
                true
            }
            Err(err) => log_failure("ensure player", uuid, &err, false),
        }
    }

    pub fn refresh_name(&self, uuid: Uuid, name: &str) -> bool {
        match self.store.update_player_name(uuid, name) {
            Ok(updated) => updated > 0,
            Err(err) => log_failure("refresh player name", uuid, &err, false),
        }
    }

    pub fn player(&self, uuid: Uuid) -> Option<PlayerRecord> {
        self.store
            .find_player(uuid)
            .unwrap_or_else(|err| log_failure("load player", uuid, &err, None))
    }

    /// Most recently seen player with this name, ignoring case.
    pub fn find_by_name(&self, name: &str) -> Option<PlayerRecord> {
        match self.store.find_player_by_name(name) {
            Ok(record) => record,
            Err(err) => {
                error!(player = %name, error = %err, "failed to look up player by name");
                None
            }
        }
    }

    pub fn known_player_names(&self) -> Vec<String> {
        match self.store.player_names() {
            Ok(names) => names,
            Err(err) => {
                error!(error = %err, "failed to list player names");
                Vec::new()
            }
        }
    }

    /// Name of the active tag when it still exists in the catalog.
    pub fn active_tag_name(&self, uuid: Uuid) -> Option<String> {
        let current = self.player(uuid)?.current_tag?;
        self.tags.get(&current).map(|tag| tag.name)
    }

    pub fn active_tag_text(&self, uuid: Uuid) -> String {
        self.player(uuid)
            .and_then(|record| record.current_tag)
            .and_then(|name| self.tags.get(&name))
            .map(|tag| tag.display_tag)
            .unwrap_or_else(|| self.default_tag_text())
    }

    /// Equips an unlocked tag, or clears the selection when `tag` is `None`.
    pub fn set_active_tag(&self, uuid: Uuid, tag: Option<&str>) -> Result<(), PlayerDataError> {
        let stored = match tag {
            Some(name) => {
                if !self.store.has_unlock(uuid, name).map_err(|err| store_error(uuid, err))? {
                    return Err(PlayerDataError::NotUnlocked(name.to_string()));
                }
                Some(self.tags.get(name).map(|tag| tag.name).unwrap_or_else(|| name.to_string()))
            }
            None => None,
        };

        let updated = self
            .store
            .set_current_tag(uuid, stored.as_deref())
            .map_err(|err| store_error(uuid, err))?;
        if updated == 0 {
            return Err(PlayerDataError::UnknownPlayer(uuid));
        }
        debug!(%uuid, tag = ?stored, "active tag changed");
        Ok(())
    }

    /// Returns `Ok(false)` when the tag was already unlocked.
    pub fn unlock(&self, uuid: Uuid, tag: &str) -> Result<bool, PlayerDataError> {
        self.require_player(uuid)?;
        let inserted = self
            .store
            .insert_unlock(uuid, tag)
            .map_err(|err| store_error(uuid, err))?;
        Ok(inserted > 0)
    }

    /// Removes one unlock. The active tag is left for the caller to clear.
    pub fn revoke_unlock(&self, uuid: Uuid, tag: &str) -> Result<bool, PlayerDataError> {
        let removed = self
            .store
            .delete_unlock(uuid, tag)
            .map_err(|err| store_error(uuid, err))?;
        Ok(removed > 0)
    }

    pub fn has_unlocked(&self, uuid: Uuid, tag: &str) -> bool {
        self.store
            .has_unlock(uuid, tag)
            .unwrap_or_else(|err| log_failure("check unlock", uuid, &err, false))
    }

    pub fn unlocked_tags(&self, uuid: Uuid) -> Vec<String> {
        self.store
            .unlocked_tag_names(uuid)
            .unwrap_or_else(|err| log_failure("list unlocks", uuid, &err, Vec::new()))
    }

    pub fn unlocked_count(&self, uuid: Uuid) -> usize {
        self.store
            .count_unlocks(uuid)
            .map(|count| count as usize)
            .unwrap_or_else(|err| log_failure("count unlocks", uuid, &err, 0))
    }

    pub fn unlocked_count_in_category(&self, uuid: Uuid, category: &str) -> usize {
        self.store
            .count_unlocks_in_category(uuid, category)
            .map(|count| count as usize)
            .unwrap_or_else(|err| log_failure("count category unlocks", uuid, &err, 0))
    }

    /// Deletes the player row; unlocks go with it.
    pub fn purge(&self, uuid: Uuid) -> bool {
        match self.store.delete_player(uuid) {
            Ok(removed) => removed > 0,
            Err(err) => log_failure("purge player", uuid, &err, false),
        }
    }

    fn require_player(&self, uuid: Uuid) -> Result<PlayerRecord, PlayerDataError> {
        self.store
            .find_player(uuid)
            .map_err(|err| store_error(uuid, err))?
            .ok_or(PlayerDataError::UnknownPlayer(uuid))
    }
}

fn log_failure<T>(operation: &str, uuid: Uuid, err: &StoreError, fallback: T) -> T {
    error!(operation, %uuid, error = %err, "player data operation failed");
    fallback
}

fn store_error(uuid: Uuid, err: StoreError) -> PlayerDataError {
    error!(%uuid, error = %err, "player data operation failed");
    PlayerDataError::Store(err)
}

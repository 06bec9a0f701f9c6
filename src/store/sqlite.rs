use std::path::Path;
use std::time::Duration;

use parking_lot::{Mutex, MutexGuard};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use crate::catalog::model::{Category, Tag};
use crate::players::PlayerRecord;

const TAGS_SCHEMA_VERSION: i64 = 2;

const TAGS_DB_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS schema_meta (
  id INTEGER PRIMARY KEY CHECK (id = 1),
  schema_version INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS categories (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  name TEXT NOT NULL UNIQUE COLLATE NOCASE,
  title TEXT NOT NULL,
  material TEXT NOT NULL,
  display_name TEXT NOT NULL,
  slot_position INTEGER NOT NULL DEFAULT 0,
  lore TEXT NOT NULL DEFAULT '[]',
  permission TEXT,
  permission_see_category INTEGER NOT NULL DEFAULT 0,
  created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
  updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
);

CREATE TABLE IF NOT EXISTS tags (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  name TEXT NOT NULL UNIQUE COLLATE NOCASE,
  display_tag TEXT NOT NULL,
  permission TEXT,
  description TEXT NOT NULL DEFAULT '',
  category TEXT NOT NULL COLLATE NOCASE,
  display_order INTEGER NOT NULL DEFAULT 0,
  display_name TEXT NOT NULL,
  display_item TEXT NOT NULL,
  cost INTEGER NOT NULL DEFAULT 0,
  created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
  updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
);

CREATE TABLE IF NOT EXISTS player_data (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  uuid TEXT NOT NULL UNIQUE,
  username TEXT NOT NULL COLLATE NOCASE,
  current_tag TEXT COLLATE NOCASE,
  last_seen TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
  created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
);

CREATE TABLE IF NOT EXISTS unlocked_tags (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  player_uuid TEXT NOT NULL REFERENCES player_data(uuid) ON DELETE CASCADE,
  tag_name TEXT NOT NULL COLLATE NOCASE,
  unlocked_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
  UNIQUE (player_uuid, tag_name)
);

CREATE INDEX IF NOT EXISTS idx_tags_category ON tags (category);
CREATE INDEX IF NOT EXISTS idx_player_current_tag ON player_data (current_tag);
CREATE INDEX IF NOT EXISTS idx_unlocked_tag_name ON unlocked_tags (tag_name);
"#;

/// Columns added after the first release, applied to older databases on open.
const COLUMN_MIGRATIONS: &[(&str, &str, &str)] = &[
    ("categories", "is_from_yaml", "INTEGER NOT NULL DEFAULT 1"),
    ("tags", "is_from_yaml", "INTEGER NOT NULL DEFAULT 1"),
];

const CATEGORY_COLUMNS: &str = "id, name, title, material, display_name, slot_position, lore, \
                                permission, permission_see_category, is_from_yaml";

const TAG_COLUMNS: &str = "id, name, display_tag, permission, description, category, \
                           display_order, display_name, display_item, cost, is_from_yaml";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("{0}")]
    InvalidData(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreStats {
    pub categories: i64,
    pub tags: i64,
    pub players: i64,
    pub unlocks: i64,
}

/// SQLite-backed persistent store for categories, tags and player state.
///
/// Each public method runs a single statement on the shared connection.
pub struct TagsDb {
    conn: Mutex<Connection>,
}

impl TagsDb {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        Self::open_with_timeout(path, Duration::from_millis(5000))
    }

    pub fn open_with_timeout(
        path: impl AsRef<Path>,
        busy_timeout: Duration,
    ) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        conn.busy_timeout(busy_timeout)?;
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        prepare_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock()
    }

    /// Creates missing tables and applies pending column migrations.
    pub fn ensure_schema(&self) -> Result<(), StoreError> {
        prepare_schema(&self.conn())
    }

    pub fn ping(&self) -> Result<(), StoreError> {
        self.conn().query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
        Ok(())
    }

    pub fn stats(&self) -> Result<StoreStats, StoreError> {
        let conn = self.conn();
        Ok(StoreStats {
            categories: count_rows(&conn, "categories")?,
            tags: count_rows(&conn, "tags")?,
            players: count_rows(&conn, "player_data")?,
            unlocks: count_rows(&conn, "unlocked_tags")?,
        })
    }

    // Categories

    pub fn load_categories(&self) -> Result<Vec<Category>, StoreError> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM categories ORDER BY slot_position, name",
            CATEGORY_COLUMNS
        ))?;
        let rows = stmt.query_map([], category_from_row)?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    pub fn find_category(&self, name: &str) -> Result<Option<Category>, StoreError> {
        let category = self
            .conn()
            .query_row(
                &format!("SELECT {} FROM categories WHERE name = ?1", CATEGORY_COLUMNS),
                params![name],
                category_from_row,
            )
            .optional()?;
        Ok(category)
    }

    pub fn insert_category(&self, category: &Category) -> Result<i64, StoreError> {
        let lore = lore_to_sql(&category.lore)?;
        let conn = self.conn();
        conn.execute(
            "INSERT INTO categories (name, title, material, display_name, slot_position, lore, \
                                     permission, permission_see_category, is_from_yaml) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                category.name,
                category.title,
                category.material,
                category.display_name,
                category.slot_position,
                lore,
                category.permission,
                category.permission_see_category,
                category.is_from_yaml,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Overwrites every declared field of the row matching `category.name`.
    pub fn update_category(&self, category: &Category) -> Result<usize, StoreError> {
        let lore = lore_to_sql(&category.lore)?;
        let changed = self.conn().execute(
            "UPDATE categories \
             SET name = ?1, title = ?2, material = ?3, display_name = ?4, slot_position = ?5, lore = ?6, \
                 permission = ?7, permission_see_category = ?8, is_from_yaml = ?9, \
                 updated_at = CURRENT_TIMESTAMP \
             WHERE name = ?1",
            params![
                category.name,
                category.title,
                category.material,
                category.display_name,
                category.slot_position,
                lore,
                category.permission,
                category.permission_see_category,
                category.is_from_yaml,
            ],
        )?;
        Ok(changed)
    }

    pub fn mark_categories_unsynced(&self) -> Result<usize, StoreError> {
        Ok(self
            .conn()
            .execute("UPDATE categories SET is_from_yaml = 0", [])?)
    }

    pub fn unsynced_categories(&self) -> Result<Vec<String>, StoreError> {
        query_names(
            &self.conn(),
            "SELECT name FROM categories WHERE is_from_yaml = 0 ORDER BY name",
            params![],
        )
    }

    pub fn count_tags_in_category(&self, category: &str) -> Result<i64, StoreError> {
        Ok(self.conn().query_row(
            "SELECT COUNT(*) FROM tags WHERE category = ?1",
            params![category],
            |row| row.get(0),
        )?)
    }

    pub fn delete_category(&self, name: &str) -> Result<usize, StoreError> {
        Ok(self
            .conn()
            .execute("DELETE FROM categories WHERE name = ?1", params![name])?)
    }

    pub fn max_category_slot(&self) -> Result<Option<i32>, StoreError> {
        Ok(self
            .conn()
            .query_row("SELECT MAX(slot_position) FROM categories", [], |row| {
                row.get(0)
            })?)
    }

    // Tags

    pub fn load_tags(&self) -> Result<Vec<Tag>, StoreError> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM tags ORDER BY category, display_order, name",
            TAG_COLUMNS
        ))?;
        let rows = stmt.query_map([], tag_from_row)?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    pub fn find_tag(&self, name: &str) -> Result<Option<Tag>, StoreError> {
        let tag = self
            .conn()
            .query_row(
                &format!("SELECT {} FROM tags WHERE name = ?1", TAG_COLUMNS),
                params![name],
                tag_from_row,
            )
            .optional()?;
        Ok(tag)
    }

    pub fn insert_tag(&self, tag: &Tag) -> Result<i64, StoreError> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO tags (name, display_tag, permission, description, category, \
                               display_order, display_name, display_item, cost, is_from_yaml) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                tag.name,
                tag.display_tag,
                tag.permission,
                tag.description,
                tag.category,
                tag.display_order,
                tag.display_name,
                tag.display_item,
                tag.cost,
                tag.is_from_yaml,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Overwrites every declared field of the row matching `tag.name`.
    pub fn update_tag(&self, tag: &Tag) -> Result<usize, StoreError> {
        let changed = self.conn().execute(
            "UPDATE tags \
             SET name = ?1, display_tag = ?2, permission = ?3, description = ?4, category = ?5, \
                 display_order = ?6, display_name = ?7, display_item = ?8, cost = ?9, \
                 is_from_yaml = ?10, updated_at = CURRENT_TIMESTAMP \
             WHERE name = ?1",
            params![
                tag.name,
                tag.display_tag,
                tag.permission,
                tag.description,
                tag.category,
                tag.display_order,
                tag.display_name,
                tag.display_item,
                tag.cost,
                tag.is_from_yaml,
            ],
        )?;
        Ok(changed)
    }

    pub fn mark_tags_unsynced(&self) -> Result<usize, StoreError> {
        Ok(self.conn().execute("UPDATE tags SET is_from_yaml = 0", [])?)
    }

    pub fn unsynced_tags(&self) -> Result<Vec<String>, StoreError> {
        query_names(
            &self.conn(),
            "SELECT name FROM tags WHERE is_from_yaml = 0 ORDER BY name",
            params![],
        )
    }

    pub fn tag_names_in_category(&self, category: &str) -> Result<Vec<String>, StoreError> {
        query_names(
            &self.conn(),
            "SELECT name FROM tags WHERE category = ?1 ORDER BY display_order, name",
            params![category],
        )
    }

    pub fn count_active_tag_users(&self, tag: &str) -> Result<i64, StoreError> {
        Ok(self.conn().query_row(
            "SELECT COUNT(*) FROM player_data WHERE current_tag = ?1",
            params![tag],
            |row| row.get(0),
        )?)
    }

    pub fn count_tag_unlocks(&self, tag: &str) -> Result<i64, StoreError> {
        Ok(self.conn().query_row(
            "SELECT COUNT(*) FROM unlocked_tags WHERE tag_name = ?1",
            params![tag],
            |row| row.get(0),
        )?)
    }

    pub fn reset_active_tag(&self, tag: &str) -> Result<usize, StoreError> {
        Ok(self.conn().execute(
            "UPDATE player_data SET current_tag = NULL WHERE current_tag = ?1",
            params![tag],
        )?)
    }

    pub fn delete_tag_unlocks(&self, tag: &str) -> Result<usize, StoreError> {
        Ok(self
            .conn()
            .execute("DELETE FROM unlocked_tags WHERE tag_name = ?1", params![tag])?)
    }

    pub fn delete_tag(&self, name: &str) -> Result<usize, StoreError> {
        Ok(self
            .conn()
            .execute("DELETE FROM tags WHERE name = ?1", params![name])?)
    }

    pub fn max_tag_order(&self, category: &str) -> Result<Option<i32>, StoreError> {
        Ok(self.conn().query_row(
            "SELECT MAX(display_order) FROM tags WHERE category = ?1",
            params![category],
            |row| row.get(0),
        )?)
    }

    // Players

    /// Inserts the player unless a row already exists. Returns the rows inserted.
    pub fn insert_player_if_absent(&self, uuid: Uuid, username: &str) -> Result<usize, StoreError> {
        Ok(self.conn().execute(
            "INSERT OR IGNORE INTO player_data (uuid, username) VALUES (?1, ?2)",
            params![uuid.to_string(), username],
        )?)
    }

    pub fn update_player_name(&self, uuid: Uuid, username: &str) -> Result<usize, StoreError> {
        Ok(self.conn().execute(
            "UPDATE player_data SET username = ?2, last_seen = CURRENT_TIMESTAMP WHERE uuid = ?1",
            params![uuid.to_string(), username],
        )?)
    }

    pub fn find_player(&self, uuid: Uuid) -> Result<Option<PlayerRecord>, StoreError> {
        let player = self
            .conn()
            .query_row(
                "SELECT uuid, username, current_tag FROM player_data WHERE uuid = ?1",
                params![uuid.to_string()],
                player_from_row,
            )
            .optional()?;
        Ok(player)
    }

    pub fn find_player_by_name(&self, username: &str) -> Result<Option<PlayerRecord>, StoreError> {
        let player = self
            .conn()
            .query_row(
                "SELECT uuid, username, current_tag FROM player_data \
                 WHERE username = ?1 ORDER BY last_seen DESC LIMIT 1",
                params![username],
                player_from_row,
            )
            .optional()?;
        Ok(player)
    }

    pub fn player_names(&self) -> Result<Vec<String>, StoreError> {
        query_names(
            &self.conn(),
            "SELECT username FROM player_data ORDER BY username",
            params![],
        )
    }

    pub fn set_current_tag(&self, uuid: Uuid, tag: Option<&str>) -> Result<usize, StoreError> {
        Ok(self.conn().execute(
            "UPDATE player_data SET current_tag = ?2 WHERE uuid = ?1",
            params![uuid.to_string(), tag],
        )?)
    }

    pub fn delete_player(&self, uuid: Uuid) -> Result<usize, StoreError> {
        Ok(self.conn().execute(
            "DELETE FROM player_data WHERE uuid = ?1",
            params![uuid.to_string()],
        )?)
    }

    // Unlocks

    /// Insert-or-ignore. Returns 0 when the pair was already present.
    pub fn insert_unlock(&self, uuid: Uuid, tag: &str) -> Result<usize, StoreError> {
        Ok(self.conn().execute(
            "INSERT OR IGNORE INTO unlocked_tags (player_uuid, tag_name) VALUES (?1, ?2)",
            params![uuid.to_string(), tag],
        )?)
    }

    pub fn delete_unlock(&self, uuid: Uuid, tag: &str) -> Result<usize, StoreError> {
        Ok(self.conn().execute(
            "DELETE FROM unlocked_tags WHERE player_uuid = ?1 AND tag_name = ?2",
            params![uuid.to_string(), tag],
        )?)
    }

    pub fn has_unlock(&self, uuid: Uuid, tag: &str) -> Result<bool, StoreError> {
        let found = self
            .conn()
            .query_row(
                "SELECT 1 FROM unlocked_tags WHERE player_uuid = ?1 AND tag_name = ?2",
                params![uuid.to_string(), tag],
                |row| row.get::<_, i64>(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    pub fn unlocked_tag_names(&self, uuid: Uuid) -> Result<Vec<String>, StoreError> {
        query_names(
            &self.conn(),
            "SELECT tag_name FROM unlocked_tags WHERE player_uuid = ?1 ORDER BY unlocked_at, id",
            params![uuid.to_string()],
        )
    }

    pub fn count_unlocks(&self, uuid: Uuid) -> Result<i64, StoreError> {
        Ok(self.conn().query_row(
            "SELECT COUNT(*) FROM unlocked_tags WHERE player_uuid = ?1",
            params![uuid.to_string()],
            |row| row.get(0),
        )?)
    }

    pub fn count_unlocks_in_category(&self, uuid: Uuid, category: &str) -> Result<i64, StoreError> {
        Ok(self.conn().query_row(
            "SELECT COUNT(*) FROM unlocked_tags u \
             JOIN tags t ON t.name = u.tag_name \
             WHERE u.player_uuid = ?1 AND t.category = ?2",
            params![uuid.to_string(), category],
            |row| row.get(0),
        )?)
    }
}

fn prepare_schema(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(TAGS_DB_SCHEMA)?;
    apply_column_migrations(conn)?;
    ensure_schema_meta(conn)
}

fn apply_column_migrations(conn: &Connection) -> Result<(), StoreError> {
    for (table, column, definition) in COLUMN_MIGRATIONS {
        if !column_exists(conn, table, column)? {
            conn.execute_batch(&format!(
                "ALTER TABLE {} ADD COLUMN {} {};",
                table, column, definition
            ))?;
        }
    }
    Ok(())
}

fn column_exists(conn: &Connection, table: &str, column: &str) -> Result<bool, StoreError> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", table))?;
    let rows = stmt.query_map([], |row| row.get::<_, String>(1))?;
    for row in rows {
        if row?.eq_ignore_ascii_case(column) {
            return Ok(true);
        }
    }
    Ok(false)
}

fn ensure_schema_meta(conn: &Connection) -> Result<(), StoreError> {
    let existing: Option<i64> = conn
        .query_row(
            "SELECT schema_version FROM schema_meta WHERE id = 1",
            [],
            |row| row.get(0),
        )
        .optional()?;

    match existing {
        None => {
            conn.execute(
                "INSERT INTO schema_meta (id, schema_version) VALUES (1, ?1)",
                params![TAGS_SCHEMA_VERSION],
            )?;
        }
        Some(version) if version > TAGS_SCHEMA_VERSION => {
            return Err(StoreError::InvalidData(format!(
                "database schema version {} is newer than supported {}",
                version, TAGS_SCHEMA_VERSION
            )));
        }
        Some(version) if version < TAGS_SCHEMA_VERSION => {
            conn.execute(
                "UPDATE schema_meta SET schema_version = ?1 WHERE id = 1",
                params![TAGS_SCHEMA_VERSION],
            )?;
        }
        Some(_) => {}
    }
    Ok(())
}

fn count_rows(conn: &Connection, table: &str) -> Result<i64, StoreError> {
    Ok(conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
        row.get(0)
    })?)
}

fn query_names(
    conn: &Connection,
    sql: &str,
    params: &[&dyn rusqlite::ToSql],
) -> Result<Vec<String>, StoreError> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params, |row| row.get::<_, String>(0))?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

fn lore_to_sql(lore: &[String]) -> Result<String, StoreError> {
    serde_json::to_string(lore)
        .map_err(|err| StoreError::InvalidData(format!("unable to encode lore: {}", err)))
}

fn category_from_row(row: &Row<'_>) -> rusqlite::Result<Category> {
    let lore_raw: String = row.get(6)?;
    let lore: Vec<String> = serde_json::from_str(&lore_raw)
        .map_err(|err| rusqlite::Error::FromSqlConversionFailure(6, Type::Text, Box::new(err)))?;
    Ok(Category {
        id: row.get(0)?,
        name: row.get(1)?,
        title: row.get(2)?,
        material: row.get(3)?,
        display_name: row.get(4)?,
        slot_position: row.get(5)?,
        lore,
        permission: row.get(7)?,
        permission_see_category: row.get(8)?,
        is_from_yaml: row.get(9)?,
    })
}

fn tag_from_row(row: &Row<'_>) -> rusqlite::Result<Tag> {
    Ok(Tag {
        id: row.get(0)?,
        name: row.get(1)?,
        display_tag: row.get(2)?,
        permission: row.get(3)?,
        description: row.get(4)?,
        category: row.get(5)?,
        display_order: row.get(6)?,
        display_name: row.get(7)?,
        display_item: row.get(8)?,
        cost: row.get(9)?,
        is_from_yaml: row.get(10)?,
    })
}

fn player_from_row(row: &Row<'_>) -> rusqlite::Result<PlayerRecord> {
    let raw: String = row.get(0)?;
    let uuid = Uuid::parse_str(&raw)
        .map_err(|err| rusqlite::Error::FromSqlConversionFailure(0, Type::Text, Box::new(err)))?;
    Ok(PlayerRecord {
        uuid,
        username: row.get(1)?,
        current_tag: row.get(2)?,
    })
}

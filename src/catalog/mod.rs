pub mod cache;
pub mod categories;
pub mod model;
pub mod tags;

use std::sync::Arc;

use bevy_utils::tracing::error;
use parking_lot::Mutex;

use crate::catalog::model::NameError;
use crate::store::StoreError;

pub use cache::{CatalogCache, CatalogSnapshot};
pub use categories::CategoryCatalog;
pub use model::{Category, Tag, DEFAULT_NAME};
pub use tags::{TagCatalog, TagDeletion, TagReferences};

/// Single-writer lock shared by catalog mutations and reconciliation runs.
pub type WriteLock = Arc<Mutex<()>>;

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error(transparent)]
    InvalidName(#[from] NameError),
    #[error("{kind} '{name}' already exists")]
    Duplicate { kind: &'static str, name: String },
    #[error("category '{0}' does not exist")]
    UnknownCategory(String),
    #[error("{kind} '{name}' does not exist")]
    NotFound { kind: &'static str, name: String },
    #[error("the {kind} 'default' is required and cannot be deleted")]
    Protected { kind: &'static str },
    #[error("category '{name}' still contains {tags} tag(s)")]
    CategoryInUse { name: String, tags: i64 },
    #[error("database error: {0}")]
    Store(StoreError),
    #[error("catalog was already initialized")]
    AlreadyInitialized,
}

pub(crate) fn store_failure(operation: &'static str, err: StoreError) -> CatalogError {
    error!(operation, error = %err, "catalog store operation failed");
    CatalogError::Store(err)
}

pub mod manager;

use uuid::Uuid;

pub use manager::{PlayerDataError, PlayerDataManager};

/// Persisted state for a player who has joined at least once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerRecord {
    pub uuid: Uuid,
    pub username: String,
    /// `None` means the default tag is shown.
    pub current_tag: Option<String>,
}

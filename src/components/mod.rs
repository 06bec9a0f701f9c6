pub mod player;

pub use player::{OpenMenu, PermissionCheck, Permissions, PlayerIdentity};

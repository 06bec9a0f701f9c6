pub mod commands;
pub mod menus;
pub mod outbox;
pub mod players;

pub use commands::command_system;
pub use menus::menu_system;
pub use outbox::{clear_queue_system, colorize_outbox_system};
pub use players::player_session_system;

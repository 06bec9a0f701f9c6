pub mod catalog;
pub mod commands;
pub mod components;
pub mod core;
pub mod data;
pub mod players;
pub mod store;
pub mod sync;
pub mod systems;
pub mod ui;

#[cfg(test)]
mod test_support;

// Entry points for the host binary and embedding servers
pub use crate::core::{
    init_logging, GrvTags, HostEvent, OutboundMessage, Recipient, Server, StartupError,
};
pub use crate::ui::PlaceholderResolver;

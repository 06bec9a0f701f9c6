pub mod ecs;
pub mod logging;
pub mod plugin;
pub mod server;

pub use ecs::{create_schedule, create_world, TickSet};
pub use logging::init_logging;
pub use plugin::{CleanupReport, GrvTags, PluginStatus, ReloadError, ReloadReport, StartupError, VERSION};
pub use server::{HostEvent, HostQueue, OutboundMessage, Outbox, Recipient, Server, TagsPlugin};

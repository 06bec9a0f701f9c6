use std::sync::Arc;

use bevy_ecs::prelude::*;
use bevy_ecs::schedule::SystemSet;

use crate::core::plugin::GrvTags;
use crate::core::server::{HostQueue, Outbox, TagsPlugin};
use crate::systems::commands::command_system;
use crate::systems::menus::menu_system;
use crate::systems::outbox::{clear_queue_system, colorize_outbox_system};
use crate::systems::players::player_session_system;

/// Canonical tick ordering for host events.
#[derive(SystemSet, Debug, Hash, PartialEq, Eq, Clone)]
pub enum TickSet {
    Intake,
    Interaction,
    Outbox,
}

/// Build the ECS world with baseline resources.
pub fn create_world(plugin: Arc<GrvTags>) -> World {
    let mut world = World::new();
    world.insert_resource(TagsPlugin(plugin));
    world.insert_resource(HostQueue::default());
    world.insert_resource(Outbox::default());
    world
}

/// Build the system schedule in the canonical order.
pub fn create_schedule() -> Schedule {
    let mut schedule = Schedule::default();

    schedule.configure_sets((TickSet::Intake, TickSet::Interaction, TickSet::Outbox).chain());

    schedule.add_systems((
        player_session_system.in_set(TickSet::Intake),
        (command_system, menu_system)
            .chain()
            .in_set(TickSet::Interaction),
        (colorize_outbox_system, clear_queue_system).in_set(TickSet::Outbox),
    ));

    schedule
}

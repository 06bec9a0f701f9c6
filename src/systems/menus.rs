use bevy_ecs::prelude::*;
use bevy_utils::tracing::debug;

use crate::components::player::{OpenMenu, Permissions, PlayerIdentity};
use crate::core::server::{HostEvent, HostQueue, Outbox, Recipient, TagsPlugin};
use crate::ui::interaction::{handle_click, MenuTransition};
use crate::ui::menu::Viewer;

/// Applies inventory clicks and closes to each player's open menu.
pub fn menu_system(
    queue: Res<HostQueue>,
    plugin: Res<TagsPlugin>,
    mut outbox: ResMut<Outbox>,
    mut players: Query<(&PlayerIdentity, &Permissions, &mut OpenMenu)>,
) {
    let prefix = plugin.0.prefix();
    let context = plugin.0.menu_context();

    for event in queue.0.iter() {
        match event {
            HostEvent::Click { uuid, slot } => {
                let Some((identity, permissions, mut open)) = players
                    .iter_mut()
                    .find(|(identity, _, _)| identity.uuid == *uuid)
                else {
                    continue;
                };
                let outcome = {
                    let Some(menu) = open.0.as_ref() else {
                        debug!(player = %identity.name, slot, "click without an open menu");
                        continue;
                    };
                    let viewer = Viewer {
                        uuid: identity.uuid,
                        name: &identity.name,
                        permissions,
                    };
                    handle_click(&context, &viewer, menu, *slot)
                };

                for message in outcome.messages {
                    outbox.push(Recipient::Player(*uuid), format!("{}{}", prefix, message));
                }
                match outcome.transition {
                    MenuTransition::Keep => {}
                    MenuTransition::Open(menu) => open.0 = Some(menu),
                    MenuTransition::Close => open.0 = None,
                }
            }
            HostEvent::Close { uuid } => {
                if let Some((_, _, mut open)) = players
                    .iter_mut()
                    .find(|(identity, _, _)| identity.uuid == *uuid)
                {
                    open.0 = None;
                }
            }
            _ => {}
        }
    }
}

use std::collections::HashMap;

use bevy_ecs::prelude::*;
use bevy_utils::tracing::{debug, info, warn};
use uuid::Uuid;

use crate::components::player::{OpenMenu, Permissions, PlayerIdentity};
use crate::core::server::{HostEvent, HostQueue, TagsPlugin};

/// Spawns an entity per joining player and despawns it on quit.
///
/// Joining also makes sure the player has a stored record with their
/// current name. The stored active tag is never touched here.
pub fn player_session_system(
    mut commands: Commands,
    queue: Res<HostQueue>,
    plugin: Res<TagsPlugin>,
    online: Query<(Entity, &PlayerIdentity)>,
) {
    let mut sessions: HashMap<Uuid, Entity> = online
        .iter()
        .map(|(entity, identity)| (identity.uuid, entity))
        .collect();

    for event in queue.0.iter() {
        match event {
            HostEvent::Join {
                uuid,
                name,
                op,
                permissions,
            } => {
                let players = plugin.0.players();
                if !players.ensure_exists(*uuid, name) {
                    warn!(player = %name, "could not verify player record on join");
                }
                players.refresh_name(*uuid, name);

                let identity = PlayerIdentity {
                    uuid: *uuid,
                    name: name.clone(),
                };
                let granted = Permissions::new(*op, permissions.iter().cloned());
                if let Some(entity) = sessions.get(uuid).copied() {
                    commands.entity(entity).insert((identity, granted));
                    debug!(player = %name, "duplicate join refreshed the session");
                    continue;
                }

                let entity = commands
                    .spawn((identity, granted, OpenMenu::default()))
                    .id();
                sessions.insert(*uuid, entity);
                info!(player = %name, %uuid, "player joined");
            }
            HostEvent::Quit { uuid } => {
                if let Some(entity) = sessions.remove(uuid) {
                    commands.entity(entity).despawn();
                    debug!(%uuid, "player left");
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::player::PermissionCheck;
    use crate::core::ecs::{create_schedule, create_world};
    use crate::core::plugin::GrvTags;
    use std::sync::Arc;

    #[test]
    fn join_quit_and_rejoin_in_one_tick() {
        let dir = tempfile::tempdir().unwrap();
        let plugin = Arc::new(GrvTags::enable(dir.path()).unwrap());
        let mut world = create_world(plugin.clone());
        let mut schedule = create_schedule();
        let uuid = Uuid::new_v4();
        let join = |name: &str, nodes: Vec<String>| HostEvent::Join {
            uuid,
            name: name.to_string(),
            op: false,
            permissions: nodes,
        };

        world.resource_mut::<HostQueue>().0 = vec![
            join("Steve", Vec::new()),
            HostEvent::Quit { uuid },
            join("Steven", vec!["grvtags.category.xmas".to_string()]),
        ];
        schedule.run(&mut world);

        let mut query = world.query::<(&PlayerIdentity, &Permissions)>();
        let sessions: Vec<_> = query.iter(&world).collect();
        assert_eq!(sessions.len(), 1);
        assert!(sessions[0].1.has_permission("grvtags.category.xmas"));
        assert_eq!(plugin.players().player(uuid).unwrap().username, "Steven");
    }
}

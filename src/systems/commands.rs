use std::collections::HashSet;

use bevy_ecs::prelude::*;
use bevy_utils::tracing::{info, warn};
use uuid::Uuid;

use crate::commands::{dispatch, CommandOutput, CommandSender};
use crate::components::player::{OpenMenu, Permissions, PlayerIdentity};
use crate::core::server::{HostEvent, HostQueue, Outbox, Recipient, TagsPlugin};
use crate::ui::menu::Viewer;

const UNKNOWN_COMMAND: &str = "&cUnknown command. Try /tags or /grvtags help.";

/// Runs queued command lines for the console and online players.
pub fn command_system(
    queue: Res<HostQueue>,
    plugin: Res<TagsPlugin>,
    mut outbox: ResMut<Outbox>,
    mut players: Query<(&PlayerIdentity, &Permissions, &mut OpenMenu)>,
) {
    let online: HashSet<Uuid> = players.iter().map(|(identity, _, _)| identity.uuid).collect();
    let is_online = |uuid: Uuid| online.contains(&uuid);

    for event in queue.0.iter() {
        let HostEvent::Command { sender, line } = event else {
            continue;
        };

        let Some(uuid) = sender else {
            info!(sender = "CONSOLE", command = %line, "command issued");
            let output = dispatch(&plugin.0, &CommandSender::Console, &is_online, line);
            deliver(&mut outbox, Recipient::Console, output);
            continue;
        };

        let Some((identity, permissions, mut open)) = players
            .iter_mut()
            .find(|(identity, _, _)| identity.uuid == *uuid)
        else {
            warn!(%uuid, command = %line, "command from a player who is not online");
            continue;
        };
        info!(sender = %identity.name, command = %line, "command issued");

        let viewer = Viewer {
            uuid: identity.uuid,
            name: &identity.name,
            permissions,
        };
        let mut output = dispatch(&plugin.0, &CommandSender::Player(viewer), &is_online, line);
        if let Some(menu) = output.as_mut().and_then(|output| output.open_menu.take()) {
            open.0 = Some(menu);
        }
        deliver(&mut outbox, Recipient::Player(*uuid), output);
    }
}

fn deliver(outbox: &mut Outbox, recipient: Recipient, output: Option<CommandOutput>) {
    let Some(output) = output else {
        outbox.push(recipient, UNKNOWN_COMMAND);
        return;
    };
    for reply in output.replies {
        outbox.push(recipient, reply);
    }
    for notice in output.notices {
        outbox.push(Recipient::Player(notice.target), notice.message);
    }
}

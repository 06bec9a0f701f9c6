use std::sync::Arc;

use bevy_ecs::prelude::*;
use uuid::Uuid;

use crate::commands::{complete, CommandSender};
use crate::components::player::{OpenMenu, Permissions, PlayerIdentity};
use crate::core::ecs::{create_schedule, create_world};
use crate::core::plugin::GrvTags;
use crate::ui::menu::{Menu, Viewer};

/// Something the host server reports to the plugin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    Join {
        uuid: Uuid,
        name: String,
        op: bool,
        permissions: Vec<String>,
    },
    Quit {
        uuid: Uuid,
    },
    /// `sender` is `None` for the console.
    Command {
        sender: Option<Uuid>,
        line: String,
    },
    Click {
        uuid: Uuid,
        slot: usize,
    },
    Close {
        uuid: Uuid,
    },
}

/// Events delivered for the current tick.
#[derive(Resource, Default, Debug)]
pub struct HostQueue(pub Vec<HostEvent>);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recipient {
    Console,
    Player(Uuid),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub recipient: Recipient,
    pub text: String,
}

/// Chat lines produced during a tick, colourised before they leave.
#[derive(Resource, Default, Debug)]
pub struct Outbox(pub Vec<OutboundMessage>);

impl Outbox {
    pub fn push(&mut self, recipient: Recipient, text: impl Into<String>) {
        self.0.push(OutboundMessage {
            recipient,
            text: text.into(),
        });
    }
}

/// The enabled plugin, shared with every system.
#[derive(Resource, Clone)]
pub struct TagsPlugin(pub Arc<GrvTags>);

/// Wrapper around the ECS world and schedule that stands in for the host.
pub struct Server {
    world: World,
    schedule: Schedule,
}

impl Server {
    pub fn new(plugin: Arc<GrvTags>) -> Self {
        Self {
            world: create_world(plugin),
            schedule: create_schedule(),
        }
    }

    /// Runs one tick over `events` and returns the messages to deliver.
    pub fn tick(&mut self, events: Vec<HostEvent>) -> Vec<OutboundMessage> {
        self.world.resource_mut::<HostQueue>().0 = events;
        self.schedule.run(&mut self.world);
        std::mem::take(&mut self.world.resource_mut::<Outbox>().0)
    }

    pub fn plugin(&self) -> Arc<GrvTags> {
        self.world.resource::<TagsPlugin>().0.clone()
    }

    /// The menu a player has open, if any.
    pub fn open_menu(&mut self, uuid: Uuid) -> Option<Menu> {
        let mut query = self.world.query::<(&PlayerIdentity, &OpenMenu)>();
        query
            .iter(&self.world)
            .find(|(identity, _)| identity.uuid == uuid)
            .and_then(|(_, open)| open.0.clone())
    }

    /// Tab completion for a partially typed command line.
    pub fn complete(&mut self, sender: Option<Uuid>, line: &str) -> Vec<String> {
        let plugin = self.plugin();
        let Some(uuid) = sender else {
            return complete(&plugin, &CommandSender::Console, line);
        };
        let mut query = self.world.query::<(&PlayerIdentity, &Permissions)>();
        let Some((identity, permissions)) = query
            .iter(&self.world)
            .find(|(identity, _)| identity.uuid == uuid)
        else {
            return Vec::new();
        };
        let viewer = Viewer {
            uuid,
            name: &identity.name,
            permissions,
        };
        complete(&plugin, &CommandSender::Player(viewer), line)
    }

    pub fn online_players(&mut self) -> Vec<PlayerIdentity> {
        let mut query = self.world.query::<&PlayerIdentity>();
        let mut players: Vec<PlayerIdentity> = query.iter(&self.world).cloned().collect();
        players.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
        players
    }

    pub fn find_online(&mut self, name: &str) -> Option<PlayerIdentity> {
        self.online_players()
            .into_iter()
            .find(|player| player.name.eq_ignore_ascii_case(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::menu::MenuKind;

    fn server() -> (tempfile::TempDir, Server) {
        let dir = tempfile::tempdir().unwrap();
        let plugin = Arc::new(GrvTags::enable(dir.path()).unwrap());
        (dir, Server::new(plugin))
    }

    fn join(uuid: Uuid, name: &str, op: bool) -> HostEvent {
        HostEvent::Join {
            uuid,
            name: name.to_string(),
            op,
            permissions: Vec::new(),
        }
    }

    fn texts(messages: &[OutboundMessage], recipient: Recipient) -> Vec<String> {
        messages
            .iter()
            .filter(|message| message.recipient == recipient)
            .map(|message| message.text.clone())
            .collect()
    }

    #[test]
    fn join_creates_player_record() {
        let (_dir, mut server) = server();
        let uuid = Uuid::new_v4();
        server.tick(vec![join(uuid, "Steve", false)]);

        assert_eq!(server.online_players().len(), 1);
        let record = server.plugin().players().player(uuid).unwrap();
        assert_eq!(record.username, "Steve");
        assert_eq!(record.current_tag, None);

        server.tick(vec![HostEvent::Quit { uuid }]);
        assert!(server.online_players().is_empty());
        assert!(server.plugin().players().player(uuid).is_some());
    }

    #[test]
    fn tags_command_opens_menu_and_clicks_navigate() {
        let (_dir, mut server) = server();
        let uuid = Uuid::new_v4();
        server.tick(vec![
            HostEvent::Join {
                uuid,
                name: "Steve".to_string(),
                op: false,
                permissions: vec!["grvtags.category.vip".to_string()],
            },
            HostEvent::Command {
                sender: Some(uuid),
                line: "tags".to_string(),
            },
        ]);
        let menu = server.open_menu(uuid).unwrap();
        assert_eq!(menu.kind, MenuKind::Main);

        let vip_slot = menu
            .items()
            .find(|(_, item)| item.name.contains("VIP"))
            .map(|(slot, _)| slot)
            .unwrap();
        server.tick(vec![HostEvent::Click { uuid, slot: vip_slot }]);
        assert!(matches!(
            server.open_menu(uuid).unwrap().kind,
            MenuKind::Category { .. }
        ));

        server.tick(vec![HostEvent::Close { uuid }]);
        assert!(server.open_menu(uuid).is_none());
    }

    #[test]
    fn admin_notices_reach_online_targets() {
        let (_dir, mut server) = server();
        let admin = Uuid::new_v4();
        let target = Uuid::new_v4();
        server.tick(vec![join(admin, "Admin", true), join(target, "Steve", false)]);

        let out = server.tick(vec![HostEvent::Command {
            sender: Some(admin),
            line: "/grvtags give Steve vip".to_string(),
        }]);
        let to_admin = texts(&out, Recipient::Player(admin));
        let to_target = texts(&out, Recipient::Player(target));
        assert!(to_admin.iter().any(|line| line.contains("given to §fSteve")));
        assert_eq!(to_target.len(), 1);
        assert!(to_target[0].starts_with("§8[§6grvTags§8]"));
    }

    #[test]
    fn console_commands_reply_to_console() {
        let (_dir, mut server) = server();
        let out = server.tick(vec![HostEvent::Command {
            sender: None,
            line: "tags".to_string(),
        }]);
        assert!(texts(&out, Recipient::Console)[0].contains("Only players"));

        let unknown = server.tick(vec![HostEvent::Command {
            sender: None,
            line: "spawn".to_string(),
        }]);
        assert!(texts(&unknown, Recipient::Console)[0].contains("Unknown command"));
    }

    #[test]
    fn completion_respects_sender_permissions() {
        let (_dir, mut server) = server();
        let member = Uuid::new_v4();
        server.tick(vec![join(member, "Steve", false)]);

        assert_eq!(server.complete(None, "grvtags rel"), vec!["reload"]);
        assert!(server.complete(Some(member), "grvtags rel").is_empty());
        assert!(server.complete(Some(Uuid::new_v4()), "grvtags rel").is_empty());
    }
}

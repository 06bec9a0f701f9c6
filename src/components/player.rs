use std::collections::BTreeSet;

use bevy_ecs::prelude::*;
use uuid::Uuid;

use crate::ui::menu::Menu;

/// Permission lookups as the host's permission system answers them.
pub trait PermissionCheck {
    fn has_permission(&self, node: &str) -> bool;
}

/// An online player.
#[derive(Component, Debug, Clone, PartialEq, Eq)]
pub struct PlayerIdentity {
    pub uuid: Uuid,
    pub name: String,
}

/// Granted permission nodes. Operators hold every node.
#[derive(Component, Debug, Clone, Default, PartialEq, Eq)]
pub struct Permissions {
    pub op: bool,
    pub nodes: BTreeSet<String>,
}

impl Permissions {
    pub fn new(op: bool, nodes: impl IntoIterator<Item = String>) -> Self {
        Self {
            op,
            nodes: nodes
                .into_iter()
                .map(|node| node.to_lowercase())
                .collect(),
        }
    }
}

impl PermissionCheck for Permissions {
    fn has_permission(&self, node: &str) -> bool {
        self.op || self.nodes.contains(&node.to_lowercase())
    }
}

/// The inventory menu a player currently has open.
#[derive(Component, Debug, Default)]
pub struct OpenMenu(pub Option<Menu>);

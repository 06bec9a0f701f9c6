use bevy_ecs::prelude::*;

use crate::core::server::{HostQueue, Outbox};
use crate::ui::text::colorize;

/// Translates `&` codes in every pending line.
pub fn colorize_outbox_system(mut outbox: ResMut<Outbox>) {
    for message in outbox.0.iter_mut() {
        message.text = colorize(&message.text);
    }
}

pub fn clear_queue_system(mut queue: ResMut<HostQueue>) {
    queue.0.clear();
}

use std::sync::Arc;

use uuid::Uuid;

use crate::players::PlayerDataManager;
use crate::ui::text::colorize;

pub const IDENTIFIER: &str = "grvtags";

/// Resolves `%grvtags_<params>%` expressions for the templating host.
pub struct PlaceholderResolver {
    players: Arc<PlayerDataManager>,
}

impl PlaceholderResolver {
    pub fn new(players: Arc<PlayerDataManager>) -> Self {
        Self { players }
    }

    /// `None` means the expression is not one of ours.
    pub fn resolve(&self, player: Option<Uuid>, params: &str) -> Option<String> {
        let Some(uuid) = player else {
            return Some(String::new());
        };
        match params {
            "tag" => Some(colorize(&self.players.active_tag_text(uuid))),
            "tags" => Some(self.players.unlocked_count(uuid).to_string()),
            _ => {
                let category = params.strip_prefix("tags_")?;
                Some(
                    self.players
                        .unlocked_count_in_category(uuid, category)
                        .to_string(),
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::Services;

    #[test]
    fn expressions_resolve_against_player_data() {
        let services = Services::new();
        let resolver = PlaceholderResolver::new(services.players.clone());
        let uuid = services.join("PlayerA");
        services.players.unlock(uuid, "vip").unwrap();
        services.players.unlock(uuid, "mvp").unwrap();
        services.players.set_active_tag(uuid, Some("vip")).unwrap();

        assert_eq!(resolver.resolve(Some(uuid), "tag").as_deref(), Some("§6[VIP]"));
        assert_eq!(resolver.resolve(Some(uuid), "tags").as_deref(), Some("2"));
        assert_eq!(resolver.resolve(Some(uuid), "tags_rank").as_deref(), Some("2"));
        assert_eq!(resolver.resolve(Some(uuid), "tags_default").as_deref(), Some("0"));
        assert_eq!(resolver.resolve(Some(uuid), "rank"), None);
    }

    #[test]
    fn unknown_players_get_defaults() {
        let services = Services::new();
        let resolver = PlaceholderResolver::new(services.players.clone());
        let stranger = Uuid::new_v4();
        assert_eq!(
            resolver.resolve(Some(stranger), "tag").as_deref(),
            Some("§8[§7Member§8]")
        );
        assert_eq!(resolver.resolve(Some(stranger), "tags").as_deref(), Some("0"));
        assert_eq!(resolver.resolve(None, "tag").as_deref(), Some(""));
    }
}

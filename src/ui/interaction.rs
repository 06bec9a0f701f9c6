use bevy_utils::tracing::{debug, warn};

use crate::catalog::Tag;
use crate::ui::category_menu::{build_category_menu, tag_state, TagState};
use crate::ui::confirmation::build_confirmation;
use crate::ui::main_menu::build_main_menu;
use crate::ui::menu::{ClickAction, ConfirmAction, Menu, MenuContext, MenuKind, Viewer};

/// What happens to the open inventory after a click.
#[derive(Debug, Clone, PartialEq)]
pub enum MenuTransition {
    Keep,
    Open(Menu),
    Close,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClickOutcome {
    pub messages: Vec<String>,
    pub transition: MenuTransition,
}

impl ClickOutcome {
    fn keep() -> Self {
        Self {
            messages: Vec::new(),
            transition: MenuTransition::Keep,
        }
    }

    fn open(menu: Menu) -> Self {
        Self {
            messages: Vec::new(),
            transition: MenuTransition::Open(menu),
        }
    }

    fn say(mut self, message: impl Into<String>) -> Self {
        self.messages.push(message.into());
        self
    }
}

/// Resolves a click on `slot` of the open `menu`.
pub fn handle_click(
    context: &MenuContext<'_>,
    viewer: &Viewer<'_>,
    menu: &Menu,
    slot: usize,
) -> ClickOutcome {
    let Some(action) = menu.action(slot) else {
        return ClickOutcome::keep();
    };
    debug!(player = %viewer.name, slot, ?action, "menu click");

    match action {
        ClickAction::Info => ClickOutcome::keep(),
        ClickAction::Refresh => {
            ClickOutcome::open(build_main_menu(context, viewer)).say("&a✓ Menu refreshed")
        }
        ClickAction::BackToMain => ClickOutcome::open(build_main_menu(context, viewer)),
        ClickAction::OpenCategory(name) => open_category(context, viewer, name),
        ClickAction::Page(page) => match &menu.kind {
            MenuKind::Category { name, .. } => {
                ClickOutcome::open(build_category_menu(context, viewer, name, *page))
            }
            _ => ClickOutcome::keep(),
        },
        ClickAction::SelectTag(name) => select_tag(context, viewer, menu, name),
        ClickAction::RemoveActiveTag => request_removal(context, viewer, menu),
        ClickAction::Confirm => confirm(context, viewer, menu),
        ClickAction::Cancel => match &menu.kind {
            MenuKind::Confirm(ConfirmAction::RemoveActiveTag { category, page }) => {
                ClickOutcome::open(build_category_menu(context, viewer, category, *page))
                    .say("&7Action cancelled")
            }
            _ => ClickOutcome {
                messages: Vec::new(),
                transition: MenuTransition::Close,
            },
        },
    }
}

fn open_category(context: &MenuContext<'_>, viewer: &Viewer<'_>, name: &str) -> ClickOutcome {
    let Some(category) = context.tags.categories().get(name) else {
        return ClickOutcome::keep().say("&c✗ Error: category not found");
    };
    if let Some(node) = category.permission.as_deref().filter(|node| !node.is_empty()) {
        if !viewer.has_permission(node) {
            return ClickOutcome::keep()
                .say("&c✗ You do not have permission for this category")
                .say(format!("&7Required: &f{}", node));
        }
    }
    if context.tags.count_in_category(&category.name) == 0 {
        return ClickOutcome::keep().say("&e⚠ This category is empty");
    }
    ClickOutcome::open(build_category_menu(context, viewer, &category.name, 1))
}

fn current_page(menu: &Menu) -> Option<(String, usize)> {
    match &menu.kind {
        MenuKind::Category { name, page } => Some((name.clone(), *page)),
        _ => None,
    }
}

fn reopen(context: &MenuContext<'_>, viewer: &Viewer<'_>, menu: &Menu) -> MenuTransition {
    match current_page(menu) {
        Some((category, page)) => {
            MenuTransition::Open(build_category_menu(context, viewer, &category, page))
        }
        None => MenuTransition::Keep,
    }
}

fn select_tag(
    context: &MenuContext<'_>,
    viewer: &Viewer<'_>,
    menu: &Menu,
    name: &str,
) -> ClickOutcome {
    let Some(tag) = context.tags.get(name) else {
        return ClickOutcome::keep().say("&c✗ That tag no longer exists");
    };

    match tag_state(context, viewer, &tag) {
        TagState::Active => ClickOutcome::keep().say("&eYou already have this tag equipped!"),
        TagState::Unlocked => equip(context, viewer, menu, &tag),
        TagState::Locked => locked_reason(viewer, &tag),
    }
}

fn equip(context: &MenuContext<'_>, viewer: &Viewer<'_>, menu: &Menu, tag: &Tag) -> ClickOutcome {
    let selection = if tag.is_default() {
        None
    } else {
        Some(tag.name.as_str())
    };
    match context.players.set_active_tag(viewer.uuid, selection) {
        Ok(()) => ClickOutcome {
            messages: vec![format!("&aTag equipped! {}", tag.display_tag)],
            transition: reopen(context, viewer, menu),
        },
        Err(err) => {
            warn!(player = %viewer.name, tag = %tag.name, error = %err, "failed to equip tag");
            ClickOutcome::keep().say("&cCould not equip the tag. Please try again.")
        }
    }
}

fn locked_reason(viewer: &Viewer<'_>, tag: &Tag) -> ClickOutcome {
    if let Some(node) = tag.permission.as_deref() {
        if !viewer.has_permission(node) {
            return ClickOutcome::keep()
                .say("&cYou do not have permission to use this tag!")
                .say(format!("&7Required permission: &f{}", node));
        }
    }
    if !tag.is_free() {
        return ClickOutcome::keep().say(format!("&eThis tag costs &6{} coins&e!", tag.cost));
    }
    ClickOutcome::keep()
        .say("&eThis tag must be granted by an administrator!")
        .say(format!("&7Ask for &f/grvtags give {} {}", viewer.name, tag.name))
}

fn request_removal(context: &MenuContext<'_>, viewer: &Viewer<'_>, menu: &Menu) -> ClickOutcome {
    if context.players.active_tag_name(viewer.uuid).is_none() {
        return ClickOutcome::keep().say("&eYou already use the default tag!");
    }
    let Some((category, page)) = current_page(menu) else {
        return ClickOutcome::keep();
    };
    ClickOutcome::open(build_confirmation(ConfirmAction::RemoveActiveTag { category, page }))
}

fn confirm(context: &MenuContext<'_>, viewer: &Viewer<'_>, menu: &Menu) -> ClickOutcome {
    let MenuKind::Confirm(action) = &menu.kind else {
        return ClickOutcome::keep();
    };
    match action {
        ConfirmAction::RemoveActiveTag { category, page } => {
            match context.players.set_active_tag(viewer.uuid, None) {
                Ok(()) => ClickOutcome::open(build_category_menu(context, viewer, category, *page))
                    .say("&aTag removed! You now use the default tag."),
                Err(err) => {
                    warn!(player = %viewer.name, error = %err, "failed to clear active tag");
                    ClickOutcome {
                        messages: vec!["&cCould not remove the tag. Please try again.".to_string()],
                        transition: MenuTransition::Close,
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::player::Permissions;
    use crate::test_support::Services;
    use crate::ui::category_menu::{REMOVE_SLOT, NEXT_SLOT};
    use crate::ui::confirmation::{CANCEL_SLOT, CONFIRM_SLOT};
    use crate::ui::main_menu::{category_slot, REFRESH_SLOT};
    use crate::ui::menu::content_slots;
    use uuid::Uuid;

    fn viewer<'a>(uuid: Uuid, permissions: &'a Permissions) -> Viewer<'a> {
        Viewer {
            uuid,
            name: "PlayerA",
            permissions,
        }
    }

    fn opened(outcome: ClickOutcome) -> Menu {
        match outcome.transition {
            MenuTransition::Open(menu) => menu,
            other => panic!("expected a menu, got {:?}", other),
        }
    }

    fn slot_of(menu: &Menu, tag: &str) -> usize {
        content_slots(menu.size)
            .into_iter()
            .find(|slot| menu.action(*slot) == Some(&ClickAction::SelectTag(tag.to_string())))
            .unwrap()
    }

    #[test]
    fn hidden_categories_need_their_permission() {
        let services = Services::new();
        let context = services.menu_context();
        let uuid = services.join("PlayerA");

        let member = Permissions::default();
        let menu = build_main_menu(&context, &viewer(uuid, &member));
        // default and rank only, centred: slots 21 and 22.
        assert_eq!(
            menu.action(category_slot(0, 2).unwrap()),
            Some(&ClickAction::OpenCategory("default".to_string()))
        );
        assert!(!(19..=43).any(|slot| {
            menu.action(slot) == Some(&ClickAction::OpenCategory("secret".to_string()))
        }));

        let staff = Permissions::new(false, vec!["grvtags.category.secret".to_string()]);
        let menu = build_main_menu(&context, &viewer(uuid, &staff));
        assert_eq!(
            menu.action(category_slot(2, 3).unwrap()),
            Some(&ClickAction::OpenCategory("secret".to_string()))
        );
        assert_eq!(menu.action(REFRESH_SLOT), Some(&ClickAction::Refresh));
    }

    #[test]
    fn empty_category_does_not_open() {
        let services = Services::new();
        let context = services.menu_context();
        let uuid = services.join("PlayerA");
        let perms = Permissions::new(true, Vec::new());
        let main = build_main_menu(&context, &viewer(uuid, &perms));
        let slot = (19..=43)
            .find(|slot| main.action(*slot) == Some(&ClickAction::OpenCategory("secret".to_string())))
            .unwrap();

        let outcome = handle_click(&context, &viewer(uuid, &perms), &main, slot);
        assert_eq!(outcome.transition, MenuTransition::Keep);
        assert_eq!(outcome.messages, vec!["&e⚠ This category is empty"]);
    }

    #[test]
    fn category_permission_is_checked_on_click() {
        let services = Services::new();
        let context = services.menu_context();
        let uuid = services.join("PlayerA");

        let member = Permissions::default();
        let main = build_main_menu(&context, &viewer(uuid, &member));
        let rank_slot = (19..=43)
            .find(|slot| main.action(*slot) == Some(&ClickAction::OpenCategory("rank".to_string())))
            .unwrap();

        let refused = handle_click(&context, &viewer(uuid, &member), &main, rank_slot);
        assert_eq!(refused.transition, MenuTransition::Keep);
        assert_eq!(
            refused.messages,
            vec![
                "&c✗ You do not have permission for this category",
                "&7Required: &fgrvtags.category.rank"
            ]
        );

        let granted = Permissions::new(false, vec!["grvtags.category.rank".to_string()]);
        let menu = opened(handle_click(&context, &viewer(uuid, &granted), &main, rank_slot));
        assert_eq!(
            menu.kind,
            MenuKind::Category {
                name: "rank".to_string(),
                page: 1
            }
        );
    }

    #[test]
    fn unlocked_tag_is_equipped_and_locked_tag_explains_itself() {
        let services = Services::new();
        let context = services.menu_context();
        let uuid = services.join("PlayerA");
        services.players.unlock(uuid, "vip").unwrap();
        let perms = Permissions::new(false, vec!["grvtags.tag.mvp".to_string()]);
        let who = viewer(uuid, &perms);

        let menu = build_category_menu(&context, &who, "rank", 1);
        let outcome = handle_click(&context, &who, &menu, slot_of(&menu, "vip"));
        assert_eq!(outcome.messages, vec!["&aTag equipped! &6[VIP]"]);
        assert_eq!(services.players.active_tag_name(uuid).as_deref(), Some("vip"));

        let menu = opened(outcome);
        let again = handle_click(&context, &who, &menu, slot_of(&menu, "vip"));
        assert_eq!(again.messages, vec!["&eYou already have this tag equipped!"]);

        let locked = handle_click(&context, &who, &menu, slot_of(&menu, "mvp"));
        assert_eq!(locked.messages, vec!["&eThis tag costs &6250 coins&e!"]);
        assert_eq!(locked.transition, MenuTransition::Keep);
    }

    #[test]
    fn missing_permission_is_reported_before_cost() {
        let services = Services::new();
        let context = services.menu_context();
        let uuid = services.join("PlayerA");
        let perms = Permissions::default();
        let who = viewer(uuid, &perms);

        let menu = build_category_menu(&context, &who, "rank", 1);
        let outcome = handle_click(&context, &who, &menu, slot_of(&menu, "vip"));
        assert_eq!(
            outcome.messages,
            vec![
                "&cYou do not have permission to use this tag!",
                "&7Required permission: &fgrvtags.tag.vip"
            ]
        );
    }

    #[test]
    fn removing_the_active_tag_goes_through_confirmation() {
        let services = Services::new();
        let context = services.menu_context();
        let uuid = services.join("PlayerA");
        services.players.unlock(uuid, "vip").unwrap();
        services.players.set_active_tag(uuid, Some("vip")).unwrap();
        let perms = Permissions::default();
        let who = viewer(uuid, &perms);

        let menu = build_category_menu(&context, &who, "rank", 1);
        assert!(menu.action(NEXT_SLOT).is_none());
        let confirmation = opened(handle_click(&context, &who, &menu, REMOVE_SLOT));
        assert_eq!(confirmation.size, 27);

        let cancelled = handle_click(&context, &who, &confirmation, CANCEL_SLOT);
        assert_eq!(cancelled.messages, vec!["&7Action cancelled"]);
        assert_eq!(services.players.active_tag_name(uuid).as_deref(), Some("vip"));

        let confirmed = handle_click(&context, &who, &confirmation, CONFIRM_SLOT);
        assert_eq!(confirmed.messages, vec!["&aTag removed! You now use the default tag."]);
        assert_eq!(services.players.active_tag_name(uuid), None);
        let back = opened(confirmed);
        assert_eq!(
            back.kind,
            MenuKind::Category {
                name: "rank".to_string(),
                page: 1
            }
        );
        assert!(back.action(REMOVE_SLOT).is_none());
    }

    #[test]
    fn default_tag_is_active_without_a_selection() {
        let services = Services::new();
        let context = services.menu_context();
        let uuid = services.join("PlayerA");
        let perms = Permissions::default();
        let who = viewer(uuid, &perms);

        let menu = build_category_menu(&context, &who, "default", 1);
        let outcome = handle_click(&context, &who, &menu, slot_of(&menu, "default"));
        assert_eq!(outcome.messages, vec!["&eYou already have this tag equipped!"]);
    }
}

use crate::catalog::Category;
use crate::ui::menu::{info_item, ClickAction, Menu, MenuContext, MenuItem, MenuKind, Viewer, CHEST_SIZE};
use crate::ui::text::{percent, progress_bar, progress_color};

pub const MAIN_TITLE: &str = "&8&lSelect a Category";

pub const CATEGORY_SLOTS: [usize; 21] = [
    19, 20, 21, 22, 23, 24, 25, //
    28, 29, 30, 31, 32, 33, 34, //
    37, 38, 39, 40, 41, 42, 43,
];
const PER_ROW: usize = 7;

pub const CURRENT_TAG_SLOT: usize = 45;
pub const STATS_SLOT: usize = 49;
pub const REFRESH_SLOT: usize = 51;
pub const INFO_SLOT: usize = 53;
const EMPTY_SLOT: usize = 22;

/// Slot for the `index`-th of `count` visible categories. A single row is centred.
pub fn category_slot(index: usize, count: usize) -> Option<usize> {
    let offset = if count <= PER_ROW { (PER_ROW - count) / 2 } else { 0 };
    CATEGORY_SLOTS.get(index + offset).copied()
}

pub fn build_main_menu(context: &MenuContext<'_>, viewer: &Viewer<'_>) -> Menu {
    let mut menu = Menu::new(MenuKind::Main, MAIN_TITLE, CHEST_SIZE);
    menu.fill_borders();

    let visible: Vec<Category> = context
        .tags
        .categories()
        .all()
        .into_iter()
        .filter(|category| category.visible_to(|node| viewer.has_permission(node)))
        .collect();

    if visible.is_empty() {
        menu.set(
            EMPTY_SLOT,
            MenuItem::new(
                "BARRIER",
                "&c&lNo Categories",
                vec![
                    "&7There are no categories available".to_string(),
                    "&7for your permission level".to_string(),
                ],
            ),
        );
        menu.set_button(INFO_SLOT, info_item(context, viewer), ClickAction::Info);
        return menu;
    }

    for (index, category) in visible.iter().enumerate() {
        let Some(slot) = category_slot(index, visible.len()) else {
            break;
        };
        menu.set_button(
            slot,
            category_item(context, viewer, category),
            ClickAction::OpenCategory(category.name.clone()),
        );
    }

    menu.set_button(CURRENT_TAG_SLOT, current_tag_item(context, viewer), ClickAction::Info);
    menu.set_button(STATS_SLOT, stats_item(context, viewer), ClickAction::Info);
    menu.set_button(
        REFRESH_SLOT,
        MenuItem::new(
            "ECHO_SHARD",
            "&b&l↻ Refresh",
            vec![
                "&7Reloads the information".to_string(),
                "&7shown in this menu".to_string(),
                String::new(),
                "&e▶ Click to refresh".to_string(),
            ],
        ),
        ClickAction::Refresh,
    );
    menu.set_button(INFO_SLOT, info_item(context, viewer), ClickAction::Info);
    menu
}

fn category_item(context: &MenuContext<'_>, viewer: &Viewer<'_>, category: &Category) -> MenuItem {
    let total = context.tags.count_in_category(&category.name);
    let unlocked = context
        .players
        .unlocked_count_in_category(viewer.uuid, &category.name)
        .min(total);
    let progress = percent(unlocked, total);

    let mut lore = category.rendered_lore(total);
    lore.push(String::new());
    lore.push(format!(
        "&7Unlocked tags: {}{}&7/&f{}",
        progress_color(progress),
        unlocked,
        total
    ));
    lore.push(format!("&7Progress: {} &f{:.1}%", progress_bar(progress), progress));
    lore.push(String::new());
    if total == 0 {
        lore.push("&c✗ Empty category".to_string());
    } else if unlocked == 0 {
        lore.push("&e▶ Click to explore tags".to_string());
    } else {
        lore.push("&a✓ Click to see your tags".to_string());
        if unlocked == total {
            lore.push("&6★ Category completed!".to_string());
        }
    }

    MenuItem::new(category.material.clone(), category.display_name.clone(), lore)
}

fn current_tag_item(context: &MenuContext<'_>, viewer: &Viewer<'_>) -> MenuItem {
    MenuItem::new(
        "PLAYER_HEAD",
        "&6&lYour Current Tag",
        vec![
            "&7Your current tag:".to_string(),
            context.players.active_tag_text(viewer.uuid),
            String::new(),
            format!(
                "&7Total unlocked: &a{}",
                context.players.unlocked_count(viewer.uuid)
            ),
        ],
    )
}

fn stats_item(context: &MenuContext<'_>, viewer: &Viewer<'_>) -> MenuItem {
    let total_tags = context.tags.count();
    let unlocked = context.players.unlocked_count(viewer.uuid);
    MenuItem::new(
        "ENCHANTED_BOOK",
        "&b&lStatistics",
        vec![
            "&7Server statistics:".to_string(),
            format!("&8▪ &7Total tags: &f{}", total_tags),
            format!("&8▪ &7Categories: &f{}", context.tags.categories().count()),
            String::new(),
            "&7Your statistics:".to_string(),
            format!("&8▪ &7Unlocked tags: &a{}", unlocked),
            format!("&8▪ &7Overall progress: &f{:.1}%", percent(unlocked, total_tags)),
        ],
    )
}

use crate::catalog::{Category, Tag};
use crate::ui::menu::{
    content_slots, total_pages, ClickAction, Menu, MenuContext, MenuItem, MenuKind, Viewer,
    CHEST_SIZE,
};

pub const TAGS_PER_PAGE: usize = 21;

pub const PREVIOUS_SLOT: usize = 45;
pub const CATEGORY_INFO_SLOT: usize = 46;
pub const BACK_SLOT: usize = 47;
pub const PAGE_SLOT: usize = 49;
pub const REMOVE_SLOT: usize = 51;
pub const STATS_SLOT: usize = 52;
pub const NEXT_SLOT: usize = 53;
const MESSAGE_SLOT: usize = 22;

const ACTIVE_MATERIAL: &str = "DIAMOND";
const LOCKED_MATERIAL: &str = "GRAY_DYE";

/// How a tag relates to the viewing player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagState {
    Active,
    Unlocked,
    Locked,
}

/// The `default` tag is available to everyone and is active when nothing else is.
pub fn tag_state(context: &MenuContext<'_>, viewer: &Viewer<'_>, tag: &Tag) -> TagState {
    let active = context.players.active_tag_name(viewer.uuid);
    match active {
        Some(name) if name.eq_ignore_ascii_case(&tag.name) => TagState::Active,
        None if tag.is_default() => TagState::Active,
        _ if tag.is_default() || context.players.has_unlocked(viewer.uuid, &tag.name) => {
            TagState::Unlocked
        }
        _ => TagState::Locked,
    }
}

pub fn build_category_menu(
    context: &MenuContext<'_>,
    viewer: &Viewer<'_>,
    category_name: &str,
    page: usize,
) -> Menu {
    let Some(category) = context.tags.categories().get(category_name) else {
        return missing_category_menu(category_name, page);
    };
    let tags = context.tags.by_category(&category.name);
    let pages = total_pages(tags.len(), TAGS_PER_PAGE);
    let page = page.clamp(1, pages);

    let mut menu = Menu::new(
        MenuKind::Category {
            name: category.name.clone(),
            page,
        },
        category.page_title(page),
        CHEST_SIZE,
    );
    menu.fill_borders();

    if tags.is_empty() {
        menu.set(
            MESSAGE_SLOT,
            MenuItem::new(
                "BARRIER",
                "&c&lEmpty Category",
                vec![
                    "&7This category has no tags yet".to_string(),
                    "&7Check back later or ask an administrator".to_string(),
                ],
            ),
        );
    }

    let slots = content_slots(CHEST_SIZE);
    let start = (page - 1) * TAGS_PER_PAGE;
    for (slot, tag) in slots
        .iter()
        .take(TAGS_PER_PAGE)
        .zip(tags.iter().skip(start))
    {
        let state = tag_state(context, viewer, tag);
        menu.set_button(
            *slot,
            tag_item(viewer, tag, state),
            ClickAction::SelectTag(tag.name.clone()),
        );
    }

    if page > 1 {
        menu.set_button(
            PREVIOUS_SLOT,
            MenuItem::new(
                "ARROW",
                "&a◀ Previous Page",
                vec![format!("&7Go to page &f{}", page - 1)],
            ),
            ClickAction::Page(page - 1),
        );
    }
    if page < pages {
        menu.set_button(
            NEXT_SLOT,
            MenuItem::new(
                "ARROW",
                "&aNext Page ▶",
                vec![format!("&7Go to page &f{}", page + 1)],
            ),
            ClickAction::Page(page + 1),
        );
    }
    menu.set_button(
        PAGE_SLOT,
        MenuItem::new(
            "BOOK",
            format!("&6Page {}", page),
            vec![
                format!("&7Current page: &f{}&7/&f{}", page, pages),
                String::new(),
                format!("&7Tags in this category: &f{}", tags.len()),
            ],
        ),
        ClickAction::Info,
    );
    menu.set_button(
        BACK_SLOT,
        MenuItem::new(
            "BARRIER",
            "&c&l← Back",
            vec!["&7Return to the category list".to_string()],
        ),
        ClickAction::BackToMain,
    );
    menu.set_button(CATEGORY_INFO_SLOT, category_info_item(&category), ClickAction::Info);

    if context.players.active_tag_name(viewer.uuid).is_some() {
        menu.set_button(
            REMOVE_SLOT,
            MenuItem::new(
                "LAVA_BUCKET",
                "&c&lRemove Tag",
                vec![
                    "&7Your current tag:".to_string(),
                    context.players.active_tag_text(viewer.uuid),
                    String::new(),
                    "&e▶ Click to remove your tag".to_string(),
                    "&7(You will go back to the default tag)".to_string(),
                ],
            ),
            ClickAction::RemoveActiveTag,
        );
    }

    let unlocked_here = context
        .players
        .unlocked_count_in_category(viewer.uuid, &category.name);
    menu.set_button(
        STATS_SLOT,
        MenuItem::new(
            "ENCHANTED_BOOK",
            "&b&lYour Statistics",
            vec![
                format!("&7In this category: &a{}&7/&f{}", unlocked_here.min(tags.len()), tags.len()),
                format!(
                    "&7Total: &a{} tags",
                    context.players.unlocked_count(viewer.uuid)
                ),
            ],
        ),
        ClickAction::Info,
    );
    menu
}

fn tag_item(viewer: &Viewer<'_>, tag: &Tag, state: TagState) -> MenuItem {
    let material = match state {
        TagState::Active => ACTIVE_MATERIAL.to_string(),
        TagState::Unlocked => tag.display_item.clone(),
        TagState::Locked => LOCKED_MATERIAL.to_string(),
    };

    let mut lore = vec!["&7Preview:".to_string(), tag.display_tag.clone(), String::new()];
    if !tag.description.is_empty() {
        lore.push("&7Description:".to_string());
        lore.push(format!("&f{}", tag.description));
        lore.push(String::new());
    }
    match state {
        TagState::Active => lore.push("&a✓ &lThis is your current tag".to_string()),
        TagState::Unlocked => {
            lore.push("&a✓ Unlocked".to_string());
            lore.push("&e▶ Click to equip this tag".to_string());
        }
        TagState::Locked => {
            lore.push("&c✗ Locked".to_string());
            match tag.permission.as_deref() {
                Some(node) if !viewer.has_permission(node) => {
                    lore.push(format!("&c⚠ Requires permission: {}", node));
                }
                _ if !tag.is_free() => {
                    lore.push(format!("&7Cost: &6{} coins", tag.cost));
                }
                _ => lore.push("&7Granted by an administrator".to_string()),
            }
        }
    }
    if let Some(node) = tag.permission.as_deref() {
        lore.push(String::new());
        lore.push(format!("&8Permission: {}", node));
    }

    MenuItem::new(material, tag.rendered_display_name(), lore)
}

fn category_info_item(category: &Category) -> MenuItem {
    let mut lore = vec![format!("&7Category: &f{}", category.name), String::new()];
    lore.extend(category.lore.iter().cloned());
    MenuItem::new(category.material.clone(), "&6&lCategory Info", lore)
}

fn missing_category_menu(category_name: &str, page: usize) -> Menu {
    let mut menu = Menu::new(
        MenuKind::Category {
            name: category_name.to_string(),
            page,
        },
        format!("&8{} Tags", category_name),
        CHEST_SIZE,
    );
    menu.fill_borders();
    menu.set(
        MESSAGE_SLOT,
        MenuItem::new(
            "BARRIER",
            "&c&lError",
            vec![
                "&cCategory not found".to_string(),
                "&7Contact an administrator".to_string(),
            ],
        ),
    );
    menu.set_button(
        BACK_SLOT,
        MenuItem::new("ARROW", "&c&l← Back", Vec::new()),
        ClickAction::BackToMain,
    );
    menu
}

use std::collections::BTreeMap;

use uuid::Uuid;

use crate::catalog::TagCatalog;
use crate::components::player::PermissionCheck;
use crate::players::PlayerDataManager;
use crate::ui::text::strip_colors;

pub const CHEST_SIZE: usize = 54;
pub const CONFIRM_SIZE: usize = 27;
const ROW: usize = 9;

const FILLER_MATERIAL: &str = "GRAY_STAINED_GLASS_PANE";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuItem {
    pub material: String,
    pub name: String,
    pub lore: Vec<String>,
}

impl MenuItem {
    pub fn new(material: impl Into<String>, name: impl Into<String>, lore: Vec<String>) -> Self {
        Self {
            material: material.into(),
            name: name.into(),
            lore,
        }
    }

    fn filler() -> Self {
        Self::new(FILLER_MATERIAL, " ", Vec::new())
    }

    pub fn is_filler(&self) -> bool {
        self.material == FILLER_MATERIAL
    }
}

/// Which screen a menu shows, enough to rebuild it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuKind {
    Main,
    Category { name: String, page: usize },
    Confirm(ConfirmAction),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmAction {
    /// Clear the active tag, then return to the category page.
    RemoveActiveTag { category: String, page: usize },
}

/// What a slot does when clicked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickAction {
    OpenCategory(String),
    SelectTag(String),
    Page(usize),
    BackToMain,
    RemoveActiveTag,
    Refresh,
    Confirm,
    Cancel,
    Info,
}

/// A rendered inventory: items per slot plus the click action bound to each.
#[derive(Debug, Clone, PartialEq)]
pub struct Menu {
    pub kind: MenuKind,
    pub title: String,
    pub size: usize,
    items: BTreeMap<usize, MenuItem>,
    actions: BTreeMap<usize, ClickAction>,
}

impl Menu {
    pub fn new(kind: MenuKind, title: impl Into<String>, size: usize) -> Self {
        Self {
            kind,
            title: title.into(),
            size,
            items: BTreeMap::new(),
            actions: BTreeMap::new(),
        }
    }

    pub fn set(&mut self, slot: usize, item: MenuItem) {
        if slot < self.size {
            self.items.insert(slot, item);
            self.actions.remove(&slot);
        }
    }

    pub fn set_button(&mut self, slot: usize, item: MenuItem, action: ClickAction) {
        if slot < self.size {
            self.items.insert(slot, item);
            self.actions.insert(slot, action);
        }
    }

    pub fn item(&self, slot: usize) -> Option<&MenuItem> {
        self.items.get(&slot)
    }

    pub fn action(&self, slot: usize) -> Option<&ClickAction> {
        self.actions.get(&slot)
    }

    pub fn items(&self) -> impl Iterator<Item = (usize, &MenuItem)> {
        self.items.iter().map(|(slot, item)| (*slot, item))
    }

    pub fn fill_borders(&mut self) {
        for slot in border_slots(self.size) {
            self.set(slot, MenuItem::filler());
        }
    }

    /// Plain-text listing of the non-filler slots.
    pub fn describe(&self) -> Vec<String> {
        let mut lines = vec![format!("== {} ({} slots) ==", strip_colors(&self.title), self.size)];
        for (slot, item) in self.items() {
            if item.is_filler() {
                continue;
            }
            let marker = if self.actions.contains_key(&slot) { "*" } else { " " };
            lines.push(format!(
                "[{:>2}]{} {} ({})",
                slot,
                marker,
                strip_colors(&item.name),
                item.material
            ));
            for line in &item.lore {
                if !line.is_empty() {
                    lines.push(format!("        {}", strip_colors(line)));
                }
            }
        }
        lines
    }
}

/// The viewing player as the menus see them.
pub struct Viewer<'a> {
    pub uuid: Uuid,
    pub name: &'a str,
    pub permissions: &'a dyn PermissionCheck,
}

impl Viewer<'_> {
    pub fn has_permission(&self, node: &str) -> bool {
        self.permissions.has_permission(node)
    }
}

/// Shared services the menus read from.
#[derive(Clone, Copy)]
pub struct MenuContext<'a> {
    pub tags: &'a TagCatalog,
    pub players: &'a PlayerDataManager,
    pub version: &'a str,
}

pub fn border_slots(size: usize) -> Vec<usize> {
    let rows = size / ROW;
    (0..size)
        .filter(|slot| {
            let row = slot / ROW;
            let col = slot % ROW;
            row == 0 || row + 1 == rows || col == 0 || col == ROW - 1
        })
        .collect()
}

/// Inner slots in row-major order, excluding the border.
pub fn content_slots(size: usize) -> Vec<usize> {
    let rows = size / ROW;
    let mut slots = Vec::new();
    for row in 1..rows.saturating_sub(1) {
        for col in 1..ROW - 1 {
            slots.push(row * ROW + col);
        }
    }
    slots
}

pub fn total_pages(items: usize, per_page: usize) -> usize {
    if per_page == 0 {
        return 1;
    }
    items.div_ceil(per_page).max(1)
}

pub(crate) fn info_item(context: &MenuContext<'_>, viewer: &Viewer<'_>) -> MenuItem {
    MenuItem::new(
        "BOOK",
        "&6&lInformation",
        vec![
            format!("&7Plugin: &fgrvTags v{}", context.version),
            format!("&7Player: &f{}", viewer.name),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn border_and_content_partition_the_chest() {
        let borders = border_slots(CHEST_SIZE);
        let content = content_slots(CHEST_SIZE);
        assert_eq!(borders.len(), 26);
        assert_eq!(content.len(), 28);
        assert_eq!(&content[..7], &[10, 11, 12, 13, 14, 15, 16]);
        assert!(content.iter().all(|slot| !borders.contains(slot)));
        assert_eq!(content_slots(CONFIRM_SIZE), vec![10, 11, 12, 13, 14, 15, 16]);
    }

    #[test]
    fn buttons_bind_actions_and_plain_items_clear_them() {
        let mut menu = Menu::new(MenuKind::Main, "&8Test", CHEST_SIZE);
        menu.fill_borders();
        menu.set_button(53, MenuItem::new("BOOK", "Info", Vec::new()), ClickAction::Info);
        assert_eq!(menu.action(53), Some(&ClickAction::Info));
        menu.set(53, MenuItem::new("BOOK", "Info", Vec::new()));
        assert_eq!(menu.action(53), None);
        menu.set(99, MenuItem::new("STONE", "out of range", Vec::new()));
        assert!(menu.item(99).is_none());
        assert!(menu.item(0).map(MenuItem::is_filler).unwrap_or(false));
    }

    #[test]
    fn pages_round_up_with_a_minimum_of_one() {
        assert_eq!(total_pages(0, 21), 1);
        assert_eq!(total_pages(21, 21), 1);
        assert_eq!(total_pages(22, 21), 2);
    }
}

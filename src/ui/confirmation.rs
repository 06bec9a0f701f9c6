use crate::ui::menu::{ClickAction, ConfirmAction, Menu, MenuItem, MenuKind, CONFIRM_SIZE};

pub const CONFIRM_TITLE: &str = "&c&lConfirm Action";

pub const WARNING_SLOT: usize = 4;
pub const CONFIRM_SLOT: usize = 11;
pub const ACTION_SLOT: usize = 13;
pub const CANCEL_SLOT: usize = 15;

impl ConfirmAction {
    pub fn description(&self) -> &'static str {
        match self {
            ConfirmAction::RemoveActiveTag { .. } => "Remove your current tag",
        }
    }
}

pub fn build_confirmation(action: ConfirmAction) -> Menu {
    let description = action.description();
    let mut menu = Menu::new(MenuKind::Confirm(action), CONFIRM_TITLE, CONFIRM_SIZE);
    menu.fill_borders();

    menu.set(
        WARNING_SLOT,
        MenuItem::new(
            "YELLOW_WOOL",
            "&e&l⚠ WARNING",
            vec![
                "&7This is an important action".to_string(),
                "&7Make sure before confirming".to_string(),
            ],
        ),
    );
    menu.set_button(
        CONFIRM_SLOT,
        MenuItem::new(
            "GREEN_WOOL",
            "&a&l✓ CONFIRM",
            vec!["&7Confirm the action".to_string(), String::new(), "&a▶ Click to confirm".to_string()],
        ),
        ClickAction::Confirm,
    );
    menu.set(
        ACTION_SLOT,
        MenuItem::new(
            "EMERALD",
            "&6&lPending Action",
            vec![
                "&7Are you sure you want to".to_string(),
                "&7do the following?".to_string(),
                String::new(),
                format!("&e{}", description),
            ],
        ),
    );
    menu.set_button(
        CANCEL_SLOT,
        MenuItem::new(
            "RED_WOOL",
            "&c&l✗ CANCEL",
            vec!["&7Cancel the action".to_string(), String::new(), "&c▶ Click to cancel".to_string()],
        ),
        ClickAction::Cancel,
    );
    menu
}

pub mod category_menu;
pub mod confirmation;
pub mod interaction;
pub mod main_menu;
pub mod menu;
pub mod placeholders;
pub mod text;

pub use category_menu::build_category_menu;
pub use confirmation::build_confirmation;
pub use interaction::{handle_click, ClickOutcome, MenuTransition};
pub use main_menu::build_main_menu;
pub use menu::{ClickAction, ConfirmAction, Menu, MenuContext, MenuItem, MenuKind, Viewer};
pub use placeholders::PlaceholderResolver;

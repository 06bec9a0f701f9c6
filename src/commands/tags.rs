use crate::commands::{Chat, CommandOutput, CommandSender};
use crate::core::plugin::GrvTags;
use crate::ui::main_menu::build_main_menu;

/// `/tags`: opens the main menu for the sending player.
pub fn execute(plugin: &GrvTags, sender: &CommandSender<'_>) -> CommandOutput {
    let mut chat = Chat::new(plugin.prefix());
    match sender {
        CommandSender::Console => chat.say("&cOnly players can use this command."),
        CommandSender::Player(viewer) => {
            let menu = build_main_menu(&plugin.menu_context(), viewer);
            chat.open(menu);
        }
    }
    chat.finish()
}

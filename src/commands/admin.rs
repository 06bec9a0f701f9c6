use bevy_utils::tracing::info;
use uuid::Uuid;

use crate::catalog::model::is_default;
use crate::catalog::{CatalogError, TagDeletion};
use crate::commands::{starting_with, Chat, CommandOutput, CommandSender, ADMIN_PERMISSION};
use crate::components::player::PermissionCheck;
use crate::core::plugin::{CleanupReport, GrvTags, ReloadReport};
use crate::players::PlayerRecord;
use crate::store::StoreStats;
use crate::sync::{EntityKind, SyncReport};

pub const SUBCOMMANDS: [&str; 14] = [
    "reload",
    "info",
    "database",
    "create",
    "createcategory",
    "delete",
    "deletetag",
    "deletecategory",
    "give",
    "take",
    "set",
    "check",
    "cleanup",
    "help",
];

const CONFIRM: &str = "confirm";
const NONE: &str = "none";
const TAGS_PER_LINE: usize = 5;

/// Runs `/grvtags <args>`.
pub fn execute(
    plugin: &GrvTags,
    sender: &CommandSender<'_>,
    is_online: &dyn Fn(Uuid) -> bool,
    args: &[&str],
) -> CommandOutput {
    let mut chat = Chat::new(plugin.prefix());
    if !sender.has_permission(ADMIN_PERMISSION) {
        chat.say("&cYou do not have permission to run this command.");
        return chat.finish();
    }
    let Some(subcommand) = args.first() else {
        help(&mut chat);
        return chat.finish();
    };

    let admin = Admin {
        plugin,
        sender,
        is_online,
    };
    match subcommand.to_lowercase().as_str() {
        "reload" => admin.reload(&mut chat),
        "info" => admin.info(&mut chat),
        "database" => admin.database(&mut chat),
        "create" => admin.create_tag(&mut chat, args),
        "createcategory" => admin.create_category(&mut chat, args),
        "delete" | "deletetag" => admin.delete_tag(&mut chat, args),
        "deletecategory" => admin.delete_category(&mut chat, args),
        "give" => admin.give(&mut chat, args),
        "take" => admin.take(&mut chat, args),
        "set" => admin.set(&mut chat, args),
        "check" => admin.check(&mut chat, args),
        "cleanup" => admin.cleanup(&mut chat, args),
        "help" => help(&mut chat),
        other => {
            chat.say(format!("&cUnknown subcommand: &f{}", other));
            chat.say("&7Use &f/grvtags help &7to list the available commands.");
        }
    }
    chat.finish()
}

/// Tab completion for `/grvtags`. `args` always has the word being typed last.
pub fn complete(plugin: &GrvTags, sender: &CommandSender<'_>, args: &[&str]) -> Vec<String> {
    if !sender.has_permission(ADMIN_PERMISSION) {
        return Vec::new();
    }
    let Some((partial, typed)) = args.split_last() else {
        return SUBCOMMANDS.iter().map(|s| s.to_string()).collect();
    };
    if typed.is_empty() {
        return starting_with(SUBCOMMANDS.iter().map(|s| s.to_string()), partial);
    }

    let subcommand = typed[0].to_lowercase();
    let candidates: Vec<String> = match (subcommand.as_str(), typed.len()) {
        ("create", 2) | ("deletecategory", 1) => plugin.categories().names(),
        ("delete" | "deletetag", 1) => plugin
            .tags()
            .names()
            .into_iter()
            .filter(|name| !is_default(name))
            .collect(),
        ("give" | "take" | "set" | "check", 1) => plugin.players().known_player_names(),
        ("give", 2) => plugin.tags().names(),
        ("take", 2) => unlocked_of(plugin, typed[1]),
        ("set", 2) => {
            let mut names = unlocked_of(plugin, typed[1]);
            names.push(NONE.to_string());
            names
        }
        ("delete" | "deletetag" | "deletecategory", 2) | ("cleanup", 1) => {
            vec![CONFIRM.to_string()]
        }
        _ => Vec::new(),
    };
    starting_with(candidates, partial)
}

fn unlocked_of(plugin: &GrvTags, player: &str) -> Vec<String> {
    plugin
        .players()
        .find_by_name(player)
        .map(|record| plugin.players().unlocked_tags(record.uuid))
        .unwrap_or_default()
}

fn is_confirmed(args: &[&str], index: usize) -> bool {
    args.get(index)
        .is_some_and(|word| word.eq_ignore_ascii_case(CONFIRM))
}

fn help(chat: &mut Chat) {
    chat.separator();
    chat.line("&6&l            grvTags Commands");
    chat.separator();
    for (usage, summary) in [
        ("/grvtags reload", "Reload the YAML files and synchronize"),
        ("/grvtags info", "Plugin and database status"),
        ("/grvtags database", "Test the database connection"),
        ("/grvtags create <tag> <category>", "Create a tag"),
        ("/grvtags createcategory <name> [display]", "Create a category"),
        ("/grvtags delete <tag> [confirm]", "Delete a tag"),
        ("/grvtags deletecategory <category> [confirm]", "Delete an empty category"),
        ("/grvtags give <player> <tag>", "Unlock a tag for a player"),
        ("/grvtags take <player> <tag>", "Remove a tag from a player"),
        ("/grvtags set <player> <tag|none>", "Change a player's active tag"),
        ("/grvtags check <player>", "Show a player's tags"),
        ("/grvtags cleanup [confirm]", "Remove rows no longer in the YAML files"),
    ] {
        chat.line(format!("&f{} &8- &7{}", usage, summary));
    }
    chat.separator();
}

fn usage(chat: &mut Chat, syntax: &str, example: &str) {
    chat.say("&cIncorrect usage. Syntax:");
    chat.say(format!("&f{}", syntax));
    chat.say(format!("&7Example: &f{}", example));
}

fn change_line(label: &str, before: i64, after: i64) -> String {
    let diff = after - before;
    let change = match diff {
        0 => "&eno changes".to_string(),
        d if d > 0 => format!("&a+{} &7added", d),
        d => format!("&c{} &7removed", d.abs()),
    };
    format!("&7{}: &f{} &7-> &f{} &8(&7{}&8)", label, before, after, change)
}

struct Admin<'a> {
    plugin: &'a GrvTags,
    sender: &'a CommandSender<'a>,
    is_online: &'a dyn Fn(Uuid) -> bool,
}

impl Admin<'_> {
    fn lookup_player(&self, chat: &mut Chat, name: &str) -> Option<PlayerRecord> {
        let record = self.plugin.players().find_by_name(name);
        if record.is_none() {
            chat.say(format!("&cPlayer '&f{}&c' has never joined the server.", name));
        }
        record
    }

    fn notify_if_online(&self, chat: &mut Chat, target: Uuid, message: &str) {
        if (self.is_online)(target) {
            chat.notify(target, message);
        }
    }

    fn stats(&self) -> Option<StoreStats> {
        self.plugin.store().stats().ok()
    }

    fn reload(&self, chat: &mut Chat) {
        chat.say("&7Reloading configuration...");
        let before = self.stats();
        match self.plugin.reload() {
            Ok(report) => self.report_reload(chat, &report, before),
            Err(err) => {
                chat.say("&cReload failed!");
                chat.say(format!("&cError: &f{}", err));
                chat.say("&7The previous configuration is still active.");
            }
        }
    }

    fn report_reload(&self, chat: &mut Chat, report: &ReloadReport, before: Option<StoreStats>) {
        chat.say("&a✓ &7config.yml reloaded");
        if report.backups.is_empty() {
            chat.say("&7No YAML backups were written");
        }
        for path in &report.backups {
            let file = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string());
            chat.say(format!("&a✓ &7Backup written: &f{}", file));
        }
        chat.say("&a✓ &7Database connection verified");
        report_sync(chat, &report.sync);
        chat.say(format!("&a✓ &7Default tag reloaded: {}", report.default_tag));

        chat.separator();
        chat.say("&aReload completed!");
        chat.separator();
        if let (Some(before), Some(after)) = (before, self.stats()) {
            chat.line(change_line("Categories", before.categories, after.categories));
            chat.line(change_line("Tags", before.tags, after.tags));
        }
        chat.line(format!(
            "&7Reload time: &f{}ms",
            report.sync.elapsed.as_millis()
        ));
        chat.separator();
        info!(sender = self.sender.name(), "reload executed");
    }

    fn info(&self, chat: &mut Chat) {
        let status = self.plugin.status();
        chat.separator();
        chat.line("&6&l              grvTags Info");
        chat.separator();
        chat.line("&7Plugin: &fgrvTags");
        chat.line(format!("&7Version: &f{}", status.version));
        chat.line(format!("&7Uptime: &f{}s", status.uptime.as_secs()));
        chat.blank();
        chat.line(format!(
            "&7Database status: {}",
            if status.database_ok {
                "&aConnected"
            } else {
                "&cDisconnected"
            }
        ));
        chat.line(format!("&7Tags loaded: &f{}", status.tags_loaded));
        chat.line(format!("&7Categories loaded: &f{}", status.categories_loaded));
        chat.line(format!("&7Default tag: {}", status.default_tag));
        chat.separator();
    }

    fn database(&self, chat: &mut Chat) {
        let status = self.plugin.status();
        chat.say("&7Database information:");
        chat.line(format!(
            "&7- Status: {}",
            if status.database_ok {
                "&aConnected"
            } else {
                "&cDisconnected"
            }
        ));
        chat.line(format!("&7- File: &f{}", status.database_path.display()));
        if let Some(stats) = status.stats {
            chat.line(format!("&7- Categories: &f{}", stats.categories));
            chat.line(format!("&7- Tags: &f{}", stats.tags));
            chat.line(format!("&7- Players: &f{}", stats.players));
            chat.line(format!("&7- Unlocks: &f{}", stats.unlocks));
        }
        chat.say("&7Testing connection...");
        match self.plugin.store().ping() {
            Ok(()) => chat.say("&a✓ &7Connection OK"),
            Err(err) => chat.say(format!("&c✗ &7Connection failed: &f{}", err)),
        }
    }

    fn create_tag(&self, chat: &mut Chat, args: &[&str]) {
        let (Some(name), Some(category)) = (args.get(1), args.get(2)) else {
            usage(chat, "/grvtags create <name> <category>", "/grvtags create VIP default");
            return;
        };
        match self.plugin.tags().create(name, category) {
            Ok(tag) => {
                chat.say(format!("&aTag '&f{}&a' created!", tag.name));
                chat.say(format!("&7Category: &f{}", tag.category));
                chat.say("&7Add it to tags.yml to keep it across reloads.");
                info!(sender = self.sender.name(), tag = %tag.name, "tag created by command");
            }
            Err(CatalogError::InvalidName(err)) => {
                chat.say("&cInvalid tag name.");
                chat.say(format!("&7- {}", err));
                chat.say("&7- Valid example: &fVIP_Premium");
            }
            Err(CatalogError::UnknownCategory(category)) => {
                chat.say(format!("&cCategory '&f{}&c' does not exist.", category));
                chat.say(format!(
                    "&7Use &f/grvtags createcategory {} &7to create it first.",
                    category
                ));
            }
            Err(CatalogError::Duplicate { name, .. }) => {
                chat.say(format!("&cTag '&f{}&c' already exists.", name));
            }
            Err(err) => {
                chat.say("&cFailed to create the tag!");
                chat.say(format!("&cError: &f{}", err));
            }
        }
    }

    fn create_category(&self, chat: &mut Chat, args: &[&str]) {
        let Some(name) = args.get(1) else {
            usage(
                chat,
                "/grvtags createcategory <name> [display name]",
                "/grvtags createcategory premium Premium Ranks",
            );
            return;
        };
        let display = args[2..].join(" ");
        let display = (!display.is_empty()).then_some(display.as_str());
        match self.plugin.categories().create(name, display) {
            Ok(category) => {
                chat.say(format!("&aCategory '&f{}&a' created!", category.name));
                chat.say(format!("&7Display name: {}", category.display_name));
                chat.say(format!("&7Menu slot: &f{}", category.slot_position));
                chat.say("&7Add it to categories.yml to keep it across reloads.");
                info!(sender = self.sender.name(), category = %category.name, "category created by command");
            }
            Err(CatalogError::InvalidName(err)) => {
                chat.say("&cInvalid category name.");
                chat.say(format!("&7- {}", err));
                chat.say("&7- Valid example: &fpremium_ranks");
            }
            Err(CatalogError::Duplicate { name, .. }) => {
                chat.say(format!("&cCategory '&f{}&c' already exists.", name));
            }
            Err(err) => {
                chat.say("&cFailed to create the category!");
                chat.say(format!("&cError: &f{}", err));
            }
        }
    }

    fn delete_tag(&self, chat: &mut Chat, args: &[&str]) {
        let Some(name) = args.get(1) else {
            usage(chat, "/grvtags delete <tag>", "/grvtags delete vip");
            chat.say("&c⚠ This permanently deletes the tag!");
            return;
        };
        if is_default(name) {
            chat.say("&cThe tag 'default' is required and cannot be deleted.");
            return;
        }
        let Some(tag) = self.plugin.tags().get(name) else {
            chat.say(format!("&cTag '&f{}&c' does not exist.", name));
            chat.say(format!(
                "&7Available tags: &f{}",
                self.plugin.tags().names().join(", ")
            ));
            return;
        };

        if !is_confirmed(args, 2) {
            chat.line("&c&l⚠ TAG DELETION WARNING");
            chat.blank();
            chat.say(format!("&7You are about to delete the tag: &f{}", tag.name));
            if let Ok(references) = self.plugin.tags().references(&tag.name) {
                chat.say(format!("&7- Players with it active: &f{}", references.active));
                chat.say(format!("&7- Players who unlocked it: &f{}", references.unlocks));
            }
            chat.blank();
            chat.say("&c&lThis will:");
            chat.say("&7- Switch players using it back to the default tag");
            chat.say("&7- Remove it from every player who unlocked it");
            chat.say("&7- Delete it from the database");
            chat.say("&7- This action CANNOT be undone");
            chat.blank();
            chat.say("&7To confirm, run:");
            chat.say(format!("&f/grvtags delete {} confirm", tag.name));
            return;
        }

        chat.say(format!("&7Deleting tag '&f{}&7'...", tag.name));
        match self.plugin.tags().delete(&tag.name) {
            Ok(deletion) => self.report_tag_deletion(chat, &deletion),
            Err(err) => {
                chat.say("&c✗ &7Failed to delete the tag from the database");
                chat.say(format!("&cError: &f{}", err));
            }
        }
    }

    fn report_tag_deletion(&self, chat: &mut Chat, deletion: &TagDeletion) {
        chat.say("&71. Resetting active tags...");
        chat.say(format!(
            "&a✓ &f{} &7players switched to the default tag",
            deletion.players_reset
        ));
        chat.say("&72. Removing unlocks...");
        chat.say(format!(
            "&a✓ &f{} &7unlocks removed",
            deletion.unlocks_removed
        ));
        for failure in &deletion.step_errors {
            chat.say(format!("&c✗ &7{}", failure));
        }
        chat.say("&73. Removing the tag from the database...");
        chat.say("&a✓ &7Tag removed from the database");

        chat.separator();
        chat.say("&a&lTAG DELETED");
        chat.separator();
        chat.line(format!("&7Deleted tag: &f{}", deletion.tag.name));
        chat.line(format!("&7Category: &f{}", deletion.tag.category));
        if deletion.players_reset > 0 {
            chat.line(format!(
                "&7Players affected: &f{} &7(now on default)",
                deletion.players_reset
            ));
        }
        if deletion.unlocks_removed > 0 {
            chat.line(format!("&7Unlocks removed: &f{}", deletion.unlocks_removed));
        }
        chat.separator();
        info!(sender = self.sender.name(), tag = %deletion.tag.name, "tag deleted by command");
    }

    fn delete_category(&self, chat: &mut Chat, args: &[&str]) {
        let Some(name) = args.get(1) else {
            usage(chat, "/grvtags deletecategory <category>", "/grvtags deletecategory premium");
            chat.say("&c⚠ This permanently deletes the category!");
            return;
        };
        if is_default(name) {
            chat.say("&cThe category 'default' is required and cannot be deleted.");
            return;
        }
        let Some(category) = self.plugin.categories().get(name) else {
            chat.say(format!("&cCategory '&f{}&c' does not exist.", name));
            chat.say(format!(
                "&7Available categories: &f{}",
                self.plugin.categories().names().join(", ")
            ));
            return;
        };

        let tags: Vec<String> = self
            .plugin
            .tags()
            .by_category(&category.name)
            .into_iter()
            .map(|tag| tag.name)
            .collect();
        if !tags.is_empty() {
            self.report_blocking_tags(chat, &category.name, &tags);
            return;
        }

        if !is_confirmed(args, 2) {
            chat.line("&c&l⚠ CATEGORY DELETION WARNING");
            chat.blank();
            chat.say(format!(
                "&7You are about to delete the category: &f{}",
                category.name
            ));
            chat.blank();
            chat.say("&c&lThis will:");
            chat.say("&7- Delete it from the database");
            chat.say("&7- Remove it from the main menu");
            chat.say("&7- This action CANNOT be undone");
            chat.blank();
            chat.say("&7To confirm, run:");
            chat.say(format!("&f/grvtags deletecategory {} confirm", category.name));
            return;
        }

        chat.say(format!("&7Deleting category '&f{}&7'...", category.name));
        match self.plugin.categories().delete(&category.name) {
            Ok(deleted) => {
                chat.separator();
                chat.say("&a&lCATEGORY DELETED");
                chat.separator();
                chat.line(format!("&7Deleted category: &f{}", deleted.name));
                chat.line(format!("&7Display name: {}", deleted.display_name));
                chat.line(format!("&7Freed slot: &f{}", deleted.slot_position));
                chat.separator();
                info!(sender = self.sender.name(), category = %deleted.name, "category deleted by command");
            }
            Err(CatalogError::CategoryInUse { name, .. }) => {
                let tags = self.plugin.store().tag_names_in_category(&name).unwrap_or_default();
                self.report_blocking_tags(chat, &name, &tags);
            }
            Err(err) => {
                chat.say("&cFailed to delete the category!");
                chat.say(format!("&cError: &f{}", err));
            }
        }
    }

    fn report_blocking_tags(&self, chat: &mut Chat, category: &str, tags: &[String]) {
        chat.say(format!(
            "&cCannot delete category '&f{}&c' because it contains tags.",
            category
        ));
        chat.blank();
        chat.say(format!("&7Tags in this category (&f{}&7):", tags.len()));
        for row in tags.chunks(TAGS_PER_LINE) {
            chat.say(format!("&7- {}", row.join(", ")));
        }
        chat.blank();
        chat.say("&7Remove or move these tags first:");
        chat.say("&7- To delete a tag: &f/grvtags delete <tag>");
        chat.say("&7- To move a tag, edit tags.yml and reload");
    }

    fn give(&self, chat: &mut Chat, args: &[&str]) {
        let (Some(player), Some(name)) = (args.get(1), args.get(2)) else {
            usage(chat, "/grvtags give <player> <tag>", "/grvtags give Steve vip");
            return;
        };
        let Some(tag) = self.plugin.tags().get(name) else {
            chat.say(format!("&cTag '&f{}&c' does not exist.", name));
            return;
        };
        let Some(record) = self.lookup_player(chat, player) else {
            return;
        };
        match self.plugin.players().unlock(record.uuid, &tag.name) {
            Ok(true) => {
                chat.say(format!(
                    "&aTag '&f{}&a' given to &f{}&a!",
                    tag.name, record.username
                ));
                self.notify_if_online(
                    chat,
                    record.uuid,
                    &format!("&aYou unlocked the tag '&f{}&a'!", tag.name),
                );
                info!(sender = self.sender.name(), player = %record.username, tag = %tag.name, "tag given");
            }
            Ok(false) => chat.say(format!(
                "&e{} &7already has the tag '&f{}&7'.",
                record.username, tag.name
            )),
            Err(err) => {
                chat.say("&cFailed to give the tag.");
                chat.say(format!("&cError: &f{}", err));
            }
        }
    }

    fn take(&self, chat: &mut Chat, args: &[&str]) {
        let (Some(player), Some(name)) = (args.get(1), args.get(2)) else {
            usage(chat, "/grvtags take <player> <tag>", "/grvtags take Steve vip");
            return;
        };
        let Some(record) = self.lookup_player(chat, player) else {
            return;
        };
        match self.plugin.players().revoke_unlock(record.uuid, name) {
            Ok(true) => {
                chat.say(format!(
                    "&aTag '&f{}&a' taken from &f{}&a!",
                    name, record.username
                ));
                let was_active = record
                    .current_tag
                    .as_deref()
                    .is_some_and(|current| current.eq_ignore_ascii_case(name));
                if was_active {
                    match self.plugin.players().set_active_tag(record.uuid, None) {
                        Ok(()) => {
                            chat.say("&7It was their active tag; they now use the default tag.");
                            self.notify_if_online(
                                chat,
                                record.uuid,
                                &format!("&cYour tag '&f{}&c' has been removed.", name),
                            );
                        }
                        Err(err) => chat.say(format!("&c✗ &7Could not reset the active tag: &f{}", err)),
                    }
                }
                info!(sender = self.sender.name(), player = %record.username, tag = %name, "tag taken");
            }
            Ok(false) => chat.say(format!(
                "&c{} &7does not have the tag '&f{}&7'.",
                record.username, name
            )),
            Err(err) => {
                chat.say("&cFailed to take the tag.");
                chat.say(format!("&cError: &f{}", err));
            }
        }
    }

    fn set(&self, chat: &mut Chat, args: &[&str]) {
        let (Some(player), Some(name)) = (args.get(1), args.get(2)) else {
            usage(chat, "/grvtags set <player> <tag|none>", "/grvtags set Steve vip");
            chat.say("&7To clear the tag: &f/grvtags set Steve none");
            return;
        };
        let Some(record) = self.lookup_player(chat, player) else {
            return;
        };

        if name.eq_ignore_ascii_case(NONE) || is_default(name) {
            match self.plugin.players().set_active_tag(record.uuid, None) {
                Ok(()) => {
                    chat.say(format!(
                        "&aTag cleared for &f{}&a! They now use the default tag.",
                        record.username
                    ));
                    self.notify_if_online(
                        chat,
                        record.uuid,
                        "&7Your tag was removed. You now use the default tag.",
                    );
                }
                Err(err) => chat.say(format!("&cFailed to clear the tag: &f{}", err)),
            }
            return;
        }

        let Some(tag) = self.plugin.tags().get(name) else {
            chat.say(format!("&cTag '&f{}&c' does not exist.", name));
            return;
        };
        if !self.plugin.players().has_unlocked(record.uuid, &tag.name) {
            chat.say(format!(
                "&c{} has not unlocked the tag '&f{}&c'.",
                record.username, tag.name
            ));
            chat.say(format!(
                "&7Use &f/grvtags give {} {} &7first.",
                record.username, tag.name
            ));
            return;
        }
        match self.plugin.players().set_active_tag(record.uuid, Some(&tag.name)) {
            Ok(()) => {
                chat.say(format!(
                    "&aTag '&f{}&a' set for &f{}&a!",
                    tag.name, record.username
                ));
                self.notify_if_online(
                    chat,
                    record.uuid,
                    &format!("&aYour tag was changed to '&f{}&a'!", tag.name),
                );
            }
            Err(err) => chat.say(format!("&cFailed to set the tag: &f{}", err)),
        }
    }

    fn check(&self, chat: &mut Chat, args: &[&str]) {
        let Some(player) = args.get(1) else {
            usage(chat, "/grvtags check <player>", "/grvtags check Steve");
            return;
        };
        let Some(record) = self.lookup_player(chat, player) else {
            return;
        };
        let players = self.plugin.players();

        chat.separator();
        chat.line(format!("&6&l         Player {}", record.username));
        chat.separator();
        chat.line(format!(
            "&7Current tag: {} &8({})",
            players.active_tag_text(record.uuid),
            players
                .active_tag_name(record.uuid)
                .unwrap_or_else(|| "default".to_string())
        ));
        chat.line(format!(
            "&7Unlocked tags: &f{}",
            players.unlocked_count(record.uuid)
        ));
        for category in self.plugin.categories().all() {
            let count = players.unlocked_count_in_category(record.uuid, &category.name);
            if count > 0 {
                chat.line(format!("&7- {}: &f{} tags", category.name, count));
            }
        }
        chat.line(format!(
            "&7Status: {}",
            if (self.is_online)(record.uuid) {
                "&aOnline"
            } else {
                "&cOffline"
            }
        ));
        chat.separator();
    }

    fn cleanup(&self, chat: &mut Chat, args: &[&str]) {
        if !is_confirmed(args, 1) {
            chat.say("&c&l⚠ FULL CLEANUP");
            chat.blank();
            chat.say("&7This removes every category and tag from the database");
            chat.say("&7that is NOT declared in categories.yml or tags.yml.");
            chat.blank();
            chat.say("&c&lWARNING:");
            chat.say("&7- Undeclared rows nobody uses are deleted");
            chat.say("&7- Rows players still use are kept and listed");
            chat.say("&7- This action CANNOT be undone");
            chat.blank();
            chat.say("&7To confirm, run:");
            chat.say("&f/grvtags cleanup confirm");
            return;
        }

        chat.say("&7Starting full database cleanup...");
        match self.plugin.cleanup() {
            Ok(report) => self.report_cleanup(chat, &report),
            Err(err) => {
                chat.say("&cCleanup failed!");
                chat.say(format!("&cError: &f{}", err));
            }
        }
    }

    fn report_cleanup(&self, chat: &mut Chat, report: &CleanupReport) {
        chat.say("&7Before:");
        chat.say(format!("&7- Categories: &f{}", report.before.categories));
        chat.say(format!("&7- Tags: &f{}", report.before.tags));
        report_sync(chat, &report.sync);

        chat.separator();
        chat.say("&a&lCLEANUP COMPLETED");
        chat.separator();
        chat.line(format!("&7Time: &f{}ms", report.elapsed.as_millis()));
        chat.line(change_line("Categories", report.before.categories, report.after.categories));
        chat.line(change_line("Tags", report.before.tags, report.after.tags));
        chat.blank();

        let categories_removed = report.categories_removed();
        let tags_removed = report.tags_removed();
        if categories_removed > 0 || tags_removed > 0 {
            chat.line("&cRemoved:");
            if categories_removed > 0 {
                chat.line(format!(
                    "&7  - &c{} &7categories: &f{}",
                    categories_removed,
                    report.sync.categories.deleted.join(", ")
                ));
            }
            if tags_removed > 0 {
                chat.line(format!(
                    "&7  - &c{} &7tags: &f{}",
                    tags_removed,
                    report.sync.tags.deleted.join(", ")
                ));
            }
        } else {
            chat.line("&aNothing needed to be removed");
        }

        let orphans = report.orphans();
        if orphans.is_empty() {
            chat.line("&7The database now matches categories.yml and tags.yml");
        } else {
            chat.blank();
            chat.line(format!("&eKept {} undeclared row(s) still in use:", orphans.len()));
            for (kind, entry) in orphans {
                chat.line(format!("&7  - {} &f{} &8(&7{}&8)", kind, entry.name, entry.reason));
            }
        }
        chat.separator();
        info!(
            sender = self.sender.name(),
            categories_removed,
            tags_removed,
            "cleanup executed by command"
        );
    }
}

fn report_sync(chat: &mut Chat, sync: &SyncReport) {
    for phase in [&sync.categories, &sync.tags] {
        let label = match phase.kind {
            EntityKind::Category => "categories",
            EntityKind::Tag => "tags",
        };
        chat.say(format!("&7Synchronizing {}...", label));
        let mark = if phase.failed.is_empty() { "&a✓" } else { "&e!" };
        chat.say(format!("{} &7{}", mark, phase.summary()));
        for failure in &phase.failed {
            chat.say(format!("&c✗ &7{} &f{}&7: {}", phase.kind, failure.name, failure.message));
        }
        for skipped in &phase.skipped {
            chat.say(format!(
                "&e! &7Kept undeclared {} &f{}&7: {}",
                phase.kind, skipped.name, skipped.reason
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::dispatch;
    use crate::components::player::Permissions;
    use crate::data::TAGS_FILE;
    use crate::ui::menu::Viewer;
    use std::fs;

    fn plugin() -> (tempfile::TempDir, GrvTags) {
        let dir = tempfile::tempdir().unwrap();
        let plugin = GrvTags::enable(dir.path()).unwrap();
        (dir, plugin)
    }

    fn run(plugin: &GrvTags, line: &str) -> CommandOutput {
        dispatch(plugin, &CommandSender::Console, &|_| true, line).unwrap()
    }

    fn text(output: &CommandOutput) -> String {
        output.replies.join("\n")
    }

    fn join(plugin: &GrvTags, name: &str) -> Uuid {
        let uuid = Uuid::new_v4();
        plugin.players().ensure_exists(uuid, name);
        uuid
    }

    #[test]
    fn players_without_permission_are_rejected() {
        let (_dir, plugin) = plugin();
        let perms = Permissions::new(false, Vec::new());
        let sender = CommandSender::Player(Viewer {
            uuid: Uuid::new_v4(),
            name: "Steve",
            permissions: &perms,
        });
        let output = dispatch(&plugin, &sender, &|_| true, "grvtags reload").unwrap();
        assert!(text(&output).contains("do not have permission"));
        assert!(complete(&plugin, &sender, &["re"]).is_empty());
    }

    #[test]
    fn delete_requires_confirmation() {
        let (_dir, plugin) = plugin();
        let uuid = join(&plugin, "Steve");
        plugin.players().unlock(uuid, "vip").unwrap();
        plugin.players().set_active_tag(uuid, Some("vip")).unwrap();

        let warning = text(&run(&plugin, "grvtags delete vip"));
        assert!(warning.contains("Players with it active: &f1"));
        assert!(warning.contains("/grvtags delete vip confirm"));
        assert!(plugin.tags().exists("vip"));

        let done = text(&run(&plugin, "grvtags deletetag VIP confirm"));
        assert!(done.contains("&a✓ &f1 &7players switched"));
        assert!(done.contains("&a✓ &f1 &7unlocks removed"));
        assert!(!plugin.tags().exists("vip"));
        assert_eq!(plugin.players().active_tag_name(uuid), None);

        assert!(text(&run(&plugin, "grvtags delete default confirm")).contains("cannot be deleted"));
    }

    #[test]
    fn create_reports_validation_errors() {
        let (_dir, plugin) = plugin();
        assert!(text(&run(&plugin, "grvtags create x default")).contains("Invalid tag name"));
        assert!(text(&run(&plugin, "grvtags create gold nowhere")).contains("createcategory nowhere"));
        assert!(text(&run(&plugin, "grvtags create VIP default")).contains("already exists"));

        let created = text(&run(&plugin, "grvtags create gold default"));
        assert!(created.contains("&aTag '&fgold&a' created!"));
        assert!(plugin.tags().exists("gold"));

        let category = text(&run(&plugin, "grvtags createcategory events Seasonal Events"));
        assert!(category.contains("&7&lSeasonal Events Tags"));
        assert!(plugin.categories().exists("events"));
    }

    #[test]
    fn category_with_tags_lists_blockers() {
        let (_dir, plugin) = plugin();
        let output = text(&run(&plugin, "grvtags deletecategory xmas confirm"));
        assert!(output.contains("because it contains tags"));
        assert!(output.contains("&7- santa"));
        assert!(plugin.categories().exists("xmas"));

        run(&plugin, "grvtags createcategory empty");
        assert!(text(&run(&plugin, "grvtags deletecategory empty")).contains("deletecategory empty confirm"));
        assert!(text(&run(&plugin, "grvtags deletecategory empty confirm")).contains("CATEGORY DELETED"));
        assert!(!plugin.categories().exists("empty"));
    }

    #[test]
    fn give_take_and_set_update_player_state() {
        let (_dir, plugin) = plugin();
        let uuid = join(&plugin, "Steve");

        let given = run(&plugin, "grvtags give steve vip");
        assert!(text(&given).contains("given to &fSteve"));
        assert_eq!(given.notices.len(), 1);
        assert_eq!(given.notices[0].target, uuid);
        assert!(text(&run(&plugin, "grvtags give Steve vip")).contains("already has"));

        assert!(text(&run(&plugin, "grvtags set Steve santa")).contains("has not unlocked"));
        run(&plugin, "grvtags set Steve vip");
        assert_eq!(plugin.players().active_tag_name(uuid).as_deref(), Some("vip"));

        let taken = text(&run(&plugin, "grvtags take Steve vip"));
        assert!(taken.contains("now use the default tag"));
        assert_eq!(plugin.players().active_tag_name(uuid), None);
        assert!(!plugin.players().has_unlocked(uuid, "vip"));

        assert!(text(&run(&plugin, "grvtags give Nobody vip")).contains("never joined"));
    }

    #[test]
    fn offline_players_get_no_notices() {
        let (_dir, plugin) = plugin();
        join(&plugin, "Alex");
        let output = dispatch(&plugin, &CommandSender::Console, &|_| false, "grvtags give Alex vip").unwrap();
        assert!(output.notices.is_empty());
        let check = text(&dispatch(&plugin, &CommandSender::Console, &|_| false, "grvtags check Alex").unwrap());
        assert!(check.contains("Unlocked tags: &f1"));
        assert!(check.contains("- vip: &f1 tags"));
        assert!(check.contains("&cOffline"));
    }

    #[test]
    fn cleanup_reports_kept_orphans() {
        let (dir, plugin) = plugin();
        let uuid = join(&plugin, "Steve");
        plugin.players().unlock(uuid, "santa").unwrap();
        fs::write(dir.path().join(TAGS_FILE), "tags:\n  default: {}\n").unwrap();

        assert!(text(&run(&plugin, "grvtags cleanup")).contains("/grvtags cleanup confirm"));
        let output = text(&run(&plugin, "grvtags cleanup confirm"));
        assert!(output.contains("CLEANUP COMPLETED"));
        assert!(output.contains("tags: &fvip"));
        assert!(output.contains("tag &fsanta"));
        assert!(plugin.tags().exists("santa"));
        assert!(plugin.categories().exists("xmas"));
    }

    #[test]
    fn reload_echoes_each_step() {
        let (_dir, plugin) = plugin();
        let output = text(&run(&plugin, "grvtags reload"));
        assert!(output.contains("config.yml reloaded"));
        assert!(output.contains("Backup written"));
        assert!(output.contains("Synchronizing categories..."));
        assert!(output.contains("Default tag reloaded: &8[&7Member&8]"));
        assert!(output.contains("Reload completed"));
    }

    #[test]
    fn unknown_subcommand_points_to_help() {
        let (_dir, plugin) = plugin();
        let output = text(&run(&plugin, "grvtags frobnicate"));
        assert!(output.contains("Unknown subcommand: &ffrobnicate"));
        assert!(text(&run(&plugin, "grvtags")).contains("/grvtags give <player> <tag>"));
    }

    #[test]
    fn completion_follows_argument_position() {
        let (_dir, plugin) = plugin();
        let uuid = join(&plugin, "Steve");
        plugin.players().unlock(uuid, "santa").unwrap();
        let console = CommandSender::Console;

        assert_eq!(complete(&plugin, &console, &["delete"]), vec!["delete", "deletetag", "deletecategory"]);
        assert_eq!(complete(&plugin, &console, &["delete", ""]), vec!["vip", "santa"]);
        assert_eq!(complete(&plugin, &console, &["delete", "vip", "c"]), vec!["confirm"]);
        assert_eq!(complete(&plugin, &console, &["give", "st"]), vec!["Steve"]);
        assert_eq!(complete(&plugin, &console, &["set", "Steve", ""]), vec!["santa", "none"]);
        assert_eq!(complete(&plugin, &console, &["create", "gold", "x"]), vec!["xmas"]);
    }
}

use std::collections::HashMap;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

use bevy_utils::tracing::{error, info};
use clap::Parser;
use uuid::Uuid;

use grv_tags::core::PluginStatus;
use grv_tags::ui::text::strip_colors;
use grv_tags::{init_logging, GrvTags, HostEvent, OutboundMessage, Recipient, Server};

const HELP: &str = "Commands: join <name> [op] [perm...] | quit <name> | cmd <name|console> <command line> | \
complete <name|console> <partial line> | click <name> <slot> | close <name> | menu <name> | \
placeholder <name> <param> | online | status | help | exit";

/// Console host for the grvTags plugin.
#[derive(Parser, Debug)]
#[command(name = "grv-tags")]
#[command(about = "Runs the grvTags plugin against a simulated server console")]
struct Args {
    /// Plugin data directory holding config.yml, categories.yml and tags.yml
    #[arg(long, value_name = "PATH", default_value = "./plugins/grvTags")]
    data_dir: PathBuf,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, value_name = "LEVEL", default_value = "info")]
    log_level: String,
}

fn main() {
    let args = Args::parse();
    init_logging(&args.log_level);

    let plugin = match GrvTags::enable(&args.data_dir) {
        Ok(plugin) => Arc::new(plugin),
        Err(err) => {
            error!(error = %err, "failed to enable grvTags, disabling plugin");
            std::process::exit(1);
        }
    };
    let mut server = Server::new(plugin.clone());
    info!("console ready");

    println!("{}", HELP);
    loop {
        print!("> ");
        if io::stdout().flush().is_err() {
            break;
        }

        let mut input = String::new();
        match io::stdin().read_line(&mut input) {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }
        let trimmed = input.trim();
        if trimmed.is_empty() {
            continue;
        }

        let (cmd, rest) = split_word(trimmed);
        match cmd.to_lowercase().as_str() {
            "exit" | "stop" => break,
            "help" => println!("{}", HELP),
            "join" => {
                let mut parts = rest.split_whitespace();
                let Some(name) = parts.next() else {
                    println!("Usage: join <name> [op] [perm...]");
                    continue;
                };
                let mut op = false;
                let mut permissions = Vec::new();
                for part in parts {
                    if part.eq_ignore_ascii_case("op") {
                        op = true;
                    } else {
                        permissions.push(part.to_string());
                    }
                }
                let out = server.tick(vec![HostEvent::Join {
                    uuid: offline_uuid(name),
                    name: name.to_string(),
                    op,
                    permissions,
                }]);
                print_messages(&mut server, &out);
                println!("{} joined ({})", name, offline_uuid(name));
            }
            "quit" => {
                let Some(player) = online_uuid(&mut server, rest) else {
                    continue;
                };
                let out = server.tick(vec![HostEvent::Quit { uuid: player }]);
                print_messages(&mut server, &out);
            }
            "cmd" => {
                let (who, line) = split_word(rest);
                if who.is_empty() || line.is_empty() {
                    println!("Usage: cmd <name|console> <command line>");
                    continue;
                }
                let sender = if who.eq_ignore_ascii_case("console") {
                    None
                } else {
                    match online_uuid(&mut server, who) {
                        Some(uuid) => Some(uuid),
                        None => continue,
                    }
                };
                let out = server.tick(vec![HostEvent::Command {
                    sender,
                    line: line.to_string(),
                }]);
                print_messages(&mut server, &out);
                if let Some(uuid) = sender {
                    print_menu(&mut server, uuid);
                }
            }
            "complete" => {
                let (who, line) = split_word(rest);
                let sender = if who.eq_ignore_ascii_case("console") {
                    None
                } else {
                    match online_uuid(&mut server, who) {
                        Some(uuid) => Some(uuid),
                        None => continue,
                    }
                };
                println!("{}", server.complete(sender, line).join(" "));
            }
            "click" => {
                let mut parts = rest.split_whitespace();
                let (Some(name), Some(slot_raw)) = (parts.next(), parts.next()) else {
                    println!("Usage: click <name> <slot>");
                    continue;
                };
                let Ok(slot) = slot_raw.parse::<usize>() else {
                    println!("Invalid slot: {}", slot_raw);
                    continue;
                };
                let Some(uuid) = online_uuid(&mut server, name) else {
                    continue;
                };
                let out = server.tick(vec![HostEvent::Click { uuid, slot }]);
                print_messages(&mut server, &out);
                print_menu(&mut server, uuid);
            }
            "close" => {
                let Some(uuid) = online_uuid(&mut server, rest) else {
                    continue;
                };
                server.tick(vec![HostEvent::Close { uuid }]);
            }
            "menu" => {
                let Some(uuid) = online_uuid(&mut server, rest) else {
                    continue;
                };
                if server.open_menu(uuid).is_none() {
                    println!("{} has no menu open", rest);
                }
                print_menu(&mut server, uuid);
            }
            "placeholder" => {
                let (name, param) = split_word(rest);
                if name.is_empty() || param.is_empty() {
                    println!("Usage: placeholder <name> <param>");
                    continue;
                }
                let uuid = plugin
                    .players()
                    .find_by_name(name)
                    .map(|record| record.uuid)
                    .unwrap_or_else(|| offline_uuid(name));
                match plugin.placeholders().resolve(Some(uuid), param) {
                    Some(value) => println!("%grvtags_{}% = {}", param, strip_colors(&value)),
                    None => println!("%grvtags_{}% is not a grvTags placeholder", param),
                }
            }
            "online" => {
                let players = server.online_players();
                if players.is_empty() {
                    println!("Nobody is online");
                }
                for player in players {
                    println!("{} ({})", player.name, player.uuid);
                }
            }
            "status" => print_status(&plugin.status()),
            _ => println!("Unknown command: {} (try help)", cmd),
        }
    }
    info!("console closed");
}

/// Offline-mode identity for a player name.
fn offline_uuid(name: &str) -> Uuid {
    Uuid::new_v3(&Uuid::NAMESPACE_OID, format!("OfflinePlayer:{}", name).as_bytes())
}

fn split_word(input: &str) -> (&str, &str) {
    let input = input.trim();
    match input.split_once(char::is_whitespace) {
        Some((head, tail)) => (head, tail.trim()),
        None => (input, ""),
    }
}

fn online_uuid(server: &mut Server, name: &str) -> Option<Uuid> {
    let name = name.trim();
    if name.is_empty() {
        println!("A player name is required");
        return None;
    }
    match server.find_online(name) {
        Some(player) => Some(player.uuid),
        None => {
            println!("{} is not online", name);
            None
        }
    }
}

fn print_messages(server: &mut Server, messages: &[OutboundMessage]) {
    let names: HashMap<Uuid, String> = server
        .online_players()
        .into_iter()
        .map(|player| (player.uuid, player.name))
        .collect();
    for message in messages {
        let target = match message.recipient {
            Recipient::Console => "console".to_string(),
            Recipient::Player(uuid) => names
                .get(&uuid)
                .cloned()
                .unwrap_or_else(|| uuid.to_string()),
        };
        println!("[{}] {}", target, strip_colors(&message.text));
    }
}

fn print_menu(server: &mut Server, uuid: Uuid) {
    if let Some(menu) = server.open_menu(uuid) {
        for line in menu.describe() {
            println!("  {}", line);
        }
    }
}

fn print_status(status: &PluginStatus) {
    println!("grvTags v{} (up {}s)", status.version, status.uptime.as_secs());
    println!(
        "Database: {} at {}",
        if status.database_ok { "connected" } else { "unreachable" },
        status.database_path.display()
    );
    if let Some(stats) = &status.stats {
        println!(
            "Rows: categories={}, tags={}, players={}, unlocks={}",
            stats.categories, stats.tags, stats.players, stats.unlocks
        );
    }
    println!(
        "Loaded: {} categories, {} tags",
        status.categories_loaded, status.tags_loaded
    );
    println!("Default tag: {}", strip_colors(&status.default_tag));
}

use std::fs;
use std::path::Path;

use grv_tags::commands::{dispatch, CommandOutput, CommandSender};
use grv_tags::data::{CATEGORIES_FILE, TAGS_FILE};
use grv_tags::sync::SkipReason;
use grv_tags::GrvTags;
use uuid::Uuid;

const CATEGORIES: &str = "\
categories:
  default:
    slot: 11
  rank:
    slot: 13
    id_display: \"&6&lRank Tags\"
";

const TAGS_WITH_VIP: &str = "\
tags:
  default:
    tag: \"&8[&7Member&8]\"
    permission: \"\"
    category: default
  vip:
    tag: \"&6[VIP]\"
    category: rank
";

const TAGS_WITHOUT_VIP: &str = "\
tags:
  default:
    tag: \"&8[&7Member&8]\"
    permission: \"\"
    category: default
";

fn write_source(dir: &Path, tags: &str) {
    fs::write(dir.join(CATEGORIES_FILE), CATEGORIES).unwrap();
    fs::write(dir.join(TAGS_FILE), tags).unwrap();
}

fn console(plugin: &GrvTags, line: &str) -> CommandOutput {
    dispatch(plugin, &CommandSender::Console, &|_| false, line).unwrap()
}

fn enable_with_vip() -> (tempfile::TempDir, GrvTags) {
    let dir = tempfile::tempdir().unwrap();
    write_source(dir.path(), TAGS_WITH_VIP);
    let plugin = GrvTags::enable(dir.path()).unwrap();
    (dir, plugin)
}

#[test]
fn first_run_creates_declared_entities() {
    let (_dir, plugin) = enable_with_vip();
    assert!(plugin.categories().exists("rank"));
    assert!(plugin.tags().exists("vip"));
    assert!(plugin.tags().exists("default"));
    assert_eq!(plugin.tags().get("vip").unwrap().category, "rank");
}

#[test]
fn unreferenced_tag_is_swept_on_reload() {
    let (dir, plugin) = enable_with_vip();
    write_source(dir.path(), TAGS_WITHOUT_VIP);

    let report = plugin.reload().unwrap();
    assert_eq!(report.sync.tags.deleted, vec!["vip".to_string()]);
    assert!(!plugin.tags().exists("vip"));
    assert!(plugin.store().find_tag("vip").unwrap().is_none());
}

#[test]
fn unlocked_tag_survives_removal_from_yaml() {
    let (dir, plugin) = enable_with_vip();
    let player = Uuid::new_v4();
    plugin.players().ensure_exists(player, "PlayerA");

    let given = console(&plugin, "grvtags give PlayerA vip");
    assert!(given.replies.iter().any(|line| line.contains("given to &fPlayerA")));

    write_source(dir.path(), TAGS_WITHOUT_VIP);
    let report = plugin.reload().unwrap();

    assert!(report.sync.tags.deleted.is_empty());
    let skipped = &report.sync.tags.skipped;
    assert_eq!(skipped.len(), 1);
    assert_eq!(skipped[0].name, "vip");
    assert_eq!(
        skipped[0].reason,
        SkipReason::TagReferenced {
            active: 0,
            unlocks: 1
        }
    );

    let stored = plugin.store().find_tag("vip").unwrap().unwrap();
    assert!(!stored.is_from_yaml);
    assert!(plugin.players().has_unlocked(player, "vip"));

    // the category is still declared, so it stays regardless
    assert!(plugin.categories().exists("rank"));
}

#[test]
fn orphan_is_removed_once_references_are_gone() {
    let (dir, plugin) = enable_with_vip();
    let player = Uuid::new_v4();
    plugin.players().ensure_exists(player, "PlayerA");
    console(&plugin, "grvtags give PlayerA vip");
    write_source(dir.path(), TAGS_WITHOUT_VIP);
    plugin.reload().unwrap();
    assert!(plugin.tags().exists("vip"));

    console(&plugin, "grvtags take PlayerA vip");
    let cleanup = console(&plugin, "grvtags cleanup confirm");
    assert!(cleanup.replies.iter().any(|line| line.contains("tags: &fvip")));
    assert!(!plugin.tags().exists("vip"));
}

#[test]
fn reload_is_idempotent() {
    let (_dir, plugin) = enable_with_vip();
    let before = plugin.store().stats().unwrap();
    let first = plugin.reload().unwrap();
    let second = plugin.reload().unwrap();
    assert_eq!(plugin.store().stats().unwrap(), before);
    assert!(first.sync.tags.created.is_empty());
    assert!(second.sync.tags.created.is_empty());
    assert!(second.sync.tags.deleted.is_empty());
    assert!(second.sync.categories.deleted.is_empty());
}

#[test]
fn default_entities_survive_an_empty_source() {
    let (dir, plugin) = enable_with_vip();
    fs::write(dir.path().join(CATEGORIES_FILE), "categories: {}\n").unwrap();
    fs::write(dir.path().join(TAGS_FILE), "tags: {}\n").unwrap();

    plugin.reload().unwrap();
    assert!(plugin.categories().exists("default"));
    assert!(plugin.tags().exists("default"));
    assert!(!plugin.tags().exists("vip"));
    assert!(!plugin.categories().exists("rank"));
}

#[test]
fn deleting_a_tag_cascades_and_falls_back_to_default_text() {
    let (_dir, plugin) = enable_with_vip();
    let holders: Vec<Uuid> = (0..3)
        .map(|index| {
            let uuid = Uuid::new_v4();
            plugin.players().ensure_exists(uuid, &format!("Player{}", index));
            plugin.players().unlock(uuid, "vip").unwrap();
            uuid
        })
        .collect();
    plugin.players().set_active_tag(holders[0], Some("vip")).unwrap();
    plugin.players().set_active_tag(holders[1], Some("vip")).unwrap();
    assert_eq!(plugin.players().active_tag_text(holders[0]), "&6[VIP]");

    let output = console(&plugin, "grvtags delete vip confirm");
    assert!(output.replies.iter().any(|line| line.contains("&f2 &7players switched")));
    assert!(output.replies.iter().any(|line| line.contains("&f3 &7unlocks removed")));

    for uuid in &holders {
        assert_eq!(plugin.players().player(*uuid).unwrap().current_tag, None);
        assert!(!plugin.players().has_unlocked(*uuid, "vip"));
        assert_eq!(
            plugin.players().active_tag_text(*uuid),
            plugin.players().default_tag_text()
        );
    }
    assert_eq!(plugin.store().count_tag_unlocks("vip").unwrap(), 0);
}

#[test]
fn category_with_tags_cannot_be_deleted() {
    let (_dir, plugin) = enable_with_vip();
    let output = console(&plugin, "grvtags deletecategory rank confirm");
    assert!(output.replies.iter().any(|line| line.contains("contains tags")));
    assert!(plugin.categories().exists("rank"));
    assert!(plugin.tags().exists("vip"));
}

#[test]
fn placeholders_follow_player_state() {
    let (_dir, plugin) = enable_with_vip();
    let player = Uuid::new_v4();
    plugin.players().ensure_exists(player, "PlayerA");
    let resolver = plugin.placeholders();

    assert_eq!(resolver.resolve(Some(player), "tag").as_deref(), Some("§8[§7Member§8]"));
    console(&plugin, "grvtags give PlayerA vip");
    console(&plugin, "grvtags set PlayerA vip");
    assert_eq!(resolver.resolve(Some(player), "tag").as_deref(), Some("§6[VIP]"));
    assert_eq!(resolver.resolve(Some(player), "tags").as_deref(), Some("1"));
    assert_eq!(resolver.resolve(Some(player), "tags_rank").as_deref(), Some("1"));
    assert_eq!(resolver.resolve(Some(player), "unknown"), None);
}

pub mod admin;
pub mod tags;

use uuid::Uuid;

use crate::components::player::PermissionCheck;
use crate::core::plugin::GrvTags;
use crate::ui::menu::{Menu, Viewer};
use crate::ui::text::SEPARATOR;

pub const ADMIN_LABEL: &str = "grvtags";
pub const TAGS_LABEL: &str = "tags";
pub const ADMIN_PERMISSION: &str = "grvtags.admin";

/// Who issued a command.
pub enum CommandSender<'a> {
    Console,
    Player(Viewer<'a>),
}

impl CommandSender<'_> {
    pub fn name(&self) -> &str {
        match self {
            CommandSender::Console => "CONSOLE",
            CommandSender::Player(viewer) => viewer.name,
        }
    }

    pub fn uuid(&self) -> Option<Uuid> {
        match self {
            CommandSender::Console => None,
            CommandSender::Player(viewer) => Some(viewer.uuid),
        }
    }
}

impl PermissionCheck for CommandSender<'_> {
    fn has_permission(&self, node: &str) -> bool {
        match self {
            CommandSender::Console => true,
            CommandSender::Player(viewer) => viewer.has_permission(node),
        }
    }
}

/// A message for another player, delivered by the host if they are online.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub target: Uuid,
    pub message: String,
}

/// Everything a command produced. Text keeps its `&` colour codes.
#[derive(Debug, Default)]
pub struct CommandOutput {
    pub replies: Vec<String>,
    pub notices: Vec<Notice>,
    pub open_menu: Option<Menu>,
}

impl CommandOutput {
    pub(crate) fn reply(&mut self, line: impl Into<String>) {
        self.replies.push(line.into());
    }

    pub(crate) fn notify(&mut self, target: Uuid, message: impl Into<String>) {
        self.notices.push(Notice {
            target,
            message: message.into(),
        });
    }
}

/// Reply builder that applies the configured chat prefix.
pub(crate) struct Chat {
    prefix: String,
    output: CommandOutput,
}

impl Chat {
    pub(crate) fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            output: CommandOutput::default(),
        }
    }

    /// A prefixed line.
    pub(crate) fn say(&mut self, message: impl AsRef<str>) {
        let line = format!("{}{}", self.prefix, message.as_ref());
        self.output.reply(line);
    }

    /// An unprefixed line, used inside report blocks.
    pub(crate) fn line(&mut self, message: impl Into<String>) {
        self.output.reply(message);
    }

    pub(crate) fn blank(&mut self) {
        self.output.reply(String::new());
    }

    pub(crate) fn separator(&mut self) {
        self.output.reply(SEPARATOR);
    }

    pub(crate) fn notify(&mut self, target: Uuid, message: impl AsRef<str>) {
        let line = format!("{}{}", self.prefix, message.as_ref());
        self.output.notify(target, line);
    }

    pub(crate) fn open(&mut self, menu: Menu) {
        self.output.open_menu = Some(menu);
    }

    pub(crate) fn finish(self) -> CommandOutput {
        self.output
    }
}

/// Splits a command line into its label and arguments. A leading `/` is optional.
pub fn split_command_line(line: &str) -> Option<(String, Vec<&str>)> {
    let mut parts = line.trim().trim_start_matches('/').split_whitespace();
    let label = parts.next()?.to_lowercase();
    Some((label, parts.collect()))
}

/// Runs a command line. `None` means the label is not handled here.
pub fn dispatch(
    plugin: &GrvTags,
    sender: &CommandSender<'_>,
    is_online: &dyn Fn(Uuid) -> bool,
    line: &str,
) -> Option<CommandOutput> {
    let (label, args) = split_command_line(line)?;
    match label.as_str() {
        ADMIN_LABEL => Some(admin::execute(plugin, sender, is_online, &args)),
        TAGS_LABEL => Some(tags::execute(plugin, sender)),
        _ => None,
    }
}

/// Suggestions for the last word of a partially typed command line.
pub fn complete(plugin: &GrvTags, sender: &CommandSender<'_>, line: &str) -> Vec<String> {
    let Some((label, mut args)) = split_command_line(line) else {
        return Vec::new();
    };
    if line.ends_with(' ') {
        args.push("");
    }
    match label.as_str() {
        ADMIN_LABEL => admin::complete(plugin, sender, &args),
        _ => Vec::new(),
    }
}

pub(crate) fn starting_with(candidates: impl IntoIterator<Item = String>, partial: &str) -> Vec<String> {
    let partial = partial.to_lowercase();
    candidates
        .into_iter()
        .filter(|candidate| candidate.to_lowercase().starts_with(&partial))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_lines_split_into_label_and_args() {
        let (label, args) = split_command_line("/GrvTags give PlayerA vip").unwrap();
        assert_eq!(label, "grvtags");
        assert_eq!(args, vec!["give", "PlayerA", "vip"]);
        assert!(split_command_line("   ").is_none());
    }

    #[test]
    fn prefix_filter_ignores_case() {
        let names = vec!["Default".to_string(), "vip".to_string(), "VIP_Plus".to_string()];
        assert_eq!(starting_with(names, "Vi"), vec!["vip", "VIP_Plus"]);
    }
}

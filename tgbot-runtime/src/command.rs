//! Slash-command registry.
//!
//! Commands match on the first whitespace-delimited token of a message, `/name` or
//! `/name@botname`. A `help` command listing the other enabled commands is always registered
//! first.

use std::fmt;
use std::sync::Arc;

use tgbot_core::Message;
use tracing::debug;

use crate::action::Action;

pub type CommandHandler = Arc<dyn Fn(&Message) -> Action + Send + Sync>;

const HELP_NAME: &str = "help";
const HELP_DESCRIPTION: &str = "List available commands";

#[derive(Clone)]
enum CommandKind {
    Help,
    Custom(CommandHandler),
}

#[derive(Clone)]
pub struct Command {
    pub name: String,
    pub description: String,
    pub enabled: bool,
    kind: CommandKind,
}

impl Command {
    /// `name` without the leading slash.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        handler: impl Fn(&Message) -> Action + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            enabled: true,
            kind: CommandKind::Custom(Arc::new(handler)),
        }
    }

    fn help() -> Self {
        Self {
            name: HELP_NAME.to_string(),
            description: HELP_DESCRIPTION.to_string(),
            enabled: true,
            kind: CommandKind::Help,
        }
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("enabled", &self.enabled)
            .finish()
    }
}

#[derive(Clone, Debug)]
pub struct CommandRegistry {
    commands: Vec<Command>,
    suffix: Option<String>,
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self {
            commands: vec![Command::help()],
            suffix: None,
        }
    }

    /// Bot username accepted after `@` in `/name@botname`. A leading `@` is ignored.
    pub fn suffix(mut self, suffix: impl Into<String>) -> Self {
        let suffix = suffix.into();
        let suffix = suffix.trim_start_matches('@');
        self.suffix = (!suffix.is_empty()).then(|| suffix.to_string());
        self
    }

    /// Adds `command`, replacing any command with the same name in place.
    pub fn add(mut self, command: Command) -> Self {
        match self.commands.iter_mut().find(|c| c.name == command.name) {
            Some(existing) => *existing = command,
            None => self.commands.push(command),
        }
        self
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn get(&self, name: &str) -> Option<&Command> {
        self.commands.iter().find(|c| c.name == name)
    }

    /// Returns false when no command has that name.
    pub fn enable(&mut self, name: &str) -> bool {
        self.set_enabled(name, true)
    }

    /// Returns false when no command has that name.
    pub fn disable(&mut self, name: &str) -> bool {
        self.set_enabled(name, false)
    }

    pub fn is_enabled(&self, name: &str) -> bool {
        self.get(name).is_some_and(|c| c.enabled)
    }

    fn set_enabled(&mut self, name: &str, enabled: bool) -> bool {
        match self.commands.iter_mut().find(|c| c.name == name) {
            Some(command) => {
                command.enabled = enabled;
                true
            }
            None => false,
        }
    }

    /// The action for `message`, or `Nothing` when it names no enabled command here.
    pub fn match_message(&self, message: &Message) -> Action {
        let Some(name) = message.text().and_then(|text| self.command_name(text)) else {
            return Action::Nothing;
        };

        match self.commands.iter().find(|c| c.enabled && c.name == name) {
            Some(command) => {
                debug!(command = %command.name, chat_id = message.chat_id(), "Command matched");
                match &command.kind {
                    CommandKind::Help => Action::reply(message, self.help_text()),
                    CommandKind::Custom(handler) => handler(message),
                }
            }
            None => {
                debug!(command = %name, "No enabled command");
                Action::Nothing
            }
        }
    }

    /// `/name - description` for every enabled command other than help.
    pub fn help_text(&self) -> String {
        let lines: Vec<String> = self
            .commands
            .iter()
            .filter(|c| c.enabled && !matches!(c.kind, CommandKind::Help))
            .map(|c| format!("/{} - {}", c.name, c.description))
            .collect();
        if lines.is_empty() {
            "No commands available.".to_string()
        } else {
            format!("Available commands:\n{}", lines.join("\n"))
        }
    }

    /// Command name addressed to this bot, if the text is shaped like one.
    fn command_name<'a>(&self, text: &'a str) -> Option<&'a str> {
        let token = tokenize(text).into_iter().next()?;
        let token = token.strip_prefix('/').unwrap_or(token);
        match (token.split_once('@'), self.suffix.as_deref()) {
            (Some((name, target)), Some(suffix)) if target == suffix => Some(name),
            // Addressed to another bot.
            (Some(_), Some(_)) => None,
            _ => Some(token),
        }
    }
}

pub fn tokenize(text: &str) -> Vec<&str> {
    text.split_whitespace().collect()
}

/// Tokens after the command itself.
pub fn command_args(text: &str) -> Vec<&str> {
    text.split_whitespace().skip(1).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn message(text: &str) -> Message {
        serde_json::from_value(json!({
            "message_id": 1,
            "date": 0,
            "chat": {"id": 42, "type": "private"},
            "from": {"id": 42, "is_bot": false, "first_name": "Ada"},
            "text": text,
        }))
        .unwrap()
    }

    fn reply_text(action: Action) -> String {
        match action {
            Action::SendMessage(m, _) => m.text,
            other => panic!("expected SendMessage, got {other:?}"),
        }
    }

    fn registry() -> CommandRegistry {
        CommandRegistry::new()
            .suffix("mybot")
            .add(Command::new("say_hi", "Say hi", |m| Action::reply(m, "hi")))
            .add(Command::new("my_pics", "Show my photos", |m| Action::reply(m, "pics")))
    }

    #[test]
    fn test_tokenize_and_args() {
        assert_eq!(tokenize("  /say_hi@mybot extra\targs "), vec!["/say_hi@mybot", "extra", "args"]);
        assert_eq!(command_args("/say_hi@mybot extra args"), vec!["extra", "args"]);
        assert!(command_args("/say_hi").is_empty());
    }

    #[test]
    fn test_match_with_suffix_and_args() {
        let registry = registry();
        assert_eq!(reply_text(registry.match_message(&message("/say_hi@mybot extra args"))), "hi");
        assert_eq!(reply_text(registry.match_message(&message("/say_hi"))), "hi");
    }

    #[test]
    fn test_other_bot_suffix_is_ignored() {
        assert!(registry().match_message(&message("/say_hi@otherbot")).is_nothing());
    }

    #[test]
    fn test_without_suffix_token_compared_as_is() {
        let registry = CommandRegistry::new().add(Command::new("say_hi", "", |m| Action::reply(m, "hi")));
        assert!(registry.match_message(&message("/say_hi@mybot")).is_nothing());
        assert_eq!(reply_text(registry.match_message(&message("/say_hi"))), "hi");
    }

    #[test]
    fn test_case_sensitive_and_unknown() {
        let registry = registry();
        assert!(registry.match_message(&message("/Say_Hi")).is_nothing());
        assert!(registry.match_message(&message("/unknown")).is_nothing());
    }

    #[test]
    fn test_help_lists_enabled_commands() {
        let mut registry = registry();
        assert_eq!(registry.commands()[0].name, "help");

        let text = reply_text(registry.match_message(&message("/help")));
        assert_eq!(text, "Available commands:\n/say_hi - Say hi\n/my_pics - Show my photos");

        assert!(registry.disable("my_pics"));
        let text = reply_text(registry.match_message(&message("/help")));
        assert_eq!(text, "Available commands:\n/say_hi - Say hi");
    }

    #[test]
    fn test_disable_and_enable() {
        let mut registry = registry();
        assert!(registry.disable("say_hi"));
        assert!(!registry.is_enabled("say_hi"));
        assert!(registry.match_message(&message("/say_hi")).is_nothing());

        assert!(registry.enable("say_hi"));
        assert_eq!(reply_text(registry.match_message(&message("/say_hi"))), "hi");
        assert!(!registry.disable("missing"));
    }

    #[test]
    fn test_add_replaces_in_place() {
        let registry = registry().add(Command::new("say_hi", "Say hello", |m| Action::reply(m, "hello")));
        let names: Vec<&str> = registry.commands().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["help", "say_hi", "my_pics"]);
        assert_eq!(reply_text(registry.match_message(&message("/say_hi"))), "hello");
    }

    #[test]
    fn test_non_text_message() {
        let mut photo = message("");
        photo.text = None;
        assert!(registry().match_message(&photo).is_nothing());
    }
}

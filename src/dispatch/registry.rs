// src/dispatch/registry.rs

use std::collections::HashSet;

use crate::errors::{BackupError, Result};
use crate::types::Role;

/// Handler a command name resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BotCommand {
    Start,
    Next,
    Status,
    Backup,
    Cancel,
    Help,
}

/// How invoking a command interacts with dialogs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    /// Runs and replies immediately.
    Immediate,
    /// Opens a multi-turn confirmation dialog.
    DialogEntry,
    /// Terminates any open dialog.
    DialogFallback,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    pub handler: BotCommand,
    pub required: Role,
    pub kind: CommandKind,
}

impl CommandDescriptor {
    pub const fn new(
        name: &'static str,
        description: &'static str,
        handler: BotCommand,
        required: Role,
        kind: CommandKind,
    ) -> Self {
        Self {
            name,
            description,
            handler,
            required,
            kind,
        }
    }
}

/// Validated set of commands exposed to operators.
#[derive(Debug, Clone)]
pub struct CommandRegistry {
    commands: Vec<CommandDescriptor>,
}

impl CommandRegistry {
    /// Build a registry, checking that names are unique and that exactly one
    /// dialog entry is paired with exactly one fallback.
    pub fn new(commands: Vec<CommandDescriptor>) -> Result<Self> {
        let mut names = HashSet::new();
        for cmd in commands.iter() {
            if !names.insert(cmd.name) {
                return Err(BackupError::ConfigError(format!(
                    "command '{}' is registered more than once",
                    cmd.name
                )));
            }
        }

        let entries = count_kind(&commands, CommandKind::DialogEntry);
        let fallbacks = count_kind(&commands, CommandKind::DialogFallback);
        if entries != 1 || fallbacks != 1 {
            return Err(BackupError::ConfigError(format!(
                "expected exactly one dialog entry and one fallback command (got {entries} and {fallbacks})"
            )));
        }

        Ok(Self { commands })
    }

    /// The command table served by the bot, checked like any other table.
    pub fn standard() -> Result<Self> {
        Self::new(vec![
            CommandDescriptor::new(
                "next",
                "Date of next scheduled backup.",
                BotCommand::Next,
                Role::User,
                CommandKind::Immediate,
            ),
            CommandDescriptor::new(
                "status",
                "State of the current or last backup run.",
                BotCommand::Status,
                Role::User,
                CommandKind::Immediate,
            ),
            CommandDescriptor::new(
                "backup",
                "Start a backup manually.",
                BotCommand::Backup,
                Role::Admin,
                CommandKind::DialogEntry,
            ),
            CommandDescriptor::new(
                "start",
                "Start the bot.",
                BotCommand::Start,
                Role::Stranger,
                CommandKind::Immediate,
            ),
            CommandDescriptor::new(
                "cancel",
                "Cancel your action.",
                BotCommand::Cancel,
                Role::User,
                CommandKind::DialogFallback,
            ),
            CommandDescriptor::new(
                "help",
                "List the commands you may use.",
                BotCommand::Help,
                Role::User,
                CommandKind::Immediate,
            ),
        ])
    }

    pub fn get(&self, name: &str) -> Option<&CommandDescriptor> {
        self.commands.iter().find(|cmd| cmd.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CommandDescriptor> {
        self.commands.iter()
    }

    /// Commands a caller with `role` may run.
    pub fn available_to(&self, role: Role) -> impl Iterator<Item = &CommandDescriptor> {
        self.commands
            .iter()
            .filter(move |cmd| role.satisfies(cmd.required))
    }

    pub fn dialog_entry(&self) -> Option<&CommandDescriptor> {
        self.commands
            .iter()
            .find(|cmd| cmd.kind == CommandKind::DialogEntry)
    }

    pub fn dialog_fallback(&self) -> Option<&CommandDescriptor> {
        self.commands
            .iter()
            .find(|cmd| cmd.kind == CommandKind::DialogFallback)
    }
}

fn count_kind(commands: &[CommandDescriptor], kind: CommandKind) -> usize {
    commands.iter().filter(|cmd| cmd.kind == kind).count()
}

// src/dispatch/dispatcher.rs

//! Permission gate and command handlers.
//!
//! Every command goes through [`Dispatcher::dispatch`], which resolves the
//! caller's role and compares it with the command's requirement before any
//! handler runs. Free-text answers to the backup confirmation go through
//! [`Dispatcher::reply`].

use std::fmt::Write as _;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::engine::BackupOrchestrator;
use crate::errors::BackupError;
use crate::event::StagePhase;
use crate::notify::Notifier;
use crate::types::{OperatorId, Role};

use super::dialog::DialogSessions;
use super::operators::OperatorRegistry;
use super::registry::{BotCommand, CommandRegistry};

const ALREADY_RUNNING: &str = "A backup is already running.";

/// Identity of whoever sent a message, as reported by the front-end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub id: OperatorId,
    pub name: String,
}

impl Caller {
    pub fn new(id: OperatorId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// What the front-end should do after a command or reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Send `text` back to the caller.
    Reply(String),
    /// Ask the caller a question, offering `choices` as quick replies.
    Prompt { text: String, choices: Vec<String> },
    /// Caller lacks the permission; nothing happened and nothing is sent.
    Rejected,
    /// No such command; nothing happened.
    Unknown,
    /// Free text outside of any dialog.
    Ignored,
}

impl Outcome {
    fn reply(text: impl Into<String>) -> Self {
        Outcome::Reply(text.into())
    }

    /// Text to deliver to the caller, if any.
    pub fn text(&self) -> Option<&str> {
        match self {
            Outcome::Reply(text) | Outcome::Prompt { text, .. } => Some(text.as_str()),
            Outcome::Rejected | Outcome::Unknown | Outcome::Ignored => None,
        }
    }
}

/// Routes operator commands to handlers behind a role check.
///
/// Safe to share between concurrent front-end handlers.
pub struct Dispatcher {
    commands: CommandRegistry,
    operators: OperatorRegistry,
    orchestrator: Arc<BackupOrchestrator>,
    notifier: Notifier,
    dialogs: Arc<DialogSessions>,
    dialog_timeout: Duration,
    schedule: Option<String>,
}

impl Dispatcher {
    pub fn new(
        commands: CommandRegistry,
        operators: OperatorRegistry,
        orchestrator: Arc<BackupOrchestrator>,
        notifier: Notifier,
        dialog_timeout: Duration,
    ) -> Self {
        Self {
            commands,
            operators,
            orchestrator,
            notifier,
            dialogs: Arc::new(DialogSessions::new()),
            dialog_timeout,
            schedule: None,
        }
    }

    /// Configured schedule expression reported by `/next`.
    pub fn with_schedule(mut self, schedule: Option<String>) -> Self {
        self.schedule = schedule;
        self
    }

    pub fn commands(&self) -> &CommandRegistry {
        &self.commands
    }

    pub fn operators(&self) -> &OperatorRegistry {
        &self.operators
    }

    pub fn orchestrator(&self) -> &Arc<BackupOrchestrator> {
        &self.orchestrator
    }

    pub fn dialog_open(&self, id: OperatorId) -> bool {
        self.dialogs.is_open(id)
    }

    /// Run command `name` (a leading `/` is accepted) on behalf of `caller`.
    ///
    /// Unknown commands and permission failures end any dialog the caller
    /// has open and run no handler.
    pub async fn dispatch(&self, caller: &Caller, name: &str, args: &str) -> Outcome {
        let name = name.trim().trim_start_matches('/');

        let Some(descriptor) = self.commands.get(name) else {
            warn!(caller = caller.id, command = %name, "unknown command");
            self.dialogs.close(caller.id);
            return Outcome::Unknown;
        };

        let role = self.operators.role_of(caller.id);
        if !role.satisfies(descriptor.required) {
            error!(
                caller = caller.id,
                name = %caller.name,
                has = %role,
                requires = %descriptor.required,
                command = descriptor.name,
                "caller does not have the required permission"
            );
            self.dialogs.close(caller.id);
            return Outcome::Rejected;
        }

        info!(
            caller = caller.id,
            name = %caller.name,
            has = %role,
            requires = %descriptor.required,
            command = descriptor.name,
            "caller has sufficient permission"
        );
        debug!(command = descriptor.name, args = %args, "dispatching command");

        match descriptor.handler {
            BotCommand::Start => self.cmd_start(caller, role).await,
            BotCommand::Next => self.cmd_next(),
            BotCommand::Status => self.cmd_status(),
            BotCommand::Backup => self.cmd_backup(caller),
            BotCommand::Cancel => self.cmd_cancel(caller),
            BotCommand::Help => self.cmd_help(role),
        }
    }

    /// Handle free text from `caller`, answering an open confirmation dialog.
    ///
    /// Only an exact, case-insensitive `yes` or `no` is understood; anything
    /// else ends the dialog.
    pub async fn reply(&self, caller: &Caller, text: &str) -> Outcome {
        if !self.dialogs.close(caller.id) {
            debug!(caller = caller.id, "free text outside of a dialog; ignoring");
            return Outcome::Ignored;
        }

        match text.to_lowercase().as_str() {
            "yes" => self.start_backup(caller),
            "no" => Outcome::reply("Maybe the next time..."),
            _ => Outcome::reply("Did not expect that reply...\nMaybe use the keyboard next time?"),
        }
    }

    async fn cmd_start(&self, caller: &Caller, role: Role) -> Outcome {
        if role == Role::Stranger {
            warn!(caller = caller.id, name = %caller.name, "message from unknown user");
            self.notifier
                .notify_owner(format!("Got message from unknown user {}!", caller.name))
                .await;
            return Outcome::reply("I do not talk to strangers.");
        }
        Outcome::reply(format!("Hi {}!", caller.name))
    }

    fn cmd_next(&self) -> Outcome {
        match &self.schedule {
            Some(schedule) => Outcome::reply(format!(
                "Scheduled backups are disabled (configured schedule: {schedule})."
            )),
            None => Outcome::reply("No backup is scheduled."),
        }
    }

    fn cmd_status(&self) -> Outcome {
        let state = self.orchestrator.state();
        let mut text = String::new();

        match state.run_dir() {
            Some(dir) => {
                let _ = writeln!(text, "Run: {} ({})", dir.display(), state.phase());
            }
            None => text.push_str("No backup has run yet.\n"),
        }

        for (name, stage) in state.stages() {
            let _ = write!(text, "{name}: {}", stage.phase());
            if let Some(ok) = stage.succeeded() {
                text.push_str(if ok { " (ok)" } else { " (failed)" });
            }
            if let Some(fraction) = stage.progress() {
                if stage.phase() == StagePhase::Started {
                    let _ = write!(text, " {:.0}%", fraction * 100.0);
                }
            }
            text.push('\n');
        }

        Outcome::Reply(text.trim_end().to_string())
    }

    fn cmd_backup(&self, caller: &Caller) -> Outcome {
        if self.orchestrator.is_running() {
            self.dialogs.close(caller.id);
            return Outcome::reply(ALREADY_RUNNING);
        }

        let generation = self.dialogs.open(caller.id);
        self.arm_dialog_timeout(caller.id, generation);

        Outcome::Prompt {
            text: "Are you sure?".to_string(),
            choices: vec!["Yes".to_string(), "No".to_string()],
        }
    }

    fn cmd_cancel(&self, caller: &Caller) -> Outcome {
        if self.dialogs.close(caller.id) {
            debug!(caller = caller.id, "dialog cancelled");
        }
        Outcome::reply("Canceled.")
    }

    fn cmd_help(&self, role: Role) -> Outcome {
        let mut text = String::from("Available commands:");
        for cmd in self.commands.available_to(role) {
            let _ = write!(text, "\n/{} - {}", cmd.name, cmd.description);
        }
        Outcome::Reply(text)
    }

    fn start_backup(&self, caller: &Caller) -> Outcome {
        match self.orchestrator.spawn() {
            Ok(_handle) => {
                info!(caller = caller.id, "backup started on operator request");
                Outcome::reply("Backup started.")
            }
            Err(BackupError::AlreadyRunning) => Outcome::reply(ALREADY_RUNNING),
            Err(err) => {
                error!(caller = caller.id, error = %err, "could not start backup");
                Outcome::reply(format!("Could not start backup: {err}"))
            }
        }
    }

    /// Close the dialog after the configured window unless it was answered
    /// or reopened in the meantime, telling the caller once.
    fn arm_dialog_timeout(&self, caller: OperatorId, generation: u64) {
        let dialogs = Arc::clone(&self.dialogs);
        let notifier = self.notifier.clone();
        let timeout = self.dialog_timeout;

        tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            if dialogs.close_if(caller, generation) {
                info!(caller, "confirmation dialog timed out");
                notifier
                    .notify_operator(caller, "Conversation timeout.")
                    .await;
            }
        });
    }
}

// src/frontend.rs

//! Line-oriented console front-end.
//!
//! Stands in for a chat transport: each stdin line is
//! `<operator-id> /<command> [args]` or `<operator-id> <reply text>`.
//! Replies and notifications are printed as `[to <recipient>] <text>`.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::dispatch::{Caller, Dispatcher, OperatorRegistry, Outcome};
use crate::engine::BackupOrchestrator;
use crate::notify::{Notification, Recipient};
use crate::types::OperatorId;

/// One parsed console line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleInput {
    Command {
        caller: OperatorId,
        name: String,
        args: String,
    },
    Text {
        caller: OperatorId,
        text: String,
    },
}

/// Parse `<id> /cmd args` or `<id> text`. Returns `None` for malformed lines.
pub fn parse_line(line: &str) -> Option<ConsoleInput> {
    let line = line.trim();
    let (id, rest) = line.split_once(char::is_whitespace)?;
    let caller: OperatorId = id.parse().ok()?;
    let rest = rest.trim();

    if let Some(command) = rest.strip_prefix('/') {
        let (name, args) = command
            .split_once(char::is_whitespace)
            .unwrap_or((command, ""));
        if name.is_empty() {
            return None;
        }
        return Some(ConsoleInput::Command {
            caller,
            name: name.to_string(),
            args: args.trim().to_string(),
        });
    }

    if rest.is_empty() {
        return None;
    }
    Some(ConsoleInput::Text {
        caller,
        text: rest.to_string(),
    })
}

/// Where the notification printer writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrintTarget {
    Stdout,
    Stderr,
}

/// Render a recipient for console output, resolving the owner's id.
pub fn recipient_label(recipient: Recipient, operators: &OperatorRegistry) -> String {
    match recipient {
        Recipient::Owner => operators
            .owner_id()
            .map(|id| id.to_string())
            .unwrap_or_else(|| "owner".to_string()),
        other => other.to_string(),
    }
}

/// Drain the notification channel until every sender is gone.
pub fn spawn_printer(
    mut rx: mpsc::Receiver<Notification>,
    operators: OperatorRegistry,
    target: PrintTarget,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(note) = rx.recv().await {
            let line = format!("[to {}] {}", recipient_label(note.recipient, &operators), note.text);
            match target {
                PrintTarget::Stdout => println!("{line}"),
                PrintTarget::Stderr => eprintln!("{line}"),
            }
        }
        debug!("notification channel closed");
    })
}

/// Serve operator commands from stdin until EOF or Ctrl-C.
///
/// A backup still running at that point is awaited before returning.
pub async fn serve(
    dispatcher: Arc<Dispatcher>,
    notifications: mpsc::Receiver<Notification>,
) -> Result<()> {
    let printer = spawn_printer(
        notifications,
        dispatcher.operators().clone(),
        PrintTarget::Stdout,
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    info!("console front-end ready");

    let mut ctrl_c_armed = true;
    loop {
        let line = tokio::select! {
            line = lines.next_line() => line.context("reading stdin")?,
            res = tokio::signal::ctrl_c(), if ctrl_c_armed => {
                match on_ctrl_c(res) {
                    SignalAction::Shutdown => break,
                    SignalAction::KeepServing => {
                        ctrl_c_armed = false;
                        continue;
                    }
                }
            }
        };

        let Some(line) = line else {
            info!("stdin closed; shutting down");
            break;
        };

        match parse_line(&line) {
            Some(input) => handle_input(&dispatcher, input).await,
            None if line.trim().is_empty() => {}
            None => eprintln!("expected '<operator-id> /<command>' or '<operator-id> <text>'"),
        }
    }

    wait_for_backup(dispatcher.orchestrator()).await;

    drop(dispatcher);
    finish_printer(printer, PRINTER_GRACE).await;
    Ok(())
}

/// How long shutdown waits for queued notifications to be printed.
const PRINTER_GRACE: Duration = Duration::from_secs(1);

/// What the serve loop does after the Ctrl-C listener resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SignalAction {
    Shutdown,
    /// The listener could not be installed; serve on without it.
    KeepServing,
}

pub(crate) fn on_ctrl_c(res: std::io::Result<()>) -> SignalAction {
    match res {
        Ok(()) => {
            info!("Ctrl-C received; shutting down");
            SignalAction::Shutdown
        }
        Err(err) => {
            error!(error = %err, "failed to listen for Ctrl-C; stop with EOF instead");
            SignalAction::KeepServing
        }
    }
}

/// Wait for an in-flight backup to report its outcome. Returns at once when
/// the orchestrator is idle.
pub async fn wait_for_backup(orchestrator: &BackupOrchestrator) {
    if orchestrator.is_running() {
        info!("waiting for the running backup to finish");
        let outcome = orchestrator.state().backup.wait_finished().await;
        debug!(?outcome, "running backup finished");
    }
}

/// Join the notification printer, giving it `grace` to drain.
pub async fn finish_printer(printer: JoinHandle<()>, grace: Duration) {
    match tokio::time::timeout(grace, printer).await {
        Ok(Ok(())) => {}
        Ok(Err(err)) => warn!(error = %err, "notification printer failed"),
        Err(_) => debug!("notification printer still draining; not waiting longer"),
    }
}

async fn handle_input(dispatcher: &Dispatcher, input: ConsoleInput) {
    let (caller, outcome) = match input {
        ConsoleInput::Command { caller, name, args } => {
            let who = Caller::new(caller, format!("operator-{caller}"));
            (caller, dispatcher.dispatch(&who, &name, &args).await)
        }
        ConsoleInput::Text { caller, text } => {
            let who = Caller::new(caller, format!("operator-{caller}"));
            (caller, dispatcher.reply(&who, &text).await)
        }
    };

    match outcome {
        Outcome::Reply(text) => println!("[to {caller}] {text}"),
        Outcome::Prompt { text, choices } => {
            println!("[to {caller}] {text} [{}]", choices.join(" / "))
        }
        other @ (Outcome::Rejected | Outcome::Unknown | Outcome::Ignored) => {
            debug!(caller, outcome = ?other, "no reply sent");
        }
    }
}

// tests/dispatch_permissions.rs

mod common;
use crate::common::builders::{ConfigBuilder, OWNER_ID};
use crate::common::{
    ADMIN_ID, FakeExecutor, STRANGER_ID, USER_ID, dispatcher, drain, init_tracing,
};

use std::error::Error;

use tempfile::tempdir;

use backup_bot::dispatch::{
    BotCommand, Caller, CommandDescriptor, CommandKind, CommandRegistry, Outcome,
};
use backup_bot::notify::Recipient;
use backup_bot::types::Role;

type TestResult = Result<(), Box<dyn Error>>;

const ROLES: [Role; 4] = [Role::Stranger, Role::User, Role::Admin, Role::Owner];

fn caller_with(role: Role) -> Caller {
    let id = match role {
        Role::Owner => OWNER_ID,
        Role::Admin => ADMIN_ID,
        Role::User => USER_ID,
        Role::Stranger => STRANGER_ID,
    };
    Caller::new(id, format!("{role}-caller"))
}

fn config(root: &std::path::Path) -> backup_bot::config::ConfigFile {
    ConfigBuilder::new(root)
        .operator(ADMIN_ID, Role::Admin)
        .operator(USER_ID, Role::User)
        .build()
}

#[test]
fn roles_are_ordered_from_stranger_to_owner() {
    assert!(Role::Stranger < Role::User);
    assert!(Role::User < Role::Admin);
    assert!(Role::Admin < Role::Owner);

    for caller in ROLES {
        for required in ROLES {
            assert_eq!(caller.satisfies(required), caller >= required);
        }
    }
}

#[tokio::test]
async fn permission_gate_follows_role_order() -> TestResult {
    init_tracing();
    let root = tempdir()?;
    let cfg = config(root.path());
    let (dispatcher, _rx) = dispatcher(&cfg, FakeExecutor::new());

    let registry = CommandRegistry::standard()?;
    for role in ROLES {
        for cmd in registry.iter() {
            let outcome = dispatcher.dispatch(&caller_with(role), cmd.name, "").await;
            if role >= cmd.required {
                assert_ne!(outcome, Outcome::Rejected, "{role} running /{}", cmd.name);
            } else {
                assert_eq!(outcome, Outcome::Rejected, "{role} running /{}", cmd.name);
            }
        }
    }
    Ok(())
}

#[tokio::test]
async fn rejected_command_has_no_side_effects() -> TestResult {
    init_tracing();
    let root = tempdir()?;
    let cfg = config(root.path());
    let executor = FakeExecutor::new();
    let (dispatcher, mut rx) = dispatcher(&cfg, executor.clone());

    let outcome = dispatcher
        .dispatch(&caller_with(Role::User), "/backup", "")
        .await;

    assert_eq!(outcome, Outcome::Rejected);
    assert!(!dispatcher.dialog_open(USER_ID));
    assert!(!dispatcher.orchestrator().is_running());
    assert!(executor.invoked().is_empty());
    assert!(drain(&mut rx).is_empty());
    Ok(())
}

#[tokio::test]
async fn strangers_are_turned_away_and_reported() -> TestResult {
    init_tracing();
    let root = tempdir()?;
    let cfg = config(root.path());
    let (dispatcher, mut rx) = dispatcher(&cfg, FakeExecutor::new());

    let outcome = dispatcher
        .dispatch(&Caller::new(STRANGER_ID, "mallory"), "start", "")
        .await;
    assert_eq!(outcome.text(), Some("I do not talk to strangers."));

    let notes = drain(&mut rx);
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].recipient, Recipient::Owner);
    assert_eq!(notes[0].text, "Got message from unknown user mallory!");

    let outcome = dispatcher
        .dispatch(&Caller::new(USER_ID, "alice"), "start", "")
        .await;
    assert_eq!(outcome, Outcome::Reply("Hi alice!".to_string()));
    assert!(drain(&mut rx).is_empty());
    Ok(())
}

#[tokio::test]
async fn unknown_command_runs_nothing() -> TestResult {
    init_tracing();
    let root = tempdir()?;
    let cfg = config(root.path());
    let (dispatcher, _rx) = dispatcher(&cfg, FakeExecutor::new());

    let outcome = dispatcher
        .dispatch(&caller_with(Role::Owner), "/reboot", "")
        .await;
    assert_eq!(outcome, Outcome::Unknown);
    Ok(())
}

#[tokio::test]
async fn help_lists_only_permitted_commands() -> TestResult {
    init_tracing();
    let root = tempdir()?;
    let cfg = config(root.path());
    let (dispatcher, _rx) = dispatcher(&cfg, FakeExecutor::new());

    let user_help = dispatcher.dispatch(&caller_with(Role::User), "help", "").await;
    let text = user_help.text().unwrap_or_default();
    assert!(text.contains("/status"));
    assert!(!text.contains("/backup"));

    let admin_help = dispatcher.dispatch(&caller_with(Role::Admin), "help", "").await;
    assert!(admin_help.text().unwrap_or_default().contains("/backup"));
    Ok(())
}

#[tokio::test]
async fn next_reports_the_configured_schedule() -> TestResult {
    init_tracing();
    let root = tempdir()?;

    let cfg = config(root.path());
    let (dispatcher_plain, _rx) = dispatcher(&cfg, FakeExecutor::new());
    let outcome = dispatcher_plain.dispatch(&caller_with(Role::User), "next", "").await;
    assert_eq!(outcome.text(), Some("No backup is scheduled."));

    let cfg = ConfigBuilder::new(root.path())
        .operator(USER_ID, Role::User)
        .schedule("0 3 * * *")
        .build();
    let (dispatcher_sched, _rx) = dispatcher(&cfg, FakeExecutor::new());
    let outcome = dispatcher_sched.dispatch(&caller_with(Role::User), "next", "").await;
    assert_eq!(
        outcome.text(),
        Some("Scheduled backups are disabled (configured schedule: 0 3 * * *).")
    );
    Ok(())
}

#[tokio::test]
async fn status_before_and_after_a_run() -> TestResult {
    init_tracing();
    let root = tempdir()?;
    let cfg = config(root.path());
    let (dispatcher, _rx) = dispatcher(&cfg, FakeExecutor::new());

    let before = dispatcher.dispatch(&caller_with(Role::User), "status", "").await;
    let text = before.text().unwrap_or_default().to_string();
    assert!(text.starts_with("No backup has run yet."));
    assert!(text.contains("enable_maintenance: not started"));

    dispatcher.orchestrator().run().await?;

    let after = dispatcher.dispatch(&caller_with(Role::User), "status", "").await;
    let text = after.text().unwrap_or_default().to_string();
    assert!(text.contains("(done)"));
    assert!(text.contains("backup: finished (ok)"));
    Ok(())
}

#[test]
fn registry_rejects_inconsistent_tables() {
    let entry = CommandDescriptor::new(
        "backup",
        "Start a backup manually.",
        BotCommand::Backup,
        Role::Admin,
        CommandKind::DialogEntry,
    );
    let fallback = CommandDescriptor::new(
        "cancel",
        "Cancel your action.",
        BotCommand::Cancel,
        Role::User,
        CommandKind::DialogFallback,
    );

    assert!(CommandRegistry::new(vec![entry.clone(), fallback.clone()]).is_ok());
    assert!(CommandRegistry::new(vec![entry.clone()]).is_err());
    assert!(CommandRegistry::new(vec![entry.clone(), fallback.clone(), fallback]).is_err());

    let standard = CommandRegistry::standard().expect("standard command table is valid");
    assert_eq!(standard.iter().count(), 6);
    for cmd in standard.iter() {
        assert_eq!(standard.get(cmd.name), Some(cmd), "/{} must be unique", cmd.name);
    }
    assert_eq!(standard.dialog_entry().map(|c| c.name), Some("backup"));
    assert_eq!(standard.dialog_fallback().map(|c| c.name), Some("cancel"));
}

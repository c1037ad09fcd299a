// src/lib.rs

pub mod cli;
pub mod config;
pub mod dispatch;
pub mod engine;
pub mod errors;
pub mod event;
pub mod exec;
pub mod frontend;
pub mod logging;
pub mod notify;
pub mod types;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Result, bail};
use tracing::{debug, info};

use crate::cli::{CliArgs, Command};
use crate::config::{ConfigFile, load_and_validate};
use crate::dispatch::{CommandRegistry, Dispatcher, OperatorRegistry};
use crate::engine::BackupOrchestrator;
use crate::exec::ProcessExecutor;
use crate::frontend::PrintTarget;
use crate::notify::Notifier;

/// Capacity of the notification channel between producers and front-end.
const NOTIFICATION_CAPACITY: usize = 64;

/// Upper bound on draining notifications after a one-shot run.
const PRINTER_DRAIN: Duration = Duration::from_secs(5);

/// High-level entry point used by `main.rs`.
///
/// Loads and validates the config, then runs the selected subcommand.
pub async fn run(args: CliArgs) -> Result<()> {
    let cfg = load_and_validate(&args.config)?;

    match args.command {
        Command::Check => {
            print_config(&cfg);
            Ok(())
        }
        Command::Run => run_once(&cfg).await,
        Command::Serve => serve(&cfg).await,
    }
}

/// Run a single backup, printing failure notifications to stderr.
async fn run_once(cfg: &ConfigFile) -> Result<()> {
    let (notifier, rx) = Notifier::channel(NOTIFICATION_CAPACITY);
    let printer = frontend::spawn_printer(
        rx,
        OperatorRegistry::new(&cfg.operators),
        PrintTarget::Stderr,
    );

    let orchestrator =
        BackupOrchestrator::from_config(cfg, Arc::new(ProcessExecutor::new()), notifier)?;
    let success = orchestrator.run().await?;
    let run_dir = orchestrator.state().run_dir();

    // Dropping the orchestrator closes the channel so the printer can finish.
    drop(orchestrator);
    frontend::finish_printer(printer, PRINTER_DRAIN).await;

    if !success {
        bail!("backup run failed");
    }

    if let Some(dir) = run_dir {
        info!(run_dir = %dir.display(), "backup completed");
        println!("backup completed: {}", dir.display());
    }
    Ok(())
}

/// Serve operator commands on the console front-end.
async fn serve(cfg: &ConfigFile) -> Result<()> {
    let (notifier, rx) = Notifier::channel(NOTIFICATION_CAPACITY);

    let orchestrator = Arc::new(BackupOrchestrator::from_config(
        cfg,
        Arc::new(ProcessExecutor::new()),
        notifier.clone(),
    )?);

    let dispatcher = Dispatcher::new(
        CommandRegistry::standard()?,
        OperatorRegistry::new(&cfg.operators),
        orchestrator,
        notifier,
        cfg.dialog.timeout(),
    )
    .with_schedule(cfg.backup.schedule.clone());

    frontend::serve(Arc::new(dispatcher), rx).await
}

/// Print the validated configuration; nothing is executed.
fn print_config(cfg: &ConfigFile) {
    println!("backup-bot check");
    println!("  backup.root_dir = {}", cfg.backup.root_dir.display());
    println!("  backup.data_dir = {}", cfg.backup.data_dir.display());
    println!("  backup.database = {}", cfg.backup.database);
    println!("  backup.dump_file = {}", cfg.backup.dump_file);
    println!("  backup.data_dir_name = {}", cfg.backup.data_dir_name);
    if let Some(ref schedule) = cfg.backup.schedule {
        println!("  backup.schedule = {schedule} (not executed)");
    }
    if let Some(interval) = cfg.backup.update_interval {
        println!("  backup.update_interval = {interval} (not used)");
    }
    println!("  dialog.timeout_secs = {}", cfg.dialog.timeout_secs);
    println!();

    println!("commands:");
    println!("  maintenance_on:  {:?}", cfg.commands.maintenance_on);
    println!("  maintenance_off: {:?}", cfg.commands.maintenance_off);
    println!("  dump:            {:?}", cfg.commands.dump);
    println!("  sync:            {:?}", cfg.commands.sync);
    println!();

    println!("operators ({}):", cfg.operators.len());
    for op in cfg.operators.iter() {
        println!("  - {} ({})", op.id, op.role);
    }

    debug!("check complete (no execution)");
}

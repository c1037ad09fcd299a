#![allow(dead_code)]

pub use backup_bot_test_utils::builders;
pub use backup_bot_test_utils::fake_executor::FakeExecutor;
pub use backup_bot_test_utils::{init_tracing, with_timeout};

use std::sync::Arc;

use tokio::sync::mpsc;

use backup_bot::config::ConfigFile;
use backup_bot::engine::BackupOrchestrator;
use backup_bot::notify::{Notification, Notifier};

/// Fixed run sub-directory so tests can predict paths.
pub const SUBDIR: &str = "run-1";

/// Orchestrator over `executor` with a fixed sub-directory name.
pub fn orchestrator(
    cfg: &ConfigFile,
    executor: FakeExecutor,
) -> (Arc<BackupOrchestrator>, mpsc::Receiver<Notification>) {
    let (notifier, rx) = Notifier::channel(32);
    let orchestrator = BackupOrchestrator::from_config(cfg, Arc::new(executor), notifier)
        .expect("valid commands")
        .with_subdir_fn(Arc::new(|| SUBDIR.to_string()));
    (Arc::new(orchestrator), rx)
}

/// Everything currently buffered in the notification channel.
pub fn drain(rx: &mut mpsc::Receiver<Notification>) -> Vec<Notification> {
    let mut out = Vec::new();
    while let Ok(note) = rx.try_recv() {
        out.push(note);
    }
    out
}

use backup_bot::dispatch::{CommandRegistry, Dispatcher, OperatorRegistry};

pub const ADMIN_ID: i64 = 2;
pub const USER_ID: i64 = 3;
pub const STRANGER_ID: i64 = 99;

/// Dispatcher over the standard command table and `cfg`'s operators.
pub fn dispatcher(
    cfg: &ConfigFile,
    executor: FakeExecutor,
) -> (Dispatcher, mpsc::Receiver<Notification>) {
    let (notifier, rx) = Notifier::channel(32);
    let orchestrator = BackupOrchestrator::from_config(cfg, Arc::new(executor), notifier.clone())
        .expect("valid commands")
        .with_subdir_fn(Arc::new(|| SUBDIR.to_string()));
    let dispatcher = Dispatcher::new(
        CommandRegistry::standard().expect("standard command table is valid"),
        OperatorRegistry::new(&cfg.operators),
        Arc::new(orchestrator),
        notifier,
        cfg.dialog.timeout(),
    )
    .with_schedule(cfg.backup.schedule.clone());
    (dispatcher, rx)
}

// src/engine/runtime.rs

use std::collections::VecDeque;
use std::fmt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::Utc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::config::ConfigFile;
use crate::errors::{BackupError, Result};
use crate::event::BackupJobState;
use crate::exec::{CommandExecutor, CommandOutput};
use crate::notify::Notifier;

use super::core::{BackupCore, CoreCommand};
use super::progress::parse_progress;
use super::{CoreEvent, Stage, StageCommands};

/// Generates the run sub-directory name.
pub type SubdirFn = Arc<dyn Fn() -> String + Send + Sync>;

/// Sub-directory name for a run started now: UTC, second resolution.
pub fn timestamp_subdir() -> String {
    Utc::now().format("%Y-%m-%d-%H:%M:%S").to_string()
}

/// Runs backup jobs: the async shell around [`BackupCore`].
///
/// At most one run is in flight per orchestrator. A run executes on its own
/// tokio task when started through [`BackupOrchestrator::spawn`], reports
/// progress through the shared [`BackupJobState`] and sends one notification
/// per failure. A fully successful run is silent; observers wait on
/// `state().backup` for the outcome.
pub struct BackupOrchestrator {
    commands: StageCommands,
    state: Arc<BackupJobState>,
    executor: Arc<dyn CommandExecutor>,
    notifier: Notifier,
    running: Arc<AtomicBool>,
    subdir_fn: SubdirFn,
}

impl fmt::Debug for BackupOrchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackupOrchestrator")
            .field("commands", &self.commands)
            .field("state", &self.state)
            .field("running", &self.running)
            .finish_non_exhaustive()
    }
}

/// Clears the in-flight flag when a run ends, however it ends.
struct RunGuard {
    running: Arc<AtomicBool>,
}

impl RunGuard {
    fn acquire(running: &Arc<AtomicBool>) -> Result<Self> {
        running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| BackupError::AlreadyRunning)?;
        Ok(Self {
            running: Arc::clone(running),
        })
    }
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Release);
    }
}

impl BackupOrchestrator {
    pub fn new(
        commands: StageCommands,
        root_dir: impl Into<PathBuf>,
        executor: Arc<dyn CommandExecutor>,
        notifier: Notifier,
    ) -> Self {
        Self {
            commands,
            state: Arc::new(BackupJobState::new(root_dir)),
            executor,
            notifier,
            running: Arc::new(AtomicBool::new(false)),
            subdir_fn: Arc::new(timestamp_subdir),
        }
    }

    pub fn from_config(
        cfg: &ConfigFile,
        executor: Arc<dyn CommandExecutor>,
        notifier: Notifier,
    ) -> Result<Self> {
        let commands = StageCommands::from_config(cfg)?;
        Ok(Self::new(
            commands,
            cfg.backup.root_dir.clone(),
            executor,
            notifier,
        ))
    }

    /// Replace the run sub-directory generator (timestamps by default).
    pub fn with_subdir_fn(mut self, subdir_fn: SubdirFn) -> Self {
        self.subdir_fn = subdir_fn;
        self
    }

    pub fn state(&self) -> &Arc<BackupJobState> {
        &self.state
    }

    pub fn commands(&self) -> &StageCommands {
        &self.commands
    }

    /// True between the start of a run and its final outcome.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Run one backup on the current task and return its outcome.
    pub async fn run(&self) -> Result<bool> {
        let _guard = RunGuard::acquire(&self.running)?;
        let run_dir = self.begin_run();
        Ok(self.execute_run(&run_dir).await)
    }

    /// Start one backup on a background task.
    ///
    /// Fails with [`BackupError::AlreadyRunning`] while another run is in
    /// flight. The in-flight flag is taken and the job state reset before
    /// this returns, so two concurrent callers can never both start a run
    /// and waiters attached afterwards only see the new run.
    pub fn spawn(self: &Arc<Self>) -> Result<JoinHandle<bool>> {
        let guard = RunGuard::acquire(&self.running).inspect_err(|_| {
            warn!("backup requested while another run is in flight");
        })?;
        let run_dir = self.begin_run();
        let this = Arc::clone(self);
        Ok(tokio::spawn(async move {
            let _guard = guard;
            this.execute_run(&run_dir).await
        }))
    }

    /// Reset the job state for a new run and latch `backup.started`.
    fn begin_run(&self) -> PathBuf {
        let subdir = (self.subdir_fn)();
        let run_dir = self.state.root_dir().join(&subdir);
        self.state.begin_run(subdir);
        self.state.backup.emit_started();
        info!(run_dir = %run_dir.display(), "backup run started");
        run_dir
    }

    async fn execute_run(&self, run_dir: &Path) -> bool {
        let mut core = BackupCore::new();
        let mut pending: VecDeque<CoreCommand> =
            self.apply(&mut core, CoreEvent::RunRequested).into();
        let mut outcome = false;

        while let Some(command) = pending.pop_front() {
            let event = match command {
                CoreCommand::CreateRunDir => CoreEvent::RunDirCreated {
                    ok: self.create_run_dir(run_dir).await,
                },
                CoreCommand::RunStage(stage) => CoreEvent::StageCompleted {
                    stage,
                    success: self.run_stage(stage, run_dir).await,
                },
                CoreCommand::Finish { success } => {
                    outcome = success;
                    self.state.backup.emit_finished(success);
                    continue;
                }
            };
            pending.extend(self.apply(&mut core, event));
        }

        info!(
            run_dir = %run_dir.display(),
            success = outcome,
            phase = %core.phase(),
            "backup run finished"
        );
        outcome
    }

    /// Feed `event` to the core and publish the resulting phase.
    fn apply(&self, core: &mut BackupCore, event: CoreEvent) -> Vec<CoreCommand> {
        let step = core.step(event);
        self.state.set_phase(step.phase);
        step.commands
    }

    async fn create_run_dir(&self, run_dir: &Path) -> bool {
        match tokio::fs::create_dir(run_dir).await {
            Ok(()) => {
                debug!(run_dir = %run_dir.display(), "run directory created");
                true
            }
            Err(err) => {
                let msg = match err.kind() {
                    ErrorKind::AlreadyExists => {
                        format!("Backup directory '{}' already existing!", run_dir.display())
                    }
                    ErrorKind::NotFound => format!(
                        "Backup directory '{}' does not exist!",
                        self.state.root_dir().display()
                    ),
                    _ => format!(
                        "Could not create backup directory '{}': {err}",
                        run_dir.display()
                    ),
                };
                error!(run_dir = %run_dir.display(), error = %err, "{msg}");
                self.notifier.notify_operators(msg).await;
                false
            }
        }
    }

    /// Emit the stage's start event, run its command, emit its finish event.
    ///
    /// The failure notification only ever carries this stage's own stderr.
    async fn run_stage(&self, stage: Stage, run_dir: &Path) -> bool {
        let spec = self.commands.spec_for(stage, run_dir);
        info!(%stage, command = %spec, "stage started");

        let output = match stage {
            Stage::DataSync => {
                let event = &self.state.data_backup;
                event.emit_started();
                let on_line = |segment: &str| {
                    if let Some(fraction) = parse_progress(segment) {
                        event.emit_progress(fraction);
                    }
                };
                let output = self.executor.execute_streaming(&spec, &on_line).await;
                event.emit_finished(output.success);
                output
            }
            Stage::EnableMaintenance | Stage::DatabaseDump | Stage::DisableMaintenance => {
                let event = match stage {
                    Stage::EnableMaintenance => &self.state.enable_maintenance,
                    Stage::DatabaseDump => &self.state.database_backup,
                    _ => &self.state.disable_maintenance,
                };
                event.emit_started();
                let output = self.executor.execute(&spec).await;
                event.emit_finished(output.success);
                output
            }
        };

        if output.success {
            info!(%stage, "stage succeeded");
        } else {
            self.report_failure(stage, &output).await;
        }
        output.success
    }

    async fn report_failure(&self, stage: Stage, output: &CommandOutput) {
        let stderr = output.stderr.trim_end();
        let msg = if stderr.is_empty() {
            stage.failure_headline().to_string()
        } else {
            format!("{}\n{stderr}", stage.failure_headline())
        };
        error!(%stage, exit_code = ?output.exit_code, "{msg}");
        self.notifier.notify_operators(msg).await;
    }
}

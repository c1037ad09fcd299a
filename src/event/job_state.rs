// src/event/job_state.rs

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::debug;

use super::{ProgressStageEvent, StageEvent, StagePhase, StageSignal};
use crate::engine::RunPhase;

/// Name of one of the five events of a backup job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageName {
    EnableMaintenance,
    DatabaseBackup,
    DataBackup,
    DisableMaintenance,
    Backup,
}

impl StageName {
    pub const ALL: [StageName; 5] = [
        StageName::EnableMaintenance,
        StageName::DatabaseBackup,
        StageName::DataBackup,
        StageName::DisableMaintenance,
        StageName::Backup,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            StageName::EnableMaintenance => "enable_maintenance",
            StageName::DatabaseBackup => "database_backup",
            StageName::DataBackup => "data_backup",
            StageName::DisableMaintenance => "disable_maintenance",
            StageName::Backup => "backup",
        }
    }
}

impl fmt::Display for StageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug)]
struct RunInfo {
    subdir: Option<String>,
    phase: RunPhase,
}

/// Events and paths of one backup job.
///
/// One instance lives as long as its orchestrator and is reset at the top of
/// every run. The orchestrator is the only writer.
#[derive(Debug)]
pub struct BackupJobState {
    pub enable_maintenance: StageEvent,
    pub database_backup: StageEvent,
    pub data_backup: ProgressStageEvent,
    pub disable_maintenance: StageEvent,
    /// Overall outcome of the run.
    pub backup: StageEvent,

    root_dir: PathBuf,
    run: Mutex<RunInfo>,
}

impl BackupJobState {
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            enable_maintenance: StageEvent::new(),
            database_backup: StageEvent::new(),
            data_backup: ProgressStageEvent::new(),
            disable_maintenance: StageEvent::new(),
            backup: StageEvent::new(),
            root_dir: root_dir.into(),
            run: Mutex::new(RunInfo {
                subdir: None,
                phase: RunPhase::Idle,
            }),
        }
    }

    fn lock_run(&self) -> MutexGuard<'_, RunInfo> {
        self.run.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fixed list of the job's events, in execution order.
    pub fn stages(&self) -> [(StageName, &dyn StageSignal); 5] {
        [
            (StageName::EnableMaintenance, &self.enable_maintenance),
            (StageName::DatabaseBackup, &self.database_backup),
            (StageName::DataBackup, &self.data_backup),
            (StageName::DisableMaintenance, &self.disable_maintenance),
            (StageName::Backup, &self.backup),
        ]
    }

    pub fn stage(&self, name: StageName) -> &dyn StageSignal {
        match name {
            StageName::EnableMaintenance => &self.enable_maintenance,
            StageName::DatabaseBackup => &self.database_backup,
            StageName::DataBackup => &self.data_backup,
            StageName::DisableMaintenance => &self.disable_maintenance,
            StageName::Backup => &self.backup,
        }
    }

    /// Reset every event of the job.
    pub fn clear_all(&self) {
        for (name, stage) in self.stages() {
            stage.clear();
            debug!(stage = %name, "stage event cleared");
        }
    }

    /// Reset all events and record the sub-directory of a new run.
    pub(crate) fn begin_run(&self, subdir: String) {
        self.clear_all();
        let mut run = self.lock_run();
        run.subdir = Some(subdir);
        run.phase = RunPhase::Idle;
    }

    pub(crate) fn set_phase(&self, phase: RunPhase) {
        self.lock_run().phase = phase;
    }

    pub fn phase(&self) -> RunPhase {
        self.lock_run().phase
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    /// Sub-directory name of the current (or last) run.
    pub fn run_subdir(&self) -> Option<String> {
        self.lock_run().subdir.clone()
    }

    /// `root_dir/run_subdir` of the current (or last) run.
    pub fn run_dir(&self) -> Option<PathBuf> {
        self.run_subdir().map(|subdir| self.root_dir.join(subdir))
    }

    /// True while a run has started and not yet reported its outcome.
    pub fn is_running(&self) -> bool {
        self.backup.phase() == StagePhase::Started
    }
}

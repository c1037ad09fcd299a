// src/engine/mod.rs

//! Backup orchestration engine.
//!
//! The stage sequencing rules live in a pure, synchronous core
//! ([`core::BackupCore`]) that consumes [`CoreEvent`]s and returns
//! [`CoreCommand`]s. The async shell ([`runtime::BackupOrchestrator`]) owns
//! the job state, the executor and the notifier, and turns those commands
//! into directory creation, process execution and event emission.

use std::fmt;

use crate::event::StageName;

/// Position of a run in the backup state machine.
///
/// Runs move strictly forward through
/// `Idle -> DirCreated -> MaintenanceOn -> DbDumped -> DataSynced ->
/// MaintenanceOff -> Done`; `Aborted` is absorbing and reachable from every
/// step. A failed dump or sync skips ahead to the maintenance-off step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RunPhase {
    #[default]
    Idle,
    DirCreated,
    MaintenanceOn,
    DbDumped,
    DataSynced,
    MaintenanceOff,
    Done,
    Aborted,
}

impl RunPhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, RunPhase::Done | RunPhase::Aborted)
    }
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RunPhase::Idle => "idle",
            RunPhase::DirCreated => "run directory created",
            RunPhase::MaintenanceOn => "maintenance on",
            RunPhase::DbDumped => "database dumped",
            RunPhase::DataSynced => "data synced",
            RunPhase::MaintenanceOff => "maintenance off",
            RunPhase::Done => "done",
            RunPhase::Aborted => "aborted",
        };
        f.write_str(s)
    }
}

/// An external-command step of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    EnableMaintenance,
    DatabaseDump,
    DataSync,
    DisableMaintenance,
}

impl Stage {
    /// The job-state event that reports this stage.
    pub fn event_name(self) -> StageName {
        match self {
            Stage::EnableMaintenance => StageName::EnableMaintenance,
            Stage::DatabaseDump => StageName::DatabaseBackup,
            Stage::DataSync => StageName::DataBackup,
            Stage::DisableMaintenance => StageName::DisableMaintenance,
        }
    }

    /// Headline of the operator notification sent when this stage fails.
    pub fn failure_headline(self) -> &'static str {
        match self {
            Stage::EnableMaintenance => "Failed to enter maintenance mode!",
            Stage::DatabaseDump => "Failed to dump database!",
            Stage::DataSync => "Failed to backup data directory!",
            Stage::DisableMaintenance => "Failed to leave maintenance mode!",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.event_name().as_str())
    }
}

/// Input to the core state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoreEvent {
    /// A new run should begin.
    RunRequested,
    /// The shell tried to create the run directory.
    RunDirCreated { ok: bool },
    /// An external-command stage exited.
    StageCompleted { stage: Stage, success: bool },
}

pub mod commands;
pub mod core;
pub mod progress;
pub mod runtime;

pub use commands::StageCommands;
pub use core::{BackupCore, CoreCommand, CoreStep};
pub use runtime::BackupOrchestrator;

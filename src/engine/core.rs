// src/engine/core.rs

//! Pure backup state machine.
//!
//! `BackupCore` holds no channels, paths or processes. It is fed one
//! [`CoreEvent`] at a time and answers with the phase reached and the
//! commands the shell must carry out next. Failure composition lives here:
//!
//! - run directory or maintenance-on failures abort the run immediately;
//! - dump and sync failures are recorded but the run continues to the
//!   maintenance-off step;
//! - a maintenance-off failure aborts the run.

use tracing::{debug, warn};

use super::{CoreEvent, RunPhase, Stage};

/// Work the shell must perform after a core step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoreCommand {
    /// Create `root/subdir` exclusively.
    CreateRunDir,
    /// Emit the stage's start event, run its command, emit its finish event.
    RunStage(Stage),
    /// Emit the overall `backup` finish event with this outcome.
    Finish { success: bool },
}

/// Result of feeding one event into the core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreStep {
    /// Phase after the event was applied.
    pub phase: RunPhase,
    pub commands: Vec<CoreCommand>,
}

/// What the core is waiting for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Awaiting {
    Nothing,
    RunDir,
    Stage(Stage),
}

#[derive(Debug, Clone)]
pub struct BackupCore {
    phase: RunPhase,
    failed: bool,
    awaiting: Awaiting,
}

impl BackupCore {
    pub fn new() -> Self {
        Self {
            phase: RunPhase::Idle,
            failed: false,
            awaiting: Awaiting::Nothing,
        }
    }

    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    /// Whether a soft failure has been recorded in this run.
    pub fn failed(&self) -> bool {
        self.failed
    }

    /// Apply one event and return the resulting step.
    ///
    /// Events that do not match what the core is waiting for are ignored and
    /// produce no commands.
    pub fn step(&mut self, event: CoreEvent) -> CoreStep {
        let commands = match (self.awaiting, event) {
            (Awaiting::Nothing, CoreEvent::RunRequested)
                if self.phase == RunPhase::Idle || self.phase.is_terminal() =>
            {
                self.phase = RunPhase::Idle;
                self.failed = false;
                self.awaiting = Awaiting::RunDir;
                vec![CoreCommand::CreateRunDir]
            }
            (Awaiting::RunDir, CoreEvent::RunDirCreated { ok }) => self.on_run_dir(ok),
            (Awaiting::Stage(expected), CoreEvent::StageCompleted { stage, success })
                if expected == stage =>
            {
                self.on_stage_completed(stage, success)
            }
            (awaiting, event) => {
                warn!(
                    ?awaiting,
                    ?event,
                    phase = %self.phase,
                    "ignoring event that does not match the current run state"
                );
                Vec::new()
            }
        };

        CoreStep {
            phase: self.phase,
            commands,
        }
    }

    fn on_run_dir(&mut self, ok: bool) -> Vec<CoreCommand> {
        if !ok {
            return self.abort();
        }
        self.transition(RunPhase::DirCreated);
        self.run(Stage::EnableMaintenance)
    }

    fn on_stage_completed(&mut self, stage: Stage, success: bool) -> Vec<CoreCommand> {
        match (stage, success) {
            // Maintenance was never entered, so there is nothing to leave.
            (Stage::EnableMaintenance, false) => self.abort(),
            (Stage::EnableMaintenance, true) => {
                self.transition(RunPhase::MaintenanceOn);
                self.run(Stage::DatabaseDump)
            }
            (Stage::DatabaseDump, true) => {
                self.transition(RunPhase::DbDumped);
                self.run(Stage::DataSync)
            }
            (Stage::DataSync, true) => {
                self.transition(RunPhase::DataSynced);
                self.run(Stage::DisableMaintenance)
            }
            (Stage::DatabaseDump, false) | (Stage::DataSync, false) => {
                self.failed = true;
                debug!(%stage, "soft stage failure recorded; continuing to maintenance-off");
                self.run(Stage::DisableMaintenance)
            }
            (Stage::DisableMaintenance, true) => {
                self.transition(RunPhase::MaintenanceOff);
                self.transition(RunPhase::Done);
                self.awaiting = Awaiting::Nothing;
                vec![CoreCommand::Finish {
                    success: !self.failed,
                }]
            }
            (Stage::DisableMaintenance, false) => {
                self.failed = true;
                self.abort()
            }
        }
    }

    fn run(&mut self, stage: Stage) -> Vec<CoreCommand> {
        self.awaiting = Awaiting::Stage(stage);
        vec![CoreCommand::RunStage(stage)]
    }

    fn abort(&mut self) -> Vec<CoreCommand> {
        self.transition(RunPhase::Aborted);
        self.awaiting = Awaiting::Nothing;
        vec![CoreCommand::Finish { success: false }]
    }

    fn transition(&mut self, next: RunPhase) {
        debug!(from = %self.phase, to = %next, "run phase transition");
        self.phase = next;
    }
}

impl Default for BackupCore {
    fn default() -> Self {
        Self::new()
    }
}

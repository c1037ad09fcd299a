// tests/core_state_machine.rs

mod common;
use crate::common::init_tracing;

use backup_bot::engine::progress::parse_progress;
use backup_bot::engine::{BackupCore, CoreCommand, CoreEvent, RunPhase, Stage};

fn completed(stage: Stage, success: bool) -> CoreEvent {
    CoreEvent::StageCompleted { stage, success }
}

/// Drive a fresh core to the point where it asks for `stage`.
fn core_at(stage: Stage) -> BackupCore {
    let mut core = BackupCore::new();
    core.step(CoreEvent::RunRequested);
    core.step(CoreEvent::RunDirCreated { ok: true });
    for earlier in [Stage::EnableMaintenance, Stage::DatabaseDump, Stage::DataSync] {
        if earlier == stage {
            break;
        }
        core.step(completed(earlier, true));
    }
    core
}

#[test]
fn happy_path_walks_every_phase() {
    init_tracing();
    let mut core = BackupCore::new();

    let step = core.step(CoreEvent::RunRequested);
    assert_eq!(step.phase, RunPhase::Idle);
    assert_eq!(step.commands, vec![CoreCommand::CreateRunDir]);

    let step = core.step(CoreEvent::RunDirCreated { ok: true });
    assert_eq!(step.phase, RunPhase::DirCreated);
    assert_eq!(step.commands, vec![CoreCommand::RunStage(Stage::EnableMaintenance)]);

    let step = core.step(completed(Stage::EnableMaintenance, true));
    assert_eq!(step.phase, RunPhase::MaintenanceOn);
    assert_eq!(step.commands, vec![CoreCommand::RunStage(Stage::DatabaseDump)]);

    let step = core.step(completed(Stage::DatabaseDump, true));
    assert_eq!(step.phase, RunPhase::DbDumped);
    assert_eq!(step.commands, vec![CoreCommand::RunStage(Stage::DataSync)]);

    let step = core.step(completed(Stage::DataSync, true));
    assert_eq!(step.phase, RunPhase::DataSynced);
    assert_eq!(step.commands, vec![CoreCommand::RunStage(Stage::DisableMaintenance)]);

    let step = core.step(completed(Stage::DisableMaintenance, true));
    assert_eq!(step.phase, RunPhase::Done);
    assert_eq!(step.commands, vec![CoreCommand::Finish { success: true }]);
    assert!(!core.failed());
}

#[test]
fn run_dir_failure_aborts() {
    init_tracing();
    let mut core = BackupCore::new();
    core.step(CoreEvent::RunRequested);

    let step = core.step(CoreEvent::RunDirCreated { ok: false });
    assert_eq!(step.phase, RunPhase::Aborted);
    assert_eq!(step.commands, vec![CoreCommand::Finish { success: false }]);
}

#[test]
fn maintenance_on_failure_aborts_without_leaving_maintenance() {
    init_tracing();
    let mut core = core_at(Stage::EnableMaintenance);

    let step = core.step(completed(Stage::EnableMaintenance, false));
    assert_eq!(step.phase, RunPhase::Aborted);
    assert_eq!(step.commands, vec![CoreCommand::Finish { success: false }]);
}

#[test]
fn soft_failures_go_straight_to_maintenance_off() {
    init_tracing();
    for stage in [Stage::DatabaseDump, Stage::DataSync] {
        let mut core = core_at(stage);
        let before = core.phase();

        let step = core.step(completed(stage, false));
        assert_eq!(step.phase, before, "{stage}: phase must not advance on failure");
        assert_eq!(
            step.commands,
            vec![CoreCommand::RunStage(Stage::DisableMaintenance)]
        );
        assert!(core.failed());

        let step = core.step(completed(Stage::DisableMaintenance, true));
        assert_eq!(step.phase, RunPhase::Done);
        assert_eq!(step.commands, vec![CoreCommand::Finish { success: false }]);
    }
}

#[test]
fn maintenance_off_failure_aborts() {
    init_tracing();
    let mut core = core_at(Stage::DataSync);
    core.step(completed(Stage::DataSync, true));

    let step = core.step(completed(Stage::DisableMaintenance, false));
    assert_eq!(step.phase, RunPhase::Aborted);
    assert_eq!(step.commands, vec![CoreCommand::Finish { success: false }]);
}

#[test]
fn unexpected_events_are_ignored() {
    init_tracing();
    let mut core = BackupCore::new();

    let step = core.step(completed(Stage::DataSync, true));
    assert_eq!(step.phase, RunPhase::Idle);
    assert!(step.commands.is_empty());

    let mut core = core_at(Stage::DatabaseDump);
    let step = core.step(completed(Stage::DataSync, true));
    assert_eq!(step.phase, RunPhase::MaintenanceOn);
    assert!(step.commands.is_empty());

    // A second run request while one is in flight is ignored too.
    let step = core.step(CoreEvent::RunRequested);
    assert!(step.commands.is_empty());
}

#[test]
fn finished_core_accepts_a_new_run() {
    init_tracing();
    let mut core = core_at(Stage::EnableMaintenance);
    core.step(completed(Stage::EnableMaintenance, false));
    assert_eq!(core.phase(), RunPhase::Aborted);

    let step = core.step(CoreEvent::RunRequested);
    assert_eq!(step.phase, RunPhase::Idle);
    assert_eq!(step.commands, vec![CoreCommand::CreateRunDir]);
    assert!(!core.failed());
}

#[test]
fn progress_is_read_from_percent_columns() {
    assert_eq!(parse_progress("  32,768   0%    0.00kB/s    0:00:00"), Some(0.0));
    assert_eq!(parse_progress("  1,234,567  45%  1.23MB/s  0:00:10"), Some(0.45));
    assert_eq!(parse_progress("1,234,567 100%  1.23MB/s  0:00:00 (xfr#3)"), Some(1.0));
    assert_eq!(parse_progress("sending incremental file list"), None);
    assert_eq!(parse_progress("a50%b"), None);
}

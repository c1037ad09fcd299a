// src/engine/commands.rs

use std::path::{Path, PathBuf};

use crate::config::ConfigFile;
use crate::errors::{BackupError, Result};
use crate::exec::CommandSpec;

use super::Stage;

/// The four external commands of a backup run, resolved from configuration.
#[derive(Debug, Clone)]
pub struct StageCommands {
    pub maintenance_on: CommandSpec,
    pub maintenance_off: CommandSpec,
    pub dump: CommandSpec,
    pub sync: CommandSpec,
    pub database: String,
    pub data_dir: PathBuf,
    pub dump_file: String,
    pub data_dir_name: String,
}

impl StageCommands {
    pub fn from_config(cfg: &ConfigFile) -> Result<Self> {
        Ok(Self {
            maintenance_on: argv("maintenance_on", &cfg.commands.maintenance_on)?,
            maintenance_off: argv("maintenance_off", &cfg.commands.maintenance_off)?,
            dump: argv("dump", &cfg.commands.dump)?,
            sync: argv("sync", &cfg.commands.sync)?,
            database: cfg.backup.database.clone(),
            data_dir: cfg.backup.data_dir.clone(),
            dump_file: cfg.backup.dump_file.clone(),
            data_dir_name: cfg.backup.data_dir_name.clone(),
        })
    }

    /// Full command line for `stage` of a run writing into `run_dir`.
    ///
    /// - dump: `<dump argv> --result-file=<run_dir>/<dump_file> <database>`
    /// - sync: `<sync argv> <data_dir> <run_dir>/<data_dir_name>`
    pub fn spec_for(&self, stage: Stage, run_dir: &Path) -> CommandSpec {
        match stage {
            Stage::EnableMaintenance => self.maintenance_on.clone(),
            Stage::DisableMaintenance => self.maintenance_off.clone(),
            Stage::DatabaseDump => {
                let output = run_dir.join(&self.dump_file);
                self.dump
                    .clone()
                    .arg(format!("--result-file={}", output.display()))
                    .arg(self.database.clone())
            }
            Stage::DataSync => {
                let dest = run_dir.join(&self.data_dir_name);
                self.sync
                    .clone()
                    .arg(self.data_dir.display().to_string())
                    .arg(dest.display().to_string())
            }
        }
    }
}

fn argv(name: &str, argv: &[String]) -> Result<CommandSpec> {
    CommandSpec::from_argv(argv).ok_or_else(|| {
        BackupError::ConfigError(format!("[commands].{name} must name a program"))
    })
}

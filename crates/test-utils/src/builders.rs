#![allow(dead_code)]

use std::path::{Path, PathBuf};

use backup_bot::config::{
    BackupSection, CommandsSection, ConfigFile, DialogSection, OperatorEntry, RawConfigFile,
};
use backup_bot::types::{OperatorId, Role};

pub const MAINT_ON: &str = "maint-on";
pub const MAINT_OFF: &str = "maint-off";
pub const DUMP: &str = "dump";
pub const SYNC: &str = "sync";

pub const OWNER_ID: OperatorId = 1;

/// Builder for `ConfigFile` rooted at a test directory.
///
/// Commands are short placeholder programs meant for a `FakeExecutor`.
/// One owner (`OWNER_ID`) is always registered.
pub struct ConfigBuilder {
    config: RawConfigFile,
}

impl ConfigBuilder {
    pub fn new(root_dir: impl AsRef<Path>) -> Self {
        Self {
            config: RawConfigFile {
                backup: BackupSection {
                    root_dir: root_dir.as_ref().to_path_buf(),
                    data_dir: PathBuf::from("/srv/app/data"),
                    database: "appdb".to_string(),
                    dump_file: "db.sql".to_string(),
                    data_dir_name: "data".to_string(),
                    schedule: None,
                    update_interval: None,
                },
                commands: CommandsSection {
                    maintenance_on: vec![MAINT_ON.to_string(), "--on".to_string()],
                    maintenance_off: vec![MAINT_OFF.to_string(), "--off".to_string()],
                    dump: vec![DUMP.to_string()],
                    sync: vec![SYNC.to_string(), "-a".to_string()],
                },
                dialog: DialogSection::default(),
                operators: vec![OperatorEntry {
                    id: OWNER_ID,
                    role: Role::Owner,
                }],
            },
        }
    }

    pub fn operator(mut self, id: OperatorId, role: Role) -> Self {
        self.config.operators.push(OperatorEntry { id, role });
        self
    }

    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.config.dialog.timeout_secs = secs;
        self
    }

    pub fn schedule(mut self, expr: &str) -> Self {
        self.config.backup.schedule = Some(expr.to_string());
        self
    }

    pub fn build_raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

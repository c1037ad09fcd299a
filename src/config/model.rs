// src/config/model.rs

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::types::{OperatorId, Role};

/// Configuration exactly as read from the TOML file, before validation.
///
/// ```toml
/// [backup]
/// root_dir = "/mnt/backup"
/// data_dir = "/var/www/nextcloud/data"
/// database = "nextcloud"
///
/// [commands]
/// sync = ["rsync", "-Aax", "--info=progress2"]
///
/// [[operators]]
/// id = 1001
/// role = "owner"
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfigFile {
    pub backup: BackupSection,

    #[serde(default)]
    pub commands: CommandsSection,

    #[serde(default)]
    pub dialog: DialogSection,

    #[serde(default)]
    pub operators: Vec<OperatorEntry>,
}

/// Validated configuration. Only constructed through
/// `ConfigFile::try_from(RawConfigFile)`.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub backup: BackupSection,
    pub commands: CommandsSection,
    pub dialog: DialogSection,
    pub operators: Vec<OperatorEntry>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(raw: RawConfigFile) -> Self {
        Self {
            backup: raw.backup,
            commands: raw.commands,
            dialog: raw.dialog,
            operators: raw.operators,
        }
    }
}

/// `[backup]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct BackupSection {
    /// Directory that receives one sub-directory per run. Must already exist.
    pub root_dir: PathBuf,

    /// Application data directory mirrored by the sync command.
    pub data_dir: PathBuf,

    /// Database name handed to the dump command.
    pub database: String,

    /// File name of the database dump inside the run directory.
    #[serde(default = "default_dump_file")]
    pub dump_file: String,

    /// Name of the data copy inside the run directory.
    #[serde(default = "default_data_dir_name")]
    pub data_dir_name: String,

    /// Cron expression. Parsed and reported by `/next`, never executed.
    #[serde(default)]
    pub schedule: Option<String>,

    /// Poll interval in seconds for the scheduler. Not acted on.
    #[serde(default)]
    pub update_interval: Option<u64>,
}

fn default_dump_file() -> String {
    "nextcloud-sqlbkp.bak".to_string()
}

fn default_data_dir_name() -> String {
    "nextcloud-dirbkp".to_string()
}

/// `[commands]` section: tokenized argv lists, never shell strings.
#[derive(Debug, Clone, Deserialize)]
pub struct CommandsSection {
    #[serde(default = "default_maintenance_on")]
    pub maintenance_on: Vec<String>,

    #[serde(default = "default_maintenance_off")]
    pub maintenance_off: Vec<String>,

    /// Dump argv; `--result-file=<path>` and the database name are appended.
    #[serde(default = "default_dump")]
    pub dump: Vec<String>,

    /// Sync argv; source and destination are appended.
    #[serde(default = "default_sync")]
    pub sync: Vec<String>,
}

fn occ(mode: &str) -> Vec<String> {
    [
        "sudo",
        "-u",
        "www-data",
        "/usr/bin/php",
        "/var/www/nextcloud/occ",
        "maintenance:mode",
        mode,
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_maintenance_on() -> Vec<String> {
    occ("--on")
}

fn default_maintenance_off() -> Vec<String> {
    occ("--off")
}

fn default_dump() -> Vec<String> {
    vec![
        "mysqldump".to_string(),
        "--defaults-extra-file=user.cnf".to_string(),
        "--single-transaction".to_string(),
    ]
}

fn default_sync() -> Vec<String> {
    vec![
        "rsync".to_string(),
        "-Aax".to_string(),
        "--info=progress2".to_string(),
    ]
}

impl Default for CommandsSection {
    fn default() -> Self {
        Self {
            maintenance_on: default_maintenance_on(),
            maintenance_off: default_maintenance_off(),
            dump: default_dump(),
            sync: default_sync(),
        }
    }
}

/// `[dialog]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct DialogSection {
    /// How long a confirmation dialog stays open, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    10
}

impl DialogSection {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for DialogSection {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// One `[[operators]]` entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct OperatorEntry {
    pub id: OperatorId,
    pub role: Role,
}

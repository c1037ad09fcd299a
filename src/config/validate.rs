// src/config/validate.rs

use std::collections::HashSet;
use std::path::{Component, Path};

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{BackupError, Result};
use crate::types::Role;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = BackupError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_backup_section(cfg)?;
    validate_commands(cfg)?;
    validate_dialog(cfg)?;
    validate_operators(cfg)?;
    Ok(())
}

fn validate_backup_section(cfg: &RawConfigFile) -> Result<()> {
    let backup = &cfg.backup;

    if !backup.root_dir.is_dir() {
        return Err(BackupError::ConfigError(format!(
            "[backup].root_dir '{}' does not exist or is not a directory",
            backup.root_dir.display()
        )));
    }

    if backup.database.trim().is_empty() {
        return Err(BackupError::ConfigError(
            "[backup].database must not be empty".to_string(),
        ));
    }

    ensure_single_component("dump_file", &backup.dump_file)?;
    ensure_single_component("data_dir_name", &backup.data_dir_name)?;

    Ok(())
}

/// Output names end up joined onto the run directory, so they must not be
/// able to escape it.
fn ensure_single_component(field: &str, value: &str) -> Result<()> {
    let mut components = Path::new(value).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(()),
        _ => Err(BackupError::ConfigError(format!(
            "[backup].{field} must be a plain file name (got '{value}')"
        ))),
    }
}

fn validate_commands(cfg: &RawConfigFile) -> Result<()> {
    let commands = [
        ("maintenance_on", &cfg.commands.maintenance_on),
        ("maintenance_off", &cfg.commands.maintenance_off),
        ("dump", &cfg.commands.dump),
        ("sync", &cfg.commands.sync),
    ];

    for (name, argv) in commands {
        match argv.first() {
            Some(program) if !program.trim().is_empty() => {}
            _ => {
                return Err(BackupError::ConfigError(format!(
                    "[commands].{name} must name a program"
                )));
            }
        }
    }

    Ok(())
}

fn validate_dialog(cfg: &RawConfigFile) -> Result<()> {
    if cfg.dialog.timeout_secs == 0 {
        return Err(BackupError::ConfigError(
            "[dialog].timeout_secs must be >= 1 (got 0)".to_string(),
        ));
    }
    Ok(())
}

fn validate_operators(cfg: &RawConfigFile) -> Result<()> {
    let mut seen = HashSet::new();

    for op in cfg.operators.iter() {
        if !seen.insert(op.id) {
            return Err(BackupError::ConfigError(format!(
                "operator id {} is listed more than once",
                op.id
            )));
        }
        if op.role == Role::Stranger {
            return Err(BackupError::ConfigError(format!(
                "operator {} cannot have role 'stranger'",
                op.id
            )));
        }
    }

    if !cfg.operators.iter().any(|op| op.role == Role::Owner) {
        return Err(BackupError::ConfigError(
            "at least one operator with role 'owner' is required".to_string(),
        ));
    }

    Ok(())
}

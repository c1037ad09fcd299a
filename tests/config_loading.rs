// tests/config_loading.rs

mod common;
use crate::common::builders::ConfigBuilder;

use std::io::Write;
use std::path::Path;

use tempfile::{NamedTempFile, tempdir};

use backup_bot::config::{ConfigFile, load_and_validate};
use backup_bot::errors::BackupError;
use backup_bot::types::Role;

fn write_config(root: &Path, extra: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
[backup]
root_dir = '{}'
data_dir = '/var/www/nextcloud/data'
database = 'nextcloud'
{extra}
"#,
        root.display()
    )
    .unwrap();
    file
}

fn expect_config_error(result: Result<ConfigFile, BackupError>, needle: &str) {
    match result {
        Err(BackupError::ConfigError(msg)) => {
            assert!(msg.contains(needle), "unexpected message: {msg}");
        }
        Err(e) => panic!("Expected ConfigError, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn minimal_config_gets_defaults() {
    let root = tempdir().unwrap();
    let file = write_config(
        root.path(),
        r#"
[[operators]]
id = 1001
role = "owner"

[[operators]]
id = 1002
role = "user"
"#,
    );

    let cfg = load_and_validate(file.path()).unwrap();

    assert_eq!(cfg.backup.root_dir, root.path());
    assert_eq!(cfg.backup.dump_file, "nextcloud-sqlbkp.bak");
    assert_eq!(cfg.backup.data_dir_name, "nextcloud-dirbkp");
    assert_eq!(cfg.commands.sync, vec!["rsync", "-Aax", "--info=progress2"]);
    assert_eq!(cfg.commands.maintenance_on.last().map(String::as_str), Some("--on"));
    assert_eq!(cfg.dialog.timeout_secs, 10);
    assert_eq!(cfg.operators.len(), 2);
    assert_eq!(cfg.operators[1].role, Role::User);
}

#[test]
fn explicit_sections_override_defaults() {
    let root = tempdir().unwrap();
    let file = write_config(
        root.path(),
        r#"
schedule = "0 3 * * *"

[commands]
maintenance_on = ["true"]
maintenance_off = ["true"]
dump = ["pg_dump"]
sync = ["cp", "-a"]

[dialog]
timeout_secs = 30

[[operators]]
id = 7
role = "owner"
"#,
    );

    let cfg = load_and_validate(file.path()).unwrap();

    assert_eq!(cfg.backup.schedule.as_deref(), Some("0 3 * * *"));
    assert_eq!(cfg.commands.dump, vec!["pg_dump"]);
    assert_eq!(cfg.dialog.timeout().as_secs(), 30);
}

#[test]
fn invalid_toml_is_a_toml_error() {
    let root = tempdir().unwrap();
    let file = write_config(root.path(), "[[operators]\nid = ");

    assert!(matches!(
        load_and_validate(file.path()),
        Err(BackupError::TomlError(_))
    ));
}

#[test]
fn unknown_role_is_rejected_at_parse_time() {
    let root = tempdir().unwrap();
    let file = write_config(
        root.path(),
        r#"
[[operators]]
id = 1
role = "superuser"
"#,
    );

    assert!(matches!(
        load_and_validate(file.path()),
        Err(BackupError::TomlError(_))
    ));
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempdir().unwrap();
    assert!(matches!(
        load_and_validate(dir.path().join("absent.toml")),
        Err(BackupError::IoError(_))
    ));
}

#[test]
fn missing_root_dir_is_rejected() {
    let root = tempdir().unwrap();
    let raw = ConfigBuilder::new(root.path().join("nope")).build_raw();
    expect_config_error(ConfigFile::try_from(raw), "root_dir");
}

#[test]
fn duplicate_operator_ids_are_rejected() {
    let root = tempdir().unwrap();
    let raw = ConfigBuilder::new(root.path())
        .operator(5, Role::User)
        .operator(5, Role::Admin)
        .build_raw();
    expect_config_error(ConfigFile::try_from(raw), "more than once");
}

#[test]
fn stranger_role_cannot_be_configured() {
    let root = tempdir().unwrap();
    let raw = ConfigBuilder::new(root.path())
        .operator(5, Role::Stranger)
        .build_raw();
    expect_config_error(ConfigFile::try_from(raw), "stranger");
}

#[test]
fn an_owner_is_required() {
    let root = tempdir().unwrap();
    let mut raw = ConfigBuilder::new(root.path()).build_raw();
    raw.operators.clear();
    expect_config_error(ConfigFile::try_from(raw), "owner");
}

#[test]
fn output_names_must_stay_inside_the_run_directory() {
    let root = tempdir().unwrap();

    let mut raw = ConfigBuilder::new(root.path()).build_raw();
    raw.backup.dump_file = "../escape.sql".to_string();
    expect_config_error(ConfigFile::try_from(raw), "dump_file");

    let mut raw = ConfigBuilder::new(root.path()).build_raw();
    raw.backup.data_dir_name = "/abs".to_string();
    expect_config_error(ConfigFile::try_from(raw), "data_dir_name");
}

#[test]
fn empty_commands_and_zero_timeout_are_rejected() {
    let root = tempdir().unwrap();

    let mut raw = ConfigBuilder::new(root.path()).build_raw();
    raw.commands.sync.clear();
    expect_config_error(ConfigFile::try_from(raw), "[commands].sync");

    let raw = ConfigBuilder::new(root.path()).timeout_secs(0).build_raw();
    expect_config_error(ConfigFile::try_from(raw), "timeout_secs");

    let mut raw = ConfigBuilder::new(root.path()).build_raw();
    raw.backup.database = "  ".to_string();
    expect_config_error(ConfigFile::try_from(raw), "database");
}

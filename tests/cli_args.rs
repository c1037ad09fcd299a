// tests/cli_args.rs

use std::io::Write;
use std::path::PathBuf;

use clap::Parser;
use tempfile::{NamedTempFile, tempdir};

use backup_bot::cli::{CliArgs, Command, LogLevel};
use backup_bot::config::default_config_path;
use backup_bot::logging::parse_level_str;

#[test]
fn subcommands_and_global_flags_parse() {
    let args = CliArgs::try_parse_from([
        "backup-bot",
        "run",
        "--config",
        "/etc/backup-bot.toml",
        "--log-level",
        "debug",
    ])
    .unwrap();

    assert!(matches!(args.command, Command::Run));
    assert_eq!(args.config, PathBuf::from("/etc/backup-bot.toml"));
    assert!(matches!(args.log_level, Some(LogLevel::Debug)));
    assert!(args.log_file.is_none());

    let args = CliArgs::try_parse_from(["backup-bot", "serve"]).unwrap();
    assert!(matches!(args.command, Command::Serve));
    assert_eq!(args.config, default_config_path());
    assert_eq!(args.config, PathBuf::from("backup-bot.toml"));
}

#[test]
fn a_subcommand_is_required() {
    assert!(CliArgs::try_parse_from(["backup-bot"]).is_err());
}

#[test]
fn env_level_names_parse() {
    assert_eq!(parse_level_str("WARNING"), Some(tracing::Level::WARN));
    assert_eq!(parse_level_str(" trace "), Some(tracing::Level::TRACE));
    assert_eq!(parse_level_str("loud"), None);
}

#[tokio::test]
async fn check_validates_without_running_anything() {
    let root = tempdir().unwrap();
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
[backup]
root_dir = '{}'
data_dir = '/srv/data'
database = 'app'

[[operators]]
id = 1
role = "owner"
"#,
        root.path().display()
    )
    .unwrap();

    let args = CliArgs {
        config: file.path().to_path_buf(),
        log_level: None,
        log_file: None,
        command: Command::Check,
    };

    backup_bot::run(args).await.unwrap();
    assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 0);
}

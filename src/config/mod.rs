// src/config/mod.rs

//! Configuration model, loading and validation.
//!
//! - [`model`] holds the serde types that mirror the TOML file.
//! - [`loader`] reads the file from disk.
//! - [`validate`] turns a `RawConfigFile` into a checked `ConfigFile`.

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path};
pub use model::{
    BackupSection, CommandsSection, ConfigFile, DialogSection, OperatorEntry, RawConfigFile,
};

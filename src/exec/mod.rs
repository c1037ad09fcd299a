// src/exec/mod.rs

//! External command execution layer.
//!
//! The orchestrator never builds shell strings. Every external tool is
//! described by a tokenized [`CommandSpec`] and run through a
//! [`CommandExecutor`]:
//!
//! - [`command`] holds the `CommandSpec` and `CommandOutput` value types.
//! - [`backend`] provides the `CommandExecutor` trait and the production
//!   [`ProcessExecutor`].
//! - [`process`] spawns the child with `tokio::process::Command` and captures
//!   its output, optionally streaming stdout segments as they arrive.

pub mod backend;
pub mod command;
pub mod process;

pub use backend::{CommandExecutor, ExecFuture, LineSink, ProcessExecutor};
pub use command::{CommandOutput, CommandSpec};

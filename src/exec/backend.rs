// src/exec/backend.rs

//! Pluggable executor abstraction.
//!
//! The orchestrator talks to a `CommandExecutor` instead of spawning
//! processes itself, so tests can swap in a scripted fake while production
//! uses [`ProcessExecutor`].

use std::future::Future;
use std::pin::Pin;

use super::command::{CommandOutput, CommandSpec};
use super::process::run_process;

/// Future returned by executor calls.
pub type ExecFuture<'a> = Pin<Box<dyn Future<Output = CommandOutput> + Send + 'a>>;

/// Callback receiving stdout segments (split on `\n` and `\r`).
pub type LineSink<'a> = &'a (dyn Fn(&str) + Send + Sync);

/// Trait abstracting how external commands are run.
///
/// Implementations never fail: a command that cannot be spawned is reported
/// as an unsuccessful [`CommandOutput`] carrying the reason in `stderr`.
/// There is no timeout; a hanging tool blocks the caller until it exits.
pub trait CommandExecutor: Send + Sync {
    /// Run `spec` to completion and capture its output.
    fn execute<'a>(&'a self, spec: &'a CommandSpec) -> ExecFuture<'a>;

    /// Run `spec`, additionally feeding stdout segments to `on_line`.
    ///
    /// The default implementation replays the captured stdout after the
    /// command exited. [`ProcessExecutor`] streams segments live.
    fn execute_streaming<'a>(
        &'a self,
        spec: &'a CommandSpec,
        on_line: LineSink<'a>,
    ) -> ExecFuture<'a> {
        Box::pin(async move {
            let output = self.execute(spec).await;
            output
                .stdout
                .split(['\n', '\r'])
                .filter(|segment| !segment.is_empty())
                .for_each(on_line);
            output
        })
    }
}

/// Production executor backed by `tokio::process`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessExecutor;

impl ProcessExecutor {
    pub fn new() -> Self {
        Self
    }
}

impl CommandExecutor for ProcessExecutor {
    fn execute<'a>(&'a self, spec: &'a CommandSpec) -> ExecFuture<'a> {
        Box::pin(run_process(spec, None))
    }

    fn execute_streaming<'a>(
        &'a self,
        spec: &'a CommandSpec,
        on_line: LineSink<'a>,
    ) -> ExecFuture<'a> {
        Box::pin(run_process(spec, Some(on_line)))
    }
}

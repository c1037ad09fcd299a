use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::Notify;

use backup_bot::exec::{CommandExecutor, CommandOutput, CommandSpec, ExecFuture};

/// A scripted executor that:
/// - records every command it was asked to run, in order
/// - answers with a canned [`CommandOutput`] per program (success by default)
/// - can park a program until the test releases it.
#[derive(Clone, Default)]
pub struct FakeExecutor {
    responses: Arc<Mutex<HashMap<String, CommandOutput>>>,
    holds: Arc<Mutex<HashMap<String, Arc<Notify>>>>,
    invoked: Arc<Mutex<Vec<CommandSpec>>>,
}

impl FakeExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer every invocation of `program` with `output`.
    pub fn respond(self, program: &str, output: CommandOutput) -> Self {
        self.responses
            .lock()
            .unwrap()
            .insert(program.to_string(), output);
        self
    }

    /// Make `program` fail with exit code 1 and the given stderr.
    pub fn fail(self, program: &str, stderr: &str) -> Self {
        self.respond(program, CommandOutput::failure(1, stderr))
    }

    /// Block `program` until `release` is notified.
    pub fn hold_until(self, program: &str, release: Arc<Notify>) -> Self {
        self.holds
            .lock()
            .unwrap()
            .insert(program.to_string(), release);
        self
    }

    /// Every command run so far.
    pub fn invoked(&self) -> Vec<CommandSpec> {
        self.invoked.lock().unwrap().clone()
    }

    /// Program names run so far, in order.
    pub fn programs(&self) -> Vec<String> {
        self.invoked()
            .into_iter()
            .map(|spec| spec.program)
            .collect()
    }
}

impl CommandExecutor for FakeExecutor {
    fn execute<'a>(&'a self, spec: &'a CommandSpec) -> ExecFuture<'a> {
        Box::pin(async move {
            self.invoked.lock().unwrap().push(spec.clone());

            let hold = self.holds.lock().unwrap().get(&spec.program).cloned();
            if let Some(release) = hold {
                release.notified().await;
            }

            self.responses
                .lock()
                .unwrap()
                .get(&spec.program)
                .cloned()
                .unwrap_or_else(|| CommandOutput::success(""))
        })
    }
}

// src/exec/process.rs

//! Child process runner.

use std::process::Stdio;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, error, info};

use super::backend::LineSink;
use super::command::{CommandOutput, CommandSpec};

/// Run one external command to completion.
///
/// Spawn and wait errors are logged and folded into an unsuccessful
/// `CommandOutput`; they are never returned to the caller.
pub async fn run_process(spec: &CommandSpec, on_line: Option<LineSink<'_>>) -> CommandOutput {
    match run_process_inner(spec, on_line).await {
        Ok(output) => output,
        Err(err) => {
            error!(program = %spec.program, error = %err, "external command could not be run");
            CommandOutput::not_run(format!("{err:#}"))
        }
    }
}

async fn run_process_inner(
    spec: &CommandSpec,
    on_line: Option<LineSink<'_>>,
) -> Result<CommandOutput> {
    info!(program = %spec.program, args = ?spec.args, "starting external command");

    let mut child = Command::new(&spec.program)
        .args(&spec.args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .with_context(|| format!("spawning '{}'", spec.program))?;

    let stdout = child.stdout.take().context("child stdout was not piped")?;
    let mut stderr = child.stderr.take().context("child stderr was not piped")?;

    // Drain both pipes concurrently so neither can fill up and stall the child.
    let mut stderr_buf = Vec::new();
    let (stdout_res, stderr_res) = tokio::join!(
        read_segments(stdout, &spec.program, on_line),
        stderr.read_to_end(&mut stderr_buf)
    );
    let stdout_buf = stdout_res.with_context(|| format!("reading stdout of '{}'", spec.program))?;
    stderr_res.with_context(|| format!("reading stderr of '{}'", spec.program))?;

    let status = child
        .wait()
        .await
        .with_context(|| format!("waiting for '{}'", spec.program))?;

    info!(
        program = %spec.program,
        exit_code = ?status.code(),
        success = status.success(),
        "external command exited"
    );

    Ok(CommandOutput {
        success: status.success(),
        exit_code: status.code(),
        stdout: String::from_utf8_lossy(&stdout_buf).into_owned(),
        stderr: String::from_utf8_lossy(&stderr_buf).into_owned(),
    })
}

/// Capture everything from `reader`, handing each `\n`/`\r` separated
/// segment to `on_line` as soon as it is complete.
async fn read_segments<R: AsyncRead + Unpin>(
    reader: R,
    program: &str,
    on_line: Option<LineSink<'_>>,
) -> std::io::Result<Vec<u8>> {
    let mut reader = BufReader::new(reader);
    let mut captured = Vec::new();
    let mut segment = Vec::new();

    loop {
        let buf = reader.fill_buf().await?;
        if buf.is_empty() {
            break;
        }
        let len = buf.len();

        for &byte in buf {
            if byte == b'\n' || byte == b'\r' {
                emit_segment(&segment, program, on_line);
                segment.clear();
            } else {
                segment.push(byte);
            }
        }

        captured.extend_from_slice(buf);
        reader.consume(len);
    }

    emit_segment(&segment, program, on_line);
    Ok(captured)
}

fn emit_segment(segment: &[u8], program: &str, on_line: Option<LineSink<'_>>) {
    if segment.is_empty() {
        return;
    }
    let text = String::from_utf8_lossy(segment);
    debug!(program = %program, "stdout: {}", text);
    if let Some(on_line) = on_line {
        on_line(&text);
    }
}

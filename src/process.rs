// ABOUTME: Subprocess management for the hashcat engine, covering one-shot commands and long-running sessions
// ABOUTME: Wraps tokio::process with timeouts, capped output, spawn/kill/wait for supervised runs
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 dravr.ai

use std::ffi::OsStr;
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::time::{Duration, Instant};

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, ChildStderr, ChildStdout, Command};
use tokio::time::timeout as tokio_timeout;
use tracing::{debug, info, warn};

use crate::sandbox::SandboxPolicy;
use crate::types::HashcatError;

/// Default maximum output size (10 MiB)
const DEFAULT_MAX_OUTPUT_BYTES: usize = 10 * 1024 * 1024;

/// Structured output from a one-shot command
#[derive(Debug, Clone)]
pub struct CliOutput {
    /// Captured standard output bytes
    pub stdout: Vec<u8>,
    /// Captured standard error bytes
    pub stderr: Vec<u8>,
    /// Process exit code (-1 if the process was killed by a signal)
    pub exit_code: i32,
    /// Wall-clock duration of the command
    pub duration: Duration,
}

impl CliOutput {
    /// Stdout decoded lossily as UTF-8
    #[must_use]
    pub fn stdout_text(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    /// Stderr decoded lossily as UTF-8
    #[must_use]
    pub fn stderr_text(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }
}

/// Read up to `limit` bytes from a child pipe, returning collected bytes
async fn read_capped<R: AsyncRead + Unpin>(stream: Option<R>, limit: usize) -> Vec<u8> {
    let mut buf = Vec::new();
    if let Some(mut reader) = stream {
        let mut tmp = [0u8; 8192];
        loop {
            match reader.read(&mut tmp).await {
                Ok(0) | Err(_) => break,
                Ok(n) => {
                    let remaining = limit.saturating_sub(buf.len());
                    buf.extend_from_slice(&tmp[..n.min(remaining)]);
                    if buf.len() >= limit {
                        break;
                    }
                }
            }
        }
    }
    buf
}

/// Run a one-shot command with timeout and output-size limits
///
/// If the command does not exit within `timeout`, it is killed and an
/// execution error is returned. Output is capped at `max_output_bytes`
/// (0 selects the 10 MiB default).
///
/// # Errors
///
/// Returns `HashcatError` if:
/// - The process cannot be spawned (`Launch`)
/// - The process exceeds the timeout (`Execution`)
pub async fn run_cli_command(
    cmd: &mut Command,
    timeout: Duration,
    max_output_bytes: usize,
) -> Result<CliOutput, HashcatError> {
    let effective_max = if max_output_bytes == 0 {
        DEFAULT_MAX_OUTPUT_BYTES
    } else {
        max_output_bytes
    };

    cmd.stdin(Stdio::null());
    cmd.stdout(Stdio::piped());
    cmd.stderr(Stdio::piped());
    cmd.kill_on_drop(true);

    let start = Instant::now();

    let mut child = cmd
        .spawn()
        .map_err(|e| HashcatError::launch(format!("Failed to spawn hashcat: {e}")))?;

    let stdout_task = tokio::spawn(read_capped(child.stdout.take(), effective_max));
    let stderr_task = tokio::spawn(read_capped(child.stderr.take(), effective_max));

    let wait_result = tokio_timeout(timeout, child.wait()).await;

    let duration = start.elapsed();

    match wait_result {
        Ok(Ok(status)) => {
            let exit_code = status.code().unwrap_or(-1);
            let stdout = stdout_task.await.unwrap_or_default();
            let stderr = stderr_task.await.unwrap_or_default();

            debug!(exit_code, ?duration, "hashcat command completed");

            Ok(CliOutput {
                stdout,
                stderr,
                exit_code,
                duration,
            })
        }
        Ok(Err(e)) => Err(HashcatError::internal(format!(
            "Failed to wait for hashcat process: {e}"
        ))),
        Err(_) => {
            warn!(?timeout, "hashcat command timed out, killing process");
            let _ = child.kill().await;
            Err(HashcatError::execution(
                "command",
                format!("timed out after {timeout:?}"),
            ))
        }
    }
}

// ============================================================================
// Long-running engine process
// ============================================================================

/// A spawned engine with its output pipes detached for concurrent readers
pub struct EngineProcess {
    /// Handle used to wait for or kill the process
    pub handle: EngineHandle,
    /// Primary (status JSON) output stream
    pub stdout: ChildStdout,
    /// Diagnostic output stream
    pub stderr: ChildStderr,
}

/// Ownership of a running engine process
#[derive(Debug)]
pub struct EngineHandle {
    child: Child,
    exited: Option<ExitStatus>,
}

/// Spawn the engine with piped stdout/stderr
///
/// The child is killed if the handle is dropped while it is still running.
/// Both pipes must be drained by the caller.
///
/// # Errors
///
/// Returns a launch error if the binary cannot be spawned or a pipe
/// cannot be captured.
pub fn spawn_engine<I, S>(
    binary: &Path,
    args: I,
    policy: Option<&SandboxPolicy>,
) -> Result<EngineProcess, HashcatError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let mut cmd = Command::new(binary);
    cmd.args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    if let Some(policy) = policy {
        policy.apply(&mut cmd);
    }

    let mut child = cmd.spawn().map_err(|e| {
        HashcatError::launch(format!("Failed to start {}: {e}", binary.display()))
    })?;

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| HashcatError::launch("Failed to capture hashcat stdout"))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| HashcatError::launch("Failed to capture hashcat stderr"))?;

    info!(pid = child.id(), binary = %binary.display(), "Spawned hashcat");

    Ok(EngineProcess {
        handle: EngineHandle {
            child,
            exited: None,
        },
        stdout,
        stderr,
    })
}

impl EngineHandle {
    /// OS process id, `None` once the process has been reaped
    #[must_use]
    pub fn id(&self) -> Option<u32> {
        self.child.id()
    }

    /// Wait for the process to exit
    ///
    /// # Errors
    ///
    /// Returns an internal error if waiting fails at the OS level.
    pub async fn wait(&mut self) -> Result<ExitStatus, HashcatError> {
        if let Some(status) = self.exited {
            return Ok(status);
        }
        let status = self
            .child
            .wait()
            .await
            .map_err(|e| HashcatError::internal(format!("Failed to wait for hashcat: {e}")))?;
        self.exited = Some(status);
        Ok(status)
    }

    /// Kill the process and reap it
    ///
    /// # Errors
    ///
    /// Returns `ProcessNotRunning` if the process had already exited, or an
    /// internal error if the signal could not be delivered.
    pub async fn kill(&mut self) -> Result<(), HashcatError> {
        if self.exited.is_some() {
            return Err(HashcatError::process_not_running("hashcat already exited"));
        }
        match self.child.try_wait() {
            Ok(Some(status)) => {
                self.exited = Some(status);
                return Err(HashcatError::process_not_running(format!(
                    "hashcat already exited with {status}"
                )));
            }
            Ok(None) => {}
            Err(e) => {
                return Err(HashcatError::internal(format!(
                    "Failed to query hashcat status: {e}"
                )));
            }
        }

        self.child
            .kill()
            .await
            .map_err(|e| HashcatError::internal(format!("Failed to kill hashcat: {e}")))?;
        self.exited = self.child.try_wait().ok().flatten();
        debug!("Killed hashcat process");
        Ok(())
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::types::ErrorKind;

    #[tokio::test]
    async fn test_one_shot_captures_stdout_and_exit_code() {
        let mut cmd = Command::new("sh");
        cmd.args(["-c", "echo hello; echo oops >&2; exit 3"]);
        let output = run_cli_command(&mut cmd, Duration::from_secs(5), 0)
            .await
            .unwrap();
        assert_eq!(output.stdout_text().trim(), "hello");
        assert_eq!(output.stderr_text().trim(), "oops");
        assert_eq!(output.exit_code, 3);
    }

    #[tokio::test]
    async fn test_one_shot_caps_output() {
        let mut cmd = Command::new("sh");
        cmd.args(["-c", "printf 'abcdefghij'"]);
        let output = run_cli_command(&mut cmd, Duration::from_secs(5), 4)
            .await
            .unwrap();
        assert_eq!(output.stdout, b"abcd");
    }

    #[tokio::test]
    async fn test_one_shot_times_out() {
        let mut cmd = Command::new("sleep");
        cmd.arg("5");
        let err = run_cli_command(&mut cmd, Duration::from_millis(100), 0)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Execution);
    }

    #[tokio::test]
    async fn test_spawn_missing_binary_is_launch_error() {
        let result = spawn_engine(Path::new("/nonexistent/hashcat"), ["--version"], None);
        assert_eq!(result.err().map(|e| e.kind), Some(ErrorKind::Launch));
    }

    #[tokio::test]
    async fn test_kill_after_exit_reports_not_running() {
        let mut engine = spawn_engine(Path::new("true"), Vec::<String>::new(), None).unwrap();
        engine.handle.wait().await.unwrap();
        let err = engine.handle.kill().await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::ProcessNotRunning);
    }

    #[tokio::test]
    async fn test_kill_running_process() {
        let mut engine = spawn_engine(Path::new("sleep"), ["30"], None).unwrap();
        engine.handle.kill().await.unwrap();
        let status = engine.handle.wait().await.unwrap();
        assert!(!status.success());
    }
}

//! Shared subprocess management.
//!
//! Provides [`run_command`], which spawns a configured
//! [`tokio::process::Command`], captures stdout/stderr, and applies the
//! optional timeout.

use std::process::Stdio;
use std::time::Instant;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;

use super::executor::{ScriptError, ScriptInput, ScriptOutput};

/// Maximum stdout or stderr size captured per stream (10 MiB).
///
/// Output exceeding this limit is truncated to prevent memory exhaustion
/// from extremely verbose programs.
const MAX_OUTPUT_BYTES: usize = 10 * 1024 * 1024;

/// Spawn `cmd`, wait for it, and capture its output.
///
/// The caller sets program and arguments; `input` supplies the working
/// directory and timeout. A non-zero exit is returned as `Ok` with the
/// exit code set; use [`ScriptOutput::into_success`] to treat it as an
/// error.
pub async fn run_command(
    cmd: &mut Command,
    input: ScriptInput,
) -> Result<ScriptOutput, ScriptError> {
    // `kill_on_drop(true)` ensures the child is killed when dropped (e.g. on timeout).
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    if let Some(dir) = &input.working_directory {
        cmd.current_dir(dir);
    }

    let program = cmd.as_std().get_program().to_string_lossy().into_owned();
    let start = Instant::now();

    let mut child = cmd
        .spawn()
        .map_err(|source| ScriptError::Spawn { program, source })?;

    // Read stdout/stderr in spawned tasks so we can still call
    // `child.wait()` (which borrows `&mut child`).
    let stdout_handle = child.stdout.take();
    let stderr_handle = child.stderr.take();

    let stdout_task = tokio::spawn(async move { read_stream(stdout_handle).await });
    let stderr_task = tokio::spawn(async move { read_stream(stderr_handle).await });

    let status = match input.timeout {
        Some(limit) => match tokio::time::timeout(limit, child.wait()).await {
            Ok(result) => result.map_err(ScriptError::IoError)?,
            Err(_elapsed) => {
                // `child` is dropped on return, which kills the process.
                return Err(ScriptError::Timeout {
                    elapsed_ms: start.elapsed().as_millis() as u64,
                });
            }
        },
        None => child.wait().await.map_err(ScriptError::IoError)?,
    };

    let duration_ms = start.elapsed().as_millis() as u64;
    let stdout_bytes = stdout_task.await.unwrap_or_default();
    let stderr_bytes = stderr_task.await.unwrap_or_default();

    Ok(ScriptOutput {
        stdout: String::from_utf8_lossy(&stdout_bytes).into_owned(),
        stderr: String::from_utf8_lossy(&stderr_bytes).into_owned(),
        exit_code: status.code().unwrap_or(-1),
        duration_ms,
    })
}

/// Read an entire output stream into a byte buffer, capped at [`MAX_OUTPUT_BYTES`].
async fn read_stream<R: AsyncRead + Unpin>(handle: Option<R>) -> Vec<u8> {
    let mut buf = Vec::new();
    if let Some(mut h) = handle {
        let _ = (&mut h)
            .take(MAX_OUTPUT_BYTES as u64)
            .read_to_end(&mut buf)
            .await;
    }
    buf
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::scripting::command::CommandLine;
    use crate::scripting::test_helpers::bash_script;

    #[tokio::test]
    async fn captures_stdout_and_args() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut cmd =
            bash_script(dir.path(), "echo.sh", "echo \"$1-$2\"\n").to_command(["-a", "15"]);

        let out = run_command(&mut cmd, ScriptInput::default())
            .await
            .expect("run");
        assert_eq!(out.exit_code, 0);
        assert_eq!(out.stdout.trim(), "-a-15");
    }

    #[tokio::test]
    async fn nonzero_exit_is_reported_not_raised() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut cmd = bash_script(dir.path(), "fail.sh", "echo oops >&2\nexit 7\n")
            .to_command(Vec::<String>::new());

        let out = run_command(&mut cmd, ScriptInput::default())
            .await
            .expect("run");
        assert_eq!(out.exit_code, 7);
        assert_eq!(out.stderr.trim(), "oops");
    }

    #[tokio::test]
    async fn missing_program_is_spawn_error() {
        let mut cmd = CommandLine::new("/nonexistent/rotate_camera").to_command(["-a", "0"]);
        let result = run_command(&mut cmd, ScriptInput::default()).await;
        assert!(matches!(result, Err(ScriptError::Spawn { .. })));
    }

    #[tokio::test]
    async fn timeout_kills_slow_program() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut cmd =
            bash_script(dir.path(), "slow.sh", "sleep 60\n").to_command(Vec::<String>::new());
        let input = ScriptInput {
            working_directory: None,
            timeout: Some(Duration::from_millis(200)),
        };

        let result = run_command(&mut cmd, input).await;
        assert!(matches!(result, Err(ScriptError::Timeout { .. })));
    }

    #[tokio::test]
    async fn runs_in_working_directory() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut cmd =
            bash_script(dir.path(), "pwd.sh", "pwd\n").to_command(Vec::<String>::new());
        let input = ScriptInput {
            working_directory: Some(dir.path().to_path_buf()),
            timeout: None,
        };

        let out = run_command(&mut cmd, input).await.expect("run");
        let expected = dir.path().canonicalize().expect("canonicalize");
        assert_eq!(out.stdout.trim(), expected.to_string_lossy());
    }
}

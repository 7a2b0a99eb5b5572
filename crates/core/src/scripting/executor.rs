//! Shared types for running an external program to completion.
//!
//! Defines [`ScriptInput`], [`ScriptOutput`], and [`ScriptError`].

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;

/// Run-time options for one invocation.
#[derive(Debug, Clone, Default)]
pub struct ScriptInput {
    /// Working directory for the child process (uses current dir if `None`).
    pub working_directory: Option<PathBuf>,
    /// Maximum wall-clock time before the process is killed. `None` waits
    /// for as long as the program runs.
    pub timeout: Option<Duration>,
}

/// Captured output from a finished program.
#[derive(Debug, Clone, Serialize)]
pub struct ScriptOutput {
    /// Complete stdout captured from the process.
    pub stdout: String,
    /// Complete stderr captured from the process.
    pub stderr: String,
    /// Process exit code (`-1` if killed by signal).
    pub exit_code: i32,
    /// Wall-clock duration in milliseconds.
    pub duration_ms: u64,
}

impl ScriptOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Convert a non-zero exit into [`ScriptError::ExecutionFailed`].
    pub fn into_success(self) -> Result<Self, ScriptError> {
        if self.success() {
            Ok(self)
        } else {
            Err(ScriptError::ExecutionFailed {
                exit_code: self.exit_code,
                stderr: self.stderr.trim().to_string(),
            })
        }
    }

    /// Stdout followed by stderr, the way a terminal would interleave them
    /// for a program that writes diagnostics last.
    pub fn combined(&self) -> String {
        let mut out = self.stdout.clone();
        if !self.stderr.is_empty() {
            if !out.is_empty() && !out.ends_with('\n') {
                out.push('\n');
            }
            out.push_str(&self.stderr);
        }
        out
    }
}

/// Errors that can occur while running a program.
#[derive(Debug)]
pub enum ScriptError {
    /// The program could not be started.
    Spawn {
        /// Program as configured.
        program: String,
        /// Underlying OS error.
        source: std::io::Error,
    },
    /// The program exceeded its configured timeout and was killed.
    Timeout {
        /// Elapsed wall-clock time before the process was killed.
        elapsed_ms: u64,
    },
    /// The program ran but exited with a non-zero exit code.
    ExecutionFailed {
        /// Process exit code.
        exit_code: i32,
        /// Captured stderr output.
        stderr: String,
    },
    /// An I/O error occurred while waiting on the process.
    IoError(std::io::Error),
}

impl fmt::Display for ScriptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Spawn { program, source } => write!(f, "Failed to start {program}: {source}"),
            Self::Timeout { elapsed_ms } => {
                write!(f, "Program timed out after {elapsed_ms}ms")
            }
            Self::ExecutionFailed { exit_code, stderr } if stderr.is_empty() => {
                write!(f, "Program failed with exit code {exit_code}")
            }
            Self::ExecutionFailed { exit_code, stderr } => {
                write!(f, "Program failed with exit code {exit_code}: {stderr}")
            }
            Self::IoError(err) => write!(f, "I/O error: {err}"),
        }
    }
}

impl std::error::Error for ScriptError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Spawn { source, .. } => Some(source),
            Self::IoError(err) => Some(err),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

//! One-shot stereo calibration jobs.
//!
//! Both jobs are external scripts run to completion; their combined output
//! is returned to the caller. Jobs share the cameras, so only one runs at a
//! time.

use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::Mutex;

use crate::error::{CoreError, CoreResult};
use crate::scripting::command::CommandLine;
use crate::scripting::executor::{ScriptError, ScriptInput};
use crate::scripting::subprocess;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CalibrationJob {
    /// Photograph the calibration target with both cameras.
    CaptureImages,
    /// Compute stereo parameters from the captured images.
    Calibrate,
}

impl CalibrationJob {
    pub fn label(self) -> &'static str {
        match self {
            Self::CaptureImages => "Calibration image capture",
            Self::Calibrate => "Stereo calibration",
        }
    }
}

/// Outcome of a job that exited 0.
#[derive(Debug, Clone, Serialize)]
pub struct JobReport {
    pub job: CalibrationJob,
    pub duration_ms: u64,
    /// Stdout then stderr.
    pub output: String,
}

pub struct CalibrationRunner {
    capture: CommandLine,
    calibrate: CommandLine,
    working_directory: Option<PathBuf>,
    timeout: Option<Duration>,
    running: Mutex<()>,
}

impl CalibrationRunner {
    pub fn new(capture: CommandLine, calibrate: CommandLine) -> Self {
        Self {
            capture,
            calibrate,
            working_directory: None,
            timeout: None,
            running: Mutex::new(()),
        }
    }

    pub fn with_working_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_directory = Some(dir.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    fn command_for(&self, job: CalibrationJob) -> &CommandLine {
        match job {
            CalibrationJob::CaptureImages => &self.capture,
            CalibrationJob::Calibrate => &self.calibrate,
        }
    }

    /// Run `job` to completion. A non-zero exit is a [`CoreError::Job`]
    /// carrying the program's output.
    pub async fn run(&self, job: CalibrationJob) -> CoreResult<JobReport> {
        let _guard = self.running.lock().await;
        let command = self.command_for(job);
        let mut cmd = command.to_command(std::iter::empty::<&str>());

        tracing::info!(job = job.label(), command = %command, "Starting calibration job");
        let output = subprocess::run_command(
            &mut cmd,
            ScriptInput {
                working_directory: self.working_directory.clone(),
                timeout: self.timeout,
            },
        )
        .await
        .map_err(|e| job_error(job, &e))?;

        if !output.success() {
            tracing::warn!(
                job = job.label(),
                exit_code = output.exit_code,
                "Calibration job failed",
            );
            let combined = output.combined();
            return Err(CoreError::Job {
                job: job.label(),
                reason: format!("exit code {}\n{}", output.exit_code, combined.trim_end()),
            });
        }

        tracing::info!(
            job = job.label(),
            duration_ms = output.duration_ms,
            "Calibration job finished",
        );
        Ok(JobReport {
            job,
            duration_ms: output.duration_ms,
            output: output.combined(),
        })
    }
}

fn job_error(job: CalibrationJob, err: &ScriptError) -> CoreError {
    tracing::error!(job = job.label(), error = %err, "Calibration job could not run");
    CoreError::Job {
        job: job.label(),
        reason: err.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

//! External actuation and capture steps.
//!
//! Both are opaque programs. [`ScriptActuator`] runs the servo rotation
//! executable; [`ScriptCapture`] runs the still-capture script. The traits
//! let the state machine run against fakes in tests.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;

use super::model::CameraId;
use crate::scripting::command::CommandLine;
use crate::scripting::executor::{ScriptError, ScriptInput};
use crate::scripting::subprocess;
use crate::types::Degrees;

/// Moves one pan servo to an absolute angle.
#[async_trait]
pub trait PanActuator: Send + Sync {
    async fn rotate(&self, angle: Degrees, pin: u8) -> Result<(), ScriptError>;
}

/// Takes a confirmation picture and reports where `camera`'s image landed.
#[async_trait]
pub trait FrameCapture: Send + Sync {
    async fn capture(&self, camera: CameraId) -> Result<PathBuf, ScriptError>;
}

/// Runs `<program> -a <angle> -p <pin>`; exit 0 means the servo reached
/// the angle.
#[derive(Debug, Clone)]
pub struct ScriptActuator {
    program: CommandLine,
    timeout: Option<Duration>,
}

impl ScriptActuator {
    pub fn new(program: CommandLine, timeout: Option<Duration>) -> Self {
        Self { program, timeout }
    }
}

#[async_trait]
impl PanActuator for ScriptActuator {
    async fn rotate(&self, angle: Degrees, pin: u8) -> Result<(), ScriptError> {
        let angle_arg = angle.to_string();
        let pin_arg = pin.to_string();
        let mut cmd = self
            .program
            .to_command(["-a", angle_arg.as_str(), "-p", pin_arg.as_str()]);

        tracing::debug!(program = %self.program, angle, pin, "Waiting for camera rotation");
        let output = subprocess::run_command(
            &mut cmd,
            ScriptInput {
                working_directory: None,
                timeout: self.timeout,
            },
        )
        .await?
        .into_success()?;

        tracing::debug!(
            angle,
            pin,
            duration_ms = output.duration_ms,
            stdout = %output.stdout.trim(),
            "Rotation program finished",
        );
        Ok(())
    }
}

/// Runs `<command> -o <dir> -f <file>`. The script photographs both
/// cameras, writing `<dir>/cam1/<file>` and `<dir>/cam2/<file>`.
#[derive(Debug, Clone)]
pub struct ScriptCapture {
    command: CommandLine,
    output_dir: PathBuf,
    file_name: String,
    timeout: Option<Duration>,
}

impl ScriptCapture {
    pub fn new(
        command: CommandLine,
        output_dir: impl Into<PathBuf>,
        file_name: impl Into<String>,
        timeout: Option<Duration>,
    ) -> Self {
        Self {
            command,
            output_dir: output_dir.into(),
            file_name: file_name.into(),
            timeout,
        }
    }

    /// Where the capture script leaves `camera`'s picture.
    pub fn image_path(&self, camera: CameraId) -> PathBuf {
        self.output_dir
            .join(camera.dir_name())
            .join(&self.file_name)
    }
}

#[async_trait]
impl FrameCapture for ScriptCapture {
    async fn capture(&self, camera: CameraId) -> Result<PathBuf, ScriptError> {
        let output_dir = self.output_dir.to_string_lossy().into_owned();
        let mut cmd = self
            .command
            .to_command(["-o", output_dir.as_str(), "-f", self.file_name.as_str()]);

        tracing::debug!(command = %self.command, camera = camera.number(), "Taking picture");
        let output = subprocess::run_command(
            &mut cmd,
            ScriptInput {
                working_directory: None,
                timeout: self.timeout,
            },
        )
        .await?
        .into_success()?;

        tracing::debug!(
            camera = camera.number(),
            duration_ms = output.duration_ms,
            "Picture taken",
        );
        Ok(self.image_path(camera))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

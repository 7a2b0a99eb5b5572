use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use axum::http::HeaderValue;
use panrig_core::scripting::command::CommandLine;

/// Invalid startup configuration. Fatal: the server does not start.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} has invalid value {value:?}: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },

    #[error("{var} must not be empty")]
    Empty { var: &'static str },
}

/// Server configuration loaded from environment variables.
///
/// All fields have defaults matching the rig's on-device layout.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `4000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `120`). Camera moves that
    /// outlive it still run to completion.
    pub request_timeout_secs: u64,
    /// Persisted servo positions.
    pub servo_config_path: PathBuf,
    /// Rotation executable, called as `<program> -a <angle> -p <pin>`.
    pub actuator_program: CommandLine,
    /// Still-capture command, called as `<command> -o <dir> -f <file>`.
    pub capture_command: CommandLine,
    pub rotation_image_dir: PathBuf,
    pub rotation_image_file: String,
    /// Per-step limit for actuation and capture. `None` waits indefinitely.
    pub step_timeout_secs: Option<u64>,
    /// JSON service catalog. `None` uses the built-in `test1`/`test2`.
    pub services_file: Option<PathBuf>,
    pub calibration_capture_command: CommandLine,
    pub calibration_command: CommandLine,
    /// Limit for each calibration job. `None` waits indefinitely.
    pub calibration_timeout_secs: Option<u64>,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                       | Default                                |
    /// |-------------------------------|----------------------------------------|
    /// | `HOST`                        | `0.0.0.0`                              |
    /// | `PORT`                        | `4000`                                 |
    /// | `CORS_ORIGINS`                | `http://localhost:5173`                |
    /// | `REQUEST_TIMEOUT_SECS`        | `120`                                  |
    /// | `SERVO_CONFIG_PATH`           | `servo_config.json`                    |
    /// | `ACTUATOR_PROGRAM`            | `./rotate_camera`                      |
    /// | `CAPTURE_COMMAND`             | `python ../picam/take_picture.py`      |
    /// | `ROTATION_IMAGE_DIR`          | `../Server/rotation_images`            |
    /// | `ROTATION_IMAGE_FILE`         | `rotation.jpeg`                        |
    /// | `STEP_TIMEOUT_SECS`           | unset                                  |
    /// | `SERVICES_FILE`               | unset                                  |
    /// | `CALIBRATION_CAPTURE_COMMAND` | `python capture_calibration_images.py` |
    /// | `CALIBRATION_COMMAND`         | `python stereo_calibration.py`         |
    /// | `CALIBRATION_TIMEOUT_SECS`    | unset                                  |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an explicit variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &'static str, default: &str| -> String {
            lookup(key).unwrap_or_else(|| default.to_string())
        };
        let optional = |key: &'static str| -> Option<String> {
            lookup(key).filter(|v| !v.trim().is_empty())
        };

        let host = var("HOST", "0.0.0.0");
        let port = parse_number("PORT", &var("PORT", "4000"))?;

        let cors_origins: Vec<String> = var("CORS_ORIGINS", "http://localhost:5173")
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        for origin in &cors_origins {
            HeaderValue::from_str(origin).map_err(|e| ConfigError::Invalid {
                var: "CORS_ORIGINS",
                value: origin.clone(),
                reason: e.to_string(),
            })?;
        }

        let request_timeout_secs =
            parse_number("REQUEST_TIMEOUT_SECS", &var("REQUEST_TIMEOUT_SECS", "120"))?;

        let step_timeout_secs = optional("STEP_TIMEOUT_SECS")
            .map(|raw| parse_number("STEP_TIMEOUT_SECS", &raw))
            .transpose()?;
        let calibration_timeout_secs = optional("CALIBRATION_TIMEOUT_SECS")
            .map(|raw| parse_number("CALIBRATION_TIMEOUT_SECS", &raw))
            .transpose()?;

        let rotation_image_file = var("ROTATION_IMAGE_FILE", "rotation.jpeg");
        if rotation_image_file.trim().is_empty() {
            return Err(ConfigError::Empty {
                var: "ROTATION_IMAGE_FILE",
            });
        }

        Ok(Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            servo_config_path: var("SERVO_CONFIG_PATH", "servo_config.json").into(),
            actuator_program: parse_command(
                "ACTUATOR_PROGRAM",
                &var("ACTUATOR_PROGRAM", "./rotate_camera"),
            )?,
            capture_command: parse_command(
                "CAPTURE_COMMAND",
                &var("CAPTURE_COMMAND", "python ../picam/take_picture.py"),
            )?,
            rotation_image_dir: var("ROTATION_IMAGE_DIR", "../Server/rotation_images").into(),
            rotation_image_file,
            step_timeout_secs,
            services_file: optional("SERVICES_FILE").map(PathBuf::from),
            calibration_capture_command: parse_command(
                "CALIBRATION_CAPTURE_COMMAND",
                &var(
                    "CALIBRATION_CAPTURE_COMMAND",
                    "python capture_calibration_images.py",
                ),
            )?,
            calibration_command: parse_command(
                "CALIBRATION_COMMAND",
                &var("CALIBRATION_COMMAND", "python stereo_calibration.py"),
            )?,
            calibration_timeout_secs,
        })
    }

    pub fn step_timeout(&self) -> Option<Duration> {
        self.step_timeout_secs.map(Duration::from_secs)
    }

    pub fn calibration_timeout(&self) -> Option<Duration> {
        self.calibration_timeout_secs.map(Duration::from_secs)
    }
}

fn parse_number<T>(var: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
        var,
        value: raw.to_string(),
        reason: e.to_string(),
    })
}

fn parse_command(var: &'static str, raw: &str) -> Result<CommandLine, ConfigError> {
    CommandLine::parse(raw).ok_or(ConfigError::Empty { var })
}

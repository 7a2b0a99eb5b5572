use std::sync::Arc;

use panrig_core::calibration::CalibrationRunner;
use panrig_core::error::CoreResult;
use panrig_core::position::{JsonFileStore, PositionSupervisor, ScriptActuator, ScriptCapture};
use panrig_core::registry::ProcessRegistry;
use panrig_core::services::ServiceCatalog;
use panrig_core::types::Timestamp;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Running background services.
    pub registry: Arc<ProcessRegistry>,
    /// Camera pan state machine.
    pub positions: Arc<PositionSupervisor>,
    /// Launchable services.
    pub catalog: Arc<ServiceCatalog>,
    pub calibration: Arc<CalibrationRunner>,
    pub started_at: Timestamp,
}

impl AppState {
    /// Wire the script-backed collaborators described by `config`.
    ///
    /// Fails only if a configured service catalog cannot be loaded.
    pub fn from_config(config: ServerConfig) -> CoreResult<Self> {
        let catalog = match &config.services_file {
            Some(path) => ServiceCatalog::from_file(path)?,
            None => ServiceCatalog::default(),
        };
        tracing::info!(
            services = ?catalog.names().collect::<Vec<_>>(),
            "Service catalog loaded"
        );

        let step_timeout = config.step_timeout();
        let positions = PositionSupervisor::new(
            Arc::new(JsonFileStore::new(&config.servo_config_path)),
            Arc::new(ScriptActuator::new(
                config.actuator_program.clone(),
                step_timeout,
            )),
            Arc::new(ScriptCapture::new(
                config.capture_command.clone(),
                &config.rotation_image_dir,
                config.rotation_image_file.clone(),
                step_timeout,
            )),
        );

        let calibration = CalibrationRunner::new(
            config.calibration_capture_command.clone(),
            config.calibration_command.clone(),
        )
        .with_timeout(config.calibration_timeout());

        Ok(Self {
            config: Arc::new(config),
            registry: Arc::new(ProcessRegistry::new()),
            positions: Arc::new(positions),
            catalog: Arc::new(catalog),
            calibration: Arc::new(calibration),
            started_at: chrono::Utc::now(),
        })
    }
}

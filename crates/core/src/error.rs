use crate::types::CameraNumber;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Not found: {entity} '{key}'")]
    NotFound { entity: &'static str, key: String },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Service '{name}' already running, cannot restart: {reason}")]
    Supervision { name: String, reason: String },

    #[error("Failed to launch service '{name}': {reason}")]
    Launch { name: String, reason: String },

    #[error("Actuation failed for camera {camera}: {reason}")]
    Actuation { camera: CameraNumber, reason: String },

    #[error("Capture failed for camera {camera}: {reason}")]
    Capture { camera: CameraNumber, reason: String },

    #[error("{job} failed: {reason}")]
    Job { job: &'static str, reason: String },

    #[error("Persistence failed: {0}")]
    Persistence(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type CoreResult<T> = Result<T, CoreError>;

//! Persistence of [`ServoConfig`].

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use super::model::ServoConfig;
use crate::error::{CoreError, CoreResult};

/// Load/save access to the persisted servo state.
///
/// All failures surface as [`CoreError::Persistence`].
#[async_trait]
pub trait PositionStore: Send + Sync {
    async fn load(&self) -> CoreResult<ServoConfig>;
    async fn save(&self, config: &ServoConfig) -> CoreResult<()>;
}

/// `ServoConfig` stored as a single JSON file.
///
/// Writes go to a sibling temp file that is renamed over the target, so a
/// crash mid-write leaves either the old or the new record, never a torn
/// one.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "servo_config.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl PositionStore for JsonFileStore {
    async fn load(&self) -> CoreResult<ServoConfig> {
        let raw = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            CoreError::Persistence(format!("unable to read {}: {e}", self.path.display()))
        })?;
        let config: ServoConfig = serde_json::from_str(&raw).map_err(|e| {
            CoreError::Persistence(format!("malformed {}: {e}", self.path.display()))
        })?;
        config.check_limits()?;
        Ok(config)
    }

    async fn save(&self, config: &ServoConfig) -> CoreResult<()> {
        config.check_limits()?;

        let mut bytes = serde_json::to_vec_pretty(config)
            .map_err(|e| CoreError::Persistence(format!("unable to encode positions: {e}")))?;
        bytes.push(b'\n');

        let temp = self.temp_path();
        let write_err =
            |e: std::io::Error| CoreError::Persistence(format!("failed to save position: {e}"));

        let mut file = tokio::fs::File::create(&temp).await.map_err(write_err)?;
        file.write_all(&bytes).await.map_err(write_err)?;
        file.sync_all().await.map_err(write_err)?;
        drop(file);

        if let Err(e) = tokio::fs::rename(&temp, &self.path).await {
            let _ = tokio::fs::remove_file(&temp).await;
            return Err(write_err(e));
        }

        tracing::debug!(
            path = %self.path.display(),
            cam1 = config.cam1.current_position,
            cam2 = config.cam2.current_position,
            "Servo positions saved",
        );
        Ok(())
    }
}


// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

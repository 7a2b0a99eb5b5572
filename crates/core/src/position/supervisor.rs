//! Move/reset state machine.
//!
//! ```text
//! Idle -> Validating -> Actuating -> Capturing -> Persisting -> Idle
//!             |             |            |             |
//!             +-------------+------------+-------------+--> Failed
//! ```
//!
//! Every request holds one supervisor-wide lock from load to save, so
//! concurrent requests queue instead of clobbering each other's writes to
//! the shared [`ServoConfig`].

use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Mutex;

use super::hardware::{FrameCapture, PanActuator};
use super::model::{CameraId, Direction, PanCommand, ServoConfig};
use super::store::PositionStore;
use crate::error::{CoreError, CoreResult};
use crate::types::Degrees;

/// Where a request is in the move sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionPhase {
    Idle,
    Validating,
    Actuating,
    Capturing,
    Persisting,
    Failed,
}

impl PositionPhase {
    /// Whether `next` is a legal successor of `self`.
    pub fn can_advance_to(self, next: PositionPhase) -> bool {
        use PositionPhase::*;
        matches!(
            (self, next),
            (Idle, Validating)
                | (Validating, Actuating)
                | (Actuating, Capturing)
                | (Capturing, Persisting)
                | (Persisting, Idle)
                | (Validating | Actuating | Capturing | Persisting, Failed)
        )
    }
}

/// Image the capture step produced for the moved camera.
#[derive(Debug, Clone)]
pub struct CapturedImage {
    pub camera: CameraId,
    pub path: PathBuf,
    pub bytes: Vec<u8>,
}

/// Result of a completed move or reset.
#[derive(Debug, Clone)]
pub struct MoveOutcome {
    pub camera: CameraId,
    pub previous_position: Degrees,
    pub position: Degrees,
    pub image: CapturedImage,
}

/// Tracks one request through [`PositionPhase`]s, logging each transition.
struct PanRun {
    camera: CameraId,
    phase: PositionPhase,
}

impl PanRun {
    fn start(camera: CameraId) -> Self {
        Self {
            camera,
            phase: PositionPhase::Idle,
        }
    }

    fn advance(&mut self, next: PositionPhase) {
        debug_assert!(
            self.phase.can_advance_to(next),
            "illegal transition {:?} -> {next:?}",
            self.phase
        );
        tracing::debug!(camera = self.camera.number(), from = ?self.phase, to = ?next, "Position phase");
        self.phase = next;
    }

    /// Move to `Failed` and hand back the error for propagation.
    fn fail(&mut self, err: CoreError) -> CoreError {
        tracing::warn!(
            camera = self.camera.number(),
            phase = ?self.phase,
            error = %err,
            "Position request failed",
        );
        self.advance(PositionPhase::Failed);
        err
    }
}

/// Owns read-modify-write access to the persisted servo positions.
pub struct PositionSupervisor {
    store: Arc<dyn PositionStore>,
    actuator: Arc<dyn PanActuator>,
    capture: Arc<dyn FrameCapture>,
    /// Serializes whole requests, load through save.
    writer: Mutex<()>,
}

impl PositionSupervisor {
    pub fn new(
        store: Arc<dyn PositionStore>,
        actuator: Arc<dyn PanActuator>,
        capture: Arc<dyn FrameCapture>,
    ) -> Self {
        Self {
            store,
            actuator,
            capture,
            writer: Mutex::new(()),
        }
    }

    /// Relative move of `camera_id` by `step_size` degrees.
    ///
    /// `camera_id` and `direction` are checked before anything is loaded or
    /// run, so a malformed request never reaches the hardware.
    pub async fn move_camera(
        &self,
        camera_id: i64,
        step_size: Degrees,
        direction: &str,
    ) -> CoreResult<MoveOutcome> {
        let camera = CameraId::try_from(camera_id)?;
        let direction: Direction = direction.parse()?;
        self.execute(
            camera,
            PanCommand::Step {
                step_size,
                direction,
            },
        )
        .await
    }

    /// Absolute move of `camera_id` to 0 degrees.
    pub async fn reset_camera(&self, camera_id: i64) -> CoreResult<MoveOutcome> {
        let camera = CameraId::try_from(camera_id)?;
        self.execute(camera, PanCommand::Reset).await
    }

    /// Current persisted positions. Waits for any in-flight move so the
    /// answer is never a half-applied state.
    pub async fn positions(&self) -> CoreResult<ServoConfig> {
        let _guard = self.writer.lock().await;
        self.store.load().await
    }

    /// Run `command` for `camera` through the full sequence.
    pub async fn execute(&self, camera: CameraId, command: PanCommand) -> CoreResult<MoveOutcome> {
        let _guard = self.writer.lock().await;
        let mut run = PanRun::start(camera);

        // Validating
        run.advance(PositionPhase::Validating);
        let config = self.store.load().await.map_err(|e| run.fail(e))?;
        let current = config.camera(camera);
        let target = command
            .target_from(current.current_position)
            .map_err(|e| run.fail(e))?;
        let pin = current.pin;

        // Actuating
        run.advance(PositionPhase::Actuating);
        self.actuator.rotate(target, pin).await.map_err(|e| {
            run.fail(CoreError::Actuation {
                camera: camera.number(),
                reason: e.to_string(),
            })
        })?;

        // Capturing. The servo has moved; from here on a failure leaves the
        // stored position behind the physical one.
        run.advance(PositionPhase::Capturing);
        let image = self.capture_image(camera).await.map_err(|e| run.fail(e))?;

        // Persisting
        run.advance(PositionPhase::Persisting);
        let next = config.with_position(camera, target);
        self.store.save(&next).await.map_err(|e| run.fail(e))?;

        run.advance(PositionPhase::Idle);
        tracing::info!(
            camera = camera.number(),
            pin,
            from = current.current_position,
            to = target,
            "Camera position updated",
        );

        Ok(MoveOutcome {
            camera,
            previous_position: current.current_position,
            position: target,
            image,
        })
    }

    async fn capture_image(&self, camera: CameraId) -> CoreResult<CapturedImage> {
        let capture_err = |reason: String| CoreError::Capture {
            camera: camera.number(),
            reason,
        };

        let path = self
            .capture
            .capture(camera)
            .await
            .map_err(|e| capture_err(e.to_string()))?;
        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|e| capture_err(format!("unable to read {}: {e}", path.display())))?;

        Ok(CapturedImage {
            camera,
            path,
            bytes,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;
    use std::sync::Mutex as StdMutex;

    use assert_matches::assert_matches;
    use async_trait::async_trait;

    use super::*;
    use crate::position::model::CameraPosition;
    use crate::position::store::memory::MemoryStore;
    use crate::scripting::executor::ScriptError;

    /// Records every call so tests can assert on ordering and arguments.
    #[derive(Default)]
    struct Calls(StdMutex<Vec<String>>);

    impl Calls {
        fn push(&self, call: String) {
            self.0.lock().unwrap().push(call);
        }

        fn all(&self) -> Vec<String> {
            self.0.lock().unwrap().clone()
        }
    }

    struct FakeActuator {
        calls: Arc<Calls>,
        fail: bool,
    }

    #[async_trait]
    impl PanActuator for FakeActuator {
        async fn rotate(&self, angle: Degrees, pin: u8) -> Result<(), ScriptError> {
            self.calls.push(format!("rotate {angle} {pin}"));
            if self.fail {
                return Err(ScriptError::ExecutionFailed {
                    exit_code: 1,
                    stderr: "servo stalled".to_string(),
                });
            }
            Ok(())
        }
    }

    /// Writes a per-camera image under `dir` unless told to fail.
    struct FakeCapture {
        calls: Arc<Calls>,
        dir: PathBuf,
        fail: bool,
        /// When false, report success without writing the image.
        writes: bool,
    }

    #[async_trait]
    impl FrameCapture for FakeCapture {
        async fn capture(&self, camera: CameraId) -> Result<PathBuf, ScriptError> {
            self.calls.push(format!("capture {camera}"));
            if self.fail {
                return Err(ScriptError::ExecutionFailed {
                    exit_code: 1,
                    stderr: "no camera".to_string(),
                });
            }
            let path = self.dir.join(format!("cam{camera}.jpeg"));
            if self.writes {
                std::fs::write(&path, format!("image-{camera}")).expect("write image");
            }
            Ok(path)
        }
    }

    struct Rig {
        supervisor: PositionSupervisor,
        store: Arc<MemoryStore>,
        calls: Arc<Calls>,
        _dir: tempfile::TempDir,
    }

    fn initial() -> ServoConfig {
        ServoConfig {
            cam1: CameraPosition {
                pin: 12,
                current_position: 75,
            },
            cam2: CameraPosition {
                pin: 13,
                current_position: -10,
            },
        }
    }

    fn rig(actuator_fails: bool, capture_fails: bool) -> Rig {
        rig_with_capture(actuator_fails, capture_fails, true)
    }

    fn rig_with_capture(actuator_fails: bool, capture_fails: bool, writes: bool) -> Rig {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = Arc::new(MemoryStore::new(initial()));
        let calls = Arc::new(Calls::default());
        let supervisor = PositionSupervisor::new(
            Arc::clone(&store) as Arc<dyn PositionStore>,
            Arc::new(FakeActuator {
                calls: Arc::clone(&calls),
                fail: actuator_fails,
            }),
            Arc::new(FakeCapture {
                calls: Arc::clone(&calls),
                dir: dir.path().to_path_buf(),
                fail: capture_fails,
                writes,
            }),
        );
        Rig {
            supervisor,
            store,
            calls,
            _dir: dir,
        }
    }

    #[test]
    fn phase_transitions() {
        use PositionPhase::*;
        assert!(Idle.can_advance_to(Validating));
        assert!(Capturing.can_advance_to(Persisting));
        assert!(Persisting.can_advance_to(Idle));
        assert!(Actuating.can_advance_to(Failed));
        assert!(!Idle.can_advance_to(Failed));
        assert!(!Validating.can_advance_to(Capturing));
        assert!(!Actuating.can_advance_to(Persisting));
        assert!(!Failed.can_advance_to(Idle));
    }

    #[tokio::test]
    async fn successful_move_actuates_captures_then_persists() {
        let rig = rig(false, false);

        let outcome = rig
            .supervisor
            .move_camera(1, 10, "anticlockwise")
            .await
            .expect("move");

        assert_eq!(outcome.previous_position, 75);
        assert_eq!(outcome.position, 65);
        assert_eq!(outcome.image.bytes, b"image-1");
        assert_eq!(rig.calls.all(), vec!["rotate 65 12", "capture 1"]);
        assert_eq!(rig.store.current().cam1.current_position, 65);
        assert_eq!(rig.store.current().cam2, initial().cam2);
    }

    #[tokio::test]
    async fn overshoot_is_rejected_without_side_effects() {
        let rig = rig(false, false);

        let result = rig.supervisor.move_camera(1, 10, "clockwise").await;

        assert_matches!(result, Err(CoreError::Validation(_)));
        assert!(rig.calls.all().is_empty());
        assert_eq!(rig.store.current(), initial());
        assert_eq!(rig.store.saves.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn invalid_camera_is_rejected_before_hardware() {
        let rig = rig(false, false);

        assert_matches!(
            rig.supervisor.move_camera(3, 5, "clockwise").await,
            Err(CoreError::Validation(_))
        );
        assert_matches!(
            rig.supervisor.reset_camera(3).await,
            Err(CoreError::Validation(_))
        );
        assert!(rig.calls.all().is_empty());
    }

    #[tokio::test]
    async fn invalid_direction_is_rejected_before_hardware() {
        let rig = rig(false, false);

        assert_matches!(
            rig.supervisor.move_camera(2, 5, "sideways").await,
            Err(CoreError::Validation(_))
        );
        assert!(rig.calls.all().is_empty());
    }

    #[tokio::test]
    async fn actuation_failure_skips_capture_and_persist() {
        let rig = rig(true, false);

        let result = rig.supervisor.move_camera(2, 5, "clockwise").await;

        assert_matches!(result, Err(CoreError::Actuation { camera: 2, .. }));
        assert_eq!(rig.calls.all(), vec!["rotate -5 13"]);
        assert_eq!(rig.store.current(), initial());
    }

    #[tokio::test]
    async fn capture_failure_leaves_persisted_position() {
        let rig = rig(false, true);

        let result = rig.supervisor.move_camera(2, 5, "clockwise").await;

        assert_matches!(result, Err(CoreError::Capture { camera: 2, .. }));
        assert_eq!(rig.calls.all(), vec!["rotate -5 13", "capture 2"]);
        assert_eq!(rig.store.current(), initial());
        assert_eq!(rig.store.saves.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn capture_without_image_file_is_capture_error() {
        let rig = rig_with_capture(false, false, false);

        let result = rig.supervisor.move_camera(1, 10, "anticlockwise").await;

        assert_matches!(
            result,
            Err(CoreError::Capture { camera: 1, reason }) if reason.contains("unable to read")
        );
        assert_eq!(rig.calls.all(), vec!["rotate 65 12", "capture 1"]);
        assert_eq!(rig.store.current(), initial());
        assert_eq!(rig.store.saves.load(Ordering::SeqCst), 0);
        assert_matches!(
            rig.supervisor.reset_camera(1).await,
            Err(CoreError::Capture { camera: 1, .. })
        );
    }

    #[tokio::test]
    async fn persistence_failure_is_reported_after_move() {
        let rig = rig(false, false);
        rig.store.fail_saves.store(true, Ordering::SeqCst);

        let result = rig.supervisor.reset_camera(1).await;

        assert_matches!(result, Err(CoreError::Persistence(_)));
        assert_eq!(rig.calls.all(), vec!["rotate 0 12", "capture 1"]);
        assert_eq!(rig.store.current(), initial());
    }

    #[tokio::test]
    async fn reset_moves_to_zero() {
        let rig = rig(false, false);

        let outcome = rig.supervisor.reset_camera(2).await.expect("reset");

        assert_eq!(outcome.position, 0);
        assert_eq!(rig.calls.all(), vec!["rotate 0 13", "capture 2"]);
        assert_eq!(rig.store.current().cam2.current_position, 0);
        assert_eq!(rig.store.current().cam1, initial().cam1);
    }

    #[tokio::test]
    async fn concurrent_moves_on_both_cameras_both_persist() {
        let rig = Arc::new(rig(false, false));

        let a = {
            let rig = Arc::clone(&rig);
            tokio::spawn(async move { rig.supervisor.move_camera(1, 5, "anticlockwise").await })
        };
        let b = {
            let rig = Arc::clone(&rig);
            tokio::spawn(async move { rig.supervisor.move_camera(2, 20, "clockwise").await })
        };
        a.await.expect("join a").expect("move a");
        b.await.expect("join b").expect("move b");

        let stored = rig.store.current();
        assert_eq!(stored.cam1.current_position, 70);
        assert_eq!(stored.cam2.current_position, 10);
    }

    #[tokio::test]
    async fn positions_reads_store() {
        let rig = rig(false, false);
        assert_eq!(rig.supervisor.positions().await.expect("load"), initial());
    }
}

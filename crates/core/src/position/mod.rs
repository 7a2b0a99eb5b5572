//! Camera pan position control.
//!
//! A move is a short state machine: validate the request against the
//! persisted [`ServoConfig`](model::ServoConfig), drive the actuator, take a
//! confirmation picture, and only then write the new position back. Any
//! failing step leaves the stored position exactly as it was.

pub mod hardware;
pub mod model;
pub mod store;
pub mod supervisor;

pub use hardware::{FrameCapture, PanActuator, ScriptActuator, ScriptCapture};
pub use model::{CameraId, CameraPosition, Direction, PanCommand, ServoConfig};
pub use store::{JsonFileStore, PositionStore};
pub use supervisor::{CapturedImage, MoveOutcome, PositionPhase, PositionSupervisor};

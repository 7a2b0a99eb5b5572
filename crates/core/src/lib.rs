//! Domain logic for the stereo pan rig control service.
//!
//! Everything here is HTTP-agnostic: the process registry, the camera
//! position state machine, and the subprocess plumbing both of them use.

pub mod calibration;
pub mod error;
pub mod position;
pub mod registry;
pub mod scripting;
pub mod services;
pub mod types;

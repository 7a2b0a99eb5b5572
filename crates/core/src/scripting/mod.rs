//! Subprocess execution for the external collaborators.
//!
//! The actuator, capture, and calibration programs are all opaque
//! executables. This module builds their command lines, runs them to
//! completion, and reports the outcome as [`ScriptOutput`] or
//! [`ScriptError`].

pub mod command;
pub mod executor;
pub mod subprocess;

//! Pan position types and the bounds arithmetic.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::types::{CameraNumber, Degrees};

/// Most anticlockwise angle the pan stage can reach.
pub const MIN_POSITION: Degrees = -80;

/// Most clockwise angle the pan stage can reach.
pub const MAX_POSITION: Degrees = 80;

/// Target of a reset request.
pub const RESET_POSITION: Degrees = 0;

pub fn is_within_limits(position: Degrees) -> bool {
    (MIN_POSITION..=MAX_POSITION).contains(&position)
}

// ---------------------------------------------------------------------------
// Camera identity
// ---------------------------------------------------------------------------

/// One of the two rig cameras.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(into = "u8")]
pub enum CameraId {
    Cam1,
    Cam2,
}

impl CameraId {
    pub const ALL: [CameraId; 2] = [CameraId::Cam1, CameraId::Cam2];

    pub fn number(self) -> CameraNumber {
        match self {
            Self::Cam1 => 1,
            Self::Cam2 => 2,
        }
    }

    /// Sub-directory the capture program writes this camera's image into.
    pub fn dir_name(self) -> &'static str {
        match self {
            Self::Cam1 => "cam1",
            Self::Cam2 => "cam2",
        }
    }
}

impl TryFrom<i64> for CameraId {
    type Error = CoreError;

    /// Only ids 1 and 2 exist. There is no fallback camera.
    fn try_from(raw: i64) -> CoreResult<Self> {
        match raw {
            1 => Ok(Self::Cam1),
            2 => Ok(Self::Cam2),
            other => Err(CoreError::Validation(format!(
                "Invalid camera ID: {other} (expected 1 or 2)"
            ))),
        }
    }
}

impl From<CameraId> for u8 {
    fn from(id: CameraId) -> u8 {
        id.number()
    }
}

impl fmt::Display for CameraId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.number())
    }
}

// ---------------------------------------------------------------------------
// Direction
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Clockwise,
    Anticlockwise,
}

impl FromStr for Direction {
    type Err = CoreError;

    /// Accepts `clockwise` / `anticlockwise` and the short `clock` /
    /// `anticlock` tokens older clients send. Anything else is rejected.
    fn from_str(token: &str) -> CoreResult<Self> {
        match token {
            "clockwise" | "clock" => Ok(Self::Clockwise),
            "anticlockwise" | "anticlock" => Ok(Self::Anticlockwise),
            other => Err(CoreError::Validation(format!("Invalid direction: {other:?}"))),
        }
    }
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

/// What a position request asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanCommand {
    /// Relative move from the stored position.
    Step {
        step_size: Degrees,
        direction: Direction,
    },
    /// Absolute move to [`RESET_POSITION`].
    Reset,
}

impl PanCommand {
    /// Absolute angle this command moves to from `current`.
    ///
    /// Out-of-range targets are rejected, never clamped.
    pub fn target_from(self, current: Degrees) -> CoreResult<Degrees> {
        match self {
            Self::Reset => Ok(RESET_POSITION),
            Self::Step {
                step_size,
                direction,
            } => compute_target(current, step_size, direction),
        }
    }
}

/// `current + step` for clockwise, `current - step` for anticlockwise.
///
/// The step is signed; a negative step turns the other way. Only the
/// resulting target is bounds-checked.
pub fn compute_target(
    current: Degrees,
    step_size: Degrees,
    direction: Direction,
) -> CoreResult<Degrees> {
    let target = match direction {
        Direction::Clockwise => current.checked_add(step_size),
        Direction::Anticlockwise => current.checked_sub(step_size),
    };

    match target {
        Some(t) if is_within_limits(t) => Ok(t),
        Some(t) => Err(CoreError::Validation(format!(
            "Invalid position: {t} is outside [{MIN_POSITION}, {MAX_POSITION}]"
        ))),
        None => Err(CoreError::Validation(format!(
            "Invalid position: step of {step_size} from {current} overflows"
        ))),
    }
}

// ---------------------------------------------------------------------------
// Persisted state
// ---------------------------------------------------------------------------

/// Pin and current angle of one camera's pan servo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CameraPosition {
    /// GPIO pin driving the servo. Fixed by wiring.
    pub pin: u8,
    pub current_position: Degrees,
}

/// Both cameras' servo state; the unit of persistence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServoConfig {
    pub cam1: CameraPosition,
    pub cam2: CameraPosition,
}

impl ServoConfig {
    pub fn camera(&self, id: CameraId) -> &CameraPosition {
        match id {
            CameraId::Cam1 => &self.cam1,
            CameraId::Cam2 => &self.cam2,
        }
    }

    /// Copy with `id`'s position replaced. The other camera is untouched.
    pub fn with_position(&self, id: CameraId, position: Degrees) -> Self {
        let mut next = *self;
        match id {
            CameraId::Cam1 => next.cam1.current_position = position,
            CameraId::Cam2 => next.cam2.current_position = position,
        }
        next
    }

    /// Reject a record whose positions lie outside the mechanical range.
    pub fn check_limits(&self) -> CoreResult<()> {
        for id in CameraId::ALL {
            let position = self.camera(id).current_position;
            if !is_within_limits(position) {
                return Err(CoreError::Persistence(format!(
                    "stored position for {} is out of range: {position}",
                    id.dir_name()
                )));
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

/// Pan angle in whole degrees. Negative is anticlockwise of centre.
pub type Degrees = i32;

/// Logical camera number as it appears on the wire (`1` or `2`).
pub type CameraNumber = u8;

/// OS process identifier.
pub type Pid = u32;

/// Event timestamp type used throughout the crate.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

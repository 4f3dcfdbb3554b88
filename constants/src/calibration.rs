/// Displacement from the reference location that marks calibration stale (metres).
pub const DEFAULT_RECALIBRATION_DISTANCE_M: f64 = 5.0;

/// Heading drift from the reference heading that marks calibration stale (degrees).
pub const DEFAULT_RECALIBRATION_HEADING_DEG: f64 = 15.0;

/// Fixes reporting a horizontal accuracy worse than this are flagged (metres).
pub const DEFAULT_MIN_FIX_ACCURACY_M: f64 = 30.0;

/// Vertical offset applied when either altitude is unknown (metres, 0 = camera eye level).
pub const DEFAULT_VERTICAL_FALLBACK_OFFSET_M: f64 = 0.0;

/// Distance in front of the camera used when adding an object at the current heading (metres).
pub const DEFAULT_PLACE_AHEAD_DISTANCE_M: f64 = 5.0;

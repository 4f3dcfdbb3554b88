/// Hold time before a stationary touch becomes a long-press (milliseconds).
pub const DEFAULT_LONG_PRESS_DURATION_MS: u64 = 500;

/// Movement that cancels a pending long-press (logical pixels).
pub const DEFAULT_DRAG_JITTER_PX: f32 = 10.0;

/// Yaw applied per pixel of horizontal drag (radians).
pub const DEFAULT_ROTATE_RADIANS_PER_PX: f32 = 0.01;

/// Camera-forward translation per pixel of vertical drag (metres).
pub const DEFAULT_TRANSLATE_METERS_PER_PX: f32 = 0.02;

/// Uniform scale change per pixel of vertical drag.
pub const DEFAULT_SCALE_PER_PX: f32 = 0.005;

/// Smallest scale a drag may shrink an object to.
pub const MIN_OBJECT_SCALE: f32 = 0.05;

/// Pointer id assigned to the emulated mouse pointer.
pub const MOUSE_POINTER_ID: u64 = u64::MAX;

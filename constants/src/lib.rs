//! Shared tuning constants for the geo-anchored AR engine.

/// Recalibration policy defaults and fix-quality thresholds.
pub mod calibration;

/// Earth model and the East-North-Up to world-axis mapping.
pub mod coordinate_system;

/// Touch gesture timing and jitter thresholds.
pub mod gesture;

/// Marker sizes, colours and camera defaults for visual feedback.
pub mod render_settings;

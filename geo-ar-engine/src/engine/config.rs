use bevy::prelude::*;
use constants::calibration::{
    DEFAULT_MIN_FIX_ACCURACY_M, DEFAULT_PLACE_AHEAD_DISTANCE_M, DEFAULT_RECALIBRATION_DISTANCE_M,
    DEFAULT_RECALIBRATION_HEADING_DEG, DEFAULT_VERTICAL_FALLBACK_OFFSET_M,
};
use constants::gesture::{
    DEFAULT_DRAG_JITTER_PX, DEFAULT_LONG_PRESS_DURATION_MS, DEFAULT_ROTATE_RADIANS_PER_PX,
    DEFAULT_SCALE_PER_PX, DEFAULT_TRANSLATE_METERS_PER_PX,
};
use constants::render_settings::{DEFAULT_FOV_Y, TOUCH_MARKER_DISTANCE};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::engine::calibration::RecalibrationPolicy;
use crate::engine::error::ConfigError;
use crate::tools::transform_control::DragSettings;

/// Runtime tuning. Every field is optional in JSON; missing ones take the
/// compile-time defaults from the `constants` crate.
#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArConfig {
    pub recalibration_distance_m: f64,
    pub recalibration_update_count: Option<u32>,
    pub recalibration_heading_deg: Option<f64>,
    pub min_fix_accuracy_m: f64,
    pub skip_low_accuracy: bool,
    pub vertical_fallback_m: f64,
    /// Distance ahead of the camera used by "add object at heading".
    pub place_ahead_distance_m: f64,
    pub long_press_duration_ms: u64,
    pub drag_jitter_px: f32,
    pub rotate_radians_per_px: f32,
    pub translate_meters_per_px: f32,
    pub scale_per_px: f32,
    /// Vertical field of view used until the camera reports its own.
    pub fov_y: f32,
    pub touch_marker_distance: f32,
}

impl Default for ArConfig {
    fn default() -> Self {
        Self {
            recalibration_distance_m: DEFAULT_RECALIBRATION_DISTANCE_M,
            recalibration_update_count: None,
            recalibration_heading_deg: Some(DEFAULT_RECALIBRATION_HEADING_DEG),
            min_fix_accuracy_m: DEFAULT_MIN_FIX_ACCURACY_M,
            skip_low_accuracy: true,
            vertical_fallback_m: DEFAULT_VERTICAL_FALLBACK_OFFSET_M,
            place_ahead_distance_m: DEFAULT_PLACE_AHEAD_DISTANCE_M,
            long_press_duration_ms: DEFAULT_LONG_PRESS_DURATION_MS,
            drag_jitter_px: DEFAULT_DRAG_JITTER_PX,
            rotate_radians_per_px: DEFAULT_ROTATE_RADIANS_PER_PX,
            translate_meters_per_px: DEFAULT_TRANSLATE_METERS_PER_PX,
            scale_per_px: DEFAULT_SCALE_PER_PX,
            fov_y: DEFAULT_FOV_Y,
            touch_marker_distance: TOUCH_MARKER_DISTANCE,
        }
    }
}

impl ArConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json).map_err(|e| ConfigError::Parse {
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        let config = Self::from_json_str(&json)?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        fn invalid(
            parameter: &'static str,
            value: impl ToString,
            reason: &'static str,
        ) -> Result<(), ConfigError> {
            Err(ConfigError::InvalidValue {
                parameter,
                value: value.to_string(),
                reason,
            })
        }

        if !(self.recalibration_distance_m.is_finite() && self.recalibration_distance_m > 0.0) {
            return invalid(
                "recalibration_distance_m",
                self.recalibration_distance_m,
                "must be a positive distance",
            );
        }
        if self.recalibration_update_count == Some(0) {
            return invalid("recalibration_update_count", 0, "must be at least 1 when set");
        }
        if let Some(degrees) = self.recalibration_heading_deg {
            if !(degrees > 0.0 && degrees <= 180.0) {
                return invalid("recalibration_heading_deg", degrees, "must be in (0, 180]");
            }
        }
        if !(self.min_fix_accuracy_m.is_finite() && self.min_fix_accuracy_m > 0.0) {
            return invalid(
                "min_fix_accuracy_m",
                self.min_fix_accuracy_m,
                "must be a positive radius",
            );
        }
        if !self.vertical_fallback_m.is_finite() {
            return invalid("vertical_fallback_m", self.vertical_fallback_m, "must be finite");
        }
        if !(self.place_ahead_distance_m.is_finite() && self.place_ahead_distance_m > 0.0) {
            return invalid(
                "place_ahead_distance_m",
                self.place_ahead_distance_m,
                "must be a positive distance",
            );
        }
        if self.long_press_duration_ms == 0 {
            return invalid("long_press_duration_ms", 0, "must be non-zero");
        }
        if !(self.drag_jitter_px.is_finite() && self.drag_jitter_px >= 0.0) {
            return invalid("drag_jitter_px", self.drag_jitter_px, "must not be negative");
        }
        for (parameter, value) in [
            ("rotate_radians_per_px", self.rotate_radians_per_px),
            ("translate_meters_per_px", self.translate_meters_per_px),
            ("scale_per_px", self.scale_per_px),
            ("touch_marker_distance", self.touch_marker_distance),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return invalid(parameter, value, "must be positive");
            }
        }
        if !(self.fov_y > 0.0 && self.fov_y < std::f32::consts::PI) {
            return invalid("fov_y", self.fov_y, "must be in (0, π) radians");
        }
        Ok(())
    }

    pub fn recalibration_policy(&self) -> RecalibrationPolicy {
        RecalibrationPolicy {
            distance_threshold_m: self.recalibration_distance_m,
            update_count_threshold: self.recalibration_update_count,
            heading_threshold_deg: self.recalibration_heading_deg,
            min_fix_accuracy_m: self.min_fix_accuracy_m,
            skip_low_accuracy: self.skip_low_accuracy,
            vertical_fallback_m: self.vertical_fallback_m,
        }
    }

    pub fn long_press_duration(&self) -> Duration {
        Duration::from_millis(self.long_press_duration_ms)
    }

    pub fn drag_settings(&self) -> DragSettings {
        DragSettings {
            rotate_radians_per_px: self.rotate_radians_per_px,
            translate_meters_per_px: self.translate_meters_per_px,
            scale_per_px: self.scale_per_px,
        }
    }
}

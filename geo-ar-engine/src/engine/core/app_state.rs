use bevy::prelude::*;
use serde::Serialize;

/// Engine-wide placement state, driven by calibration status.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Hash, States, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineState {
    /// Waiting for the first location and heading fixes.
    #[default]
    AwaitingFixes,
    /// A sensor provider is unavailable; objects stay hidden.
    Degraded,
    Calibrated,
    /// Moved or turned past the recalibration thresholds.
    Stale,
}

impl EngineState {
    /// Whether placed objects have valid transforms in this state.
    pub fn is_placing(&self) -> bool {
        matches!(self, EngineState::Calibrated | EngineState::Stale)
    }
}

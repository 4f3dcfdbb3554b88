//! Calibration of the local world frame against location and heading fixes.

/// Reference state machine and object transform recomputation.
pub mod controller;

/// Per-frame ingestion, auto-initialisation, recalibration and status reporting.
pub mod systems;

pub use controller::{
    CalibrationController, CalibrationPhase, CalibrationState, FixOutcome, RecalibrationPolicy,
    RecalibrationReport,
};
pub use systems::{CalibrationStatus, CalibrationStatusChanged, SensorAvailability};

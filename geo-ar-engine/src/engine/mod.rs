/// Calibration state machine, sensor ingestion and engine status reporting.
pub mod calibration;
pub mod camera;
/// Runtime configuration loaded from JSON.
pub mod config;
pub mod core;
pub mod error;
/// Geographic types and the local tangent-plane frame.
pub mod geo;
pub mod scene;
/// Location and heading providers feeding the frame loop.
pub mod sensors;

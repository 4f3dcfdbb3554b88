//! Sensor ingestion. Providers push fixes into a shared queue from any thread
//! or JS callback; the engine drains it once per frame before calibrating.

/// Thread-safe fix queue and its producer handle.
pub mod queue;

/// Simulated walk used on desktop builds without real sensors.
pub mod simulated;

pub use queue::{SensorFix, SensorKind, SensorQueue, SensorSender};
pub use simulated::SimulatedWalk;

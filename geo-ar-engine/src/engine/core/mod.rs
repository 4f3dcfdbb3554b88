//! Engine wiring, lifecycle and state.
//!
//! [`GeoArEnginePlugin`] registers every resource, event and system of the
//! engine. [`FrameDriver`] runs a headless app frame by frame and stops it
//! through a [`CancellationToken`]. The windowed app is assembled in
//! [`app_setup`].

/// Windowed application setup for native and WASM targets.
pub mod app_setup;

/// Engine state derived from calibration status.
pub mod app_state;

/// Explicit frame loop with cancellation and clean shutdown.
pub mod frame_driver;

/// Resource, event and system registration.
pub mod plugin;

/// Platform-specific window configuration for native and WASM builds.
///
/// Configures canvas integration for web targets and vsync settings.
pub mod window_config;

pub use app_state::EngineState;
pub use frame_driver::{CancellationToken, FrameDriver, FrameStatus, ShutdownReport};
pub use plugin::{EngineSet, GeoArEnginePlugin};

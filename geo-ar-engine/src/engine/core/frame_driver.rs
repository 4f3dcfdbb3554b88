use bevy::app::{AppExit, PluginsState};
use bevy::prelude::*;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::engine::config::ArConfig;
use crate::engine::core::plugin::GeoArEnginePlugin;
use crate::engine::sensors::{SensorQueue, SensorSender};
use crate::rpc::web_rpc::WebRpcPlugin;
use crate::tools::gesture::GestureSessions;
use crate::tools::touch_visualizer::{TouchMarker, TouchVisualizer};

/// Shared stop flag for the frame loop and any sensor threads feeding it.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// What shutdown cleaned up.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShutdownReport {
    pub frames: u64,
    pub markers_removed: usize,
    pub sessions_cleared: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameStatus {
    Rendered,
    /// The driver has shut down; no further frames will run.
    Cancelled,
}

/// Drives an [`App`] one frame at a time instead of handing control to a runner.
///
/// Cancelling the token stops the loop at the next frame boundary. Shutdown
/// removes touch markers, clears gesture sessions, writes [`AppExit`] and
/// drops the app.
pub struct FrameDriver {
    app: Option<App>,
    cancel: CancellationToken,
    frames: u64,
    report: Option<ShutdownReport>,
}

impl FrameDriver {
    pub fn new(mut app: App) -> Self {
        while app.plugins_state() == PluginsState::Adding {
            #[cfg(not(target_arch = "wasm32"))]
            bevy::tasks::tick_global_task_pools_on_main_thread();
        }
        if app.plugins_state() == PluginsState::Ready {
            app.finish();
            app.cleanup();
        }

        Self {
            app: Some(app),
            cancel: CancellationToken::new(),
            frames: 0,
            report: None,
        }
    }

    /// Engine without windowing or rendering, for tests and the `--headless` binary.
    pub fn headless(config: ArConfig) -> Self {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins)
            .add_plugins(GeoArEnginePlugin { config })
            .add_plugins(WebRpcPlugin);
        Self::new(app)
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn is_running(&self) -> bool {
        self.app.is_some()
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Set once the driver has shut down.
    pub fn shutdown_report(&self) -> Option<ShutdownReport> {
        self.report
    }

    pub fn app_mut(&mut self) -> Option<&mut App> {
        self.app.as_mut()
    }

    pub fn world(&self) -> Option<&World> {
        self.app.as_ref().map(App::world)
    }

    pub fn world_mut(&mut self) -> Option<&mut World> {
        self.app.as_mut().map(App::world_mut)
    }

    pub fn sensor_sender(&self) -> Option<SensorSender> {
        self.world()?
            .get_resource::<SensorQueue>()
            .map(SensorQueue::sender)
    }

    /// Queue an event for the next frame. Returns false once shut down.
    pub fn send_event<E: Event>(&mut self, event: E) -> bool {
        self.world_mut()
            .and_then(|world| world.send_event(event))
            .is_some()
    }

    /// Run one `App::update`, unless cancelled or already shut down.
    pub fn render_frame(&mut self) -> FrameStatus {
        if self.cancel.is_cancelled() {
            let _ = self.shutdown();
            return FrameStatus::Cancelled;
        }
        let Some(app) = self.app.as_mut() else {
            return FrameStatus::Cancelled;
        };

        app.update();
        self.frames += 1;

        if let Some(exit) = app.should_exit() {
            debug!("App requested exit: {:?}", exit);
            let _ = self.shutdown();
            return FrameStatus::Cancelled;
        }
        FrameStatus::Rendered
    }

    /// Render frames until the token is cancelled. Returns the frame count.
    pub fn run_until_cancelled(&mut self, frame_interval: Duration) -> u64 {
        while self.render_frame() == FrameStatus::Rendered {
            if !frame_interval.is_zero() {
                std::thread::sleep(frame_interval);
            }
        }
        self.frames
    }

    pub fn shutdown(&mut self) -> Option<ShutdownReport> {
        let mut app = self.app.take()?;
        self.cancel.cancel();

        let world = app.world_mut();
        if let Some(mut visualizer) = world.get_resource_mut::<TouchVisualizer>() {
            visualizer.take_markers();
        }
        let markers: Vec<Entity> = world
            .query_filtered::<Entity, With<TouchMarker>>()
            .iter(world)
            .collect();
        for marker in &markers {
            world.despawn(*marker);
        }
        let sessions_cleared = match world.get_resource_mut::<GestureSessions>() {
            Some(mut sessions) => {
                let count = sessions.len();
                sessions.clear();
                count
            }
            None => 0,
        };
        world.send_event(AppExit::Success);

        let report = ShutdownReport {
            frames: self.frames,
            markers_removed: markers.len(),
            sessions_cleared,
        };
        info!(
            "Frame driver stopped after {} frames, {} touch markers removed",
            report.frames, report.markers_removed
        );
        self.report = Some(report);
        Some(report)
    }
}

impl Drop for FrameDriver {
    fn drop(&mut self) {
        let _ = self.shutdown();
    }
}

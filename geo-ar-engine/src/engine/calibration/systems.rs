use bevy::prelude::*;
use serde::Serialize;

use super::controller::{CalibrationController, CalibrationPhase, FixOutcome};
use crate::engine::camera::CameraPose;
use crate::engine::core::EngineState;
use crate::engine::scene::PlacedObject;
use crate::engine::sensors::{SensorFix, SensorKind, SensorQueue};

/// Whether each provider is currently able to deliver fixes.
#[derive(Resource, Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorAvailability {
    pub location: bool,
    pub heading: bool,
}

impl Default for SensorAvailability {
    fn default() -> Self {
        Self {
            location: true,
            heading: true,
        }
    }
}

impl SensorAvailability {
    fn set(&mut self, kind: SensorKind, available: bool) {
        match kind {
            SensorKind::Location => self.location = available,
            SensorKind::Heading => self.heading = available,
        }
    }
}

/// Snapshot reported to the host whenever it changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CalibrationStatus {
    pub phase: CalibrationPhase,
    pub has_location: bool,
    pub has_heading: bool,
    pub location_available: bool,
    pub heading_available: bool,
}

impl CalibrationStatus {
    pub fn new(controller: &CalibrationController, availability: &SensorAvailability) -> Self {
        Self {
            phase: controller.phase(),
            has_location: controller.latest_location().is_some(),
            has_heading: controller.latest_heading().is_some(),
            location_available: availability.location,
            heading_available: availability.heading,
        }
    }

    pub fn engine_state(&self) -> EngineState {
        match self.phase {
            CalibrationPhase::Calibrated => EngineState::Calibrated,
            CalibrationPhase::Stale => EngineState::Stale,
            CalibrationPhase::Uncalibrated
                if !self.location_available || !self.heading_available =>
            {
                EngineState::Degraded
            }
            CalibrationPhase::Uncalibrated => EngineState::AwaitingFixes,
        }
    }
}

#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct CalibrationStatusChanged(pub CalibrationStatus);

/// Feed every queued fix to the controller in arrival order.
pub fn drain_sensor_queue(
    queue: Res<SensorQueue>,
    mut controller: ResMut<CalibrationController>,
    mut availability: ResMut<SensorAvailability>,
) {
    for fix in queue.drain() {
        match fix {
            SensorFix::Location(location) => {
                if !availability.location {
                    availability.set(SensorKind::Location, true);
                }
                if controller.on_location_update(location) == FixOutcome::BecameStale {
                    debug!("Moved beyond the reference radius, calibration is stale");
                }
            }
            SensorFix::Heading(heading) => {
                if !availability.heading {
                    availability.set(SensorKind::Heading, true);
                }
                if controller.on_heading_update(heading) == FixOutcome::BecameStale {
                    debug!("Heading drifted from the reference, calibration is stale");
                }
            }
            SensorFix::Unavailable(kind) => {
                warn!("{:?} provider unavailable, placement degraded", kind);
                availability.set(kind, false);
            }
        }
    }
}

/// Calibrate as soon as both a location and a heading are held.
pub fn auto_initialize(
    mut controller: ResMut<CalibrationController>,
    camera: Res<CameraPose>,
    mut objects: Query<&mut PlacedObject>,
) {
    if controller.is_calibrated() || !controller.has_both_fixes() {
        return;
    }
    if let Err(skip) = controller.initialize(
        None,
        None,
        &camera,
        objects.iter_mut().map(Mut::into_inner),
    ) {
        debug!("Calibration not initialised yet: {}", skip);
    }
}

pub fn recalibrate_when_stale(
    mut controller: ResMut<CalibrationController>,
    camera: Res<CameraPose>,
    mut objects: Query<&mut PlacedObject>,
) {
    if controller.phase() != CalibrationPhase::Stale {
        return;
    }
    if let Ok(report) = controller.recalibrate(&camera, objects.iter_mut().map(Mut::into_inner)) {
        info!(
            "Recalibrated: {} objects updated, {} held by a drag",
            report.updated, report.skipped_locked
        );
    }
}

/// Emit [`CalibrationStatusChanged`] and move [`EngineState`] when the status changes.
pub fn report_calibration_status(
    controller: Res<CalibrationController>,
    availability: Res<SensorAvailability>,
    mut last: Local<Option<CalibrationStatus>>,
    mut events: EventWriter<CalibrationStatusChanged>,
    mut next_state: ResMut<NextState<EngineState>>,
) {
    let status = CalibrationStatus::new(&controller, &availability);
    if *last == Some(status) {
        return;
    }

    let state_changed = last.map(|s| s.engine_state()) != Some(status.engine_state());
    if state_changed {
        println!("→ Transitioning to {:?} state", status.engine_state());
        next_state.set(status.engine_state());
    }
    *last = Some(status);
    events.write(CalibrationStatusChanged(status));
}

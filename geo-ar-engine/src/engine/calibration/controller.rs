use bevy::prelude::*;
use serde::Serialize;
use constants::calibration::{
    DEFAULT_MIN_FIX_ACCURACY_M, DEFAULT_RECALIBRATION_DISTANCE_M,
    DEFAULT_RECALIBRATION_HEADING_DEG, DEFAULT_VERTICAL_FALLBACK_OFFSET_M,
};

use crate::engine::camera::CameraPose;
use crate::engine::error::CalibrationSkip;
use crate::engine::geo::{
    GeoPoint, Heading, bearing_and_distance, from_local_offset, heading_difference,
    to_local_offset, vertical_offset, world_heading,
};
use crate::engine::scene::PlacedObject;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CalibrationPhase {
    #[default]
    Uncalibrated,
    Calibrated,
    Stale,
}

/// When a calibrated reference is considered stale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecalibrationPolicy {
    /// Displacement from the reference location that marks the reference stale.
    pub distance_threshold_m: f64,
    /// Stale after this many fixes regardless of movement. Disabled when `None`.
    pub update_count_threshold: Option<u32>,
    /// Heading drift that marks the reference stale. Disabled when `None`.
    pub heading_threshold_deg: Option<f64>,
    /// Location fixes with a worse accuracy radius are flagged.
    pub min_fix_accuracy_m: f64,
    /// Flagged fixes never become the reference candidate.
    pub skip_low_accuracy: bool,
    /// Height used when an altitude is missing, relative to the camera.
    pub vertical_fallback_m: f64,
}

impl Default for RecalibrationPolicy {
    fn default() -> Self {
        Self {
            distance_threshold_m: DEFAULT_RECALIBRATION_DISTANCE_M,
            update_count_threshold: None,
            heading_threshold_deg: Some(DEFAULT_RECALIBRATION_HEADING_DEG),
            min_fix_accuracy_m: DEFAULT_MIN_FIX_ACCURACY_M,
            skip_low_accuracy: true,
            vertical_fallback_m: DEFAULT_VERTICAL_FALLBACK_OFFSET_M,
        }
    }
}

/// The reference every object transform is derived from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibrationState {
    pub reference_location: GeoPoint,
    pub reference_heading: Heading,
    /// Camera pose at the moment the reference was taken.
    pub reference_pose: CameraPose,
    pub updates_since_calibration: u32,
}

impl CalibrationState {
    /// Compass bearing of the world -Z axis for this reference.
    pub fn world_heading(&self) -> f64 {
        world_heading(
            self.reference_heading.degrees(),
            self.reference_pose.orientation,
        )
    }

    /// World translation of a geographic point under this reference.
    pub fn translation_for(&self, origin: &GeoPoint, vertical_fallback_m: f64) -> Vec3 {
        let (x, z) = to_local_offset(&self.reference_location, origin, self.world_heading());
        let y = vertical_offset(&self.reference_location, origin, vertical_fallback_m);
        self.reference_pose.position + Vec3::new(x as f32, y as f32, z as f32)
    }

    /// Geographic point for a world translation; `previous` supplies the fields
    /// a ground-plane inverse cannot recover.
    pub fn geo_for_translation(&self, translation: Vec3, previous: &GeoPoint) -> GeoPoint {
        let offset = translation - self.reference_pose.position;
        let ground = from_local_offset(
            &self.reference_location,
            (offset.x as f64, offset.z as f64),
            self.world_heading(),
        );
        let altitude = match (previous.altitude, self.reference_location.altitude) {
            (Some(_), Some(reference)) => Some(reference + offset.y as f64),
            _ => previous.altitude,
        };
        GeoPoint {
            latitude: ground.latitude,
            longitude: ground.longitude,
            altitude,
            ..*previous
        }
    }
}

/// Result of feeding a single fix to the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixOutcome {
    /// Held as the most recent fix until calibration is initialised.
    Buffered,
    /// Recorded; the reference is still fresh (or was already stale).
    Recorded,
    /// Recorded and the reference just turned stale.
    BecameStale,
    /// Accuracy worse than the policy allows; not used for calibration.
    LowAccuracy,
    /// Older than the fix already held; discarded.
    Superseded,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecalibrationReport {
    pub updated: usize,
    /// Objects left alone because a drag owns them.
    pub skipped_locked: usize,
}

/// Owns the calibration reference and decides when object transforms must be
/// recomputed. Transforms are always recomputed from scratch, never nudged.
#[derive(Resource, Debug, Clone)]
pub struct CalibrationController {
    policy: RecalibrationPolicy,
    phase: CalibrationPhase,
    state: Option<CalibrationState>,
    latest_location: Option<GeoPoint>,
    latest_heading: Option<Heading>,
    flagged_fixes: u32,
}

impl Default for CalibrationController {
    fn default() -> Self {
        Self::new(RecalibrationPolicy::default())
    }
}

impl CalibrationController {
    pub fn new(policy: RecalibrationPolicy) -> Self {
        Self {
            policy,
            phase: CalibrationPhase::Uncalibrated,
            state: None,
            latest_location: None,
            latest_heading: None,
            flagged_fixes: 0,
        }
    }

    pub fn policy(&self) -> &RecalibrationPolicy {
        &self.policy
    }

    pub fn phase(&self) -> CalibrationPhase {
        self.phase
    }

    pub fn state(&self) -> Option<&CalibrationState> {
        self.state.as_ref()
    }

    pub fn is_calibrated(&self) -> bool {
        self.phase != CalibrationPhase::Uncalibrated
    }

    pub fn latest_location(&self) -> Option<&GeoPoint> {
        self.latest_location.as_ref()
    }

    pub fn latest_heading(&self) -> Option<&Heading> {
        self.latest_heading.as_ref()
    }

    /// Number of location fixes flagged for poor accuracy this session.
    pub fn flagged_fixes(&self) -> u32 {
        self.flagged_fixes
    }

    pub fn has_both_fixes(&self) -> bool {
        self.latest_location.is_some() && self.latest_heading.is_some()
    }

    pub fn on_location_update(&mut self, location: GeoPoint) -> FixOutcome {
        if let Some(previous) = &self.latest_location {
            if !location.supersedes(previous) {
                return FixOutcome::Superseded;
            }
        }

        if location.is_low_accuracy(self.policy.min_fix_accuracy_m) {
            self.flagged_fixes += 1;
            debug!(
                "Location fix flagged: accuracy {:.1} m exceeds {:.1} m",
                location.accuracy, self.policy.min_fix_accuracy_m
            );
            if self.policy.skip_low_accuracy {
                return FixOutcome::LowAccuracy;
            }
        }

        self.latest_location = Some(location);
        self.register_update()
    }

    pub fn on_heading_update(&mut self, heading: Heading) -> FixOutcome {
        if let Some(previous) = &self.latest_heading {
            if !heading.supersedes(previous) {
                return FixOutcome::Superseded;
            }
        }

        self.latest_heading = Some(heading);
        self.register_update()
    }

    fn register_update(&mut self) -> FixOutcome {
        let Some(state) = self.state.as_mut() else {
            return FixOutcome::Buffered;
        };
        state.updates_since_calibration = state.updates_since_calibration.saturating_add(1);

        if self.phase == CalibrationPhase::Stale {
            return FixOutcome::Recorded;
        }
        if self.reference_is_stale() {
            self.phase = CalibrationPhase::Stale;
            return FixOutcome::BecameStale;
        }
        FixOutcome::Recorded
    }

    fn reference_is_stale(&self) -> bool {
        let Some(state) = &self.state else {
            return false;
        };

        if let Some(threshold) = self.policy.update_count_threshold {
            if state.updates_since_calibration >= threshold {
                return true;
            }
        }

        if let Some(location) = &self.latest_location {
            let (_, distance) = bearing_and_distance(&state.reference_location, location);
            if distance > self.policy.distance_threshold_m {
                return true;
            }
        }

        if let (Some(threshold), Some(heading)) =
            (self.policy.heading_threshold_deg, &self.latest_heading)
        {
            let drift = heading_difference(state.reference_heading.degrees(), heading.degrees());
            if drift > threshold {
                return true;
            }
        }

        false
    }

    /// First calibration. Fixes passed here go through the same supersession
    /// rules as sensor updates, so a newer buffered fix wins over a stale one.
    pub fn initialize<'a>(
        &mut self,
        location: Option<GeoPoint>,
        heading: Option<Heading>,
        camera: &CameraPose,
        objects: impl IntoIterator<Item = &'a mut PlacedObject>,
    ) -> Result<RecalibrationReport, CalibrationSkip> {
        if self.phase != CalibrationPhase::Uncalibrated {
            return Err(CalibrationSkip::AlreadyInitialized);
        }
        if let Some(location) = location {
            self.on_location_update(location);
        }
        if let Some(heading) = heading {
            self.on_heading_update(heading);
        }

        let report = self.apply_reference(camera, objects)?;
        if let Some(state) = &self.state {
            info!(
                "Calibration initialised at ({:.6}, {:.6}), heading {:.1}°, {} objects placed",
                state.reference_location.latitude,
                state.reference_location.longitude,
                state.reference_heading.degrees(),
                report.updated
            );
        }
        Ok(report)
    }

    /// Re-anchor to the latest fixes and recompute every object not owned by a drag.
    pub fn recalibrate<'a>(
        &mut self,
        camera: &CameraPose,
        objects: impl IntoIterator<Item = &'a mut PlacedObject>,
    ) -> Result<RecalibrationReport, CalibrationSkip> {
        if self.phase == CalibrationPhase::Uncalibrated {
            warn!("Recalibration skipped: {}", CalibrationSkip::NotInitialized);
            return Err(CalibrationSkip::NotInitialized);
        }
        self.apply_reference(camera, objects).inspect_err(|skip| {
            warn!("Recalibration skipped: {}", skip);
        })
    }

    fn apply_reference<'a>(
        &mut self,
        camera: &CameraPose,
        objects: impl IntoIterator<Item = &'a mut PlacedObject>,
    ) -> Result<RecalibrationReport, CalibrationSkip> {
        let location = self.latest_location.ok_or(CalibrationSkip::MissingLocation)?;
        let heading = self.latest_heading.ok_or(CalibrationSkip::MissingHeading)?;

        let state = CalibrationState {
            reference_location: location,
            reference_heading: heading,
            reference_pose: *camera,
            updates_since_calibration: 0,
        };
        self.state = Some(state);
        self.phase = CalibrationPhase::Calibrated;

        let mut report = RecalibrationReport::default();
        for object in objects {
            if object.is_drag_locked() {
                report.skipped_locked += 1;
                continue;
            }
            object.set_translation(state.translation_for(&object.origin, self.policy.vertical_fallback_m));
            report.updated += 1;
        }
        Ok(report)
    }

    /// Compute the transform of a single (new) object. Returns false when
    /// uncalibrated or the object is drag-locked.
    pub fn place(&self, object: &mut PlacedObject) -> bool {
        let Some(state) = &self.state else {
            return false;
        };
        if object.is_drag_locked() {
            return false;
        }
        object.set_translation(state.translation_for(&object.origin, self.policy.vertical_fallback_m));
        true
    }

    /// Geographic point for a world translation under the current reference.
    pub fn geo_for_translation(&self, translation: Vec3, previous: &GeoPoint) -> Option<GeoPoint> {
        self.state
            .as_ref()
            .map(|state| state.geo_for_translation(translation, previous))
    }

    /// Session reset: forget the reference and every buffered fix.
    pub fn reset(&mut self) {
        *self = Self::new(self.policy);
    }
}

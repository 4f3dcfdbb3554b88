use bevy::prelude::*;
use constants::gesture::{
    DEFAULT_ROTATE_RADIANS_PER_PX, DEFAULT_SCALE_PER_PX, DEFAULT_TRANSLATE_METERS_PER_PX,
    MIN_OBJECT_SCALE,
};
use serde::{Deserialize, Serialize};

use crate::engine::camera::CameraPose;
use crate::engine::scene::{DragLock, ObjectId, PlacedObject, PlacementAdjustment};

/// What a vertical drag does to the attached object.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransformMode {
    /// Move along the camera's ground-forward direction.
    #[default]
    Translate,
    /// Uniform scale.
    Scale,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragSettings {
    pub rotate_radians_per_px: f32,
    pub translate_meters_per_px: f32,
    pub scale_per_px: f32,
}

impl Default for DragSettings {
    fn default() -> Self {
        Self {
            rotate_radians_per_px: DEFAULT_ROTATE_RADIANS_PER_PX,
            translate_meters_per_px: DEFAULT_TRANSLATE_METERS_PER_PX,
            scale_per_px: DEFAULT_SCALE_PER_PX,
        }
    }
}

/// Object state captured when a drag starts. Moves are applied relative to it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragBaseline {
    pub point: Vec2,
    pub translation: Vec3,
    pub adjustment: PlacementAdjustment,
    pub forward: Vec3,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum TransformState {
    #[default]
    Detached,
    AttachedIdle {
        target: ObjectId,
    },
    Dragging {
        target: ObjectId,
        baseline: DragBaseline,
    },
}

/// Change applied by one drag move, relative to the drag start.
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct DragDelta {
    pub target: ObjectId,
    pub mode: TransformMode,
    /// Pointer displacement from the drag start, pixels.
    pub pixels: Vec2,
    pub yaw: f32,
    pub scale: f32,
    pub translation: Vec3,
}

/// Attach and detach notifications, so drag locks can be released by the owner.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransformTargetChanged {
    pub previous: Option<ObjectId>,
    pub current: Option<ObjectId>,
}

/// Marks the entity drawn as the manipulation gizmo.
#[derive(Component)]
pub struct TransformGizmo;

/// Drag-to-transform state machine for at most one attached object.
#[derive(Resource, Debug, Clone, Default)]
pub struct TransformController {
    state: TransformState,
    mode: TransformMode,
    settings: DragSettings,
    gizmo_rotation: Quat,
}

impl TransformController {
    pub fn new(settings: DragSettings) -> Self {
        Self {
            settings,
            ..default()
        }
    }

    pub fn state(&self) -> TransformState {
        self.state
    }

    pub fn mode(&self) -> TransformMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: TransformMode) {
        if self.mode != mode {
            debug!("Transform mode {:?} -> {:?}", self.mode, mode);
            self.mode = mode;
        }
    }

    pub fn target(&self) -> Option<ObjectId> {
        match self.state {
            TransformState::Detached => None,
            TransformState::AttachedIdle { target } | TransformState::Dragging { target, .. } => {
                Some(target)
            }
        }
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, TransformState::Dragging { .. })
    }

    pub fn gizmo_rotation(&self) -> Quat {
        self.gizmo_rotation
    }

    /// Attach to `id`, detaching any other target first. Returns the detached
    /// target so its drag lock can be released.
    pub fn attach(&mut self, id: ObjectId) -> Option<ObjectId> {
        if self.target() == Some(id) {
            return None;
        }
        let previous = self.detach();
        self.state = TransformState::AttachedIdle { target: id };
        previous
    }

    pub fn detach(&mut self) -> Option<ObjectId> {
        let previous = self.target();
        self.state = TransformState::Detached;
        previous
    }

    /// AttachedIdle -> Dragging. Locks the object against recalibration.
    pub fn handle_gesture_start(
        &mut self,
        point: Vec2,
        object: &mut PlacedObject,
        camera: &CameraPose,
    ) -> bool {
        let TransformState::AttachedIdle { target } = self.state else {
            return false;
        };
        if target != object.id {
            return false;
        }
        let Some(transform) = object.current_transform else {
            return false;
        };

        self.state = TransformState::Dragging {
            target,
            baseline: DragBaseline {
                point,
                translation: transform.translation,
                adjustment: object.adjustment,
                forward: camera.ground_forward(),
            },
        };
        object.drag_lock = DragLock::LockedByDrag;
        true
    }

    /// Apply the displacement from the drag start. Calling twice with the same
    /// point leaves the object unchanged.
    pub fn handle_gesture_move(&mut self, point: Vec2, object: &mut PlacedObject) -> Option<DragDelta> {
        let TransformState::Dragging { target, baseline } = self.state else {
            return None;
        };
        if target != object.id {
            return None;
        }

        let pixels = point - baseline.point;
        // Screen Y grows downwards: dragging up pushes away or grows
        let push = -pixels.y;
        let yaw = baseline.adjustment.yaw + pixels.x * self.settings.rotate_radians_per_px;

        let (translation, scale) = match self.mode {
            TransformMode::Translate => (
                baseline.translation + baseline.forward * push * self.settings.translate_meters_per_px,
                baseline.adjustment.scale,
            ),
            TransformMode::Scale => (
                baseline.translation,
                (baseline.adjustment.scale + push * self.settings.scale_per_px).max(MIN_OBJECT_SCALE),
            ),
        };

        object.adjustment = PlacementAdjustment { yaw, scale };
        object.set_translation(translation);

        Some(DragDelta {
            target,
            mode: self.mode,
            pixels,
            yaw,
            scale,
            translation,
        })
    }

    /// Dragging -> AttachedIdle. Returns the final translation when the drag
    /// moved the object, for committing back to its geographic origin.
    pub fn handle_gesture_end(&mut self, object: &mut PlacedObject) -> Option<Vec3> {
        let TransformState::Dragging { target, baseline } = self.state else {
            return None;
        };
        if target != object.id {
            return None;
        }

        self.state = TransformState::AttachedIdle { target };
        object.drag_lock = DragLock::Free;

        object
            .current_transform
            .map(|t| t.translation)
            .filter(|translation| *translation != baseline.translation)
    }

    /// Same as [`Self::handle_gesture_end`]: the last applied delta is kept.
    pub fn handle_gesture_cancel(&mut self, object: &mut PlacedObject) -> Option<Vec3> {
        self.handle_gesture_end(object)
    }

    /// Turn the gizmo to face the camera across the ground plane.
    pub fn update(&mut self, camera: &CameraPose, target_translation: Vec3) {
        if self.state == TransformState::Detached {
            return;
        }
        let eye = Vec3::new(camera.position.x, target_translation.y, camera.position.z);
        self.gizmo_rotation = Transform::from_translation(target_translation)
            .looking_at(eye, Vec3::Y)
            .rotation;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::geo::GeoPoint;
    use crate::engine::scene::ObjectKind;
    use approx::assert_abs_diff_eq;

    fn placed(id: u64) -> PlacedObject {
        let mut object = PlacedObject::new(ObjectId(id), ObjectKind::default(), GeoPoint::new(0.0, 0.0));
        object.set_translation(Vec3::new(0.0, 0.0, -5.0));
        object
    }

    fn dragging(object: &mut PlacedObject) -> TransformController {
        let mut controller = TransformController::default();
        controller.attach(object.id);
        assert!(controller.handle_gesture_start(Vec2::new(100.0, 100.0), object, &CameraPose::default()));
        controller
    }

    #[test]
    fn attaching_a_second_object_detaches_the_first() {
        let mut controller = TransformController::default();
        assert_eq!(controller.attach(ObjectId(1)), None);
        assert_eq!(controller.attach(ObjectId(2)), Some(ObjectId(1)));
        assert_eq!(controller.target(), Some(ObjectId(2)));
        assert_eq!(controller.attach(ObjectId(2)), None);
    }

    #[test]
    fn gestures_while_detached_are_noops() {
        let mut controller = TransformController::default();
        let mut object = placed(1);
        let before = object.clone();

        assert!(!controller.handle_gesture_start(Vec2::ZERO, &mut object, &CameraPose::default()));
        assert_eq!(controller.handle_gesture_move(Vec2::new(50.0, 0.0), &mut object), None);
        assert_eq!(controller.handle_gesture_end(&mut object), None);
        assert_eq!(object.current_transform, before.current_transform);
        assert_eq!(object.drag_lock, DragLock::Free);
    }

    #[test]
    fn drag_start_locks_and_end_releases() {
        let mut object = placed(1);
        let mut controller = dragging(&mut object);
        assert!(object.is_drag_locked());
        assert!(controller.is_dragging());

        controller.handle_gesture_end(&mut object);
        assert!(!object.is_drag_locked());
        assert_eq!(controller.state(), TransformState::AttachedIdle { target: ObjectId(1) });
    }

    #[test]
    fn repeated_move_to_same_point_is_idempotent() {
        let mut object = placed(1);
        let mut controller = dragging(&mut object);

        let first = controller.handle_gesture_move(Vec2::new(130.0, 60.0), &mut object);
        let after_first = object.current_transform;
        let second = controller.handle_gesture_move(Vec2::new(130.0, 60.0), &mut object);

        assert_eq!(first, second);
        assert_eq!(object.current_transform, after_first);
    }

    #[test]
    fn horizontal_drag_rotates_vertical_drag_pushes_forward() {
        let mut object = placed(1);
        let mut controller = dragging(&mut object);

        let delta = controller
            .handle_gesture_move(Vec2::new(150.0, 50.0), &mut object)
            .unwrap();
        assert_abs_diff_eq!(delta.yaw, 50.0 * DEFAULT_ROTATE_RADIANS_PER_PX, epsilon = 1e-6);
        // 50 px up moves away from the camera along -Z
        assert_abs_diff_eq!(
            delta.translation.z,
            -5.0 - 50.0 * DEFAULT_TRANSLATE_METERS_PER_PX,
            epsilon = 1e-5
        );
        assert_eq!(object.current_transform.unwrap().translation, delta.translation);
    }

    #[test]
    fn scale_mode_scales_and_clamps() {
        let mut object = placed(1);
        let mut controller = TransformController::default();
        controller.set_mode(TransformMode::Scale);
        controller.attach(ObjectId(1));
        controller.handle_gesture_start(Vec2::new(0.0, 500.0), &mut object, &CameraPose::default());

        let grow = controller.handle_gesture_move(Vec2::new(0.0, 400.0), &mut object).unwrap();
        assert_abs_diff_eq!(grow.scale, 1.0 + 100.0 * DEFAULT_SCALE_PER_PX, epsilon = 1e-6);
        assert_eq!(grow.translation, Vec3::new(0.0, 0.0, -5.0));

        let shrink = controller.handle_gesture_move(Vec2::new(0.0, 10_000.0), &mut object).unwrap();
        assert_eq!(shrink.scale, MIN_OBJECT_SCALE);
    }

    #[test]
    fn cancel_keeps_the_last_delta() {
        let mut object = placed(1);
        let mut controller = dragging(&mut object);
        controller.handle_gesture_move(Vec2::new(100.0, 0.0), &mut object);
        let moved = object.current_transform;

        let committed = controller.handle_gesture_cancel(&mut object);
        assert_eq!(object.current_transform, moved);
        assert_eq!(committed, moved.map(|t| t.translation));
        assert!(!object.is_drag_locked());
    }

    #[test]
    fn rotate_only_drag_commits_nothing() {
        let mut object = placed(1);
        let mut controller = dragging(&mut object);
        controller.handle_gesture_move(Vec2::new(180.0, 100.0), &mut object);
        assert_eq!(controller.handle_gesture_end(&mut object), None);
    }

    #[test]
    fn update_is_a_noop_when_detached() {
        let mut controller = TransformController::default();
        controller.update(&CameraPose::default(), Vec3::new(3.0, 0.0, 0.0));
        assert_eq!(controller.gizmo_rotation(), Quat::IDENTITY);

        controller.attach(ObjectId(1));
        controller.update(&CameraPose::default(), Vec3::new(0.0, 0.0, -5.0));
        // Facing the camera means -Z points back towards +Z
        let facing = controller.gizmo_rotation() * Vec3::NEG_Z;
        assert_abs_diff_eq!(facing.z, 1.0, epsilon = 1e-5);
    }
}

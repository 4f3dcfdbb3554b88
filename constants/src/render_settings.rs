use bevy::prelude::*;

/// Radius of the sphere drawn under an active touch.
pub const TOUCH_MARKER_RADIUS: f32 = 0.02;

/// Distance along the touch ray at which the marker is drawn (metres).
pub const TOUCH_MARKER_DISTANCE: f32 = 0.5;

pub const TOUCH_MARKER_COLOUR: Color = Color::srgb(0.2, 0.8, 1.0);

/// Wireframe colour of a selected object.
pub const SELECTED_COLOUR: Color = Color::srgb(1.0, 0.0, 0.0);

/// Vertical field of view used when the camera exposes no perspective projection (radians).
pub const DEFAULT_FOV_Y: f32 = std::f32::consts::FRAC_PI_4;

/// Default edge length of a placed object's bounding box (metres).
pub const DEFAULT_OBJECT_SIZE: f32 = 1.0;

/// Ring drawn around the object attached to the transform controller.
pub const GIZMO_MAJOR_RADIUS: f32 = 0.75;
pub const GIZMO_MINOR_RADIUS: f32 = 0.02;
pub const GIZMO_COLOUR: Color = Color::srgb(1.0, 0.85, 0.1);

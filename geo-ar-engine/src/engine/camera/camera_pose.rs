use bevy::prelude::*;
use constants::render_settings::DEFAULT_FOV_Y;

use crate::engine::geo::camera_yaw_degrees;

/// Marks the camera entity whose transform is the device pose.
#[derive(Component, Default)]
pub struct ArCamera;

/// Device camera pose in the world frame, refreshed every frame from the
/// rendering surface. Read-only to the engine.
#[derive(Resource, Debug, Clone, Copy, PartialEq)]
pub struct CameraPose {
    pub position: Vec3,
    pub orientation: Quat,
    /// Vertical field of view in radians.
    pub fov_y: f32,
}

impl Default for CameraPose {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            orientation: Quat::IDENTITY,
            fov_y: DEFAULT_FOV_Y,
        }
    }
}

impl CameraPose {
    pub fn new(position: Vec3, orientation: Quat) -> Self {
        Self {
            position,
            orientation,
            ..default()
        }
    }

    pub fn with_fov(mut self, fov_y: f32) -> Self {
        self.fov_y = fov_y;
        self
    }

    pub fn forward(&self) -> Vec3 {
        self.orientation * Vec3::NEG_Z
    }

    /// Forward direction flattened onto the ground plane. Falls back to world -Z
    /// when the camera looks straight up or down.
    pub fn ground_forward(&self) -> Vec3 {
        let yaw = (camera_yaw_degrees(self.orientation) as f32).to_radians();
        Vec3::new(yaw.sin(), 0.0, -yaw.cos())
    }

    /// Ray from the camera through a pixel, for a viewport of `viewport_size` pixels
    /// with the origin at the top-left corner.
    pub fn viewport_to_ray(&self, cursor_pos: Vec2, viewport_size: Vec2) -> Option<Ray3d> {
        if viewport_size.x <= 0.0 || viewport_size.y <= 0.0 {
            return None;
        }

        // Pixel space to normalised device coordinates, +Y up
        let ndc = Vec2::new(
            cursor_pos.x / viewport_size.x * 2.0 - 1.0,
            1.0 - cursor_pos.y / viewport_size.y * 2.0,
        );

        let half_height = (self.fov_y * 0.5).tan();
        let aspect = viewport_size.x / viewport_size.y;
        let local = Vec3::new(ndc.x * half_height * aspect, ndc.y * half_height, -1.0);
        let direction = Dir3::new(self.orientation * local).ok()?;

        Some(Ray3d::new(self.position, direction))
    }
}

/// Copies the `ArCamera` transform (and perspective fov, if any) into [`CameraPose`].
pub fn sync_camera_pose(
    cameras: Query<(&Transform, Option<&Projection>), With<ArCamera>>,
    mut pose: ResMut<CameraPose>,
) {
    let Ok((transform, projection)) = cameras.single() else {
        return;
    };

    let fov_y = match projection {
        Some(Projection::Perspective(perspective)) => perspective.fov,
        _ => pose.fov_y,
    };

    let next = CameraPose {
        position: transform.translation,
        orientation: transform.rotation,
        fov_y,
    };
    if *pose != next {
        *pose = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn centre_pixel_looks_forward() {
        let pose = CameraPose::default();
        let ray = pose
            .viewport_to_ray(Vec2::new(400.0, 300.0), Vec2::new(800.0, 600.0))
            .unwrap();
        assert_abs_diff_eq!(ray.direction.x, 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(ray.direction.y, 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(ray.direction.z, -1.0, epsilon = 1e-6);
    }

    #[test]
    fn top_left_pixel_points_up_and_left() {
        let pose = CameraPose::default();
        let ray = pose
            .viewport_to_ray(Vec2::ZERO, Vec2::new(800.0, 600.0))
            .unwrap();
        assert!(ray.direction.x < 0.0);
        assert!(ray.direction.y > 0.0);
    }

    #[test]
    fn empty_viewport_has_no_ray() {
        let pose = CameraPose::default();
        assert!(pose.viewport_to_ray(Vec2::ZERO, Vec2::ZERO).is_none());
    }

    #[test]
    fn ground_forward_ignores_pitch() {
        let pose = CameraPose::new(Vec3::ZERO, Quat::from_rotation_x(-0.4));
        let forward = pose.ground_forward();
        assert_abs_diff_eq!(forward.y, 0.0);
        assert_abs_diff_eq!(forward.z, -1.0, epsilon = 1e-6);
    }
}

//! Device camera pose used for world-heading derivation and touch rays.

/// Camera pose resource, marker component and sync system.
pub mod camera_pose;

pub use camera_pose::{ArCamera, CameraPose, sync_camera_pose};

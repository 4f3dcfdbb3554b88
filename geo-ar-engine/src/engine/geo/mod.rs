//! Geographic data model and the stateless GeoFrame conversions.
//!
//! All positions are expressed relative to a reference fix in a camera-centred
//! world frame: +X right, +Y up, forward is -Z. A heading is the compass bearing
//! of the world -Z axis, so an object due north of the reference at heading 0°
//! lands on the negative Z axis.

/// Stateless conversions between geographic coordinates and the local world frame.
pub mod frame;

/// Location and heading fixes as delivered by the device sensors.
pub mod types;

pub use frame::{
    bearing_and_distance, camera_yaw_degrees, from_local_offset, to_local_offset,
    vertical_offset, world_heading,
};
pub use types::{GeoPoint, Heading, heading_difference, normalize_degrees};

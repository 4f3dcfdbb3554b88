use bevy::math::{Quat, Vec3};
use constants::coordinate_system::{COINCIDENT_DISTANCE_M, EARTH_RADIUS_M, enu_to_world};

use super::types::{GeoPoint, normalize_degrees};

/// East/north displacement in metres from `from` to `to` (equirectangular, accurate below ~1 km).
fn east_north(from: &GeoPoint, to: &GeoPoint) -> (f64, f64) {
    let origin_lat = from.latitude.to_radians();
    // Shortest way round the antimeridian
    let d_lon = (to.longitude - from.longitude + 540.0).rem_euclid(360.0) - 180.0;
    let d_lat = to.latitude - from.latitude;

    let east = d_lon.to_radians() * EARTH_RADIUS_M * origin_lat.cos();
    let north = d_lat.to_radians() * EARTH_RADIUS_M;
    (east, north)
}

/// Compass bearing (degrees clockwise from north) and ground distance (metres).
/// Coincident points return (0, 0).
pub fn bearing_and_distance(from: &GeoPoint, to: &GeoPoint) -> (f64, f64) {
    let (east, north) = east_north(from, to);
    let distance = east.hypot(north);
    if distance < COINCIDENT_DISTANCE_M {
        return (0.0, 0.0);
    }
    (normalize_degrees(east.atan2(north).to_degrees()), distance)
}

/// Project `to` onto the ground plane of a frame centred on `from` whose -Z axis
/// points along `heading_degrees`. Returns world (x, z).
pub fn to_local_offset(from: &GeoPoint, to: &GeoPoint, heading_degrees: f64) -> (f64, f64) {
    let (east, north) = east_north(from, to);
    if east.hypot(north) < COINCIDENT_DISTANCE_M {
        return (0.0, 0.0);
    }

    // Rotate ENU by -heading so the heading direction becomes "north" in the local frame
    let (sin, cos) = heading_degrees.to_radians().sin_cos();
    let right = east * cos - north * sin;
    let forward = east * sin + north * cos;

    let (x, _, z) = enu_to_world(right, forward, 0.0);
    (x, z)
}

/// Inverse of [`to_local_offset`]: the geographic point at world offset (x, z)
/// from `from`. Altitude, accuracy and timestamp are carried over from `from`.
pub fn from_local_offset(from: &GeoPoint, offset: (f64, f64), heading_degrees: f64) -> GeoPoint {
    let (right, forward) = (offset.0, -offset.1);
    let (sin, cos) = heading_degrees.to_radians().sin_cos();
    let east = right * cos + forward * sin;
    let north = forward * cos - right * sin;

    let cos_lat = from.latitude.to_radians().cos().max(1e-12);
    let latitude = from.latitude + (north / EARTH_RADIUS_M).to_degrees();
    let longitude = from.longitude + (east / (EARTH_RADIUS_M * cos_lat)).to_degrees();

    GeoPoint {
        latitude,
        longitude: (longitude + 540.0).rem_euclid(360.0) - 180.0,
        ..*from
    }
}

/// Height of `to` above `from`. Falls back to `fallback` metres (relative to the
/// camera eye level) when either altitude is unknown.
pub fn vertical_offset(from: &GeoPoint, to: &GeoPoint, fallback: f64) -> f64 {
    match (from.altitude, to.altitude) {
        (Some(reference), Some(target)) => target - reference,
        _ => fallback,
    }
}

/// Camera yaw in degrees, clockwise seen from above, measured from world -Z.
pub fn camera_yaw_degrees(orientation: Quat) -> f64 {
    let mut forward = orientation * Vec3::NEG_Z;
    if forward.x.hypot(forward.z) < 1e-4 {
        // Looking straight down (or up): the top edge of the device points along the view
        let up = orientation * Vec3::Y;
        forward = if forward.y < 0.0 { up } else { -up };
    }
    normalize_degrees((forward.x as f64).atan2(-forward.z as f64).to_degrees())
}

/// Compass bearing of the world -Z axis, given the device heading and the camera
/// orientation in the world frame at the moment the heading was read.
pub fn world_heading(device_heading_degrees: f64, camera_orientation: Quat) -> f64 {
    normalize_degrees(device_heading_degrees - camera_yaw_degrees(camera_orientation))
}

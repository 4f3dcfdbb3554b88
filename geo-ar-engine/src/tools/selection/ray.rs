use bevy::prelude::*;

use crate::engine::scene::PickBounds;

/// Ray against a box given in the local space of `world_from_local`. Returns
/// the world ray parameter of the nearest hit in front of the origin.
pub fn ray_hits_obb(ray: Ray3d, world_from_local: Mat4, bounds: &PickBounds) -> Option<f32> {
    // Zero-scale objects cannot be hit
    if world_from_local.determinant().abs() < f32::EPSILON {
        return None;
    }

    let local_from_world = world_from_local.inverse();
    let origin = local_from_world.transform_point3(ray.origin);
    let direction = local_from_world.transform_vector3(ray.direction.as_vec3());
    ray_aabb_hit_t(
        origin,
        direction,
        bounds.center - bounds.half_extents,
        bounds.center + bounds.half_extents,
    )
}

// Slab-method ray–AABB intersection, returns Some(t) or None
pub fn ray_aabb_hit_t(ray_origin: Vec3, ray_direction: Vec3, min: Vec3, max: Vec3) -> Option<f32> {
    let mut t_near = f32::NEG_INFINITY;
    let mut t_far = f32::INFINITY;

    for axis in 0..3 {
        let (o, d) = (ray_origin[axis], ray_direction[axis]);
        if d == 0.0 {
            // Parallel to this slab: must already be inside it
            if o < min[axis] || o > max[axis] {
                return None;
            }
            continue;
        }

        let inv = 1.0 / d;
        let (mut t0, mut t1) = ((min[axis] - o) * inv, (max[axis] - o) * inv);
        if t0 > t1 {
            std::mem::swap(&mut t0, &mut t1);
        }
        t_near = t_near.max(t0);
        t_far = t_far.min(t1);
        if t_near > t_far {
            return None;
        }
    }

    if t_far < 0.0 {
        return None;
    }
    Some(if t_near >= 0.0 { t_near } else { t_far })
}

use bevy::prelude::*;

use super::ray::ray_hits_obb;
use crate::engine::camera::CameraPose;
use crate::engine::scene::{ObjectId, PickBounds, PlacedObject};

/// One node of an object's pick hierarchy: an optional oriented box and the
/// sub-meshes below it.
#[derive(Debug, Clone, Default)]
pub struct PickNode {
    pub volume: Option<(Mat4, PickBounds)>,
    pub children: Vec<PickNode>,
}

impl PickNode {
    pub fn leaf(world_from_local: Mat4, bounds: PickBounds) -> Self {
        Self {
            volume: Some((world_from_local, bounds)),
            children: Vec::new(),
        }
    }

    /// Nearest hit over this node and all of its descendants.
    fn nearest_hit(&self, ray: Ray3d) -> Option<f32> {
        let own = self
            .volume
            .as_ref()
            .and_then(|(world, bounds)| ray_hits_obb(ray, *world, bounds));

        self.children
            .iter()
            .filter_map(|child| child.nearest_hit(ray))
            .chain(own)
            .min_by(f32::total_cmp)
    }
}

#[derive(Debug, Clone)]
pub struct PickCandidate<H> {
    pub handle: H,
    pub root: PickNode,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PickHit<H> {
    pub handle: H,
    /// Distance along the (unit) touch ray.
    pub t: f32,
}

/// Nearest candidate under a touch point. Equal distances resolve to the
/// smaller handle, so the result never depends on candidate order.
pub fn pick<H: Copy + Ord>(
    touch_point: Vec2,
    viewport_size: Vec2,
    camera: &CameraPose,
    candidates: &[PickCandidate<H>],
) -> Option<PickHit<H>> {
    let ray = camera.viewport_to_ray(touch_point, viewport_size)?;
    pick_along_ray(ray, candidates)
}

pub fn pick_along_ray<H: Copy + Ord>(ray: Ray3d, candidates: &[PickCandidate<H>]) -> Option<PickHit<H>> {
    candidates
        .iter()
        .filter_map(|candidate| {
            candidate.root.nearest_hit(ray).map(|t| PickHit {
                handle: candidate.handle,
                t,
            })
        })
        .min_by(|a, b| a.t.total_cmp(&b.t).then(a.handle.cmp(&b.handle)))
}

/// Read access to the pick boxes of object sub-meshes.
pub type PickHierarchy<'w, 's> =
    Query<'w, 's, (Option<&'static Transform>, Option<&'static PickBounds>, Option<&'static Children>)>;

fn pick_node(
    world_from_local: Mat4,
    bounds: Option<&PickBounds>,
    children: Option<&Children>,
    hierarchy: &PickHierarchy,
) -> PickNode {
    let mut node = PickNode {
        volume: bounds.map(|b| (world_from_local, *b)),
        children: Vec::new(),
    };

    if let Some(children) = children {
        let kids: &[Entity] = children;
        for &child in kids {
            let Ok((transform, child_bounds, grandchildren)) = hierarchy.get(child) else {
                continue;
            };
            let local = transform.map_or(Mat4::IDENTITY, Transform::compute_matrix);
            node.children.push(pick_node(
                world_from_local * local,
                child_bounds,
                grandchildren,
                hierarchy,
            ));
        }
    }
    node
}

/// Build candidates for every placed object. Roots use the cached placement so
/// picking sees the same pose recalibration produced this frame.
pub fn collect_pick_candidates<'a>(
    objects: impl IntoIterator<Item = (Entity, &'a PlacedObject)>,
    hierarchy: &PickHierarchy,
) -> Vec<PickCandidate<ObjectId>> {
    objects
        .into_iter()
        .filter_map(|(entity, object)| {
            let placed = object.current_transform?;
            let (bounds, children) = match hierarchy.get(entity) {
                Ok((_, bounds, children)) => (bounds, children),
                Err(_) => (None, None),
            };
            Some(PickCandidate {
                handle: object.id,
                root: pick_node(placed.compute_matrix(), bounds, children, hierarchy),
            })
        })
        .collect()
}

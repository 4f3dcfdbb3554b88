use bevy::prelude::*;
use constants::render_settings::DEFAULT_OBJECT_SIZE;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::engine::geo::GeoPoint;

/// Stable identifier of a placed object. Gesture sessions and events refer to
/// objects through this id, never through the entity itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectId(pub u64);

impl ObjectId {
    /// Kept out of circulation so the id counter can never wrap.
    pub const RESERVED: ObjectId = ObjectId(u64::MAX);
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "object#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeometryKind {
    #[default]
    Box,
    Sphere,
    Cylinder,
    Cone,
    Torus,
    /// Map pin used for saved places.
    Place,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaterialKind {
    #[default]
    Standard,
    Basic,
    Normal,
    Wireframe,
}

/// Geometry/material pair describing what an object looks like.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ObjectKind {
    #[serde(default)]
    pub geometry: GeometryKind,
    #[serde(default)]
    pub material: MaterialKind,
}

impl ObjectKind {
    pub fn new(geometry: GeometryKind, material: MaterialKind) -> Self {
        Self { geometry, material }
    }

    pub fn place() -> Self {
        Self::new(GeometryKind::Place, MaterialKind::Standard)
    }

    /// Parse "geometry" or "geometry/material", e.g. `"sphere/wireframe"`.
    pub fn from_string(s: &str) -> Option<Self> {
        let mut parts = s.split('/');
        let geometry = match parts.next()?.trim().to_lowercase().as_str() {
            "box" | "cube" => GeometryKind::Box,
            "sphere" => GeometryKind::Sphere,
            "cylinder" => GeometryKind::Cylinder,
            "cone" => GeometryKind::Cone,
            "torus" => GeometryKind::Torus,
            "place" => GeometryKind::Place,
            _ => return None,
        };
        let material = match parts.next().map(|m| m.trim().to_lowercase()) {
            None => MaterialKind::Standard,
            Some(m) => match m.as_str() {
                "standard" => MaterialKind::Standard,
                "basic" => MaterialKind::Basic,
                "normal" => MaterialKind::Normal,
                "wireframe" => MaterialKind::Wireframe,
                _ => return None,
            },
        };
        Some(Self { geometry, material })
    }

    /// Half extents of the object's pick box at unit scale.
    pub fn half_extents(&self) -> Vec3 {
        let half = DEFAULT_OBJECT_SIZE * 0.5;
        match self.geometry {
            GeometryKind::Place => Vec3::new(half * 0.5, half * 2.0, half * 0.5),
            GeometryKind::Torus => Vec3::new(half, half * 0.4, half),
            _ => Vec3::splat(half),
        }
    }
}

/// User rotate/scale edits, kept apart from the geo-derived translation so a
/// recalibration never overwrites them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacementAdjustment {
    /// Rotation about the vertical axis, radians.
    pub yaw: f32,
    pub scale: f32,
}

impl Default for PlacementAdjustment {
    fn default() -> Self {
        Self { yaw: 0.0, scale: 1.0 }
    }
}

/// Whether an active drag owns the object's transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DragLock {
    #[default]
    Free,
    LockedByDrag,
}

/// A virtual object anchored to a geographic location. Lives on the object's
/// scene entity; the entity is the scene handle.
#[derive(Component, Debug, Clone)]
pub struct PlacedObject {
    pub id: ObjectId,
    pub kind: ObjectKind,
    pub origin: GeoPoint,
    /// Cached world transform. `None` until the first calibration.
    pub current_transform: Option<Transform>,
    pub adjustment: PlacementAdjustment,
    pub drag_lock: DragLock,
}

impl PlacedObject {
    pub fn new(id: ObjectId, kind: ObjectKind, origin: GeoPoint) -> Self {
        Self {
            id,
            kind,
            origin,
            current_transform: None,
            adjustment: PlacementAdjustment::default(),
            drag_lock: DragLock::Free,
        }
    }

    pub fn is_drag_locked(&self) -> bool {
        self.drag_lock == DragLock::LockedByDrag
    }

    pub fn is_placed(&self) -> bool {
        self.current_transform.is_some()
    }

    /// Recompose the cached transform from a geo-derived translation and the
    /// object's own adjustment.
    pub fn set_translation(&mut self, translation: Vec3) {
        self.current_transform = Some(
            Transform::from_translation(translation)
                .with_rotation(Quat::from_rotation_y(self.adjustment.yaw))
                .with_scale(Vec3::splat(self.adjustment.scale)),
        );
    }
}

/// Axis-aligned pick box in the entity's local space. Sub-mesh children may
/// carry their own box; picking walks the whole hierarchy.
#[derive(Component, Debug, Clone, Copy)]
pub struct PickBounds {
    pub center: Vec3,
    pub half_extents: Vec3,
}

impl PickBounds {
    pub fn from_half_extents(half_extents: Vec3) -> Self {
        Self {
            center: Vec3::ZERO,
            half_extents,
        }
    }
}

/// Marker for the currently selected object's entity.
#[derive(Component)]
pub struct Selected;

/// Id lookup into the live object set.
#[derive(Resource, Default, Debug)]
pub struct ObjectTable {
    entities: HashMap<ObjectId, Entity>,
    /// Handed out but not spawned yet.
    pending: HashSet<ObjectId>,
    next_id: u64,
}

impl ObjectTable {
    /// Reserve an id. Explicit ids from loaded collections bump the counter past them.
    pub fn allocate(&mut self, requested: Option<ObjectId>) -> ObjectId {
        let id = match requested {
            Some(id) => {
                self.next_id = self.next_id.max(id.0.saturating_add(1));
                id
            }
            None => {
                let id = ObjectId(self.next_id);
                self.next_id = self.next_id.saturating_add(1);
                id
            }
        };
        self.pending.insert(id);
        id
    }

    pub fn insert(&mut self, id: ObjectId, entity: Entity) {
        self.pending.remove(&id);
        self.entities.insert(id, entity);
    }

    /// Give back an id whose spawn never happened.
    pub fn release(&mut self, id: ObjectId) {
        self.pending.remove(&id);
    }

    pub fn remove(&mut self, id: ObjectId) -> Option<Entity> {
        self.entities.remove(&id)
    }

    pub fn entity(&self, id: ObjectId) -> Option<Entity> {
        self.entities.get(&id).copied()
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.entities.contains_key(&id)
    }

    /// Spawned, or allocated for a spawn later this frame.
    pub fn is_taken(&self, id: ObjectId) -> bool {
        self.contains(id) || self.pending.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Forget every object; ids keep increasing across resets.
    pub fn clear(&mut self) -> Vec<Entity> {
        self.pending.clear();
        self.entities.drain().map(|(_, e)| e).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_parses_geometry_and_material() {
        assert_eq!(
            ObjectKind::from_string("Sphere/wireframe"),
            Some(ObjectKind::new(GeometryKind::Sphere, MaterialKind::Wireframe))
        );
        assert_eq!(ObjectKind::from_string("cube"), Some(ObjectKind::default()));
        assert_eq!(ObjectKind::from_string("teapot"), None);
        assert_eq!(ObjectKind::from_string("box/chrome"), None);
    }

    #[test]
    fn allocated_ids_skip_past_explicit_ones() {
        let mut table = ObjectTable::default();
        assert_eq!(table.allocate(None), ObjectId(0));
        assert_eq!(table.allocate(Some(ObjectId(10))), ObjectId(10));
        assert_eq!(table.allocate(None), ObjectId(11));
    }

    #[test]
    fn largest_requested_id_does_not_wrap_the_counter() {
        let mut table = ObjectTable::default();
        assert_eq!(table.allocate(Some(ObjectId(u64::MAX - 1))), ObjectId(u64::MAX - 1));
        assert_eq!(table.allocate(Some(ObjectId::RESERVED)), ObjectId::RESERVED);
        assert_eq!(table.allocate(None), ObjectId::RESERVED);
        assert!(!table.is_taken(ObjectId(0)));
    }

    #[test]
    fn allocated_ids_are_taken_until_released() {
        let mut table = ObjectTable::default();
        let id = table.allocate(Some(ObjectId(7)));
        assert!(table.is_taken(id));
        assert!(!table.contains(id));

        table.insert(id, Entity::PLACEHOLDER);
        assert!(table.contains(id));

        let other = table.allocate(None);
        table.release(other);
        assert!(!table.is_taken(other));
    }

    #[test]
    fn set_translation_keeps_user_adjustment() {
        let mut object = PlacedObject::new(ObjectId(1), ObjectKind::default(), GeoPoint::new(0.0, 0.0));
        object.adjustment = PlacementAdjustment { yaw: 0.5, scale: 2.0 };
        object.set_translation(Vec3::new(1.0, 2.0, 3.0));

        let transform = object.current_transform.unwrap();
        assert_eq!(transform.translation, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(transform.scale, Vec3::splat(2.0));
        assert!(transform.rotation.angle_between(Quat::from_rotation_y(0.5)) < 1e-6);
    }
}

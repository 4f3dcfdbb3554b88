use bevy::prelude::*;
use constants::render_settings::{TOUCH_MARKER_COLOUR, TOUCH_MARKER_DISTANCE, TOUCH_MARKER_RADIUS};
use std::collections::HashMap;

use crate::engine::camera::CameraPose;

#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct TouchMarker {
    pub pointer_id: u64,
}

/// Shared marker mesh and material. Absent in apps without render assets.
#[derive(Resource, Clone)]
pub struct MarkerVisuals {
    pub mesh: Handle<Mesh>,
    pub material: Handle<StandardMaterial>,
}

/// One marker entity per active pointer, floating a fixed distance along the
/// touch ray. Purely cosmetic.
#[derive(Resource, Debug)]
pub struct TouchVisualizer {
    markers: HashMap<u64, Entity>,
    distance: f32,
}

impl Default for TouchVisualizer {
    fn default() -> Self {
        Self::new(TOUCH_MARKER_DISTANCE)
    }
}

impl TouchVisualizer {
    pub fn new(distance: f32) -> Self {
        Self {
            markers: HashMap::new(),
            distance,
        }
    }

    pub fn marker(&self, pointer_id: u64) -> Option<Entity> {
        self.markers.get(&pointer_id).copied()
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    pub fn marker_position(&self, camera: &CameraPose, point: Vec2, viewport: Vec2) -> Option<Vec3> {
        camera
            .viewport_to_ray(point, viewport)
            .map(|ray| ray.get_point(self.distance))
    }

    pub fn handle_gesture_start(
        &mut self,
        commands: &mut Commands,
        pointer_id: u64,
        position: Vec3,
        visuals: Option<&MarkerVisuals>,
    ) {
        if let Some(existing) = self.marker(pointer_id) {
            commands
                .entity(existing)
                .try_insert(Transform::from_translation(position));
            return;
        }

        let mut marker = commands.spawn((
            Name::new(format!("touch_marker_{}", pointer_id)),
            TouchMarker { pointer_id },
            Transform::from_translation(position),
            Visibility::default(),
        ));
        if let Some(visuals) = visuals {
            marker.insert((
                Mesh3d(visuals.mesh.clone()),
                MeshMaterial3d(visuals.material.clone()),
            ));
        }
        self.markers.insert(pointer_id, marker.id());
    }

    pub fn handle_gesture_move(&self, commands: &mut Commands, pointer_id: u64, position: Vec3) {
        if let Some(marker) = self.marker(pointer_id) {
            commands
                .entity(marker)
                .try_insert(Transform::from_translation(position));
        }
    }

    /// End or cancel: the marker goes away either way.
    pub fn handle_gesture_end(&mut self, commands: &mut Commands, pointer_id: u64) {
        if let Some(marker) = self.markers.remove(&pointer_id) {
            commands.entity(marker).try_despawn();
        }
    }

    pub fn clear(&mut self, commands: &mut Commands) {
        for (_, marker) in self.markers.drain() {
            commands.entity(marker).try_despawn();
        }
    }

    /// Forget markers without despawning; used when the world is torn down directly.
    pub fn take_markers(&mut self) -> Vec<Entity> {
        self.markers.drain().map(|(_, e)| e).collect()
    }
}

/// Build the shared marker visuals when render asset stores exist.
pub fn prepare_marker_visuals(
    mut commands: Commands,
    meshes: Option<ResMut<Assets<Mesh>>>,
    materials: Option<ResMut<Assets<StandardMaterial>>>,
) {
    let (Some(mut meshes), Some(mut materials)) = (meshes, materials) else {
        debug!("No render assets, touch markers stay invisible");
        return;
    };

    commands.insert_resource(MarkerVisuals {
        mesh: meshes.add(Sphere::new(TOUCH_MARKER_RADIUS)),
        material: materials.add(StandardMaterial {
            base_color: TOUCH_MARKER_COLOUR,
            emissive: LinearRgba::from(TOUCH_MARKER_COLOUR),
            unlit: true,
            ..default()
        }),
    });
}

use bevy::prelude::*;
use constants::render_settings::SELECTED_COLOUR;

use super::object::{
    GeometryKind, MaterialKind, ObjectId, ObjectKind, ObjectTable, PickBounds, PlacedObject,
};
use crate::engine::calibration::CalibrationController;
use crate::engine::camera::CameraPose;
use crate::engine::config::ArConfig;
use crate::engine::geo::GeoPoint;
use crate::tools::gesture::InteractionState;
use crate::tools::selection::SelectionChanged;

/// Request to add an object at a geographic location, from a loaded collection
/// or a user action.
#[derive(Event, Debug, Clone)]
pub struct SpawnPlacedObject {
    /// Explicit id, e.g. from storage. Allocated when `None`.
    pub id: Option<ObjectId>,
    pub kind: ObjectKind,
    pub origin: GeoPoint,
    pub name: Option<String>,
}

impl SpawnPlacedObject {
    pub fn new(kind: ObjectKind, origin: GeoPoint) -> Self {
        Self {
            id: None,
            kind,
            origin,
            name: None,
        }
    }

    pub fn with_id(mut self, id: ObjectId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

#[derive(Event, Debug, Clone, Copy)]
pub struct RemovePlacedObject(pub ObjectId);

/// Place a new object in front of the camera along the current heading.
#[derive(Event, Debug, Clone, Copy)]
pub struct PlaceObjectAhead {
    pub id: Option<ObjectId>,
    pub kind: ObjectKind,
    /// Falls back to [`ArConfig::place_ahead_distance_m`].
    pub distance_m: Option<f64>,
}

/// Despawn every object, clear selection and gestures, and start calibration over.
#[derive(Event, Debug, Clone, Copy, Default)]
pub struct ResetSession;

/// Convert "ahead" requests into geo-anchored spawn requests.
pub fn place_objects_ahead(
    mut requests: EventReader<PlaceObjectAhead>,
    controller: Res<CalibrationController>,
    camera: Res<CameraPose>,
    config: Res<ArConfig>,
    mut spawns: EventWriter<SpawnPlacedObject>,
    mut table: ResMut<ObjectTable>,
) {
    for request in requests.read() {
        let Some(state) = controller.state() else {
            warn!("Cannot place {:?} ahead: calibration not initialised", request.kind);
            if let Some(id) = request.id {
                table.release(id);
            }
            continue;
        };

        let distance = request.distance_m.unwrap_or(config.place_ahead_distance_m) as f32;
        let translation = camera.position + camera.ground_forward() * distance;
        // Unknown altitude so the object sits at the configured eye-level fallback
        let template = GeoPoint {
            altitude: None,
            ..state.reference_location
        };
        let origin = state.geo_for_translation(translation, &template);

        spawns.write(SpawnPlacedObject {
            id: request.id,
            kind: request.kind,
            origin,
            name: None,
        });
    }
}

pub fn spawn_placed_objects(
    mut commands: Commands,
    mut requests: EventReader<SpawnPlacedObject>,
    mut table: ResMut<ObjectTable>,
    controller: Res<CalibrationController>,
) {
    for request in requests.read() {
        if let Some(id) = request.id {
            if id == ObjectId::RESERVED {
                warn!("Ignoring spawn with reserved id {}", id);
                continue;
            }
            if table.contains(id) {
                warn!("Ignoring spawn of {}: id already in use", id);
                continue;
            }
        }

        let id = table.allocate(request.id);
        let mut object = PlacedObject::new(id, request.kind, request.origin);
        let placed = controller.place(&mut object);
        let transform = object.current_transform.unwrap_or_default();
        let visibility = if placed {
            Visibility::Inherited
        } else {
            Visibility::Hidden
        };
        let name = request
            .name
            .clone()
            .unwrap_or_else(|| format!("{:?} {}", request.kind.geometry, id));

        let entity = commands
            .spawn((
                Name::new(name),
                object,
                transform,
                visibility,
                PickBounds::from_half_extents(request.kind.half_extents()),
            ))
            .id();
        table.insert(id, entity);
        debug!(
            "Spawned {} at ({:.6}, {:.6}){}",
            id,
            request.origin.latitude,
            request.origin.longitude,
            if placed { "" } else { ", waiting for calibration" }
        );
    }
}

pub fn remove_placed_objects(
    mut commands: Commands,
    mut requests: EventReader<RemovePlacedObject>,
    mut table: ResMut<ObjectTable>,
    mut interaction: InteractionState,
    mut selection_events: EventWriter<SelectionChanged>,
) {
    for RemovePlacedObject(id) in requests.read() {
        let Some(entity) = table.remove(*id) else {
            warn!("Cannot remove {}: no such object", id);
            continue;
        };
        commands.entity(entity).despawn();
        if interaction.forget_object(*id) {
            selection_events.write(SelectionChanged(None));
        }
        info!("Removed {}", id);
    }
}

pub fn reset_session(
    mut commands: Commands,
    mut requests: EventReader<ResetSession>,
    mut table: ResMut<ObjectTable>,
    mut controller: ResMut<CalibrationController>,
    mut interaction: InteractionState,
    mut selection_events: EventWriter<SelectionChanged>,
) {
    if requests.is_empty() {
        return;
    }
    requests.clear();

    let entities = table.clear();
    let count = entities.len();
    for entity in entities {
        commands.entity(entity).despawn();
    }
    controller.reset();
    if interaction.clear() {
        selection_events.write(SelectionChanged(None));
    }
    info!("Session reset: {} objects removed", count);
}

/// Copy cached placements into `Transform`. Runs after every calibration step
/// so rendering never sees a partially recalibrated set.
pub fn publish_object_transforms(
    mut objects: Query<(&PlacedObject, &mut Transform, &mut Visibility), Changed<PlacedObject>>,
) {
    for (object, mut transform, mut visibility) in &mut objects {
        match object.current_transform {
            Some(placed) => {
                if *transform != placed {
                    *transform = placed;
                }
                visibility.set_if_neq(Visibility::Inherited);
            }
            None => {
                visibility.set_if_neq(Visibility::Hidden);
            }
        }
    }
}

fn object_mesh(kind: &ObjectKind) -> Mesh {
    let half = kind.half_extents();
    match kind.geometry {
        GeometryKind::Box => Cuboid::from_size(half * 2.0).into(),
        GeometryKind::Sphere => Sphere::new(half.x).into(),
        GeometryKind::Cylinder => Cylinder::new(half.x, half.y * 2.0).into(),
        GeometryKind::Cone => Cone::new(half.x, half.y * 2.0).into(),
        GeometryKind::Torus => Torus::new(half.x * 0.6, half.x).into(),
        GeometryKind::Place => Capsule3d::new(half.x, half.y * 2.0 - half.x * 2.0).into(),
    }
}

fn object_material(kind: &ObjectKind) -> StandardMaterial {
    let base_color = match kind.geometry {
        GeometryKind::Place => Color::srgb(0.9, 0.25, 0.2),
        _ => Color::srgb(0.7, 0.7, 0.9),
    };
    match kind.material {
        MaterialKind::Standard => StandardMaterial {
            base_color,
            ..default()
        },
        MaterialKind::Basic => StandardMaterial {
            base_color,
            unlit: true,
            ..default()
        },
        MaterialKind::Normal => StandardMaterial {
            base_color: Color::srgb(0.5, 0.5, 1.0),
            perceptual_roughness: 0.3,
            ..default()
        },
        MaterialKind::Wireframe => StandardMaterial {
            base_color: base_color.with_alpha(0.35),
            alpha_mode: AlphaMode::Blend,
            unlit: true,
            ..default()
        },
    }
}

/// Give newly spawned objects a mesh and material. Skipped entirely in headless
/// apps that have no render asset stores.
pub fn attach_object_visuals(
    mut commands: Commands,
    added: Query<(Entity, &PlacedObject), Added<PlacedObject>>,
    meshes: Option<ResMut<Assets<Mesh>>>,
    materials: Option<ResMut<Assets<StandardMaterial>>>,
) {
    let (Some(mut meshes), Some(mut materials)) = (meshes, materials) else {
        return;
    };

    for (entity, object) in &added {
        commands.entity(entity).insert((
            Mesh3d(meshes.add(object_mesh(&object.kind))),
            MeshMaterial3d(materials.add(object_material(&object.kind))),
        ));
    }
}

/// Tint the selected object's material while it stays selected.
pub fn highlight_selection(
    mut selection_events: EventReader<SelectionChanged>,
    table: Res<ObjectTable>,
    objects: Query<(&PlacedObject, &MeshMaterial3d<StandardMaterial>)>,
    materials: Option<ResMut<Assets<StandardMaterial>>>,
    mut highlighted: Local<Option<ObjectId>>,
) {
    let Some(SelectionChanged(selected)) = selection_events.read().last().copied() else {
        return;
    };
    let Some(mut materials) = materials else {
        return;
    };

    let mut tint = |id: ObjectId, colour: Option<Color>| {
        let Some(entity) = table.entity(id) else { return };
        let Ok((object, handle)) = objects.get(entity) else { return };
        if let Some(material) = materials.get_mut(&handle.0) {
            material.base_color = colour.unwrap_or(object_material(&object.kind).base_color);
        }
    };

    if let Some(previous) = highlighted.take() {
        tint(previous, None);
    }
    if let Some(id) = selected {
        tint(id, Some(SELECTED_COLOUR));
    }
    *highlighted = selected;
}

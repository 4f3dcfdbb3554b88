use bevy::asset::AssetMetaCheck;
use bevy::prelude::*;
use constants::render_settings::{GIZMO_COLOUR, GIZMO_MAJOR_RADIUS, GIZMO_MINOR_RADIUS};

use crate::engine::calibration::CalibrationStatusChanged;
use crate::engine::camera::ArCamera;
use crate::engine::config::ArConfig;
use crate::engine::core::plugin::GeoArEnginePlugin;
use crate::engine::core::window_config::create_window_config;
use crate::engine::scene::ObjectCollectionPlugin;
use crate::rpc::web_rpc::WebRpcPlugin;
use crate::tools::transform_control::TransformGizmo;

/// Asset path of the collection seeded into every windowed session.
pub const SAVED_PLACES_PATH: &str = "objects/saved_places.objects.json";

#[derive(Component)]
pub struct CalibrationText;

/// Windowed app: default plugins, engine, saved places and the host bridge.
pub fn create_app(config: ArConfig) -> App {
    let mut app = App::new();

    app.add_plugins(create_default_plugins())
        .add_plugins(GeoArEnginePlugin { config })
        .add_plugins(ObjectCollectionPlugin {
            path: SAVED_PLACES_PATH.to_string(),
        })
        .add_plugins(WebRpcPlugin)
        .add_systems(Startup, setup);

    #[cfg(not(target_arch = "wasm32"))]
    {
        app.add_systems(Update, calibration_text_update_system);
    }

    app
}

fn spawn_lighting(commands: &mut Commands) {
    commands.spawn((
        DirectionalLight {
            shadows_enabled: true,
            ..default()
        },
        Transform::from_rotation(Quat::from_euler(
            EulerRot::ZYX,
            0.0,
            1.0,
            -std::f32::consts::FRAC_PI_4,
        )),
    ));
}

/// Device camera at the world origin. Its transform is the AR pose.
fn spawn_ar_camera(commands: &mut Commands, fov_y: f32) {
    commands.spawn((
        Name::new("ar_camera"),
        ArCamera,
        Camera3d::default(),
        Projection::Perspective(PerspectiveProjection {
            fov: fov_y,
            ..default()
        }),
        Transform::default(),
    ));
}

fn spawn_transform_gizmo(
    commands: &mut Commands,
    meshes: &mut Assets<Mesh>,
    materials: &mut Assets<StandardMaterial>,
) {
    commands.spawn((
        Name::new("transform_gizmo"),
        TransformGizmo,
        Mesh3d(meshes.add(Torus {
            minor_radius: GIZMO_MINOR_RADIUS,
            major_radius: GIZMO_MAJOR_RADIUS,
        })),
        MeshMaterial3d(materials.add(StandardMaterial {
            base_color: GIZMO_COLOUR,
            unlit: true,
            ..default()
        })),
        Transform::default(),
        Visibility::Hidden,
    ));
}

fn setup(
    mut commands: Commands,
    config: Res<ArConfig>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    spawn_lighting(&mut commands);
    spawn_ar_camera(&mut commands, config.fov_y);
    spawn_transform_gizmo(&mut commands, &mut meshes, &mut materials);

    #[cfg(not(target_arch = "wasm32"))]
    {
        create_native_overlays(&mut commands);
    }
}

fn create_native_overlays(commands: &mut Commands) {
    commands
        .spawn(Node {
            width: Val::Percent(100.0),
            height: Val::Percent(100.0),
            ..default()
        })
        .with_children(|parent| {
            parent.spawn((
                Text::new("Calibration: awaiting fixes"),
                TextFont {
                    font_size: 16.0,
                    ..default()
                },
                TextColor(Color::srgb(1., 0., 0.)),
                Node {
                    position_type: PositionType::Absolute,
                    bottom: Val::Px(12.0),
                    right: Val::Px(12.0),
                    ..default()
                },
                CalibrationText,
            ));
        });
}

fn calibration_text_update_system(
    mut changes: EventReader<CalibrationStatusChanged>,
    mut texts: Query<(&mut Text, &mut TextColor), With<CalibrationText>>,
) {
    let Some(CalibrationStatusChanged(status)) = changes.read().last() else {
        return;
    };
    let state = status.engine_state();
    for (mut text, mut colour) in &mut texts {
        text.0 = format!("Calibration: {:?}", state);
        colour.0 = if state.is_placing() {
            Color::srgb(0., 1., 0.)
        } else {
            Color::srgb(1., 0., 0.)
        };
    }
}

fn create_default_plugins() -> impl PluginGroup {
    let window_config = WindowPlugin {
        primary_window: Some(create_window_config()),
        ..default()
    };

    let asset_config = AssetPlugin {
        meta_check: AssetMetaCheck::Never,
        ..default()
    };

    DefaultPlugins.set(window_config).set(asset_config)
}

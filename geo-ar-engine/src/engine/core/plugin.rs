use bevy::input::touch::TouchInput;
use bevy::prelude::*;
use bevy::state::app::StatesPlugin;
use bevy::transform::TransformSystem;

use crate::engine::calibration::systems::{
    auto_initialize, drain_sensor_queue, recalibrate_when_stale, report_calibration_status,
};
use crate::engine::calibration::{
    CalibrationController, CalibrationStatusChanged, SensorAvailability,
};
use crate::engine::camera::{CameraPose, sync_camera_pose};
use crate::engine::config::ArConfig;
use crate::engine::core::app_state::EngineState;
use crate::engine::scene::systems::{
    attach_object_visuals, highlight_selection, place_objects_ahead, publish_object_transforms,
    remove_placed_objects, reset_session, spawn_placed_objects,
};
use crate::engine::scene::{
    ObjectTable, PlaceObjectAhead, RemovePlacedObject, ResetSession, SpawnPlacedObject,
};
use crate::engine::sensors::SensorQueue;
use crate::tools::gesture::{
    GestureSessions, PointerEvent, ViewportSize, forward_mouse_input, forward_touch_input,
    process_gestures, sync_viewport_size, tick_long_press, update_transform_gizmo,
};
use crate::tools::long_press::{LongPressAction, LongPressController};
use crate::tools::selection::{Selection, SelectionChanged};
use crate::tools::touch_visualizer::{TouchVisualizer, prepare_marker_visuals};
use crate::tools::transform_control::{DragDelta, TransformController, TransformTargetChanged};

/// Frame stages of the engine, in execution order.
///
/// `Ingest` and `Calibrate` run in `PreUpdate`, so recalibration has finished
/// before any gesture sees the objects. `Publish` runs in `PostUpdate` ahead
/// of transform propagation.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum EngineSet {
    Ingest,
    Calibrate,
    Objects,
    Gestures,
    Publish,
}

/// Geo-anchored placement: calibration, object lifecycle and touch interaction.
///
/// Works with `MinimalPlugins` (headless) as well as `DefaultPlugins`; render
/// assets and input adapters are used only when their resources exist.
#[derive(Default)]
pub struct GeoArEnginePlugin {
    pub config: ArConfig,
}

impl Plugin for GeoArEnginePlugin {
    fn build(&self, app: &mut App) {
        let config = &self.config;

        if !app.is_plugin_added::<StatesPlugin>() {
            app.add_plugins(StatesPlugin);
        }

        app.init_state::<EngineState>()
            .insert_resource(config.clone())
            .insert_resource(CalibrationController::new(config.recalibration_policy()))
            .insert_resource(TransformController::new(config.drag_settings()))
            .insert_resource(LongPressController::new(
                config.long_press_duration(),
                config.drag_jitter_px,
            ))
            .insert_resource(TouchVisualizer::new(config.touch_marker_distance))
            .insert_resource(CameraPose::default().with_fov(config.fov_y))
            .init_resource::<SensorQueue>()
            .init_resource::<SensorAvailability>()
            .init_resource::<ObjectTable>()
            .init_resource::<Selection>()
            .init_resource::<GestureSessions>()
            .init_resource::<ViewportSize>();

        app.add_event::<PointerEvent>()
            .add_event::<SelectionChanged>()
            .add_event::<DragDelta>()
            .add_event::<TransformTargetChanged>()
            .add_event::<LongPressAction>()
            .add_event::<CalibrationStatusChanged>()
            .add_event::<SpawnPlacedObject>()
            .add_event::<RemovePlacedObject>()
            .add_event::<PlaceObjectAhead>()
            .add_event::<ResetSession>();

        app.configure_sets(PreUpdate, (EngineSet::Ingest, EngineSet::Calibrate).chain())
            .configure_sets(Update, (EngineSet::Objects, EngineSet::Gestures).chain())
            .configure_sets(
                PostUpdate,
                EngineSet::Publish.before(TransformSystem::TransformPropagate),
            );

        app.add_systems(Startup, prepare_marker_visuals)
            .add_systems(
                PreUpdate,
                (sync_camera_pose, drain_sensor_queue)
                    .chain()
                    .in_set(EngineSet::Ingest),
            )
            .add_systems(
                PreUpdate,
                (
                    auto_initialize,
                    recalibrate_when_stale,
                    report_calibration_status,
                )
                    .chain()
                    .in_set(EngineSet::Calibrate),
            )
            .add_systems(
                Update,
                (
                    reset_session,
                    remove_placed_objects,
                    place_objects_ahead,
                    spawn_placed_objects,
                )
                    .chain()
                    .in_set(EngineSet::Objects),
            )
            .add_systems(
                Update,
                (
                    sync_viewport_size,
                    forward_touch_input.run_if(resource_exists::<Events<TouchInput>>),
                    forward_mouse_input.run_if(resource_exists::<ButtonInput<MouseButton>>),
                    process_gestures,
                    tick_long_press,
                    update_transform_gizmo,
                )
                    .chain()
                    .in_set(EngineSet::Gestures),
            )
            .add_systems(
                PostUpdate,
                (publish_object_transforms, attach_object_visuals, highlight_selection)
                    .chain()
                    .in_set(EngineSet::Publish),
            );

        println!("GeoArEnginePlugin: engine systems registered");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headless_build_registers_engine_resources() {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins)
            .add_plugins(GeoArEnginePlugin::default());
        app.update();

        let world = app.world();
        assert!(world.contains_resource::<CalibrationController>());
        assert!(world.contains_resource::<SensorQueue>());
        assert!(world.contains_resource::<ObjectTable>());
        assert_eq!(
            *world.resource::<State<EngineState>>().get(),
            EngineState::AwaitingFixes
        );
    }

    #[test]
    fn config_flows_into_controllers() {
        let config = ArConfig {
            fov_y: 1.0,
            ..default()
        };
        let mut app = App::new();
        app.add_plugins(MinimalPlugins)
            .add_plugins(GeoArEnginePlugin { config });

        assert_eq!(app.world().resource::<CameraPose>().fov_y, 1.0);
        assert_eq!(app.world().resource::<ArConfig>().fov_y, 1.0);
    }
}

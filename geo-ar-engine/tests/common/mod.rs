#![allow(dead_code)]

use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;
use std::time::Duration;

use geo_ar_engine::engine::calibration::CalibrationController;
use geo_ar_engine::engine::config::ArConfig;
use geo_ar_engine::engine::core::{EngineState, FrameDriver, FrameStatus};
use geo_ar_engine::engine::geo::{GeoPoint, Heading, from_local_offset};
use geo_ar_engine::engine::scene::{ObjectId, ObjectKind, ObjectTable, PlacedObject, SpawnPlacedObject};
use geo_ar_engine::engine::sensors::SensorSender;
use geo_ar_engine::rpc::web_rpc::{RpcMessageQueue, RpcOutbox};
use geo_ar_engine::tools::gesture::{PointerEvent, PointerPhase, ViewportSize};

pub const DALLAS: (f64, f64) = (32.782149, -96.805218);
pub const FRAME: Duration = Duration::from_millis(100);

pub fn origin() -> GeoPoint {
    GeoPoint::new(DALLAS.0, DALLAS.1).with_accuracy(5.0)
}

/// Point at a world-frame offset (x right, z forward negative) from `origin()`
/// under heading `heading`.
pub fn offset(x: f64, z: f64, heading: f64) -> GeoPoint {
    from_local_offset(&origin(), (x, z), heading)
}

#[derive(Resource)]
pub struct Recorded<E: Event>(pub Vec<E>);

fn record<E: Event + Clone>(mut reader: EventReader<E>, mut log: ResMut<Recorded<E>>) {
    log.0.extend(reader.read().cloned());
}

/// Headless engine with a fixed 100 ms frame time.
pub struct Harness {
    pub driver: FrameDriver,
    pub sensors: SensorSender,
    timestamp: u64,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(ArConfig::default())
    }

    pub fn with_config(config: ArConfig) -> Self {
        let mut driver = FrameDriver::headless(config);
        driver
            .world_mut()
            .unwrap()
            .insert_resource(TimeUpdateStrategy::ManualDuration(FRAME));
        let sensors = driver.sensor_sender().unwrap();
        Self {
            driver,
            sensors,
            timestamp: 1,
        }
    }

    pub fn world(&mut self) -> &mut World {
        self.driver.world_mut().unwrap()
    }

    pub fn frame(&mut self) {
        assert_eq!(self.driver.render_frame(), FrameStatus::Rendered);
    }

    pub fn frames(&mut self, count: usize) {
        for _ in 0..count {
            self.frame();
        }
    }

    pub fn send<E: Event>(&mut self, event: E) {
        assert!(self.driver.send_event(event));
    }

    pub fn record<E: Event + Clone>(&mut self) {
        let app = self.driver.app_mut().unwrap();
        app.insert_resource(Recorded::<E>(Vec::new()))
            .add_systems(Last, record::<E>);
    }

    pub fn recorded<E: Event + Clone>(&mut self) -> Vec<E> {
        std::mem::take(&mut self.world().resource_mut::<Recorded<E>>().0)
    }

    fn next_timestamp(&mut self) -> u64 {
        self.timestamp += 1;
        self.timestamp
    }

    pub fn push_location(&mut self, location: GeoPoint) {
        let timestamp = self.next_timestamp();
        self.sensors.push_location(location.at(timestamp));
    }

    pub fn push_heading(&mut self, degrees: f64) {
        let timestamp = self.next_timestamp();
        self.sensors.push_heading(Heading::true_north(degrees).at(timestamp));
    }

    /// Deliver both fixes and run a frame.
    pub fn calibrate(&mut self, location: GeoPoint, heading: f64) {
        self.push_location(location);
        self.push_heading(heading);
        self.frame();
    }

    pub fn spawn(&mut self, id: u64, kind: ObjectKind, at: GeoPoint) {
        self.send(SpawnPlacedObject::new(kind, at).with_id(ObjectId(id)));
    }

    pub fn object(&mut self, id: u64) -> Option<PlacedObject> {
        let world = self.world();
        let entity = world.resource::<ObjectTable>().entity(ObjectId(id))?;
        world.get::<PlacedObject>(entity).cloned()
    }

    pub fn translation(&mut self, id: u64) -> Vec3 {
        self.object(id)
            .and_then(|o| o.current_transform)
            .map(|t| t.translation)
            .unwrap_or_else(|| panic!("object {} is not placed", id))
    }

    pub fn published(&mut self, id: u64) -> (Transform, Visibility) {
        let world = self.world();
        let entity = world.resource::<ObjectTable>().entity(ObjectId(id)).unwrap();
        (
            *world.get::<Transform>(entity).unwrap(),
            *world.get::<Visibility>(entity).unwrap(),
        )
    }

    pub fn controller(&mut self) -> &CalibrationController {
        self.world().resource::<CalibrationController>()
    }

    pub fn engine_state(&mut self) -> EngineState {
        *self.world().resource::<State<EngineState>>().get()
    }

    pub fn viewport(&mut self) -> Vec2 {
        self.world().resource::<ViewportSize>().0
    }

    pub fn pointer(&mut self, pointer_id: u64, phase: PointerPhase, position: Vec2) {
        self.send(PointerEvent::new(pointer_id, phase, position));
    }

    /// Down and up on the same pixel, one frame each.
    pub fn tap(&mut self, position: Vec2) {
        self.pointer(1, PointerPhase::Started, position);
        self.frame();
        self.pointer(1, PointerPhase::Ended, position);
        self.frame();
    }

    pub fn rpc(&mut self, message: &str) {
        self.world().resource::<RpcMessageQueue>().push(message);
    }

    pub fn outbox(&mut self) -> Vec<serde_json::Value> {
        self.world()
            .resource_mut::<RpcOutbox>()
            .drain()
            .iter()
            .map(|m| serde_json::from_str(m).unwrap())
            .collect()
    }
}

impl Harness {
    /// Pixel at which a world point appears, for the current camera pose.
    pub fn project(&mut self, point: Vec3) -> Vec2 {
        use geo_ar_engine::engine::camera::CameraPose;

        let viewport = self.viewport();
        let camera = *self.world().resource::<CameraPose>();
        let local = camera.orientation.inverse() * (point - camera.position);
        let half_height = (camera.fov_y * 0.5).tan();
        let aspect = viewport.x / viewport.y;
        let ndc = Vec2::new(
            local.x / -local.z / (half_height * aspect),
            local.y / -local.z / half_height,
        );
        Vec2::new(
            (ndc.x + 1.0) * 0.5 * viewport.x,
            (1.0 - ndc.y) * 0.5 * viewport.y,
        )
    }

    pub fn marker_count(&mut self) -> usize {
        use geo_ar_engine::tools::touch_visualizer::TouchMarker;

        let world = self.world();
        world.query::<&TouchMarker>().iter(world).count()
    }
}

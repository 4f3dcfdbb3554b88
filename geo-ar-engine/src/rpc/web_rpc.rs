use bevy::ecs::system::SystemParam;
use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::{Arc, Mutex, PoisonError};

use crate::engine::calibration::{
    CalibrationController, CalibrationStatus, CalibrationStatusChanged, SensorAvailability,
};
use crate::engine::core::EngineSet;
use crate::engine::geo::{GeoPoint, Heading};
use crate::engine::scene::{
    ObjectId, ObjectKind, ObjectTable, PlaceObjectAhead, RemovePlacedObject, ResetSession,
    SpawnPlacedObject,
};
use crate::engine::sensors::{SensorKind, SensorQueue};
use crate::tools::gesture::{PointerEvent, PointerPhase};
use crate::tools::long_press::LongPressAction;
use crate::tools::selection::SelectionChanged;
use crate::tools::transform_control::{DragDelta, TransformController, TransformMode};

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::JsValue;

#[cfg(target_arch = "wasm32")]
use web_sys::{MessageEvent, console, window};

/// Serialized messages kept for native hosts that never drain the outbox.
const OUTBOX_CAPACITY: usize = 256;

/// JSON-RPC 2.0 request structure.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RpcRequest {
    pub jsonrpc: String,
    pub method: String,
    #[serde(default)]
    pub params: Value,
    pub id: Option<Value>,
}

/// JSON-RPC 2.0 response structure.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RpcResponse {
    pub jsonrpc: String,
    pub result: Option<Value>,
    pub error: Option<RpcError>,
    pub id: Option<Value>,
}

/// JSON-RPC 2.0 notification structure for one-way communication.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RpcNotification {
    pub jsonrpc: String,
    pub method: String,
    pub params: Value,
}

/// JSON-RPC 2.0 error object.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RpcError {
    pub code: i32,
    pub message: String,
    pub data: Option<Value>,
}

/// A request decoded into an engine action.
#[derive(Debug, Clone, PartialEq)]
pub enum RpcCommand {
    LocationUpdate(GeoPoint),
    HeadingUpdate(Heading),
    SensorUnavailable(SensorKind),
    AddObject {
        id: Option<ObjectId>,
        kind: ObjectKind,
        location: GeoPoint,
        name: Option<String>,
    },
    AddObjectAtHeading {
        id: Option<ObjectId>,
        kind: ObjectKind,
        distance_m: Option<f64>,
    },
    RemoveObject(ObjectId),
    SetTransformMode(TransformMode),
    Pointer(PointerEvent),
    Reset,
    GetCalibrationStatus,
}

/// Resource managing bidirectional RPC communication between the host page and Bevy.
/// Handles both request-response patterns and notification broadcasting.
#[derive(Resource, Default)]
pub struct WebRpcInterface {
    outgoing_notifications: Vec<RpcNotification>,
    outgoing_responses: Vec<RpcResponse>,
}

impl WebRpcInterface {
    /// Send notification to the host without expecting a response.
    pub fn send_notification(&mut self, method: &str, params: Value) {
        self.outgoing_notifications.push(RpcNotification {
            jsonrpc: "2.0".to_string(),
            method: method.to_string(),
            params,
        });
    }

    fn queue_response(&mut self, response: RpcResponse) {
        self.outgoing_responses.push(response);
    }
}

/// Raw JSON messages from the host. The wasm listener pushes page messages
/// here; native hosts and tests may push directly.
#[derive(Resource, Clone, Default)]
pub struct RpcMessageQueue(Arc<Mutex<Vec<String>>>);

impl RpcMessageQueue {
    pub fn push(&self, message: impl Into<String>) {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message.into());
    }

    fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.0.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

/// Serialized outgoing messages on native targets, oldest first.
#[derive(Resource, Default, Debug)]
pub struct RpcOutbox(Vec<String>);

impl RpcOutbox {
    pub fn drain(&mut self) -> Vec<String> {
        std::mem::take(&mut self.0)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Plugin establishing the JSON-RPC bridge to the host frontend.
pub struct WebRpcPlugin;

impl Plugin for WebRpcPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<WebRpcInterface>()
            .init_resource::<RpcMessageQueue>()
            .init_resource::<RpcOutbox>()
            .add_event::<IncomingRpcMessage>()
            .add_systems(
                Update,
                (process_incoming_messages, handle_rpc_messages)
                    .chain()
                    .before(EngineSet::Objects),
            )
            .add_systems(
                PostUpdate,
                (forward_engine_events, send_outgoing_messages)
                    .chain()
                    .after(EngineSet::Publish),
            );

        #[cfg(target_arch = "wasm32")]
        app.add_systems(Startup, setup_message_listener);
    }
}

#[cfg(target_arch = "wasm32")]
fn setup_message_listener(queue: Res<RpcMessageQueue>) {
    let queue_clone = queue.clone();

    let closure = Closure::wrap(Box::new(move |event: MessageEvent| {
        // Filter messages to ensure they contain string data.
        if let Ok(data) = event.data().dyn_into::<js_sys::JsString>() {
            let message_str: String = data.into();
            if message_str.contains("jsonrpc") {
                queue_clone.push(message_str);
            }
        }
    }) as Box<dyn FnMut(MessageEvent)>);

    let Some(window) = window() else {
        error!("No window, host messages will not arrive");
        return;
    };
    if let Err(e) =
        window.add_event_listener_with_callback("message", closure.as_ref().unchecked_ref())
    {
        console::error_2(&JsValue::from_str("Failed to register message listener:"), &e);
        error!("Failed to register message listener: {:?}", e);
        return;
    }

    // Prevent closure from being dropped by transferring ownership to JS.
    closure.forget();
}

/// Event representing an incoming RPC message from the host.
#[derive(Event, Debug, Clone)]
pub struct IncomingRpcMessage {
    pub content: String,
}

fn process_incoming_messages(
    message_queue: Res<RpcMessageQueue>,
    mut message_events: EventWriter<IncomingRpcMessage>,
) {
    let messages = message_queue.take();
    message_events.write_batch(
        messages
            .into_iter()
            .map(|content| IncomingRpcMessage { content }),
    );
}

/// Engine resources and events an RPC command can touch.
#[derive(SystemParam)]
pub struct RpcTargets<'w> {
    sensors: Res<'w, SensorQueue>,
    table: ResMut<'w, ObjectTable>,
    transform: ResMut<'w, TransformController>,
    calibration: Res<'w, CalibrationController>,
    availability: Res<'w, SensorAvailability>,
    spawns: EventWriter<'w, SpawnPlacedObject>,
    ahead: EventWriter<'w, PlaceObjectAhead>,
    removals: EventWriter<'w, RemovePlacedObject>,
    resets: EventWriter<'w, ResetSession>,
    pointers: EventWriter<'w, PointerEvent>,
}

fn handle_rpc_messages(
    mut events: EventReader<IncomingRpcMessage>,
    mut rpc_interface: ResMut<WebRpcInterface>,
    mut targets: RpcTargets,
) {
    for event in events.read() {
        let request = match serde_json::from_str::<RpcRequest>(&event.content) {
            Ok(request) => request,
            Err(parse_error) => {
                warn!("Discarding malformed RPC message: {}", parse_error);
                continue;
            }
        };
        debug!("Processing RPC method: {}", request.method);

        let result = parse_rpc_command(&request).and_then(|command| {
            apply_rpc_command(command, &mut targets)
        });
        if let Err(error) = &result {
            warn!("RPC {} failed: {}", request.method, error.message);
        }

        // Only requests with IDs get responses; notifications are fire-and-forget.
        if let Some(id) = request.id {
            rpc_interface.queue_response(create_response(id, result));
        }
    }
}

#[derive(Deserialize)]
struct AddObjectParams {
    #[serde(flatten)]
    location: GeoPoint,
    #[serde(default)]
    kind: Option<String>,
    #[serde(default)]
    id: Option<u64>,
    #[serde(default)]
    name: Option<String>,
}

#[derive(Deserialize)]
struct AddObjectAtHeadingParams {
    #[serde(default)]
    kind: Option<String>,
    #[serde(default)]
    id: Option<u64>,
    #[serde(default)]
    distance_m: Option<f64>,
}

#[derive(Deserialize)]
struct ObjectParams {
    id: u64,
}

#[derive(Deserialize)]
struct SensorParams {
    sensor: SensorKind,
}

#[derive(Deserialize)]
struct ModeParams {
    mode: TransformMode,
}

#[derive(Deserialize)]
struct PointerParams {
    pointer_id: u64,
    phase: PointerPhase,
    x: f32,
    y: f32,
}

fn params<T: for<'de> Deserialize<'de>>(value: &Value, expected: &str) -> Result<T, RpcError> {
    serde_json::from_value::<T>(value.clone())
        .map_err(|e| RpcError::invalid_params(&format!("Expected {}: {}", expected, e)))
}

fn object_kind(kind: Option<&str>) -> Result<ObjectKind, RpcError> {
    match kind {
        None => Ok(ObjectKind::default()),
        Some(kind) => ObjectKind::from_string(kind)
            .ok_or_else(|| RpcError::invalid_params(&format!("Unknown object kind: {}", kind))),
    }
}

/// Decode a request's method and params. Does not touch the engine.
pub fn parse_rpc_command(request: &RpcRequest) -> Result<RpcCommand, RpcError> {
    let p = &request.params;
    let command = match request.method.as_str() {
        "location_update" => {
            let location: GeoPoint = params(p, "'latitude' and 'longitude'")?;
            if !(-90.0..=90.0).contains(&location.latitude)
                || !(-180.0..=180.0).contains(&location.longitude)
            {
                return Err(RpcError::invalid_params("Coordinates out of range"));
            }
            RpcCommand::LocationUpdate(location)
        }
        "heading_update" => RpcCommand::HeadingUpdate(params(p, "'magnetic_heading'")?),
        "sensor_unavailable" => {
            let parsed: SensorParams = params(p, "'sensor' of location or heading")?;
            RpcCommand::SensorUnavailable(parsed.sensor)
        }
        "add_object" => {
            let parsed: AddObjectParams = params(p, "'latitude' and 'longitude'")?;
            RpcCommand::AddObject {
                id: parsed.id.map(ObjectId),
                kind: object_kind(parsed.kind.as_deref())?,
                location: parsed.location,
                name: parsed.name,
            }
        }
        "add_object_at_heading" => {
            let parsed: AddObjectAtHeadingParams = params(p, "optional 'kind' and 'distance_m'")?;
            if parsed.distance_m.is_some_and(|d| !d.is_finite() || d <= 0.0) {
                return Err(RpcError::invalid_params("'distance_m' must be positive"));
            }
            RpcCommand::AddObjectAtHeading {
                id: parsed.id.map(ObjectId),
                kind: object_kind(parsed.kind.as_deref())?,
                distance_m: parsed.distance_m,
            }
        }
        "remove_object" => {
            let parsed: ObjectParams = params(p, "'id'")?;
            RpcCommand::RemoveObject(ObjectId(parsed.id))
        }
        "set_transform_mode" => {
            let parsed: ModeParams = params(p, "'mode' of translate or scale")?;
            RpcCommand::SetTransformMode(parsed.mode)
        }
        "pointer_event" => {
            let parsed: PointerParams = params(p, "'pointer_id', 'phase', 'x' and 'y'")?;
            RpcCommand::Pointer(PointerEvent::new(
                parsed.pointer_id,
                parsed.phase,
                Vec2::new(parsed.x, parsed.y),
            ))
        }
        "reset" => RpcCommand::Reset,
        "get_calibration_status" => RpcCommand::GetCalibrationStatus,
        _ => return Err(RpcError::method_not_found(&request.method)),
    };
    Ok(command)
}

fn apply_rpc_command(command: RpcCommand, targets: &mut RpcTargets) -> Result<Value, RpcError> {
    match command {
        RpcCommand::LocationUpdate(location) => {
            targets.sensors.sender().push_location(location);
            Ok(json!({ "success": true }))
        }
        RpcCommand::HeadingUpdate(heading) => {
            targets.sensors.sender().push_heading(heading);
            Ok(json!({ "success": true }))
        }
        RpcCommand::SensorUnavailable(kind) => {
            targets.sensors.sender().report_unavailable(kind);
            Ok(json!({ "success": true }))
        }
        RpcCommand::AddObject {
            id,
            kind,
            location,
            name,
        } => {
            let id = reserve_id(&mut targets.table, id)?;
            targets.spawns.write(SpawnPlacedObject {
                id: Some(id),
                kind,
                origin: location,
                name,
            });
            info!("Object {} requested at ({:.6}, {:.6})", id, location.latitude, location.longitude);
            Ok(json!({ "success": true, "id": id.0 }))
        }
        RpcCommand::AddObjectAtHeading { id, kind, distance_m } => {
            if targets.calibration.state().is_none() {
                return Err(RpcError::invalid_params("Calibration not initialised"));
            }
            let id = reserve_id(&mut targets.table, id)?;
            targets.ahead.write(PlaceObjectAhead {
                id: Some(id),
                kind,
                distance_m,
            });
            Ok(json!({ "success": true, "id": id.0 }))
        }
        RpcCommand::RemoveObject(id) => {
            if !targets.table.contains(id) {
                return Err(RpcError::invalid_params(&format!("Unknown object: {}", id.0)));
            }
            targets.removals.write(RemovePlacedObject(id));
            Ok(json!({ "success": true, "id": id.0 }))
        }
        RpcCommand::SetTransformMode(mode) => {
            targets.transform.set_mode(mode);
            Ok(json!({ "success": true, "mode": mode }))
        }
        RpcCommand::Pointer(event) => {
            targets.pointers.write(event);
            Ok(json!({ "success": true }))
        }
        RpcCommand::Reset => {
            targets.resets.write(ResetSession);
            Ok(json!({ "success": true }))
        }
        RpcCommand::GetCalibrationStatus => {
            let status = CalibrationStatus::new(&targets.calibration, &targets.availability);
            calibration_status_json(&status)
        }
    }
}

fn reserve_id(table: &mut ObjectTable, requested: Option<ObjectId>) -> Result<ObjectId, RpcError> {
    if let Some(id) = requested {
        if id == ObjectId::RESERVED {
            return Err(RpcError::invalid_params(&format!("Object id {} is reserved", id.0)));
        }
        if table.is_taken(id) {
            return Err(RpcError::invalid_params(&format!("Object id {} already in use", id.0)));
        }
    }
    Ok(table.allocate(requested))
}

fn calibration_status_json(status: &CalibrationStatus) -> Result<Value, RpcError> {
    let mut value = serde_json::to_value(status)
        .map_err(|e| RpcError::internal_error(&format!("Status serialization: {}", e)))?;
    if let Some(object) = value.as_object_mut() {
        object.insert("engine_state".to_string(), json!(status.engine_state()));
    }
    Ok(value)
}

/// Push engine output events to the host as notifications.
fn forward_engine_events(
    mut rpc_interface: ResMut<WebRpcInterface>,
    mut selections: EventReader<SelectionChanged>,
    mut drags: EventReader<DragDelta>,
    mut long_presses: EventReader<LongPressAction>,
    mut calibration: EventReader<CalibrationStatusChanged>,
) {
    for SelectionChanged(selected) in selections.read() {
        rpc_interface.send_notification(
            "selection_changed",
            json!({ "id": selected.map(|id| id.0) }),
        );
    }

    for drag in drags.read() {
        rpc_interface.send_notification(
            "drag_delta",
            json!({
                "id": drag.target.0,
                "mode": drag.mode,
                "pixels": [drag.pixels.x, drag.pixels.y],
                "yaw": drag.yaw,
                "scale": drag.scale,
                "translation": [drag.translation.x, drag.translation.y, drag.translation.z],
            }),
        );
    }

    for press in long_presses.read() {
        rpc_interface.send_notification(
            "long_press",
            json!({
                "id": press.target.map(|id| id.0),
                "position": [press.position.x, press.position.y],
            }),
        );
    }

    for CalibrationStatusChanged(status) in calibration.read() {
        match calibration_status_json(status) {
            Ok(params) => rpc_interface.send_notification("calibration_state", params),
            Err(e) => error!("{}", e.message),
        }
    }
}

fn create_response(id: Value, result: Result<Value, RpcError>) -> RpcResponse {
    match result {
        Ok(result_value) => RpcResponse {
            jsonrpc: "2.0".to_string(),
            result: Some(result_value),
            error: None,
            id: Some(id),
        },
        Err(error) => RpcResponse {
            jsonrpc: "2.0".to_string(),
            result: None,
            error: Some(error),
            id: Some(id),
        },
    }
}

/// Send queued notifications and responses to the host.
fn send_outgoing_messages(
    mut rpc_interface: ResMut<WebRpcInterface>,
    mut outbox: ResMut<RpcOutbox>,
) {
    // Notifications first, then responses, to keep event order.
    let notifications = std::mem::take(&mut rpc_interface.outgoing_notifications);
    for notification in &notifications {
        send_message_to_parent(notification, &mut outbox);
    }

    let responses = std::mem::take(&mut rpc_interface.outgoing_responses);
    for response in &responses {
        send_message_to_parent(response, &mut outbox);
    }
}

/// Send a serialized message to the parent window, or the outbox on native.
fn send_message_to_parent<T: Serialize>(message: &T, outbox: &mut RpcOutbox) {
    let json = match serde_json::to_string(message) {
        Ok(json) => json,
        Err(e) => {
            error!("Failed to serialize message: {}", e);
            return;
        }
    };

    #[cfg(target_arch = "wasm32")]
    {
        let _ = outbox;
        if let Some(window) = window() {
            if let Some(parent) = window.parent().ok().flatten() {
                if let Err(e) = parent.post_message(&JsValue::from_str(&json), "*") {
                    error!("Failed to send message to parent: {:?}", e);
                }
            } else {
                warn!("No parent window available for message transmission");
            }
        } else {
            error!("Window object not available");
        }
    }

    #[cfg(not(target_arch = "wasm32"))]
    {
        if outbox.0.len() >= OUTBOX_CAPACITY {
            outbox.0.remove(0);
        }
        outbox.0.push(json);
    }
}

/// Standard RPC error codes and constructors.
impl RpcError {
    pub fn method_not_found(method: &str) -> Self {
        Self {
            code: -32601,
            message: "Method not found".to_string(),
            data: Some(json!({ "method": method })),
        }
    }

    pub fn invalid_params(message: &str) -> Self {
        Self {
            code: -32602,
            message: message.to_string(),
            data: None,
        }
    }

    pub fn internal_error(message: &str) -> Self {
        Self {
            code: -32603,
            message: message.to_string(),
            data: None,
        }
    }
}

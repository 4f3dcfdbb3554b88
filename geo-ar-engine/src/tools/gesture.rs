use bevy::ecs::system::SystemParam;
use bevy::input::touch::{TouchInput, TouchPhase};
use bevy::prelude::*;
use bevy::window::PrimaryWindow;
use constants::gesture::MOUSE_POINTER_ID;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::long_press::{LongPressAction, LongPressController};
use super::selection::{PickHierarchy, Selection, SelectionChanged, collect_pick_candidates, pick};
use super::touch_visualizer::{MarkerVisuals, TouchVisualizer};
use super::transform_control::{
    DragDelta, TransformController, TransformGizmo, TransformTargetChanged,
};
use crate::engine::calibration::CalibrationController;
use crate::engine::camera::CameraPose;
use crate::engine::scene::{DragLock, ObjectId, ObjectTable, PlacedObject, Selected};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointerPhase {
    Started,
    Moved,
    Ended,
    Cancelled,
}

/// Engine-level touch input. Host adapters translate platform input into these.
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub pointer_id: u64,
    pub phase: PointerPhase,
    /// Pixels from the top-left corner of the viewport.
    pub position: Vec2,
}

impl PointerEvent {
    pub fn new(pointer_id: u64, phase: PointerPhase, position: Vec2) -> Self {
        Self {
            pointer_id,
            phase,
            position,
        }
    }
}

/// One touch, from down to up or cancel. Objects are referenced by id only.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GestureSession {
    pub pointer_id: u64,
    pub selected_object: Option<ObjectId>,
    pub start_point: Vec2,
    pub last_point: Vec2,
}

/// Live sessions keyed by pointer id. The first pointer down while none is
/// primary becomes the primary pointer and drives selection and transforms.
#[derive(Resource, Debug, Default)]
pub struct GestureSessions {
    sessions: HashMap<u64, GestureSession>,
    primary: Option<u64>,
}

impl GestureSessions {
    /// Open a session. `None` when the pointer already has one; otherwise
    /// whether it became the primary pointer.
    pub fn begin(&mut self, pointer_id: u64, point: Vec2) -> Option<bool> {
        if self.sessions.contains_key(&pointer_id) {
            return None;
        }
        self.sessions.insert(
            pointer_id,
            GestureSession {
                pointer_id,
                selected_object: None,
                start_point: point,
                last_point: point,
            },
        );
        let is_primary = self.primary.is_none();
        if is_primary {
            self.primary = Some(pointer_id);
        }
        Some(is_primary)
    }

    pub fn get(&self, pointer_id: u64) -> Option<&GestureSession> {
        self.sessions.get(&pointer_id)
    }

    pub fn set_selected(&mut self, pointer_id: u64, object: Option<ObjectId>) {
        if let Some(session) = self.sessions.get_mut(&pointer_id) {
            session.selected_object = object;
        }
    }

    pub fn update(&mut self, pointer_id: u64, point: Vec2) -> Option<&GestureSession> {
        let session = self.sessions.get_mut(&pointer_id)?;
        session.last_point = point;
        Some(session)
    }

    /// Close a session, returning it and whether it was the primary pointer.
    pub fn end(&mut self, pointer_id: u64) -> Option<(GestureSession, bool)> {
        let session = self.sessions.remove(&pointer_id)?;
        let was_primary = self.primary == Some(pointer_id);
        if was_primary {
            self.primary = None;
        }
        Some((session, was_primary))
    }

    pub fn is_primary(&self, pointer_id: u64) -> bool {
        self.primary == Some(pointer_id)
    }

    pub fn primary(&self) -> Option<u64> {
        self.primary
    }

    pub fn forget_object(&mut self, id: ObjectId) {
        for session in self.sessions.values_mut() {
            if session.selected_object == Some(id) {
                session.selected_object = None;
            }
        }
    }

    pub fn clear(&mut self) {
        self.sessions.clear();
        self.primary = None;
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

/// Size of the rendering surface in pixels, used to build touch rays.
#[derive(Resource, Debug, Clone, Copy, PartialEq)]
pub struct ViewportSize(pub Vec2);

impl Default for ViewportSize {
    fn default() -> Self {
        Self(Vec2::new(1280.0, 720.0))
    }
}

/// Interaction state touched when objects disappear or the session resets.
#[derive(SystemParam)]
pub struct InteractionState<'w> {
    pub selection: ResMut<'w, Selection>,
    pub transform: ResMut<'w, TransformController>,
    pub long_press: ResMut<'w, LongPressController>,
    pub sessions: ResMut<'w, GestureSessions>,
}

impl InteractionState<'_> {
    /// Drop every reference to a removed object. Returns true if it was selected.
    pub fn forget_object(&mut self, id: ObjectId) -> bool {
        self.long_press.detach_if(id);
        if self.transform.target() == Some(id) {
            self.transform.detach();
        }
        self.sessions.forget_object(id);
        self.selection.current() == Some(id) && self.selection.set(None)
    }

    /// Reset everything. Returns true if a selection was cleared.
    pub fn clear(&mut self) -> bool {
        self.transform.detach();
        self.long_press.handle_gesture_terminate();
        self.sessions.clear();
        self.selection.set(None)
    }
}

#[derive(SystemParam)]
pub struct GestureOutputs<'w> {
    selection_changed: EventWriter<'w, SelectionChanged>,
    drag_deltas: EventWriter<'w, DragDelta>,
    target_changed: EventWriter<'w, TransformTargetChanged>,
}

#[derive(SystemParam)]
pub struct GestureView<'w> {
    camera: Res<'w, CameraPose>,
    viewport: Res<'w, ViewportSize>,
    time: Res<'w, Time>,
    calibration: Res<'w, CalibrationController>,
    table: Res<'w, ObjectTable>,
    visuals: Option<Res<'w, MarkerVisuals>>,
}

fn release_lock(objects: &mut Query<(Entity, &mut PlacedObject)>, entity: Option<Entity>) {
    if let Some(Ok((_, mut object))) = entity.map(|e| objects.get_mut(e)) {
        if object.drag_lock != DragLock::Free {
            object.drag_lock = DragLock::Free;
        }
    }
}

/// Route pointer events through selection, transform, long-press and the
/// touch visualizer.
pub fn process_gestures(
    mut commands: Commands,
    mut pointer_events: EventReader<PointerEvent>,
    mut interaction: InteractionState,
    mut visualizer: ResMut<TouchVisualizer>,
    view: GestureView,
    mut objects: Query<(Entity, &mut PlacedObject)>,
    hierarchy: PickHierarchy,
    mut outputs: GestureOutputs,
) {
    for event in pointer_events.read() {
        let PointerEvent {
            pointer_id,
            phase,
            position,
        } = *event;
        let marker_position = visualizer.marker_position(&view.camera, position, view.viewport.0);

        match phase {
            PointerPhase::Started => {
                let Some(is_primary) = interaction.sessions.begin(pointer_id, position) else {
                    debug!("Ignoring repeated start for pointer {}", pointer_id);
                    continue;
                };
                if let Some(marker) = marker_position {
                    visualizer.handle_gesture_start(
                        &mut commands,
                        pointer_id,
                        marker,
                        view.visuals.as_deref(),
                    );
                }
                if !is_primary {
                    continue;
                }

                let candidates = collect_pick_candidates(objects.iter(), &hierarchy);
                let hit = pick(position, view.viewport.0, &view.camera, &candidates).map(|h| h.handle);
                interaction.sessions.set_selected(pointer_id, hit);

                interaction
                    .long_press
                    .handle_gesture_start(position, view.time.elapsed(), None);
                if let Some(id) = hit {
                    interaction.long_press.attach(id);
                }

                let previous_selection = interaction.selection.current();
                if interaction.selection.set(hit) {
                    if let Some(entity) = previous_selection.and_then(|id| view.table.entity(id)) {
                        commands.entity(entity).try_remove::<Selected>();
                    }
                    if let Some(entity) = hit.and_then(|id| view.table.entity(id)) {
                        commands.entity(entity).try_insert(Selected);
                    }
                    outputs.selection_changed.write(SelectionChanged(hit));
                }

                let current_target = interaction.transform.target();
                let detached = match hit {
                    Some(id) => interaction.transform.attach(id),
                    None => interaction.transform.detach(),
                };
                if let Some(previous) = detached {
                    release_lock(&mut objects, view.table.entity(previous));
                }
                if current_target != interaction.transform.target() {
                    outputs.target_changed.write(TransformTargetChanged {
                        previous: current_target,
                        current: interaction.transform.target(),
                    });
                }

                if let Some(Ok((_, mut object))) =
                    hit.and_then(|id| view.table.entity(id)).map(|e| objects.get_mut(e))
                {
                    interaction
                        .transform
                        .handle_gesture_start(position, &mut object, &view.camera);
                }
            }
            PointerPhase::Moved => {
                if interaction.sessions.update(pointer_id, position).is_none() {
                    continue;
                }
                if let Some(marker) = marker_position {
                    visualizer.handle_gesture_move(&mut commands, pointer_id, marker);
                }
                if !interaction.sessions.is_primary(pointer_id) {
                    continue;
                }

                interaction.long_press.handle_gesture_move(position);
                // Within the jitter radius the press may still become a long-press
                if interaction.long_press.is_pending() || !interaction.transform.is_dragging() {
                    continue;
                }
                let Some(entity) = interaction.transform.target().and_then(|id| view.table.entity(id))
                else {
                    continue;
                };
                let Ok((_, mut object)) = objects.get_mut(entity) else {
                    continue;
                };
                if let Some(delta) = interaction.transform.handle_gesture_move(position, &mut object) {
                    outputs.drag_deltas.write(delta);
                }
            }
            PointerPhase::Ended | PointerPhase::Cancelled => {
                let Some((_, was_primary)) = interaction.sessions.end(pointer_id) else {
                    continue;
                };
                visualizer.handle_gesture_end(&mut commands, pointer_id);
                if !was_primary {
                    continue;
                }

                if phase == PointerPhase::Ended {
                    interaction.long_press.handle_gesture_end();
                } else {
                    interaction.long_press.handle_gesture_terminate();
                }

                let Some(entity) = interaction.transform.target().and_then(|id| view.table.entity(id))
                else {
                    continue;
                };
                let Ok((_, mut object)) = objects.get_mut(entity) else {
                    continue;
                };
                let moved = if phase == PointerPhase::Ended {
                    interaction.transform.handle_gesture_end(&mut object)
                } else {
                    interaction.transform.handle_gesture_cancel(&mut object)
                };

                // Fold the drag back into the object's geographic origin. Without
                // a move, rebuild from the origin in case a recalibration skipped it.
                let Some(translation) = moved else {
                    view.calibration.place(&mut object);
                    continue;
                };
                if let Some(origin) = view.calibration.geo_for_translation(translation, &object.origin) {
                    object.origin = origin;
                    view.calibration.place(&mut object);
                    info!(
                        "Committed drag of {} to ({:.6}, {:.6})",
                        object.id, origin.latitude, origin.longitude
                    );
                }
            }
        }
    }
}

pub fn tick_long_press(
    time: Res<Time>,
    mut long_press: ResMut<LongPressController>,
    mut actions: EventWriter<LongPressAction>,
) {
    if !long_press.is_pending() {
        return;
    }
    if let Some(action) = long_press.update(time.elapsed()) {
        info!("Long press at {:?} on {:?}", action.position, action.target);
        actions.write(action);
    }
}

/// Keep the manipulation gizmo on the attached object, facing the camera.
pub fn update_transform_gizmo(
    mut controller: ResMut<TransformController>,
    camera: Res<CameraPose>,
    table: Res<ObjectTable>,
    objects: Query<&PlacedObject>,
    mut gizmos: Query<(&mut Transform, &mut Visibility), With<TransformGizmo>>,
) {
    let placement = controller
        .target()
        .and_then(|id| table.entity(id))
        .and_then(|entity| objects.get(entity).ok())
        .and_then(|object| object.current_transform);

    let Some(placement) = placement else {
        for (_, mut visibility) in &mut gizmos {
            visibility.set_if_neq(Visibility::Hidden);
        }
        return;
    };

    controller.update(&camera, placement.translation);
    for (mut transform, mut visibility) in &mut gizmos {
        transform.translation = placement.translation;
        transform.rotation = controller.gizmo_rotation();
        visibility.set_if_neq(Visibility::Inherited);
    }
}

pub fn sync_viewport_size(
    windows: Query<&Window, With<PrimaryWindow>>,
    mut viewport: ResMut<ViewportSize>,
) {
    let Ok(window) = windows.single() else {
        return;
    };
    let size = Vec2::new(window.width(), window.height());
    if viewport.0 != size {
        viewport.0 = size;
    }
}

pub fn forward_touch_input(
    mut touches: EventReader<TouchInput>,
    mut pointers: EventWriter<PointerEvent>,
) {
    for touch in touches.read() {
        let phase = match touch.phase {
            TouchPhase::Started => PointerPhase::Started,
            TouchPhase::Moved => PointerPhase::Moved,
            TouchPhase::Ended => PointerPhase::Ended,
            TouchPhase::Canceled => PointerPhase::Cancelled,
        };
        pointers.write(PointerEvent::new(touch.id, phase, touch.position));
    }
}

/// Left mouse button as a single pointer, for desktop builds.
pub fn forward_mouse_input(
    buttons: Res<ButtonInput<MouseButton>>,
    windows: Query<&Window, With<PrimaryWindow>>,
    mut pointers: EventWriter<PointerEvent>,
    mut last_position: Local<Option<Vec2>>,
) {
    let cursor = windows.single().ok().and_then(|w| w.cursor_position());

    if buttons.just_pressed(MouseButton::Left) {
        if let Some(position) = cursor {
            pointers.write(PointerEvent::new(MOUSE_POINTER_ID, PointerPhase::Started, position));
            *last_position = Some(position);
        }
        return;
    }

    let Some(last) = *last_position else {
        return;
    };
    if buttons.just_released(MouseButton::Left) {
        let position = cursor.unwrap_or(last);
        pointers.write(PointerEvent::new(MOUSE_POINTER_ID, PointerPhase::Ended, position));
        *last_position = None;
        return;
    }

    match cursor {
        Some(position) if position != last => {
            pointers.write(PointerEvent::new(MOUSE_POINTER_ID, PointerPhase::Moved, position));
            *last_position = Some(position);
        }
        Some(_) => {}
        // Cursor left the window mid-drag
        None => {
            pointers.write(PointerEvent::new(MOUSE_POINTER_ID, PointerPhase::Cancelled, last));
            *last_position = None;
        }
    }
}

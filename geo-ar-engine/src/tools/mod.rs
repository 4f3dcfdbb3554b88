//! Touch interaction tools for placed objects.
//!
//! Every pointer event is routed through [`gesture::process_gestures`]:
//!
//! ```text
//! PointerEvent (touch / mouse / RPC)
//!   └─> GestureSessions (one per pointer id)
//!       ├─> TouchVisualizer        every pointer, cosmetic marker
//!       └─> primary pointer only
//!           ├─> selection::pick    touch ray against object pick boxes
//!           ├─> TransformController
//!           │     attach / drag (rotate + translate or scale) / commit
//!           └─> LongPressController
//!                 timer, cancelled by movement beyond the jitter radius
//! ```
//!
//! ## Outputs
//!
//! - `SelectionChanged`: selection differs from the previous one
//! - `TransformTargetChanged`: transform controller attached or detached
//! - `DragDelta`: every applied drag move, relative to the drag start
//! - `LongPressAction`: a press held still for the configured duration
//!
//! Dragging locks the object (`DragLock::LockedByDrag`) so a recalibration in
//! the same frames never fights the user. On release the final translation is
//! folded back into the object's latitude and longitude.

/// Pointer routing, gesture sessions and host input adapters.
pub mod gesture;

/// Press-and-hold detection.
pub mod long_press;

/// Ray-based object picking and the current selection.
pub mod selection;

/// Visual feedback marker per active pointer.
pub mod touch_visualizer;

/// Drag-to-rotate, translate and scale for the attached object.
pub mod transform_control;

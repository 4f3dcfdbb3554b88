//! JSON-RPC 2.0 bridge between the engine and its host frontend.
//!
//! On wasm32 the engine runs in an iframe and talks to the parent page via
//! `postMessage`. Native hosts push raw JSON into [`web_rpc::RpcMessageQueue`]
//! and read replies from [`web_rpc::RpcOutbox`].
//!
//! ## Message Flow
//!
//! ```text
//! Host (parent window)  <──postMessage──>  Engine (iframe)
//!        │                                        │
//!        ├─ Request (with ID) ──────────────────> │
//!        │                                        ├─ Apply to engine
//!        │ <───────────────── Response (with ID) ─┤
//!        │                                        │
//!        │ <────────── Notification (no ID) ─────┤
//! ```
//!
//! Requests are applied in `Update` before object spawning, so an
//! `add_object` request placed during a frame spawns in that same frame.
//!
//! ## Error Handling
//!
//! - `-32601`: Method not found
//! - `-32602`: Invalid params
//! - `-32603`: Internal error
//!
//! ## Methods
//!
//! ### Sensors
//! - `location_update`: `{latitude, longitude, altitude?, accuracy?, timestamp?}`
//! - `heading_update`: `{magnetic_heading, true_heading?, accuracy?, timestamp?}`
//! - `sensor_unavailable`: `{sensor: "location" | "heading"}`
//!
//! ### Objects
//! - `add_object`: `{latitude, longitude, altitude?, kind?, id?, name?}`, returns the id
//! - `add_object_at_heading`: `{kind?, id?, distance_m?}`, in front of the camera
//! - `remove_object`: `{id}`
//! - `reset`: clear objects, selection and calibration
//!
//! ### Interaction
//! - `set_transform_mode`: `{mode: "translate" | "scale"}`
//! - `pointer_event`: `{pointer_id, phase, x, y}` for hosts that own touch input
//!
//! ### Status
//! - `get_calibration_status`
//!
//! ## Notifications
//!
//! `selection_changed`, `drag_delta`, `long_press`, `calibration_state`.

/// JSON-RPC 2.0 bidirectional communication system for host integration.
///
/// Handles request-response patterns, notifications, and WASM message listeners.
pub mod web_rpc;

//! Geo-anchored AR placement engine.
//!
//! Anchors virtual objects at real-world coordinates by calibrating a local
//! world frame against location and heading fixes, and lets the user select,
//! rotate, move and scale them with touch gestures.

pub mod engine;
pub mod rpc;
pub mod tools;

//! Placed objects and their lifecycle in the scene.
//!
//! Objects are entities carrying a [`PlacedObject`] component. Their world
//! transform is a cache derived from the geographic origin and the current
//! calibration reference; it is published to `Transform` once per frame after
//! calibration has settled.

/// Stored-object collections loaded as JSON assets.
pub mod collection;

/// Object model, pick bounds and the id table.
pub mod object;

/// Spawn, removal, reset and transform publishing systems.
pub mod systems;

pub use collection::{ObjectCollectionPlugin, ObjectDescriptor, PlacedObjectCollection};
pub use object::{
    DragLock, GeometryKind, MaterialKind, ObjectId, ObjectKind, ObjectTable, PickBounds,
    PlacedObject, PlacementAdjustment, Selected,
};
pub use systems::{PlaceObjectAhead, RemovePlacedObject, ResetSession, SpawnPlacedObject};

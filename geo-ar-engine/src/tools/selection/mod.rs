//! Touch-ray selection of placed objects.
//!
//! A touch point becomes a world ray through the camera; every placed object
//! contributes a hierarchy of oriented pick boxes and the nearest hit wins.

/// Candidate hierarchies and nearest-hit picking.
pub mod picker;

/// Slab-method ray and box intersection.
pub mod ray;

/// Current selection and its change event.
pub mod state;

pub use picker::{PickCandidate, PickHierarchy, PickHit, PickNode, collect_pick_candidates, pick};
pub use state::{Selection, SelectionChanged};

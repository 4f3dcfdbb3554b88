use bevy::prelude::*;

use crate::engine::scene::ObjectId;

/// The object currently selected by a tap, if any.
#[derive(Resource, Debug, Default)]
pub struct Selection {
    current: Option<ObjectId>,
}

impl Selection {
    pub fn current(&self) -> Option<ObjectId> {
        self.current
    }

    /// Returns true when the selection actually changed.
    pub fn set(&mut self, id: Option<ObjectId>) -> bool {
        if self.current == id {
            return false;
        }
        self.current = id;
        true
    }
}

/// Written only when the selected object changes; `None` means cleared.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionChanged(pub Option<ObjectId>);

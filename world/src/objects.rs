//! Authoritative map object storage.

use std::collections::BTreeMap;

use pointwalk_core::{CellCoord, ObjectId, ObjectSnapshot};

/// State of a map object stored inside the world.
#[derive(Clone, Copy, Debug)]
pub(crate) struct ObjectState {
    /// Identifier allocated by the world for the object.
    pub(crate) id: ObjectId,
    /// Cell the object stands on.
    pub(crate) cell: CellCoord,
    /// Whether the object stops actors from entering its cell.
    pub(crate) blocking: bool,
    /// Whether the object carries the action menu tag.
    pub(crate) menu: bool,
}

impl ObjectState {
    pub(crate) fn snapshot(&self) -> ObjectSnapshot {
        ObjectSnapshot {
            id: self.id,
            cell: self.cell,
            blocking: self.blocking,
            menu: self.menu,
        }
    }
}

/// Registry that stores map objects and manages identifier allocation.
#[derive(Debug)]
pub(crate) struct ObjectRegistry {
    entries: BTreeMap<ObjectId, ObjectState>,
    next_object_id: ObjectId,
}

impl ObjectRegistry {
    /// Creates an empty registry with a reset identifier counter.
    pub(crate) fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            next_object_id: ObjectId::new(0),
        }
    }

    /// Stores a new object and returns its identifier.
    pub(crate) fn insert(&mut self, cell: CellCoord, blocking: bool, menu: bool) -> ObjectId {
        let id = self.next_object_id;
        self.next_object_id = ObjectId::new(id.get().saturating_add(1));
        let previous = self.entries.insert(
            id,
            ObjectState {
                id,
                cell,
                blocking,
                menu,
            },
        );
        debug_assert!(previous.is_none(), "object identifiers are never reused");
        id
    }

    pub(crate) fn remove(&mut self, id: ObjectId) -> Option<ObjectState> {
        self.entries.remove(&id)
    }

    /// Objects standing on the cell in identifier order.
    pub(crate) fn at(&self, cell: CellCoord) -> impl Iterator<Item = &ObjectState> {
        self.entries.values().filter(move |object| object.cell == cell)
    }

    pub(crate) fn blocks(&self, cell: CellCoord) -> bool {
        self.at(cell).any(|object| object.blocking)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &ObjectState> {
        self.entries.values()
    }
}

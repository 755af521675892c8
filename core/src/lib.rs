#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Pointwalk crates.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative map world, and pure systems. Adapters submit [`Command`]
//! values describing desired mutations, the world executes those commands via
//! its `apply` entry point, and then broadcasts [`Event`] values for systems to
//! react to deterministically. Systems read the map through the [`MapQuery`]
//! collaborator surface and respond exclusively with new command batches.

use std::{collections::VecDeque, fmt, time::Duration};

pub use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default time window in which two pointer triggers form a double-click.
pub const DEFAULT_DOUBLE_CLICK_THRESHOLD: Duration = Duration::from_millis(300);

/// Default per-axis distance, in canvas units, below which two triggers count as the same spot.
pub const DEFAULT_CLICK_TOLERANCE: f32 = 10.0;

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Replaces the map with an empty floor grid of the provided dimensions.
    ConfigureMap {
        /// Number of cell columns laid out in the map.
        columns: u32,
        /// Number of cell rows laid out in the map.
        rows: u32,
        /// Length of each square cell measured in canvas units.
        tile_length: f32,
    },
    /// Updates how long a single actor step takes to animate.
    ConfigureStepDuration {
        /// Simulated time a step occupies before the actor may move again.
        duration: Duration,
    },
    /// Moves the canvas viewport so that `origin` is drawn at the canvas origin.
    SetDisplayOrigin {
        /// Viewport offset expressed in canvas units.
        origin: Vec2,
    },
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Overwrites the terrain of a single cell.
    SetTerrain {
        /// Cell whose terrain changes.
        cell: CellCoord,
        /// Terrain applied to the cell.
        terrain: Terrain,
    },
    /// Places a map object on the provided cell.
    PlaceObject {
        /// Cell the object stands on.
        cell: CellCoord,
        /// Whether the object stops actors from entering its cell.
        blocking: bool,
        /// Whether clicking the object opens the contextual action menu.
        menu: bool,
    },
    /// Removes a map object from the world.
    RemoveObject {
        /// Identifier of the object to remove.
        object: ObjectId,
    },
    /// Creates a new actor standing on the provided cell.
    SpawnActor {
        /// Cell the actor occupies after spawning.
        cell: CellCoord,
    },
    /// Moves an existing actor onto a cell without walking, cancelling any step in progress.
    PlaceActor {
        /// Identifier of the actor to relocate.
        actor: ActorId,
        /// Cell the actor should stand on.
        cell: CellCoord,
    },
    /// Requests that an actor advance a single step in the specified direction.
    StepActor {
        /// Identifier of the actor attempting to move.
        actor: ActorId,
        /// Direction of travel for the attempted step.
        direction: Direction,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Announces that the map was rebuilt with new dimensions.
    MapConfigured {
        /// Number of cell columns in the new map.
        columns: u32,
        /// Number of cell rows in the new map.
        rows: u32,
    },
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Confirms that the terrain of a cell changed.
    TerrainChanged {
        /// Cell whose terrain changed.
        cell: CellCoord,
        /// Terrain now applied to the cell.
        terrain: Terrain,
    },
    /// Confirms that a map object was placed.
    ObjectPlaced {
        /// Identifier assigned to the object by the world.
        object: ObjectId,
        /// Cell the object stands on.
        cell: CellCoord,
    },
    /// Confirms that a map object was removed.
    ObjectRemoved {
        /// Identifier of the removed object.
        object: ObjectId,
        /// Cell the object stood on.
        cell: CellCoord,
    },
    /// Confirms that an actor was created.
    ActorSpawned {
        /// Identifier assigned to the actor by the world.
        actor: ActorId,
        /// Cell the actor occupies after spawning.
        cell: CellCoord,
    },
    /// Confirms that an actor was relocated without walking.
    ActorPlaced {
        /// Identifier of the relocated actor.
        actor: ActorId,
        /// Cell the actor now occupies.
        cell: CellCoord,
    },
    /// Confirms that an actor started a step between two adjacent cells.
    ActorStepped {
        /// Identifier of the actor that moved.
        actor: ActorId,
        /// Cell the actor occupied before moving.
        from: CellCoord,
        /// Cell the actor occupies after the step.
        to: CellCoord,
        /// Direction of travel.
        direction: Direction,
    },
    /// Reports that the world refused a step request.
    ActorStepRejected {
        /// Identifier of the actor whose step was refused.
        actor: ActorId,
        /// Direction of the refused step.
        direction: Direction,
    },
    /// Reports that an actor finished animating its current step.
    ActorStepCompleted {
        /// Identifier of the actor that came to rest.
        actor: ActorId,
        /// Cell the actor rests on.
        cell: CellCoord,
    },
}

/// Cardinal movement directions available to actors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Direction {
    /// Movement toward decreasing row indices.
    North,
    /// Movement toward increasing column indices.
    East,
    /// Movement toward increasing row indices.
    South,
    /// Movement toward decreasing column indices.
    West,
}

impl Direction {
    /// Order in which neighbouring cells are expanded by grid searches.
    pub const SEARCH_ORDER: [Direction; 4] = [
        Direction::South,
        Direction::East,
        Direction::North,
        Direction::West,
    ];

    /// Direction of travel between two orthogonally adjacent cells.
    ///
    /// Returns `None` when the cells are not exactly one step apart.
    #[must_use]
    pub fn between(from: CellCoord, to: CellCoord) -> Option<Self> {
        let column_diff = from.column().abs_diff(to.column());
        let row_diff = from.row().abs_diff(to.row());
        if column_diff + row_diff != 1 {
            return None;
        }

        if column_diff == 1 {
            if to.column() > from.column() {
                Some(Self::East)
            } else {
                Some(Self::West)
            }
        } else if to.row() > from.row() {
            Some(Self::South)
        } else {
            Some(Self::North)
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::North => "north",
            Self::East => "east",
            Self::South => "south",
            Self::West => "west",
        };
        f.write_str(label)
    }
}

/// Unique identifier assigned to an actor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActorId(u32);

impl ActorId {
    /// Creates a new actor identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a map object.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(u32);

impl ObjectId {
    /// Creates a new object identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Location of a single grid cell expressed as column and row coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    column: u32,
    row: u32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Computes the Manhattan distance between two cell coordinates.
    #[must_use]
    pub fn manhattan_distance(self, other: CellCoord) -> u32 {
        self.column().abs_diff(other.column()) + self.row().abs_diff(other.row())
    }

    /// Adjacent cell reached by stepping once in `direction`.
    ///
    /// Returns `None` when the step would leave the non-negative quadrant or
    /// overflow; map bounds are the caller's concern.
    #[must_use]
    pub fn step(self, direction: Direction) -> Option<CellCoord> {
        let (column, row) = match direction {
            Direction::North => (Some(self.column), self.row.checked_sub(1)),
            Direction::East => (self.column.checked_add(1), Some(self.row)),
            Direction::South => (Some(self.column), self.row.checked_add(1)),
            Direction::West => (self.column.checked_sub(1), Some(self.row)),
        };
        Some(CellCoord::new(column?, row?))
    }
}

impl fmt::Display for CellCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.column, self.row)
    }
}

/// Ordered sequence of steps consumed front to back by a movement queue.
///
/// An empty path means either "no path" or "path exhausted".
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Path {
    steps: VecDeque<Direction>,
}

impl Path {
    /// Creates an empty path.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of steps left in the path.
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Reports whether no steps remain.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Removes and returns the next step.
    pub fn pop_front(&mut self) -> Option<Direction> {
        self.steps.pop_front()
    }

    /// Prepends a step, used when building a path backwards from its goal.
    pub fn push_front(&mut self, direction: Direction) {
        self.steps.push_front(direction);
    }

    /// Drops every remaining step.
    pub fn clear(&mut self) {
        self.steps.clear();
    }

    /// Iterator over the remaining steps in travel order.
    pub fn iter(&self) -> impl Iterator<Item = Direction> + '_ {
        self.steps.iter().copied()
    }

    /// Copies the remaining steps into a vector.
    #[must_use]
    pub fn to_vec(&self) -> Vec<Direction> {
        self.steps.iter().copied().collect()
    }

    /// Cell reached after walking every remaining step from `start`.
    #[must_use]
    pub fn destination_from(&self, start: CellCoord) -> Option<CellCoord> {
        self.steps
            .iter()
            .try_fold(start, |cell, direction| cell.step(*direction))
    }
}

impl From<Vec<Direction>> for Path {
    fn from(steps: Vec<Direction>) -> Self {
        Self {
            steps: steps.into(),
        }
    }
}

impl FromIterator<Direction> for Path {
    fn from_iter<I: IntoIterator<Item = Direction>>(iter: I) -> Self {
        Self {
            steps: iter.into_iter().collect(),
        }
    }
}

/// Static terrain classification of a single cell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Terrain {
    /// Walkable ground.
    #[default]
    Floor,
    /// Impassable tile.
    Wall,
}

impl Terrain {
    /// Reports whether actors may stand on this terrain.
    #[must_use]
    pub const fn is_walkable(self) -> bool {
        matches!(self, Self::Floor)
    }
}

/// Immutable representation of a single actor's state used for queries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ActorSnapshot {
    /// Unique identifier assigned to the actor.
    pub id: ActorId,
    /// Grid cell currently occupied by the actor.
    pub cell: CellCoord,
    /// Indicates whether the actor is still animating its last step.
    pub moving: bool,
}

/// Read-only snapshot describing all actors on the map.
#[derive(Clone, Debug, Default)]
pub struct ActorView {
    snapshots: Vec<ActorSnapshot>,
}

impl ActorView {
    /// Creates a new actor view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<ActorSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured actor snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &ActorSnapshot> {
        self.snapshots.iter()
    }

    /// Snapshot of the actor with the provided identifier, if present.
    #[must_use]
    pub fn get(&self, actor: ActorId) -> Option<&ActorSnapshot> {
        self.snapshots
            .binary_search_by_key(&actor, |snapshot| snapshot.id)
            .ok()
            .and_then(|index| self.snapshots.get(index))
    }
}

/// Immutable representation of a map object used for queries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ObjectSnapshot {
    /// Identifier allocated to the object by the world.
    pub id: ObjectId,
    /// Cell the object stands on.
    pub cell: CellCoord,
    /// Whether the object stops actors from entering its cell.
    pub blocking: bool,
    /// Whether the object carries the contextual action menu tag.
    pub menu: bool,
}

/// Pointer state sampled once per tick by an adapter.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointerInput {
    /// Whether the pointer was pressed on this tick.
    pub triggered: bool,
    /// Pointer position in canvas space.
    pub position: Vec2,
    /// Monotonic timestamp of the sample.
    pub now: Duration,
}

impl PointerInput {
    /// Creates a sample describing a press at `position`.
    #[must_use]
    pub const fn trigger(position: Vec2, now: Duration) -> Self {
        Self {
            triggered: true,
            position,
            now,
        }
    }

    /// Creates a sample in which the pointer was not pressed.
    #[must_use]
    pub const fn idle(position: Vec2, now: Duration) -> Self {
        Self {
            triggered: false,
            position,
            now,
        }
    }
}

/// Map query surface consumed by the systems.
///
/// Implemented by the authoritative world; systems never mutate the map
/// through it.
pub trait MapQuery {
    /// Number of columns and rows of the map.
    fn dimensions(&self) -> (u32, u32);

    /// Reports whether the cell lies inside the map bounds.
    fn is_valid(&self, cell: CellCoord) -> bool {
        let (columns, rows) = self.dimensions();
        cell.column() < columns && cell.row() < rows
    }

    /// Reports whether an actor standing on `from` may currently step in `direction`.
    fn can_pass(&self, from: CellCoord, direction: Direction) -> bool;

    /// Translates a canvas position into the map cell drawn under it.
    fn canvas_to_cell(&self, position: Vec2) -> Option<CellCoord>;

    /// Objects standing on the provided cell, in identifier order.
    fn objects_at(&self, cell: CellCoord) -> Vec<ObjectSnapshot>;

    /// First object standing on the provided cell, if any.
    fn object_at(&self, cell: CellCoord) -> Option<ObjectSnapshot> {
        self.objects_at(cell).into_iter().next()
    }
}

/// Commands offered by the contextual action menu.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MenuAction {
    /// Examine the object.
    Inspect,
    /// Speak with the object.
    Talk,
    /// Operate the object.
    Use,
    /// Take the object.
    PickUp,
    /// Dismiss the menu without acting.
    Cancel,
}

impl MenuAction {
    /// Rows listed by the menu, top to bottom.
    pub const COMMANDS: [MenuAction; 4] = [
        MenuAction::Inspect,
        MenuAction::Talk,
        MenuAction::Use,
        MenuAction::PickUp,
    ];

    /// Label displayed for the command.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Inspect => "Inspect",
            Self::Talk => "Talk",
            Self::Use => "Use",
            Self::PickUp => "Pick-up",
            Self::Cancel => "Cancel",
        }
    }
}

/// Reasons a movement request may fail to produce a walkable route.
///
/// None of these are fatal: callers log them and leave the actor standing.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum NavigationError {
    /// The pointer position does not map to any cell.
    #[error("pointer position does not map to a map cell")]
    OffCanvas,
    /// The requested cell lies outside the map.
    #[error("target cell {0} lies outside the map")]
    OutOfBounds(CellCoord),
    /// The requested cell holds a map object.
    #[error("target cell {0} is occupied by a map object")]
    Occupied(CellCoord),
    /// The actor to move is not on the map.
    #[error("actor {} is not on the map", .0.get())]
    UnknownActor(ActorId),
    /// No walkable route connects the two cells.
    #[error("no walkable route from {from} to {to}")]
    Unreachable {
        /// Cell the search started from.
        from: CellCoord,
        /// Requested destination.
        to: CellCoord,
    },
}

#[cfg(test)]
mod tests {
    use super::{CellCoord, Direction, MenuAction, NavigationError, Path};
    use serde::{de::DeserializeOwned, Serialize};

    #[test]
    fn manhattan_distance_matches_expectation() {
        let origin = CellCoord::new(1, 1);
        let destination = CellCoord::new(4, 3);
        assert_eq!(origin.manhattan_distance(destination), 5);
        assert_eq!(destination.manhattan_distance(origin), 5);
    }

    #[test]
    fn step_stops_at_the_origin_edges() {
        let origin = CellCoord::new(0, 0);
        assert_eq!(origin.step(Direction::North), None);
        assert_eq!(origin.step(Direction::West), None);
        assert_eq!(origin.step(Direction::East), Some(CellCoord::new(1, 0)));
        assert_eq!(origin.step(Direction::South), Some(CellCoord::new(0, 1)));
    }

    #[test]
    fn direction_between_neighbors() {
        let origin = CellCoord::new(3, 3);
        for direction in Direction::SEARCH_ORDER {
            let next = origin.step(direction).expect("interior cell");
            assert_eq!(Direction::between(origin, next), Some(direction));
            let back = Direction::between(next, origin).expect("cells are adjacent");
            assert_ne!(back, direction);
            assert_eq!(next.step(back), Some(origin));
        }
        assert_eq!(Direction::between(origin, origin), None);
        assert_eq!(Direction::between(origin, CellCoord::new(4, 4)), None);
    }

    #[test]
    fn path_destination_follows_steps() {
        let path = Path::from(vec![Direction::East, Direction::East, Direction::South]);
        assert_eq!(
            path.destination_from(CellCoord::new(0, 0)),
            Some(CellCoord::new(2, 1))
        );
        assert_eq!(Path::new().destination_from(CellCoord::new(3, 3)), Some(CellCoord::new(3, 3)));
        let off_edge = Path::from(vec![Direction::North]);
        assert_eq!(off_edge.destination_from(CellCoord::new(0, 0)), None);
    }

    #[test]
    fn path_pops_in_travel_order() {
        let mut path: Path = [Direction::West, Direction::North].into_iter().collect();
        path.push_front(Direction::South);
        assert_eq!(path.len(), 3);
        assert_eq!(path.pop_front(), Some(Direction::South));
        assert_eq!(path.iter().next(), Some(Direction::West));
        path.clear();
        assert!(path.is_empty());
    }

    #[test]
    fn menu_labels_match_listing() {
        let labels: Vec<_> = MenuAction::COMMANDS
            .iter()
            .map(|action| action.label())
            .collect();
        assert_eq!(labels, ["Inspect", "Talk", "Use", "Pick-up"]);
    }

    #[test]
    fn navigation_errors_describe_cells() {
        let error = NavigationError::Unreachable {
            from: CellCoord::new(0, 0),
            to: CellCoord::new(2, 1),
        };
        assert_eq!(error.to_string(), "no walkable route from (0, 0) to (2, 1)");
        assert_eq!(
            NavigationError::Occupied(CellCoord::new(4, 2)).to_string(),
            "target cell (4, 2) is occupied by a map object"
        );
    }

    fn assert_round_trip<T>(value: &T)
    where
        T: Serialize + DeserializeOwned + PartialEq + std::fmt::Debug,
    {
        let bytes = bincode::serialize(value).expect("serialize");
        let restored: T = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(&restored, value);
    }

    #[test]
    fn path_round_trips_through_bincode() {
        let path = Path::from(vec![Direction::South, Direction::East, Direction::North]);
        assert_round_trip(&path);
    }
}

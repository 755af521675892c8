#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative map state for Pointwalk.
//!
//! The world owns terrain, map objects and actors. It only changes in
//! response to [`Command`] values passed to [`apply`], and reports every
//! change as an [`Event`]. The [`query`] module exposes read-only views,
//! including a [`MapQuery`](pointwalk_core::MapQuery) implementation for the
//! systems.

mod map;
mod objects;

use std::time::Duration;

use log::{debug, trace};
use pointwalk_core::{ActorId, CellCoord, Command, Direction, Event};

use self::{
    map::{TileMap, MAX_CELLS},
    objects::ObjectRegistry,
};

const DEFAULT_MAP_COLUMNS: u32 = 17;
const DEFAULT_MAP_ROWS: u32 = 13;
const DEFAULT_TILE_LENGTH: f32 = 48.0;

/// Identifier of the actor every freshly configured world starts with.
pub const PLAYER: ActorId = ActorId::new(0);

/// Represents the authoritative Pointwalk world state.
#[derive(Debug)]
pub struct World {
    map: TileMap,
    objects: ObjectRegistry,
    actors: Vec<Actor>,
    next_actor_id: u32,
    step_duration: Duration,
    tick_index: u64,
}

impl World {
    /// Creates a new world with an empty default map and the player at the origin.
    #[must_use]
    pub fn new() -> Self {
        let mut world = Self {
            map: TileMap::new(DEFAULT_MAP_COLUMNS, DEFAULT_MAP_ROWS, DEFAULT_TILE_LENGTH)
                .unwrap_or_default(),
            objects: ObjectRegistry::new(),
            actors: Vec::new(),
            next_actor_id: 0,
            step_duration: Duration::ZERO,
            tick_index: 0,
        };
        let _ = world.spawn_actor(CellCoord::new(0, 0));
        world
    }

    fn spawn_actor(&mut self, cell: CellCoord) -> Option<ActorId> {
        if !self.is_enterable(cell) {
            return None;
        }
        let id = ActorId::new(self.next_actor_id);
        self.next_actor_id = self.next_actor_id.saturating_add(1);
        self.actors.push(Actor::at(id, cell));
        Some(id)
    }

    fn actor_mut(&mut self, actor: ActorId) -> Option<&mut Actor> {
        self.actors.iter_mut().find(|candidate| candidate.id == actor)
    }

    fn is_enterable(&self, cell: CellCoord) -> bool {
        self.map
            .terrain(cell)
            .is_some_and(|terrain| terrain.is_walkable())
            && !self.objects.blocks(cell)
            && !self.actors.iter().any(|actor| actor.cell == cell)
    }

    fn can_pass(&self, from: CellCoord, direction: Direction) -> bool {
        from.step(direction)
            .is_some_and(|destination| self.is_enterable(destination))
    }

    fn step_actor(&mut self, actor: ActorId, direction: Direction, out_events: &mut Vec<Event>) {
        let Some(current) = self.actors.iter().find(|candidate| candidate.id == actor) else {
            debug!("step requested for unknown actor {}", actor.get());
            return;
        };
        let from = current.cell;

        let destination = if current.is_moving() || !self.can_pass(from, direction) {
            None
        } else {
            from.step(direction)
        };

        let Some(to) = destination else {
            debug!(
                "rejected {direction} step for actor {} at {from}",
                actor.get()
            );
            out_events.push(Event::ActorStepRejected { actor, direction });
            return;
        };

        let step_duration = self.step_duration;
        if let Some(mover) = self.actor_mut(actor) {
            mover.cell = to;
            mover.step_remaining = step_duration;
        }
        out_events.push(Event::ActorStepped {
            actor,
            from,
            to,
            direction,
        });
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Copy, Debug)]
struct Actor {
    id: ActorId,
    cell: CellCoord,
    step_remaining: Duration,
}

impl Actor {
    const fn at(id: ActorId, cell: CellCoord) -> Self {
        Self {
            id,
            cell,
            step_remaining: Duration::ZERO,
        }
    }

    fn is_moving(&self) -> bool {
        !self.step_remaining.is_zero()
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::ConfigureMap {
            columns,
            rows,
            tile_length,
        } => {
            let Some(map) = TileMap::new(columns, rows, tile_length) else {
                debug!("ignored {columns}x{rows} map: more than {MAX_CELLS} cells");
                return;
            };
            world.map = map;
            world.objects = ObjectRegistry::new();
            world.actors.clear();
            world.next_actor_id = 0;
            out_events.push(Event::MapConfigured { columns, rows });

            let origin = CellCoord::new(0, 0);
            if let Some(actor) = world.spawn_actor(origin) {
                out_events.push(Event::ActorSpawned {
                    actor,
                    cell: origin,
                });
            }
        }
        Command::ConfigureStepDuration { duration } => {
            world.step_duration = duration;
        }
        Command::SetDisplayOrigin { origin } => {
            world.map.set_display_origin(origin);
        }
        Command::Tick { dt } => {
            world.tick_index = world.tick_index.saturating_add(1);
            trace!("tick {}", world.tick_index);
            out_events.push(Event::TimeAdvanced { dt });

            for actor in world.actors.iter_mut() {
                if !actor.is_moving() {
                    continue;
                }
                actor.step_remaining = actor.step_remaining.saturating_sub(dt);
                if !actor.is_moving() {
                    out_events.push(Event::ActorStepCompleted {
                        actor: actor.id,
                        cell: actor.cell,
                    });
                }
            }
        }
        Command::SetTerrain { cell, terrain } => {
            if world.map.set_terrain(cell, terrain) {
                out_events.push(Event::TerrainChanged { cell, terrain });
            }
        }
        Command::PlaceObject {
            cell,
            blocking,
            menu,
        } => {
            if !world.map.contains(cell) {
                debug!("ignored object placement outside the map at {cell}");
                return;
            }
            let object = world.objects.insert(cell, blocking, menu);
            out_events.push(Event::ObjectPlaced { object, cell });
        }
        Command::RemoveObject { object } => {
            if let Some(removed) = world.objects.remove(object) {
                out_events.push(Event::ObjectRemoved {
                    object,
                    cell: removed.cell,
                });
            }
        }
        Command::SpawnActor { cell } => {
            if let Some(actor) = world.spawn_actor(cell) {
                out_events.push(Event::ActorSpawned { actor, cell });
            }
        }
        Command::PlaceActor { actor, cell } => {
            let already_there = world
                .actors
                .iter()
                .any(|candidate| candidate.id == actor && candidate.cell == cell);
            if !already_there && !world.is_enterable(cell) {
                debug!("ignored placement of actor {} onto {cell}", actor.get());
                return;
            }
            if let Some(placed) = world.actor_mut(actor) {
                *placed = Actor::at(actor, cell);
                out_events.push(Event::ActorPlaced { actor, cell });
            }
        }
        Command::StepActor { actor, direction } => {
            world.step_actor(actor, direction, out_events);
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use glam::Vec2;
    use pointwalk_core::{
        ActorId, ActorSnapshot, ActorView, CellCoord, Direction, MapQuery, ObjectSnapshot, Terrain,
    };

    use super::World;

    /// Captures a read-only view of the actors standing on the map.
    #[must_use]
    pub fn actor_view(world: &World) -> ActorView {
        ActorView::from_snapshots(
            world
                .actors
                .iter()
                .map(|actor| ActorSnapshot {
                    id: actor.id,
                    cell: actor.cell,
                    moving: actor.is_moving(),
                })
                .collect(),
        )
    }

    /// Snapshot of a single actor, if it exists.
    #[must_use]
    pub fn actor(world: &World, actor: ActorId) -> Option<ActorSnapshot> {
        actor_view(world).get(actor).copied()
    }

    /// Terrain of the provided cell, or `None` outside the map.
    #[must_use]
    pub fn terrain(world: &World, cell: CellCoord) -> Option<Terrain> {
        world.map.terrain(cell)
    }

    /// Snapshots of every map object in identifier order.
    #[must_use]
    pub fn objects(world: &World) -> Vec<ObjectSnapshot> {
        world.objects.iter().map(|object| object.snapshot()).collect()
    }

    /// First object standing on the provided cell.
    #[must_use]
    pub fn object_at(world: &World, cell: CellCoord) -> Option<ObjectSnapshot> {
        world.objects.at(cell).next().map(|object| object.snapshot())
    }

    /// Exposes the map collaborator surface consumed by the systems.
    #[must_use]
    pub fn map(world: &World) -> MapView<'_> {
        MapView { world }
    }

    /// Read-only map view implementing [`MapQuery`].
    #[derive(Clone, Copy, Debug)]
    pub struct MapView<'a> {
        world: &'a World,
    }

    impl MapQuery for MapView<'_> {
        fn dimensions(&self) -> (u32, u32) {
            self.world.map.dimensions()
        }

        fn can_pass(&self, from: CellCoord, direction: Direction) -> bool {
            self.world.can_pass(from, direction)
        }

        fn canvas_to_cell(&self, position: Vec2) -> Option<CellCoord> {
            self.world.map.canvas_to_cell(position)
        }

        fn objects_at(&self, cell: CellCoord) -> Vec<ObjectSnapshot> {
            self.world
                .objects
                .at(cell)
                .map(|object| object.snapshot())
                .collect()
        }
    }
}

#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Destination-driven movement system that plans paths and proposes actor steps.
//!
//! [`Movement`] keeps one [`MovementQueue`] per actor and, on every tick,
//! emits at most one [`Command::StepActor`] per actor. [`ClickToMove`] turns
//! double-clicks into destinations for a single controlled actor.

mod queue;

use std::collections::BTreeMap;

use log::debug;
use pointwalk_core::{
    ActorId, ActorView, CellCoord, Command, Event, MapQuery, NavigationError, PointerInput, Vec2,
};
use pointwalk_system_click::{ClickDetector, ClickSettings};
use pointwalk_system_pathfinding::Pathfinder;

pub use self::queue::{MovementQueue, MovementState};

/// Pure system that reacts to world events and emits movement commands.
#[derive(Debug, Default)]
pub struct Movement {
    pathfinder: Pathfinder,
    queues: BTreeMap<ActorId, MovementQueue>,
}

impl Movement {
    /// Creates a movement system with no active destinations.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Plans a route for `actor` to `target`, replacing any earlier destination.
    ///
    /// Returns the number of planned steps. On failure the actor is left idle.
    pub fn set_destination<M>(
        &mut self,
        actor: ActorId,
        target: CellCoord,
        actors: &ActorView,
        map: &M,
    ) -> Result<usize, NavigationError>
    where
        M: MapQuery + ?Sized,
    {
        let Some(snapshot) = actors.get(actor) else {
            let _ = self.queues.remove(&actor);
            return Err(NavigationError::UnknownActor(actor));
        };

        self.queues.entry(actor).or_default().set_destination(
            &mut self.pathfinder,
            map,
            snapshot.cell,
            target,
        )
    }

    /// Cancels the destination of `actor`, if any.
    pub fn cancel(&mut self, actor: ActorId) {
        if let Some(queue) = self.queues.get_mut(&actor) {
            queue.clear();
        }
    }

    /// Consumes world events and the current map to emit movement commands.
    ///
    /// Steps are only proposed for batches that contain a
    /// [`Event::TimeAdvanced`]; other batches merely update bookkeeping.
    pub fn handle<M>(
        &mut self,
        events: &[Event],
        actors: &ActorView,
        map: &M,
        out: &mut Vec<Command>,
    ) where
        M: MapQuery + ?Sized,
    {
        let mut time_advanced = false;
        for event in events {
            match event {
                Event::MapConfigured { .. } => self.queues.clear(),
                Event::ActorPlaced { actor, .. } => self.cancel(*actor),
                Event::ActorStepRejected { actor, direction } => {
                    if let Some(queue) = self.queues.get_mut(actor) {
                        debug!(
                            "{direction} step of actor {} was refused, replanning",
                            actor.get()
                        );
                        queue.invalidate_path();
                    }
                }
                Event::TimeAdvanced { .. } => time_advanced = true,
                _ => {}
            }
        }

        if !time_advanced {
            return;
        }

        for (&id, queue) in self.queues.iter_mut() {
            let Some(actor) = actors.get(id) else {
                queue.clear();
                continue;
            };

            if let Some(direction) = queue.update(&mut self.pathfinder, map, actor) {
                out.push(Command::StepActor {
                    actor: id,
                    direction,
                });
            }
        }
    }

    /// Current phase of the actor's queue.
    #[must_use]
    pub fn state(&self, actor: ActorId) -> MovementState {
        self.queues
            .get(&actor)
            .map_or(MovementState::Idle, MovementQueue::state)
    }

    /// Active destination of the actor.
    #[must_use]
    pub fn destination(&self, actor: ActorId) -> Option<CellCoord> {
        self.queues.get(&actor).and_then(MovementQueue::destination)
    }

    /// Steps left on the actor's active path.
    #[must_use]
    pub fn remaining_steps(&self, actor: ActorId) -> usize {
        self.queues
            .get(&actor)
            .map_or(0, MovementQueue::remaining_steps)
    }

    /// Queue of the actor, if it ever received a destination.
    #[must_use]
    pub fn queue(&self, actor: ActorId) -> Option<&MovementQueue> {
        self.queues.get(&actor)
    }
}

/// Checks that a clicked cell may become a destination.
///
/// Cells outside the map and cells holding any map object are refused.
pub fn validate_target<M>(map: &M, cell: CellCoord) -> Result<CellCoord, NavigationError>
where
    M: MapQuery + ?Sized,
{
    if !map.is_valid(cell) {
        return Err(NavigationError::OutOfBounds(cell));
    }
    if !map.objects_at(cell).is_empty() {
        return Err(NavigationError::Occupied(cell));
    }
    Ok(cell)
}

/// Routes double-clicks on the map to destinations for one actor.
#[derive(Clone, Debug)]
pub struct ClickToMove {
    detector: ClickDetector,
    actor: ActorId,
}

impl ClickToMove {
    /// Creates the glue for `actor` using the provided click settings.
    #[must_use]
    pub const fn new(actor: ActorId, settings: ClickSettings) -> Self {
        Self {
            detector: ClickDetector::new(settings),
            actor,
        }
    }

    /// Actor that receives the destinations.
    #[must_use]
    pub const fn actor(&self) -> ActorId {
        self.actor
    }

    /// Feeds one pointer sample and returns the accepted destination, if any.
    ///
    /// Rejected clicks (off the map, on an object, unreachable) are logged
    /// and otherwise ignored; the actor keeps whatever it was doing.
    pub fn handle_pointer_trigger<M>(
        &mut self,
        input: PointerInput,
        movement: &mut Movement,
        actors: &ActorView,
        map: &M,
    ) -> Option<CellCoord>
    where
        M: MapQuery + ?Sized,
    {
        let position = self.detector.observe(input)?;
        match self.resolve(position, movement, actors, map) {
            Ok(target) => Some(target),
            Err(error) => {
                debug!("ignored double-click at {position:?}: {error}");
                None
            }
        }
    }

    fn resolve<M>(
        &self,
        position: Vec2,
        movement: &mut Movement,
        actors: &ActorView,
        map: &M,
    ) -> Result<CellCoord, NavigationError>
    where
        M: MapQuery + ?Sized,
    {
        let cell = map
            .canvas_to_cell(position)
            .ok_or(NavigationError::OffCanvas)?;
        let target = validate_target(map, cell)?;
        let _ = movement.set_destination(self.actor, target, actors, map)?;
        Ok(target)
    }
}

//! Per-actor destination tracking and step scheduling.

use log::debug;
use pointwalk_core::{ActorSnapshot, CellCoord, Direction, MapQuery, NavigationError, Path};
use pointwalk_system_pathfinding::Pathfinder;

/// Observable phase of a [`MovementQueue`].
///
/// Planning and replanning happen synchronously inside
/// [`MovementQueue::set_destination`] and [`MovementQueue::update`], so they
/// never appear as a resting state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MovementState {
    /// No destination is active.
    Idle,
    /// A destination is active and its path is being walked.
    Executing,
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct MovementRequest {
    target: CellCoord,
    path: Path,
}

/// Destination and remaining path of a single actor.
///
/// Holds at most one request; a new destination replaces the previous one
/// outright.
#[derive(Clone, Debug, Default)]
pub struct MovementQueue {
    request: Option<MovementRequest>,
    // Target of a request whose final step was issued but not yet confirmed.
    last_arrival: Option<CellCoord>,
}

impl MovementQueue {
    /// Creates an idle queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current phase of the queue.
    #[must_use]
    pub fn state(&self) -> MovementState {
        if self.request.is_some() {
            MovementState::Executing
        } else {
            MovementState::Idle
        }
    }

    /// Target of the active request.
    #[must_use]
    pub fn destination(&self) -> Option<CellCoord> {
        self.request.as_ref().map(|request| request.target)
    }

    /// Steps left on the active path.
    #[must_use]
    pub fn remaining_steps(&self) -> usize {
        self.request
            .as_ref()
            .map_or(0, |request| request.path.len())
    }

    /// Remaining path of the active request.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.request.as_ref().map(|request| &request.path)
    }

    /// Replaces any active request with a freshly planned route to `target`.
    ///
    /// Returns the number of planned steps. Standing on the target already
    /// succeeds with zero steps and leaves the queue idle.
    pub fn set_destination<M>(
        &mut self,
        pathfinder: &mut Pathfinder,
        map: &M,
        from: CellCoord,
        target: CellCoord,
    ) -> Result<usize, NavigationError>
    where
        M: MapQuery + ?Sized,
    {
        self.clear();

        if from == target {
            return Ok(0);
        }

        let path = pathfinder.find_path(map, from, target);
        if path.is_empty() {
            debug!("no route from {from} to {target}");
            return Err(NavigationError::Unreachable { from, to: target });
        }

        let steps = path.len();
        debug!("planned {steps} steps from {from} to {target}");
        self.request = Some(MovementRequest { target, path });
        Ok(steps)
    }

    /// Advances the request by one tick, returning the step to issue, if any.
    ///
    /// Nothing happens while the actor is still animating a step. A queued
    /// step that is no longer passable triggers a replan from the actor's
    /// cell instead of a step; an empty replan abandons the request.
    pub fn update<M>(
        &mut self,
        pathfinder: &mut Pathfinder,
        map: &M,
        actor: &ActorSnapshot,
    ) -> Option<Direction>
    where
        M: MapQuery + ?Sized,
    {
        self.last_arrival = None;

        if actor.moving {
            return None;
        }

        let request = self.request.as_mut()?;
        match request.path.pop_front() {
            Some(direction) if map.can_pass(actor.cell, direction) => {
                if request.path.is_empty() {
                    self.last_arrival = Some(request.target);
                    self.request = None;
                }
                Some(direction)
            }
            Some(direction) => {
                debug!(
                    "{direction} step from {} is blocked, replanning toward {}",
                    actor.cell, request.target
                );
                self.replan(pathfinder, map, actor.cell);
                None
            }
            None => {
                self.replan(pathfinder, map, actor.cell);
                None
            }
        }
    }

    /// Discards the remaining path but keeps the target, forcing a replan on the next update.
    ///
    /// Also revives a request whose final step was refused after the queue
    /// had already gone idle.
    pub fn invalidate_path(&mut self) {
        if let Some(request) = self.request.as_mut() {
            request.path.clear();
        } else if let Some(target) = self.last_arrival.take() {
            self.request = Some(MovementRequest {
                target,
                path: Path::new(),
            });
        }
    }

    /// Cancels the active request.
    pub fn clear(&mut self) {
        self.request = None;
        self.last_arrival = None;
    }

    fn replan<M>(&mut self, pathfinder: &mut Pathfinder, map: &M, from: CellCoord)
    where
        M: MapQuery + ?Sized,
    {
        let Some(request) = self.request.as_mut() else {
            return;
        };

        request.path = pathfinder.find_path(map, from, request.target);
        if request.path.is_empty() {
            debug!(
                "abandoned movement toward {}: no route from {from}",
                request.target
            );
            self.request = None;
        }
    }
}

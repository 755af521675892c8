//! Headless map scene that wires the world to the interaction systems.

use std::{fmt, time::Duration};

use anyhow::{Context, Result};
use glam::Vec2;
use log::info;
use pointwalk_core::{ActorId, CellCoord, Command, Event, MenuAction, ObjectId, Path, PointerInput};
use pointwalk_system_action_menu::{ActionMenu, MenuOutcome};
use pointwalk_system_movement::{ClickToMove, Movement, MovementState};
use pointwalk_system_pathfinding::Pathfinder;
use pointwalk_world::{self as world, query, World, PLAYER};

use crate::scenario::{InputSpec, Scenario};

/// Command chosen from the action menu during a run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct MenuSelection {
    pub(crate) object: ObjectId,
    pub(crate) action: MenuAction,
}

/// Outcome of a scenario run.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Summary {
    pub(crate) frames: u32,
    pub(crate) player: CellCoord,
    pub(crate) state: MovementState,
    pub(crate) destination: Option<CellCoord>,
    pub(crate) steps: usize,
    pub(crate) refused_steps: usize,
    pub(crate) destinations: Vec<CellCoord>,
    pub(crate) selections: Vec<MenuSelection>,
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "frames: {}", self.frames)?;
        writeln!(f, "player: {}", self.player)?;
        match (self.state, self.destination) {
            (MovementState::Executing, Some(target)) => {
                writeln!(f, "movement: executing toward {target}")?
            }
            _ => writeln!(f, "movement: idle")?,
        }
        writeln!(f, "steps: {}", self.steps)?;
        writeln!(f, "refused steps: {}", self.refused_steps)?;
        for target in &self.destinations {
            writeln!(f, "destination: {target}")?;
        }
        for selection in &self.selections {
            writeln!(
                f,
                "selected: {} on object {}",
                selection.action.label(),
                selection.object.get()
            )?;
        }
        Ok(())
    }
}

/// Map scene driven one frame at a time.
///
/// Each frame hands the pointer sample to the action menu first, then to
/// double-click movement, and finally advances the world clock and lets the
/// movement system step the actors.
#[derive(Debug)]
pub(crate) struct MapScene {
    world: World,
    movement: Movement,
    click: ClickToMove,
    menu: ActionMenu,
    frame: Duration,
    now: Duration,
    frames: u32,
    steps: usize,
    refused_steps: usize,
    destinations: Vec<CellCoord>,
    selections: Vec<MenuSelection>,
}

impl MapScene {
    /// Builds the scene described by a scenario.
    pub(crate) fn new(scenario: &Scenario) -> Result<Self> {
        let mut scene = Self {
            world: World::new(),
            movement: Movement::new(),
            click: ClickToMove::new(PLAYER, scenario.settings.click),
            menu: ActionMenu::new(scenario.settings.menu),
            frame: Duration::from_millis(scenario.settings.frame_ms),
            now: Duration::ZERO,
            frames: 0,
            steps: 0,
            refused_steps: 0,
            destinations: Vec::new(),
            selections: Vec::new(),
        };

        let commands = scenario
            .setup_commands()
            .context("failed to build the scenario map")?;
        for command in commands {
            scene.apply(command);
        }
        Ok(scene)
    }

    /// Plays `frames` frames, pressing the pointer whenever a scripted input falls due.
    pub(crate) fn run(&mut self, inputs: &[InputSpec], frames: u32) -> Summary {
        let mut pending = inputs.iter().peekable();
        let mut pointer = Vec2::ZERO;

        for _ in 0..frames {
            let due = pending.next_if(|input| input.at() <= self.now);
            let sample = match due {
                Some(input) => {
                    pointer = input.position;
                    PointerInput::trigger(pointer, self.now)
                }
                None => PointerInput::idle(pointer, self.now),
            };
            self.update(sample);
        }

        self.summary()
    }

    /// Advances the scene by one frame.
    pub(crate) fn update(&mut self, pointer: PointerInput) {
        let menu_was_open = self.menu.is_open();
        let outcome = self
            .menu
            .handle_pointer_trigger(pointer, &query::map(&self.world));
        match outcome {
            MenuOutcome::Selected { object, action } => {
                self.selections.push(MenuSelection { object, action });
            }
            MenuOutcome::Opened { object, .. } => {
                info!("action menu opened for object {}", object.get());
            }
            MenuOutcome::Cancelled | MenuOutcome::None => {}
        }

        // Presses handled by the menu never reach the map.
        if !menu_was_open && !self.menu.is_open() {
            let actors = query::actor_view(&self.world);
            if let Some(target) = self.click.handle_pointer_trigger(
                pointer,
                &mut self.movement,
                &actors,
                &query::map(&self.world),
            ) {
                info!("moving actor {} toward {target}", self.click.actor().get());
                self.destinations.push(target);
            }
        }

        self.apply(Command::Tick { dt: self.frame });
        self.now = self.now.saturating_add(self.frame);
        self.frames = self.frames.saturating_add(1);
    }

    /// Current outcome of the run.
    pub(crate) fn summary(&self) -> Summary {
        Summary {
            frames: self.frames,
            player: self.player_cell(),
            state: self.movement.state(PLAYER),
            destination: self.movement.destination(PLAYER),
            steps: self.steps,
            refused_steps: self.refused_steps,
            destinations: self.destinations.clone(),
            selections: self.selections.clone(),
        }
    }

    /// Plans a route on the scene's map without moving anyone.
    ///
    /// Returns the path together with the number of expanded search nodes.
    pub(crate) fn plan(&self, from: CellCoord, to: CellCoord) -> (Path, usize) {
        let mut pathfinder = Pathfinder::new();
        let path = pathfinder.find_path(&query::map(&self.world), from, to);
        (path, pathfinder.expanded_nodes())
    }

    fn player_cell(&self) -> CellCoord {
        query::actor(&self.world, PLAYER).map_or(CellCoord::new(0, 0), |actor| actor.cell)
    }

    fn apply(&mut self, command: Command) {
        let mut events = Vec::new();
        world::apply(&mut self.world, command, &mut events);

        while !events.is_empty() {
            self.record(&events);

            let actors = query::actor_view(&self.world);
            let mut commands = Vec::new();
            self.movement
                .handle(&events, &actors, &query::map(&self.world), &mut commands);

            events.clear();
            for command in commands {
                world::apply(&mut self.world, command, &mut events);
            }
        }
    }

    fn record(&mut self, events: &[Event]) {
        for event in events {
            match event {
                Event::ActorStepped { actor, .. } if is_player(*actor) => {
                    self.steps = self.steps.saturating_add(1);
                }
                Event::ActorStepRejected { actor, .. } if is_player(*actor) => {
                    self.refused_steps = self.refused_steps.saturating_add(1);
                }
                _ => {}
            }
        }
    }
}

fn is_player(actor: ActorId) -> bool {
    actor == PLAYER
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scene(contents: &str) -> (MapScene, Scenario) {
        let scenario = Scenario::parse(contents).expect("scenario parses");
        let scene = MapScene::new(&scenario).expect("scene builds");
        (scene, scenario)
    }

    #[test]
    fn player_starts_on_marked_cell() {
        let (scene, _) = scene("[map]\nrows = [\"...\", \".@.\"]");
        assert_eq!(scene.summary().player, CellCoord::new(1, 1));
        assert_eq!(
            query::terrain(&scene.world, CellCoord::new(2, 1)),
            Some(pointwalk_core::Terrain::Floor)
        );
    }

    #[test]
    fn double_click_walks_player_to_target() {
        let (mut scene, scenario) = scene(
            r#"
            [settings]
            tile_length = 10.0
            frame_ms = 50

            [map]
            rows = ["@....", ".....", "....."]

            [[inputs]]
            at_ms = 100
            position = [42.0, 22.0]

            [[inputs]]
            at_ms = 150
            position = [44.0, 21.0]
            "#,
        );

        let summary = scene.run(scenario.inputs(), 20);

        assert_eq!(summary.destinations, vec![CellCoord::new(4, 2)]);
        assert_eq!(summary.player, CellCoord::new(4, 2));
        assert_eq!(summary.state, MovementState::Idle);
        assert_eq!(summary.steps, 6);
        assert_eq!(summary.frames, 20);
    }

    #[test]
    fn menu_selection_is_recorded_and_blocks_movement() {
        let (mut scene, scenario) = scene(
            r#"
            [settings]
            tile_length = 10.0
            frame_ms = 50

            [map]
            rows = ["@....", "....."]

            [[objects]]
            column = 2
            row = 0
            menu = true

            [[inputs]]
            at_ms = 0
            position = [25.0, 5.0]

            [[inputs]]
            at_ms = 100
            position = [80.0, 60.0]
            "#,
        );

        let summary = scene.run(scenario.inputs(), 10);

        assert_eq!(
            summary.selections,
            vec![MenuSelection {
                object: ObjectId::new(0),
                action: MenuAction::Talk,
            }]
        );
        assert!(summary.destinations.is_empty());
        assert_eq!(summary.player, CellCoord::new(0, 0));
    }

    #[test]
    fn summary_lists_movement_and_selections() {
        let summary = Summary {
            frames: 3,
            player: CellCoord::new(1, 2),
            state: MovementState::Executing,
            destination: Some(CellCoord::new(4, 2)),
            steps: 1,
            refused_steps: 0,
            destinations: vec![CellCoord::new(4, 2)],
            selections: vec![MenuSelection {
                object: ObjectId::new(3),
                action: MenuAction::PickUp,
            }],
        };

        let rendered = summary.to_string();
        assert!(rendered.contains("player: (1, 2)"));
        assert!(rendered.contains("movement: executing toward (4, 2)"));
        assert!(rendered.contains("selected: Pick-up on object 3"));
    }
}

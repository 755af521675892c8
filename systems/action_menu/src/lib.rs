#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Contextual action menu opened by clicking tagged map objects.
//!
//! The menu is a small frame anchored at the click position that lists the
//! [`MenuAction::COMMANDS`]. Clicking a row selects the command, clicking
//! anywhere outside the frame dismisses the menu.

use log::{debug, info};
use pointwalk_core::{MapQuery, MenuAction, ObjectId, PointerInput, Vec2};
use serde::{Deserialize, Serialize};

/// Frame geometry of the action menu in canvas units.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MenuLayout {
    /// Width of the frame.
    pub width: f32,
    /// Height of a single command row.
    pub line_height: f32,
    /// Inset between the frame border and the command rows.
    pub padding: f32,
}

impl MenuLayout {
    /// Height of a frame that fits every command row.
    #[must_use]
    pub fn height(&self) -> f32 {
        MenuAction::COMMANDS.len() as f32 * self.line_height + 2.0 * self.padding
    }
}

impl Default for MenuLayout {
    fn default() -> Self {
        Self {
            width: 200.0,
            line_height: 36.0,
            padding: 18.0,
        }
    }
}

/// Whether the menu is showing and for which object.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum MenuState {
    /// Nothing is displayed.
    #[default]
    Closed,
    /// The menu is displayed for an object.
    Open {
        /// Object the commands apply to.
        object: ObjectId,
        /// Canvas position of the frame's top-left corner.
        anchor: Vec2,
    },
}

/// Result of feeding input or a choice to the menu.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MenuOutcome {
    /// Nothing changed.
    None,
    /// The menu opened for an object.
    Opened {
        /// Object that was clicked.
        object: ObjectId,
        /// Canvas position the frame is anchored at.
        anchor: Vec2,
    },
    /// A command was chosen and the menu closed.
    Selected {
        /// Object the command applies to.
        object: ObjectId,
        /// Command that was chosen.
        action: MenuAction,
    },
    /// The menu was dismissed without a command.
    Cancelled,
}

type Handler = fn(MenuAction, ObjectId) -> MenuOutcome;

const HANDLERS: [(MenuAction, Handler); 5] = [
    (MenuAction::Inspect, select),
    (MenuAction::Talk, select),
    (MenuAction::Use, select),
    (MenuAction::PickUp, select),
    (MenuAction::Cancel, dismiss),
];

fn select(action: MenuAction, object: ObjectId) -> MenuOutcome {
    info!("{} action selected", action.label());
    MenuOutcome::Selected { object, action }
}

fn dismiss(_action: MenuAction, object: ObjectId) -> MenuOutcome {
    debug!("action menu for object {} dismissed", object.get());
    MenuOutcome::Cancelled
}

/// Point-and-click action menu.
#[derive(Clone, Debug, Default)]
pub struct ActionMenu {
    layout: MenuLayout,
    state: MenuState,
}

impl ActionMenu {
    /// Creates a closed menu using the provided frame geometry.
    #[must_use]
    pub const fn new(layout: MenuLayout) -> Self {
        Self {
            layout,
            state: MenuState::Closed,
        }
    }

    /// Current display state.
    #[must_use]
    pub const fn state(&self) -> MenuState {
        self.state
    }

    /// Reports whether the menu is displayed.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        matches!(self.state, MenuState::Open { .. })
    }

    /// Feeds one pointer sample to the menu.
    ///
    /// While open, triggers outside the frame dismiss the menu and triggers
    /// on a command row choose that command. While closed, a trigger over an
    /// object carrying the menu tag opens the menu at the pointer.
    pub fn handle_pointer_trigger<M>(&mut self, input: PointerInput, map: &M) -> MenuOutcome
    where
        M: MapQuery + ?Sized,
    {
        if !input.triggered {
            return MenuOutcome::None;
        }

        if self.is_open() {
            if !self.contains(input.position) {
                return self.choose(MenuAction::Cancel);
            }
            return self
                .command_at(input.position)
                .map_or(MenuOutcome::None, |action| self.choose(action));
        }

        let Some(object) = map
            .canvas_to_cell(input.position)
            .and_then(|cell| map.object_at(cell))
            .filter(|object| object.menu)
        else {
            return MenuOutcome::None;
        };

        debug!(
            "opening action menu for object {} at {}",
            object.id.get(),
            object.cell
        );
        self.state = MenuState::Open {
            object: object.id,
            anchor: input.position,
        };
        MenuOutcome::Opened {
            object: object.id,
            anchor: input.position,
        }
    }

    /// Runs the handler registered for `action` and closes the menu.
    ///
    /// Ignored while the menu is closed.
    pub fn choose(&mut self, action: MenuAction) -> MenuOutcome {
        let MenuState::Open { object, .. } = self.state else {
            debug!("ignored {} while the action menu is closed", action.label());
            return MenuOutcome::None;
        };
        self.state = MenuState::Closed;

        HANDLERS
            .iter()
            .find(|(candidate, _)| *candidate == action)
            .map_or(MenuOutcome::None, |(_, handler)| handler(action, object))
    }

    /// Reports whether a canvas position lies inside the open frame.
    #[must_use]
    pub fn contains(&self, position: Vec2) -> bool {
        self.local(position).is_some_and(|local| {
            local.x >= 0.0
                && local.y >= 0.0
                && local.x < self.layout.width
                && local.y < self.layout.height()
        })
    }

    /// Command row drawn under a canvas position, if any.
    #[must_use]
    pub fn command_at(&self, position: Vec2) -> Option<MenuAction> {
        if !self.contains(position) {
            return None;
        }
        let inner = self.local(position)? - Vec2::splat(self.layout.padding);
        let rows = MenuAction::COMMANDS.len() as f32;
        if inner.x < 0.0
            || inner.y < 0.0
            || inner.x >= self.layout.width - 2.0 * self.layout.padding
            || inner.y >= rows * self.layout.line_height
        {
            return None;
        }
        MenuAction::COMMANDS
            .get((inner.y / self.layout.line_height) as usize)
            .copied()
    }

    fn local(&self, position: Vec2) -> Option<Vec2> {
        match self.state {
            MenuState::Open { anchor, .. } => Some(position - anchor),
            MenuState::Closed => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use pointwalk_core::{CellCoord, Command};
    use pointwalk_world::{self as world, World};

    // A 4x4 map of 10-unit tiles with a menu object on (1, 1) and an untagged one on (2, 2).
    fn board() -> World {
        let mut world = World::new();
        let mut events = Vec::new();
        for command in [
            Command::ConfigureMap {
                columns: 4,
                rows: 4,
                tile_length: 10.0,
            },
            Command::PlaceObject {
                cell: CellCoord::new(1, 1),
                blocking: true,
                menu: true,
            },
            Command::PlaceObject {
                cell: CellCoord::new(2, 2),
                blocking: true,
                menu: false,
            },
        ] {
            world::apply(&mut world, command, &mut events);
        }
        world
    }

    fn press_on(menu: &mut ActionMenu, x: f32, y: f32) -> MenuOutcome {
        let board = board();
        menu.handle_pointer_trigger(press(x, y), &world::query::map(&board))
    }

    fn press(x: f32, y: f32) -> PointerInput {
        PointerInput::trigger(Vec2::new(x, y), Duration::ZERO)
    }

    fn opened_at(x: f32, y: f32) -> ActionMenu {
        let mut menu = ActionMenu::default();
        menu.state = MenuState::Open {
            object: ObjectId::new(0),
            anchor: Vec2::new(x, y),
        };
        menu
    }

    #[test]
    fn default_layout_fits_four_rows() {
        assert_eq!(MenuLayout::default().height(), 180.0);
    }

    #[test]
    fn opens_over_tagged_object() {
        let mut menu = ActionMenu::default();
        let outcome = press_on(&mut menu, 15.0, 15.0);
        assert_eq!(
            outcome,
            MenuOutcome::Opened {
                object: ObjectId::new(0),
                anchor: Vec2::new(15.0, 15.0),
            }
        );
        assert!(menu.is_open());
    }

    #[test]
    fn untagged_object_and_empty_cells_do_not_open() {
        let mut menu = ActionMenu::default();
        assert_eq!(press_on(&mut menu, 25.0, 25.0), MenuOutcome::None);
        assert_eq!(press_on(&mut menu, 35.0, 5.0), MenuOutcome::None);
        assert_eq!(menu.state(), MenuState::Closed);
    }

    #[test]
    fn samples_without_trigger_are_ignored() {
        let mut menu = ActionMenu::default();
        let board = board();
        let hover = PointerInput::idle(Vec2::new(15.0, 15.0), Duration::ZERO);
        assert_eq!(
            menu.handle_pointer_trigger(hover, &world::query::map(&board)),
            MenuOutcome::None
        );
        assert!(!menu.is_open());
    }

    #[test]
    fn frame_bounds_are_half_open() {
        let menu = opened_at(100.0, 100.0);
        assert!(menu.contains(Vec2::new(100.0, 100.0)));
        assert!(menu.contains(Vec2::new(299.5, 279.5)));
        assert!(!menu.contains(Vec2::new(300.0, 150.0)));
        assert!(!menu.contains(Vec2::new(150.0, 280.0)));
        assert!(!menu.contains(Vec2::new(99.0, 150.0)));
        assert!(!ActionMenu::default().contains(Vec2::new(100.0, 100.0)));
    }

    #[test]
    fn rows_map_to_commands_in_order() {
        let menu = opened_at(100.0, 100.0);
        let row = |index: f32| Vec2::new(150.0, 118.0 + index * 36.0 + 1.0);
        assert_eq!(menu.command_at(row(0.0)), Some(MenuAction::Inspect));
        assert_eq!(menu.command_at(row(1.0)), Some(MenuAction::Talk));
        assert_eq!(menu.command_at(row(2.0)), Some(MenuAction::Use));
        assert_eq!(menu.command_at(row(3.0)), Some(MenuAction::PickUp));
        assert_eq!(menu.command_at(Vec2::new(150.0, 105.0)), None);
        assert_eq!(menu.command_at(Vec2::new(105.0, 130.0)), None);
        assert_eq!(menu.command_at(Vec2::new(150.0, 270.0)), None);
    }

    #[test]
    fn clicking_outside_cancels() {
        let mut menu = opened_at(100.0, 100.0);
        assert_eq!(
            press_on(&mut menu, 10.0, 10.0),
            MenuOutcome::Cancelled
        );
        assert!(!menu.is_open());
    }

    #[test]
    fn clicking_a_row_selects_it() {
        let mut menu = opened_at(100.0, 100.0);
        assert_eq!(
            press_on(&mut menu, 150.0, 200.0),
            MenuOutcome::Selected {
                object: ObjectId::new(0),
                action: MenuAction::Use,
            }
        );
        assert!(!menu.is_open());
    }

    #[test]
    fn clicking_frame_padding_keeps_menu_open() {
        let mut menu = opened_at(100.0, 100.0);
        assert_eq!(
            press_on(&mut menu, 105.0, 105.0),
            MenuOutcome::None
        );
        assert!(menu.is_open());
    }

    #[test]
    fn choosing_while_closed_is_ignored() {
        let mut menu = ActionMenu::default();
        assert_eq!(menu.choose(MenuAction::Talk), MenuOutcome::None);
        assert_eq!(menu.choose(MenuAction::Cancel), MenuOutcome::None);
    }

    #[test]
    fn every_action_has_a_handler() {
        for action in MenuAction::COMMANDS {
            let mut menu = opened_at(0.0, 0.0);
            assert_eq!(
                menu.choose(action),
                MenuOutcome::Selected {
                    object: ObjectId::new(0),
                    action,
                }
            );
        }
        let mut menu = opened_at(0.0, 0.0);
        assert_eq!(menu.choose(MenuAction::Cancel), MenuOutcome::Cancelled);
        assert_eq!(menu.state(), MenuState::Closed);
    }
}

use std::time::Duration;

use pointwalk_core::{CellCoord, Command, MenuAction, ObjectId, PointerInput, Vec2};
use pointwalk_system_action_menu::{ActionMenu, MenuLayout, MenuOutcome, MenuState};
use pointwalk_world::{self as world, query, World};

fn world_with_objects() -> World {
    let mut world = World::new();
    let mut events = Vec::new();
    for command in [
        Command::ConfigureMap {
            columns: 8,
            rows: 8,
            tile_length: 48.0,
        },
        Command::PlaceObject {
            cell: CellCoord::new(3, 2),
            blocking: true,
            menu: true,
        },
        Command::PlaceObject {
            cell: CellCoord::new(5, 5),
            blocking: false,
            menu: false,
        },
    ] {
        world::apply(&mut world, command, &mut events);
    }
    world
}

fn press(x: f32, y: f32) -> PointerInput {
    PointerInput::trigger(Vec2::new(x, y), Duration::ZERO)
}

#[test]
fn tagged_object_opens_menu_and_row_click_selects() {
    let world = world_with_objects();
    let mut menu = ActionMenu::new(MenuLayout::default());

    let opened = menu.handle_pointer_trigger(press(160.0, 110.0), &query::map(&world));
    assert_eq!(
        opened,
        MenuOutcome::Opened {
            object: ObjectId::new(0),
            anchor: Vec2::new(160.0, 110.0),
        }
    );

    let talk_row = Vec2::new(200.0, 110.0 + 18.0 + 36.0 + 10.0);
    assert_eq!(menu.command_at(talk_row), Some(MenuAction::Talk));
    assert_eq!(
        menu.handle_pointer_trigger(press(talk_row.x, talk_row.y), &query::map(&world)),
        MenuOutcome::Selected {
            object: ObjectId::new(0),
            action: MenuAction::Talk,
        }
    );
    assert_eq!(menu.state(), MenuState::Closed);
}

#[test]
fn untagged_object_is_not_interactive() {
    let world = world_with_objects();
    let mut menu = ActionMenu::default();

    assert_eq!(
        menu.handle_pointer_trigger(press(5.0 * 48.0 + 1.0, 5.0 * 48.0 + 1.0), &query::map(&world)),
        MenuOutcome::None
    );
    assert!(!menu.is_open());
}

#[test]
fn click_outside_frame_while_open_cancels_without_reopening() {
    let world = world_with_objects();
    let mut menu = ActionMenu::default();
    let object = press(150.0, 100.0);
    let _ = menu.handle_pointer_trigger(object, &query::map(&world));
    assert!(menu.is_open());

    assert_eq!(
        menu.handle_pointer_trigger(press(10.0, 10.0), &query::map(&world)),
        MenuOutcome::Cancelled
    );
    assert!(!menu.is_open());

    let reopened = menu.handle_pointer_trigger(object, &query::map(&world));
    assert!(matches!(reopened, MenuOutcome::Opened { .. }));
}

#[test]
fn scrolled_display_shifts_the_clickable_cell() {
    let mut world = world_with_objects();
    let mut events = Vec::new();
    world::apply(
        &mut world,
        Command::SetDisplayOrigin {
            origin: Vec2::new(96.0, 48.0),
        },
        &mut events,
    );
    let mut menu = ActionMenu::default();

    assert_eq!(
        query::object_at(&world, CellCoord::new(3, 2)).map(|object| object.id),
        Some(ObjectId::new(0))
    );
    assert_eq!(
        menu.handle_pointer_trigger(press(150.0, 100.0), &query::map(&world)),
        MenuOutcome::None
    );
    assert!(matches!(
        menu.handle_pointer_trigger(press(60.0, 60.0), &query::map(&world)),
        MenuOutcome::Opened { .. }
    ));
}

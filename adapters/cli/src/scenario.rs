//! Scenario files describing a map, its objects and scripted pointer input.

use std::{fs, path::Path, time::Duration};

use anyhow::{bail, ensure, Context, Result};
use glam::Vec2;
use pointwalk_core::{CellCoord, Command, Terrain};
use pointwalk_system_action_menu::MenuLayout;
use pointwalk_system_click::ClickSettings;
use serde::Deserialize;

const WALL: char = '#';
const FLOOR: char = '.';
const PLAYER_START: char = '@';

/// Parsed scenario file.
#[derive(Clone, Debug, Deserialize)]
pub(crate) struct Scenario {
    #[serde(default)]
    pub(crate) settings: Settings,
    map: MapSpec,
    #[serde(default)]
    objects: Vec<ObjectSpec>,
    #[serde(default)]
    inputs: Vec<InputSpec>,
}

/// Tunables shared by every frame of a scenario run.
#[derive(Clone, Debug, Deserialize)]
pub(crate) struct Settings {
    #[serde(default)]
    pub(crate) click: ClickSettings,
    #[serde(default)]
    pub(crate) menu: MenuLayout,
    /// Side length of a map cell in canvas units.
    #[serde(default = "default_tile_length")]
    pub(crate) tile_length: f32,
    /// Canvas scroll offset.
    #[serde(default)]
    pub(crate) display_origin: Vec2,
    /// Simulated duration of one frame.
    #[serde(default = "default_frame_ms")]
    pub(crate) frame_ms: u64,
    /// Simulated duration of one actor step.
    #[serde(default)]
    pub(crate) step_ms: u64,
    /// Number of frames a run lasts.
    #[serde(default = "default_frames")]
    pub(crate) frames: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            click: ClickSettings::default(),
            menu: MenuLayout::default(),
            tile_length: default_tile_length(),
            display_origin: Vec2::ZERO,
            frame_ms: default_frame_ms(),
            step_ms: 0,
            frames: default_frames(),
        }
    }
}

fn default_tile_length() -> f32 {
    48.0
}

fn default_frame_ms() -> u64 {
    16
}

fn default_frames() -> u32 {
    600
}

#[derive(Clone, Debug, Deserialize)]
struct MapSpec {
    rows: Vec<String>,
}

#[derive(Clone, Copy, Debug, Deserialize)]
struct ObjectSpec {
    column: u32,
    row: u32,
    #[serde(default = "default_blocking")]
    blocking: bool,
    #[serde(default)]
    menu: bool,
}

fn default_blocking() -> bool {
    true
}

/// Pointer press scheduled at a point in simulated time.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
pub(crate) struct InputSpec {
    /// Milliseconds since the start of the run.
    pub(crate) at_ms: u64,
    /// Canvas position of the press.
    pub(crate) position: Vec2,
}

impl InputSpec {
    /// Simulated time of the press.
    pub(crate) fn at(&self) -> Duration {
        Duration::from_millis(self.at_ms)
    }
}

/// Terrain layout decoded from the ASCII map rows.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct MapLayout {
    pub(crate) columns: u32,
    pub(crate) rows: u32,
    pub(crate) walls: Vec<CellCoord>,
    pub(crate) player_start: Option<CellCoord>,
}

impl Scenario {
    /// Reads and validates the scenario at `path`.
    pub(crate) fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read scenario at {}", path.display()))?;
        Self::parse(&contents)
            .with_context(|| format!("invalid scenario file {}", path.display()))
    }

    /// Parses and validates scenario contents.
    pub(crate) fn parse(contents: &str) -> Result<Self> {
        let mut scenario: Self =
            toml::from_str(contents).context("failed to parse scenario toml contents")?;
        ensure!(
            scenario.settings.tile_length.is_finite() && scenario.settings.tile_length > 0.0,
            "tile length must be a positive number, got {}",
            scenario.settings.tile_length
        );
        ensure!(scenario.settings.frame_ms > 0, "frame length must be positive");

        let layout = scenario.layout()?;
        for object in &scenario.objects {
            ensure!(
                object.column < layout.columns && object.row < layout.rows,
                "object at ({}, {}) lies outside the {}x{} map",
                object.column,
                object.row,
                layout.columns,
                layout.rows
            );
        }

        scenario.inputs.sort_by_key(|input| input.at_ms);
        Ok(scenario)
    }

    /// Decodes the ASCII map rows.
    pub(crate) fn layout(&self) -> Result<MapLayout> {
        let Some(first) = self.map.rows.first() else {
            bail!("map must contain at least one row");
        };
        let width = first.chars().count();
        ensure!(width > 0, "map rows must not be empty");

        let mut walls = Vec::new();
        let mut player_start = None;
        for (row, line) in (0_u32..).zip(&self.map.rows) {
            ensure!(
                line.chars().count() == width,
                "map row {row} has {} columns, expected {width}",
                line.chars().count()
            );
            for (column, symbol) in (0_u32..).zip(line.chars()) {
                let cell = CellCoord::new(column, row);
                match symbol {
                    WALL => walls.push(cell),
                    FLOOR => {}
                    PLAYER_START => {
                        if let Some(previous) = player_start.replace(cell) {
                            bail!("map marks two player starts: {previous} and {cell}");
                        }
                    }
                    other => bail!("unknown map symbol `{other}` at {cell}"),
                }
            }
        }

        Ok(MapLayout {
            columns: u32::try_from(width).context("map is too wide")?,
            rows: u32::try_from(self.map.rows.len()).context("map is too tall")?,
            walls,
            player_start,
        })
    }

    /// World commands that build the scenario's initial state.
    pub(crate) fn setup_commands(&self) -> Result<Vec<Command>> {
        let layout = self.layout()?;
        let mut commands = vec![
            Command::ConfigureMap {
                columns: layout.columns,
                rows: layout.rows,
                tile_length: self.settings.tile_length,
            },
            Command::ConfigureStepDuration {
                duration: Duration::from_millis(self.settings.step_ms),
            },
            Command::SetDisplayOrigin {
                origin: self.settings.display_origin,
            },
        ];
        commands.extend(layout.walls.iter().map(|&cell| Command::SetTerrain {
            cell,
            terrain: Terrain::Wall,
        }));
        if let Some(cell) = layout.player_start {
            commands.push(Command::PlaceActor {
                actor: pointwalk_world::PLAYER,
                cell,
            });
        }
        commands.extend(self.objects.iter().map(|object| Command::PlaceObject {
            cell: CellCoord::new(object.column, object.row),
            blocking: object.blocking,
            menu: object.menu,
        }));
        Ok(commands)
    }

    /// Scripted pointer presses in chronological order.
    pub(crate) fn inputs(&self) -> &[InputSpec] {
        &self.inputs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        [settings]
        tile_length = 32.0
        frame_ms = 20
        step_ms = 60

        [settings.click]
        threshold = 250

        [map]
        rows = [
            "@..#",
            "...#",
            "....",
        ]

        [[objects]]
        column = 2
        row = 0
        menu = true

        [[inputs]]
        at_ms = 400
        position = [10.0, 10.0]

        [[inputs]]
        at_ms = 100
        position = [70.0, 20.0]
    "#;

    #[test]
    fn parses_settings_map_and_inputs() {
        let scenario = Scenario::parse(SAMPLE).expect("sample scenario parses");
        assert_eq!(scenario.settings.tile_length, 32.0);
        assert_eq!(scenario.settings.click.threshold, Duration::from_millis(250));
        assert_eq!(scenario.settings.click.tolerance, 10.0);
        assert_eq!(scenario.settings.menu, MenuLayout::default());
        assert_eq!(scenario.settings.frames, 600);

        let layout = scenario.layout().expect("layout decodes");
        assert_eq!((layout.columns, layout.rows), (4, 3));
        assert_eq!(
            layout.walls,
            vec![CellCoord::new(3, 0), CellCoord::new(3, 1)]
        );
        assert_eq!(layout.player_start, Some(CellCoord::new(0, 0)));

        let times: Vec<u64> = scenario.inputs().iter().map(|input| input.at_ms).collect();
        assert_eq!(times, vec![100, 400]);
    }

    #[test]
    fn setup_places_walls_player_and_objects() {
        let scenario = Scenario::parse(SAMPLE).expect("sample scenario parses");
        let commands = scenario.setup_commands().expect("commands build");

        assert!(matches!(
            commands.first(),
            Some(Command::ConfigureMap {
                columns: 4,
                rows: 3,
                ..
            })
        ));
        assert!(commands.contains(&Command::ConfigureStepDuration {
            duration: Duration::from_millis(60)
        }));
        assert!(commands.contains(&Command::PlaceObject {
            cell: CellCoord::new(2, 0),
            blocking: true,
            menu: true,
        }));
        let walls = commands
            .iter()
            .filter(|command| matches!(command, Command::SetTerrain { .. }))
            .count();
        assert_eq!(walls, 2);
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let error = Scenario::parse("[map]\nrows = [\"...\", \"..\"]")
            .expect_err("ragged map must fail");
        assert!(format!("{error:#}").contains("map row 1 has 2 columns"));
    }

    #[test]
    fn unknown_symbols_are_rejected() {
        let error =
            Scenario::parse("[map]\nrows = [\"..x\"]").expect_err("unknown symbol must fail");
        assert!(format!("{error:#}").contains("unknown map symbol `x`"));
    }

    #[test]
    fn objects_outside_the_map_are_rejected() {
        let contents = "[map]\nrows = [\"..\"]\n\n[[objects]]\ncolumn = 5\nrow = 0\n";
        let error = Scenario::parse(contents).expect_err("object outside map must fail");
        assert!(format!("{error:#}").contains("outside the 2x1 map"));
    }

    #[test]
    fn second_player_start_is_rejected() {
        let error =
            Scenario::parse("[map]\nrows = [\"@.@\"]").expect_err("two starts must fail");
        assert!(format!("{error:#}").contains("two player starts"));
    }
}

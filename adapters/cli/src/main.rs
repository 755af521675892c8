#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that plays Pointwalk scenarios headlessly.

mod scenario;
mod scene;

use std::{path::PathBuf, time::Duration};

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use pointwalk_core::CellCoord;

use self::{scenario::Scenario, scene::MapScene};

/// Headless driver for the Pointwalk click-to-move map scene.
#[derive(Debug, Parser)]
#[command(name = "pointwalk", version, about)]
struct Cli {
    /// Log debug output (RUST_LOG takes precedence).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Debug, Subcommand)]
enum CliCommand {
    /// Plays the scripted pointer input of a scenario and prints the outcome.
    Run {
        /// Scenario file to play.
        scenario: PathBuf,
        /// Overrides the double-click threshold in milliseconds.
        #[arg(long)]
        threshold_ms: Option<u64>,
        /// Overrides the number of frames to play.
        #[arg(long)]
        frames: Option<u32>,
    },
    /// Prints the route the pathfinder finds between two cells of a scenario map.
    Path {
        /// Scenario file providing the map.
        scenario: PathBuf,
        /// Start cell as `column,row`.
        #[arg(long, value_parser = parse_cell)]
        from: CellCoord,
        /// Goal cell as `column,row`.
        #[arg(long, value_parser = parse_cell)]
        to: CellCoord,
    },
}

/// Entry point for the Pointwalk command-line interface.
fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        CliCommand::Run {
            scenario,
            threshold_ms,
            frames,
        } => run(scenario, threshold_ms, frames),
        CliCommand::Path { scenario, from, to } => path(scenario, from, to),
    }
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();
}

fn run(path: PathBuf, threshold_ms: Option<u64>, frames: Option<u32>) -> Result<()> {
    let mut scenario = Scenario::load(&path)?;
    if let Some(threshold_ms) = threshold_ms {
        scenario.settings.click.threshold = Duration::from_millis(threshold_ms);
    }
    let frames = frames.unwrap_or(scenario.settings.frames);

    let mut scene = MapScene::new(&scenario)?;
    let summary = scene.run(scenario.inputs(), frames);
    print!("{summary}");
    Ok(())
}

fn path(path: PathBuf, from: CellCoord, to: CellCoord) -> Result<()> {
    let scenario = Scenario::load(&path)?;
    let scene = MapScene::new(&scenario)?;

    let (route, expanded) = scene.plan(from, to);
    if route.is_empty() && from != to {
        bail!("no walkable route from {from} to {to} ({expanded} nodes expanded)");
    }

    let directions: Vec<String> = route.iter().map(|direction| direction.to_string()).collect();
    println!("steps: {}", route.len());
    println!("route: {}", directions.join(" "));
    if let Some(end) = route.destination_from(from) {
        println!("end: {end}");
    }
    println!("expanded: {expanded}");
    Ok(())
}

fn parse_cell(value: &str) -> Result<CellCoord, String> {
    let Some((column, row)) = value.split_once(',') else {
        return Err(format!("expected `column,row`, got `{value}`"));
    };
    let parse = |part: &str| {
        part.trim()
            .parse::<u32>()
            .map_err(|error| format!("invalid coordinate `{part}`: {error}"))
    };
    Ok(CellCoord::new(parse(column)?, parse(row)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_cell_arguments() {
        assert_eq!(parse_cell("3,4"), Ok(CellCoord::new(3, 4)));
        assert_eq!(parse_cell(" 0 , 12 "), Ok(CellCoord::new(0, 12)));
        assert!(parse_cell("3").is_err());
        assert!(parse_cell("-1,2").is_err());
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn run_flags_are_optional() {
        let cli = Cli::try_parse_from(["pointwalk", "run", "demo.toml", "--frames", "5"])
            .expect("run arguments parse");
        match cli.command {
            CliCommand::Run {
                scenario,
                threshold_ms,
                frames,
            } => {
                assert_eq!(scenario, PathBuf::from("demo.toml"));
                assert_eq!(threshold_ms, None);
                assert_eq!(frames, Some(5));
            }
            CliCommand::Path { .. } => panic!("expected run command"),
        }
    }
}

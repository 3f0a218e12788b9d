use crate::map::DEFAULT_ZOOM;
use crate::types::{ActivityKind, Coords};
use crate::utils::parse_coords;
use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

const DEFAULT_DB: &str = "workouts.sqlite3";

#[derive(Parser, Debug)]
#[command(
    name = "waymark",
    about = "Log running and cycling workouts at map positions"
)]
pub struct Cli {
    /// SQLite file holding the saved workouts.
    #[arg(long, value_name = "PATH", default_value = DEFAULT_DB, global = true)]
    pub db: PathBuf,

    /// Current position, as LAT,LNG or a maps URL.
    ///
    /// Without it the position lookup fails and the map is not loaded.
    #[arg(long, value_name = "LAT,LNG", value_parser = parse_coords, global = true)]
    pub here: Option<Coords>,

    /// Map zoom level.
    #[arg(long, default_value_t = DEFAULT_ZOOM, global = true)]
    pub zoom: u8,

    /// Increase log verbosity (-v, -vv). Defaults to INFO.
    #[arg(short = 'v', long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Decrease log verbosity (-q, -qq). Defaults to INFO.
    #[arg(short = 'q', long, action = ArgAction::Count, global = true)]
    pub quiet: u8,

    #[command(subcommand)]
    pub cmd: Option<Cmd>,
}

#[derive(Subcommand, Debug)]
pub enum Cmd {
    /// Print the saved workouts (default).
    List,

    /// Print the saved workouts as list-item HTML.
    Html,

    /// Log a workout at a map position.
    Add {
        #[arg(value_parser = parse_kind)]
        kind: ActivityKind,

        /// Where the workout happened. Also used as the current position when --here is absent.
        #[arg(long, value_name = "LAT,LNG", value_parser = parse_coords)]
        at: Coords,

        /// Miles.
        #[arg(long, allow_hyphen_values = true)]
        distance: String,

        /// Minutes.
        #[arg(long, allow_hyphen_values = true)]
        duration: String,

        /// Steps per minute (running).
        #[arg(long, allow_hyphen_values = true, default_value = "")]
        cadence: String,

        /// Feet climbed (cycling).
        #[arg(long, allow_hyphen_values = true, default_value = "")]
        elevation: String,
    },

    /// Center the map on a workout.
    Show { id: String },

    /// Remove the most recent workout.
    DeleteLast,

    /// Remove every saved workout.
    Reset,
}

fn parse_kind(s: &str) -> Result<ActivityKind, String> {
    s.parse()
        .map_err(|k| format!("unknown workout type {k:?} (expected running or cycling)"))
}

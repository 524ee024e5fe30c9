//! Defines `Args` which is used to parse command line arguments.

use std::{path::PathBuf, str::FromStr};

use structopt::StructOpt;
use tracing::Level;


#[derive(StructOpt, Debug)]
#[structopt(setting = structopt::clap::AppSettings::VersionlessSubcommands)]
pub struct Args {
    #[structopt(flatten)]
    pub global: GlobalArgs,

    #[structopt(subcommand)]
    pub command: Command,
}

#[derive(StructOpt, Debug)]
pub struct GlobalArgs {
    /// Which library log messages to print on stderr. Valid values: 'off',
    /// 'error', 'warn', 'info', 'debug' and 'trace'.
    #[structopt(long = "--log-level", default_value = "off", global = true)]
    pub log_level: LogLevel,
}

#[derive(StructOpt, Debug)]
pub enum Command {
    /// Print information about a model and its tetrahedral mesh.
    #[structopt(name = "info")]
    Info {
        #[structopt(flatten)]
        args: InfoArgs,
    },

    /// Tetrahedralizes a model and writes it together with its linked
    /// tetrahedral mesh.
    #[structopt(name = "tetra")]
    Tetra {
        #[structopt(flatten)]
        args: TetraArgs,
    },

    /// Drops a model as soft body onto the ground and writes the deformed
    /// result.
    #[structopt(name = "simulate")]
    Simulate {
        #[structopt(flatten)]
        args: SimulateArgs,
    },
}

#[derive(StructOpt, Debug)]
pub struct InfoArgs {
    /// Path to the OBJ file. A `.tet` file with the same stem is read as
    /// well, if it exists.
    pub file: PathBuf,
}

#[derive(StructOpt, Debug)]
pub struct TetraArgs {
    /// Path to the source OBJ file.
    pub source: PathBuf,

    /// Path to the target OBJ file. The tetrahedral mesh is written next to
    /// it (same stem, extension `.tet`).
    #[structopt(short = "-o", long = "--output")]
    pub target: PathBuf,

    /// Number of voxels along the longest side of the model.
    #[structopt(long = "--subdivision", default_value = "20")]
    pub subdivision: u32,

    /// Detail level of the surface simplification in (0, 1]. 1 keeps the
    /// surface as is.
    #[structopt(long = "--detail", default_value = "1")]
    pub detail: f32,

    /// Tetrahedralize the iso surface instead of the (simplified) surface.
    #[structopt(long = "--iso")]
    pub iso: bool,

    /// Skip smoothing of the iso surface.
    #[structopt(long = "--single-pass", requires = "iso")]
    pub single_pass: bool,
}

#[derive(StructOpt, Debug)]
pub struct SimulateArgs {
    /// Path to the source OBJ file. If there is no `.tet` file next to it,
    /// the model is tetrahedralized first.
    pub source: PathBuf,

    /// Path of the OBJ file receiving the deformed model.
    #[structopt(short = "-o", long = "--output")]
    pub target: PathBuf,

    /// Number of simulation steps.
    #[structopt(long = "--steps", default_value = "100")]
    pub steps: u32,

    /// Length of one simulation step in seconds.
    #[structopt(long = "--dt", default_value = "0.016")]
    pub dt: f32,

    /// Initial height above the ground.
    #[structopt(long = "--height", default_value = "0")]
    pub height: f32,

    /// Disable gravity.
    #[structopt(long = "--no-gravity")]
    pub no_gravity: bool,

    /// Subdivision level used if the model has to be tetrahedralized.
    #[structopt(long = "--subdivision", default_value = "20")]
    pub subdivision: u32,
}

/// A log level or `off`.
#[derive(Debug, Clone, Copy)]
pub struct LogLevel(pub Option<Level>);

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(src: &str) -> Result<Self, Self::Err> {
        let level = match src.to_ascii_lowercase().as_str() {
            "off" => None,
            "error" => Some(Level::ERROR),
            "warn" => Some(Level::WARN),
            "info" => Some(Level::INFO),
            "debug" => Some(Level::DEBUG),
            "trace" => Some(Level::TRACE),
            other => return Err(format!("'{}' is not a valid log level", other)),
        };

        Ok(LogLevel(level))
    }
}

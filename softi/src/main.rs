use failure::Error;
use structopt::StructOpt;
use tracing_subscriber::FmtSubscriber;

#[macro_use]
mod ui;

mod args;
mod commands;

use crate::args::{Args, Command, LogLevel};


fn main() {
    if let Err(e) = run() {
        error!("softi failed: {}", e);
        for cause in e.iter_causes() {
            error!("  ... caused by: {}", cause);
        }

        // Backtraces are only captured with `RUST_BACKTRACE=1`.
        if std::env::var_os("RUST_BACKTRACE").map_or(false, |v| v == "1") {
            error!();
            error!("{}", e.backtrace());
        }

        std::process::exit(1);
    }
}

fn run() -> Result<(), Error> {
    let args = Args::from_args();
    install_logger(args.global.log_level)?;

    let global_args = &args.global;
    match &args.command {
        Command::Info { args } => commands::info::run(global_args, args),
        Command::Tetra { args } => commands::tetra::run(global_args, args),
        Command::Simulate { args } => commands::simulate::run(global_args, args),
    }
}

/// Library log messages go to stderr so they do not mix with the regular
/// output.
fn install_logger(LogLevel(level): LogLevel) -> Result<(), Error> {
    if let Some(level) = level {
        let subscriber = FmtSubscriber::builder()
            .with_max_level(level)
            .with_writer(std::io::stderr)
            .with_target(false)
            .finish();
        tracing::subscriber::set_global_default(subscriber)?;
    }

    Ok(())
}

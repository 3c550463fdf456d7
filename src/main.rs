//! ptydeck - multiplexed pseudo-terminal sessions
//!
//! Thin binary entry point that delegates to the subcommand handlers.

use anyhow::Result;
use clap::Parser;
use ptydeck_config::ConfigLoader;

mod attach;
mod cli;
mod inspect;
mod logging;
mod serve;

use cli::{Cli, Commands};
use logging::LogSink;

/// Exit status for a run cut short by Ctrl-C.
const INTERRUPTED_EXIT_CODE: i32 = 130;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();
    let command = args.resolved_command();

    let (config, source) = ConfigLoader::new().load(args.config.as_deref())?;

    let sink = match command {
        Commands::Attach { .. } => LogSink::File(logging::log_file_path(&config.debug)),
        _ => LogSink::Stderr,
    };
    logging::initialize_tracing(&config.debug, args.log_level, sink)?;
    tracing::debug!(source = ?source, "configuration loaded");

    match command {
        Commands::Serve => {
            if serve::run(&config).await? == serve::ServeExit::Interrupted {
                // stdin is read on a blocking thread; exiting here avoids
                // waiting on it during runtime shutdown.
                std::process::exit(INTERRUPTED_EXIT_CODE);
            }
        }
        Commands::Attach { id } => {
            attach::run(&config, id).await?;
        }
        Commands::Shell { json } => {
            inspect::print_shell(&config, json)?;
        }
        Commands::Slots => {
            inspect::print_slots(&config);
        }
    }

    Ok(())
}

use std::path::PathBuf;

use clap::builder::{PossibleValuesParser, TypedValueParser};
use clap::{Parser, Subcommand};
use ptydeck_config::TraceLevel;

/// Multiplexed pseudo-terminal sessions with batched output
#[derive(Debug, Parser)]
#[command(name = "ptydeck", version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (defaults to ./ptydeck.toml, then the user config dir)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Log level override
    #[arg(
        long,
        global = true,
        value_name = "LEVEL",
        ignore_case = true,
        value_parser = trace_level_parser()
    )]
    pub log_level: Option<TraceLevel>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// Run the session registry: JSON-line commands on stdin, events on stdout
    Serve,

    /// Open a session in this terminal (the default). Press Ctrl-] to leave.
    Attach {
        /// Session id; defaults to the first configured terminal slot
        #[arg(value_name = "ID")]
        id: Option<String>,
    },

    /// Show the shell a new session would launch
    Shell {
        #[arg(long)]
        json: bool,
    },

    /// List the configured terminal slots
    Slots,
}

impl Cli {
    pub fn resolved_command(&self) -> Commands {
        self.command
            .clone()
            .unwrap_or(Commands::Attach { id: None })
    }
}

fn trace_level_parser() -> impl TypedValueParser<Value = TraceLevel> {
    PossibleValuesParser::new(TraceLevel::names()).try_map(|name| name.parse::<TraceLevel>())
}

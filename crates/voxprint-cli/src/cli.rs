//! CLI argument definitions for voxprint.
//!
//! All `clap` structures live here so that `main.rs` stays focused on
//! dispatching subcommands.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// voxprint -- a voice-driven print and scan assistant.
#[derive(Parser)]
#[command(
    name = "voxprint",
    version,
    about = "voxprint -- voice-driven print and scan assistant",
    long_about = "Type what you would say to the assistant. Each line is parsed into a \
                  command, checked against the current workflow step and carried out \
                  against a simulated document list."
)]
pub struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, short, global = true, default_value = "config/default.toml")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Talk to the assistant turn by turn.
    Repl,

    /// Print the parsed command for one utterance against the saved context.
    Parse {
        /// The utterance, e.g. `select documents 1 to 3`.
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },

    /// Show the saved workflow context.
    Status,

    /// Discard the saved context and start on the dashboard.
    Reset,
}

//! CLI entry point for voxprint.
//!
//! This binary provides the `voxprint` command: an interactive REPL that
//! drives the print/scan assistant from typed utterances, plus one-shot
//! subcommands for parsing and for inspecting or resetting the saved
//! workflow context.

mod callbacks;
mod cli;
mod config;
mod helpers;
mod repl;
mod store;

use anyhow::Result;
use clap::Parser;

use crate::cli::{Cli, Commands};
use crate::config::load_assistant_config;
use crate::helpers::init_tracing;

fn main() -> Result<()> {
    // `.env` first so RUST_LOG from it reaches the filter.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = load_assistant_config(&cli.config);
    init_tracing(&config.log_level);

    match cli.command {
        Commands::Repl => repl::cmd_repl(&config),
        Commands::Parse { text } => repl::cmd_parse(&config, &text.join(" ")),
        Commands::Status => repl::cmd_status(&config),
        Commands::Reset => repl::cmd_reset(&config),
    }
}

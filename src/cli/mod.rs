//! CLI module for Labyrinth.
//!
//! Subcommands:
//! - `validate`: load the atlas and report structure and fork warnings
//! - `stats`: node, override, and progression statistics
//! - `walk`: interactive fork walk driving the gate end to end

mod stats;
mod validate;
mod walk;

use clap::{Parser, Subcommand};

pub use walk::WalkCommand;

/// Labyrinth - Dimensional Knowledge Graph
#[derive(Parser)]
#[command(name = "labyrinth")]
#[command(about = "Dimensional knowledge graph - progression and visibility engine")]
#[command(version)]
pub struct App {
    /// Run in verbose mode
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Load the atlas and report structure and fork warnings
    Validate,

    /// Show node counts, override tiers, and a progression snapshot
    Stats,

    /// Walk the graph interactively through the progression gate
    Walk(WalkCommand),
}

impl App {
    /// Run the CLI application.
    pub async fn run(self) -> color_eyre::Result<()> {
        match self.command {
            Command::Validate => validate::run().await,
            Command::Stats => stats::run().await,
            Command::Walk(cmd) => cmd.run().await,
        }
    }
}

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(author, version, about = "Plan equipment swaps and piece requirements against your inventory")]
pub struct Cli {
    /// Seed the session from a JSON snapshot
    #[clap(long, short = 'i')]
    pub import: Option<PathBuf>,

    /// Starting requirement mode (ByPiece or ByEquipment)
    #[clap(long, short = 'm')]
    pub mode: Option<String>,

    /// Path to the settings file (defaults to $PLANNER_CONFIG or ~/.equipment_planner.yaml)
    #[clap(long)]
    pub config: Option<PathBuf>,

    #[clap(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start an interactive planning session (the default)
    Session,

    /// List the requirements of the active mode
    List,

    /// Show required versus stocked pieces
    Summary {
        /// Include pieces that are fully stocked
        #[clap(long, short = 'a')]
        all: bool,
    },

    /// Export the store snapshot as JSON
    Export {
        /// Output file path (prints to stdout when omitted)
        #[clap(long, short = 'o')]
        output: Option<PathBuf>,
    },
}

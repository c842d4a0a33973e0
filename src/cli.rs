use clap::{Parser, Subcommand};
use std::path::PathBuf;

use autostudio::director::StopAfter;

#[derive(Parser)]
#[command(name = "autostudio")]
#[command(author, version, about = "Turn a one-line idea into a scripted, storyboarded and voiced short")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the whole pipeline for an idea, approving each review automatically
    Run {
        /// The story idea, e.g. "a robot chase in a cyberpunk city"
        #[arg(required = true)]
        idea: String,

        /// Write the final project snapshot to this file as JSON
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Stop at a review stage instead of producing assets
        #[arg(long, value_enum)]
        stop_after: Option<StopAfter>,
    },

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses default if not specified)
        config: Option<PathBuf>,
    },

    /// Display version information
    Version,
}

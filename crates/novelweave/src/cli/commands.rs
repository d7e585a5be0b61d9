//! CLI command definitions.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Novelweave - turn prose into branching visual-novel scripts
#[derive(Parser, Debug)]
#[command(name = "novelweave")]
#[command(about = "Turn prose into branching visual-novel scripts", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file overriding the bundled and user defaults
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Export spans through OpenTelemetry
    #[arg(long, global = true)]
    pub telemetry: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Convert a text file into a script
    Convert {
        /// Path to the novel text (UTF-8)
        input: PathBuf,

        /// Write the script here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Always convert segment by segment
        #[arg(long, conflicts_with = "no_stream")]
        stream: bool,

        /// Never segment, even long texts
        #[arg(long)]
        no_stream: bool,

        /// Generate scene and item images after conversion
        #[arg(long)]
        assets: bool,

        /// Provider quota tier (defaults to the configured tier)
        #[arg(long)]
        tier: Option<String>,
    },

    /// Show how a text file would be segmented, without calling any provider
    Segment {
        /// Path to the novel text (UTF-8)
        input: PathBuf,
    },

    /// Check and repair an existing script file
    Validate {
        /// Path to the script JSON
        script: PathBuf,

        /// Write the repaired script here
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

//! Command-line argument definitions for the erdlayout CLI.
//!
//! This module defines the [`Args`] structure parsed from the command line
//! using [`clap`]. Arguments control input/output paths, configuration file
//! selection, the layout strategy and logging verbosity.

use clap::Parser;

use erdlayout::layout::LayoutKind;

/// Command-line arguments for the erdlayout tool
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the input entity list (JSON)
    #[arg(help = "Path to the input file")]
    pub input: String,

    /// Path to the output diagram file (JSON)
    #[arg(short, long, default_value = "out.json")]
    pub output: String,

    /// Path to configuration file (TOML)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Layout strategy, overriding the configured one
    /// (linear, circular, hierarchical, force-directed, x, y, box)
    #[arg(short, long)]
    pub engine: Option<LayoutKind>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

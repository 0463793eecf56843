//! CLI argument parsing for latmap

use clap::Parser;
use std::path::{Path, PathBuf};

/// One-line usage shown when the positional argument count is wrong
pub const USAGE: &str = "Usage: latmap <op_trace_csv_input_file>";

#[derive(Parser, Debug)]
#[command(name = "latmap")]
#[command(version)]
#[command(
    about = "End-to-end latency correlation and heatmap rendering for operation traces",
    long_about = None
)]
pub struct Cli {
    /// Operation trace CSV file (exactly one)
    #[arg(value_name = "OP_TRACE_CSV")]
    pub inputs: Vec<PathBuf>,

    /// Write the heatmap PNG here instead of the configured path
    #[arg(short = 'o', long = "output", value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Load binning/rendering settings from a TOML file
    #[arg(long = "config", value_name = "TOML")]
    pub config: Option<PathBuf>,

    /// Print a run summary (record, sample and grid counts) to stderr
    #[arg(short = 'c', long = "summary")]
    pub summary: bool,

    /// Enable debug tracing output to stderr
    #[arg(long = "debug")]
    pub debug: bool,
}

impl Cli {
    /// The input path, if exactly one was given
    pub fn input(&self) -> Option<&Path> {
        match self.inputs.as_slice() {
            [input] => Some(input.as_path()),
            _ => None,
        }
    }
}

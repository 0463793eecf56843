//! Error types for latency correlation and heatmap output
//!
//! Record-level problems never surface here: they are counted and skipped
//! by the reader. Everything in [`HeatmapError`] ends the run.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort a heatmap run
#[derive(Error, Debug)]
pub enum HeatmapError {
    #[error("Failed to open the input file {}: {source}", .path.display())]
    InputOpen {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Failed to write latency sample: {0}")]
    SampleWrite(#[from] std::io::Error),

    #[error("Failed to write heatmap image {}: {source}", .path.display())]
    OutputWrite {
        path: PathBuf,
        #[source]
        source: png::EncodingError,
    },

    #[error("Failed to load config {}: {reason}", .path.display())]
    ConfigLoad { path: PathBuf, reason: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for heatmap operations
pub type Result<T> = std::result::Result<T, HeatmapError>;

//! latmap - end-to-end latency heatmaps from operation traces
//!
//! Pairs successful create and read operations on the same item into latency
//! samples, streams them as CSV, and renders their distribution over time as
//! a grayscale heatmap with a logarithmic latency axis.

pub mod cli;
pub mod config;
pub mod correlator;
pub mod error;
pub mod heatmap;
pub mod histogram;
pub mod pipeline;
pub mod record;
pub mod sample_output;
pub mod trace_reader;

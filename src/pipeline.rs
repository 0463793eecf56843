//! End-to-end run: trace records to latency samples to heatmap
//!
//! ```text
//! TraceReader -> Correlator -> SampleWriter (streamed)
//!                           -> HistogramGrid -> HeatmapImage -> PNG
//! ```
//!
//! State lives in the values built here; nothing survives the run.

use crate::config::HeatmapConfig;
use crate::correlator::Correlator;
use crate::error::Result;
use crate::heatmap::{render, HeatmapImage};
use crate::histogram::{Degenerate, GridPoint, HistogramGrid, LatencyRange};
use crate::sample_output::SampleWriter;
use crate::trace_reader::{ReadStats, TraceReader};
use std::fmt;
use std::io::{Read, Write};
use std::path::Path;

/// What a run saw and produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub records: ReadStats,
    pub samples: u64,
    pub unmatched_reads: u64,
    pub pending_creates: usize,
    /// Raw min/max over all samples, `None` when there were none
    pub latency_range: Option<LatencyRange>,
    pub unplottable: u64,
    pub degenerate: Option<Degenerate>,
    pub columns: usize,
    pub rows: usize,
    pub max_cell_count: u64,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "records: {} read, {} decoded, {} skipped ({} non-success, {} malformed, {} short, {} unknown op, {} unreadable)",
            self.records.rows,
            self.records.events,
            self.records.skipped(),
            self.records.non_success,
            self.records.malformed,
            self.records.too_few_fields,
            self.records.unknown_operation,
            self.records.unreadable,
        )?;
        writeln!(
            f,
            "samples: {} matched, {} unmatched reads, {} creates still pending",
            self.samples, self.unmatched_reads, self.pending_creates
        )?;
        if let Some(range) = self.latency_range {
            writeln!(f, "latency: min {}us, max {}us", range.min, range.max)?;
        }
        if let Some(reason) = self.degenerate {
            writeln!(f, "heatmap: degenerate scale ({})", reason)?;
        }
        write!(
            f,
            "heatmap: {}x{} cells, {} unplottable, densest cell {}",
            self.columns, self.rows, self.unplottable, self.max_cell_count
        )
    }
}

/// Correlate every event from `reader`, stream samples to `sink`, and render
pub fn process<R: Read, W: Write>(
    mut reader: TraceReader<R>,
    config: &HeatmapConfig,
    sink: &mut SampleWriter<W>,
) -> Result<(RunSummary, HeatmapImage)> {
    let mut correlator = Correlator::new();
    // Item keys are only needed for the streamed line; the grid gets points.
    let mut points: Vec<GridPoint> = Vec::new();

    while let Some(event) = reader.next_event() {
        if let Some(sample) = correlator.ingest(event) {
            sink.write_sample(&sample)?;
            points.push(GridPoint::from(&sample));
        }
    }

    let stats = reader.stats();
    tracing::debug!(
        rows = stats.rows,
        skipped = stats.skipped(),
        samples = points.len(),
        "trace consumed"
    );

    let latency_range = (correlator.sample_count() > 0).then(|| LatencyRange {
        min: correlator.latency_min(),
        max: correlator.latency_max(),
    });

    // Non-positive samples are unplottable, so the scale spans positive ones only.
    let bounds = LatencyRange::plottable(&points).unwrap_or(LatencyRange {
        min: correlator.latency_min(),
        max: correlator.latency_max(),
    });
    let grid = HistogramGrid::build(&points, bounds.min, bounds.max, config);
    let degenerate = grid.scale().err();
    if let Some(reason) = degenerate {
        tracing::warn!("Degenerate latency scale: {}", reason);
    }

    let image = render(&grid, config);

    let summary = RunSummary {
        records: stats.clone(),
        samples: correlator.sample_count(),
        unmatched_reads: correlator.unmatched_reads(),
        pending_creates: correlator.pending_count(),
        latency_range,
        unplottable: grid.unplottable(),
        degenerate,
        columns: grid.columns(),
        rows: grid.rows(),
        max_cell_count: grid.max_cell_count(),
    };

    Ok((summary, image))
}

/// Run over a trace file and write the heatmap to `config.output_path`
pub fn run<P: AsRef<Path>, W: Write>(
    input: P,
    config: &HeatmapConfig,
    sink: &mut SampleWriter<W>,
) -> Result<RunSummary> {
    let reader = TraceReader::open(input, config.success_status)?;
    let (summary, image) = process(reader, config, sink)?;
    image.write_png(&config.output_path)?;
    Ok(summary)
}

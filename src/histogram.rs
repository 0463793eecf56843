//! 2-D latency histogram: fixed-width time columns by log-scale latency rows
//!
//! Row `r` covers `[min * factor^r, min * factor^(r+1))` with
//! `factor = (max / min)^(1 / rows)`. A sample equal to `max` lands in the
//! last row. Samples with `latency <= 0` or a negative time offset cannot be
//! placed and are counted as unplottable instead.

use crate::config::HeatmapConfig;
use crate::correlator::LatencySample;
use std::fmt;

/// Why no logarithmic scale could be built
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Degenerate {
    /// There were no samples at all
    NoSamples,
    /// Lower bound was zero or negative
    NonPositiveMinimum,
    /// Upper bound was not above the lower bound
    EmptyRange,
}

impl fmt::Display for Degenerate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Degenerate::NoSamples => write!(f, "no latency samples"),
            Degenerate::NonPositiveMinimum => write!(f, "minimum latency is not positive"),
            Degenerate::EmptyRange => write!(f, "maximum latency does not exceed minimum"),
        }
    }
}

/// Where one sample sits on the heatmap axes
///
/// The binner only needs these two values, so runs keep points instead of
/// whole samples once a sample has been streamed out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridPoint {
    pub time_offset_micros: i64,
    pub latency_micros: i64,
}

impl From<&LatencySample> for GridPoint {
    fn from(sample: &LatencySample) -> Self {
        Self {
            time_offset_micros: sample.time_offset_micros,
            latency_micros: sample.latency_micros,
        }
    }
}

impl From<&GridPoint> for GridPoint {
    fn from(point: &GridPoint) -> Self {
        *point
    }
}

/// Inclusive latency bounds over a set of samples
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LatencyRange {
    pub min: i64,
    pub max: i64,
}

impl LatencyRange {
    /// Bounds over samples the grid can place, `None` if there are none
    pub fn plottable<I, P>(samples: I) -> Option<Self>
    where
        I: IntoIterator<Item = P>,
        P: Into<GridPoint>,
    {
        samples
            .into_iter()
            .map(Into::<GridPoint>::into)
            .filter(|s| s.time_offset_micros >= 0)
            .map(|s| s.latency_micros)
            .filter(|&lat| lat > 0)
            .fold(None, |range, lat| match range {
                None => Some(LatencyRange { min: lat, max: lat }),
                Some(r) => Some(LatencyRange {
                    min: r.min.min(lat),
                    max: r.max.max(lat),
                }),
            })
    }
}

/// Geometric row boundaries between two positive latencies
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LogScale {
    latency_min: f64,
    factor: f64,
    rows: usize,
}

impl LogScale {
    pub fn new(latency_min: i64, latency_max: i64, rows: usize) -> Result<Self, Degenerate> {
        if latency_min <= 0 {
            return Err(Degenerate::NonPositiveMinimum);
        }
        if latency_max <= latency_min {
            return Err(Degenerate::EmptyRange);
        }
        let ratio = latency_max as f64 / latency_min as f64;
        Ok(Self {
            latency_min: latency_min as f64,
            factor: ratio.powf(1.0 / rows as f64),
            rows,
        })
    }

    /// Row for a positive latency, clamped into `[0, rows - 1]`
    pub fn row_of(&self, latency_micros: i64) -> Option<usize> {
        if latency_micros <= 0 {
            return None;
        }
        let steps = (latency_micros as f64 / self.latency_min).ln() / self.factor.ln();
        let row = if steps.is_finite() && steps > 0.0 {
            steps.floor() as usize
        } else {
            0
        };
        Some(row.min(self.rows - 1))
    }
}

/// Column-major grid of sample counts
#[derive(Debug, Clone)]
pub struct HistogramGrid {
    rows: usize,
    column_width_micros: i64,
    counts: Vec<u64>,
    max_cell_count: u64,
    total_count: u64,
    unplottable: u64,
    scale: Result<LogScale, Degenerate>,
}

impl HistogramGrid {
    /// Bin samples against the given latency bounds
    ///
    /// The column count covers the largest time offset among all samples and
    /// is never less than one, so even a degenerate grid renders.
    pub fn build<I, P>(
        samples: I,
        latency_min: i64,
        latency_max: i64,
        config: &HeatmapConfig,
    ) -> Self
    where
        I: IntoIterator<Item = P>,
        I::IntoIter: Clone,
        P: Into<GridPoint>,
    {
        let samples = samples.into_iter().map(Into::<GridPoint>::into);
        let rows = config.row_count.max(1);
        let width = config.column_width_micros.max(1);

        let columns = samples
            .clone()
            .filter(|s| s.time_offset_micros >= 0)
            .map(|s| (s.time_offset_micros / width) as usize + 1)
            .max()
            .unwrap_or(1);

        let has_samples = samples.clone().next().is_some();
        let scale = if has_samples {
            LogScale::new(latency_min, latency_max, rows)
        } else {
            Err(Degenerate::NoSamples)
        };

        let mut grid = Self {
            rows,
            column_width_micros: width,
            counts: vec![0; columns * rows],
            max_cell_count: 0,
            total_count: 0,
            unplottable: 0,
            scale,
        };

        if let Err(reason) = grid.scale {
            tracing::debug!("histogram scale degenerate ({}), no cells filled", reason);
        }

        for sample in samples {
            let col = match grid.column_of(sample.time_offset_micros) {
                Some(col) if sample.latency_micros > 0 => col,
                _ => {
                    grid.unplottable += 1;
                    continue;
                }
            };
            if let Some(row) = grid.scale.ok().and_then(|s| s.row_of(sample.latency_micros)) {
                grid.increment(col, row);
            }
        }

        grid
    }

    fn column_of(&self, time_offset_micros: i64) -> Option<usize> {
        if time_offset_micros < 0 {
            return None;
        }
        Some((time_offset_micros / self.column_width_micros) as usize)
    }

    fn increment(&mut self, col: usize, row: usize) {
        let cell = &mut self.counts[col * self.rows + row];
        *cell += 1;
        self.max_cell_count = self.max_cell_count.max(*cell);
        self.total_count += 1;
    }

    pub fn columns(&self) -> usize {
        self.counts.len() / self.rows
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Count in a cell; out-of-range coordinates read as zero
    pub fn cell(&self, col: usize, row: usize) -> u64 {
        if row >= self.rows {
            return 0;
        }
        self.counts.get(col * self.rows + row).copied().unwrap_or(0)
    }

    pub fn max_cell_count(&self) -> u64 {
        self.max_cell_count
    }

    /// Sum over all cells
    pub fn total_count(&self) -> u64 {
        self.total_count
    }

    /// Samples that could not be placed on the scale
    pub fn unplottable(&self) -> u64 {
        self.unplottable
    }

    pub fn scale(&self) -> Result<&LogScale, Degenerate> {
        self.scale.as_ref().map_err(|d| *d)
    }
}

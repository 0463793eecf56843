//! Streaming reader for operation trace CSV files
//!
//! Rows are decoded one at a time in file order. Rows that do not yield an
//! event are counted by reason and skipped; only failing to open the file
//! is fatal.

use crate::error::{HeatmapError, Result};
use crate::record::{decode, OpEvent, SkipReason};
use std::fs::File;
use std::io;
use std::path::Path;

/// Per-run record counters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadStats {
    /// Rows seen, decoded or not
    pub rows: u64,
    /// Rows that produced an event
    pub events: u64,
    pub non_success: u64,
    pub malformed: u64,
    pub too_few_fields: u64,
    pub unknown_operation: u64,
    pub unreadable: u64,
    /// Set when an I/O error ended the stream early
    pub truncated: bool,
}

impl ReadStats {
    fn record_skip(&mut self, reason: SkipReason) {
        match reason {
            SkipReason::NonSuccessStatus(_) => self.non_success += 1,
            SkipReason::Malformed { .. } => self.malformed += 1,
            SkipReason::TooFewFields => self.too_few_fields += 1,
            SkipReason::UnknownOperation(_) => self.unknown_operation += 1,
            SkipReason::Unreadable => self.unreadable += 1,
        }
    }

    /// Total rows that were skipped for any reason
    pub fn skipped(&self) -> u64 {
        self.non_success
            + self.malformed
            + self.too_few_fields
            + self.unknown_operation
            + self.unreadable
    }
}

/// Reader yielding decoded [`OpEvent`]s
pub struct TraceReader<R: io::Read> {
    reader: csv::Reader<R>,
    record: csv::StringRecord,
    success_status: i64,
    stats: ReadStats,
    done: bool,
}

impl TraceReader<File> {
    /// Open a trace file
    pub fn open<P: AsRef<Path>>(path: P, success_status: i64) -> Result<Self> {
        let path = path.as_ref();
        let reader = Self::builder()
            .from_path(path)
            .map_err(|source| HeatmapError::InputOpen {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(Self::with_reader(reader, success_status))
    }
}

impl<R: io::Read> TraceReader<R> {
    /// Wrap any byte source (used for stdin-like inputs and tests)
    pub fn from_reader(rdr: R, success_status: i64) -> Self {
        Self::with_reader(Self::builder().from_reader(rdr), success_status)
    }

    fn builder() -> csv::ReaderBuilder {
        let mut builder = csv::ReaderBuilder::new();
        builder.has_headers(false).flexible(true);
        builder
    }

    fn with_reader(reader: csv::Reader<R>, success_status: i64) -> Self {
        Self {
            reader,
            record: csv::StringRecord::new(),
            success_status,
            stats: ReadStats::default(),
            done: false,
        }
    }

    /// Advance to the next event, skipping rows that don't decode
    pub fn next_event(&mut self) -> Option<OpEvent> {
        while !self.done {
            match self.reader.read_record(&mut self.record) {
                Ok(false) => self.done = true,
                Ok(true) => {
                    self.stats.rows += 1;
                    let fields: Vec<&str> = self.record.iter().collect();
                    match decode(&fields, self.success_status) {
                        Ok(event) => {
                            self.stats.events += 1;
                            return Some(event);
                        }
                        Err(reason) => {
                            tracing::trace!(row = self.stats.rows, %reason, "skipping record");
                            self.stats.record_skip(reason);
                        }
                    }
                }
                Err(e) if e.is_io_error() => {
                    tracing::warn!("Failed to read the record from the input file: {}", e);
                    self.stats.truncated = true;
                    self.done = true;
                }
                Err(e) => {
                    self.stats.rows += 1;
                    tracing::trace!(row = self.stats.rows, error = %e, "skipping unreadable row");
                    self.stats.record_skip(SkipReason::Unreadable);
                }
            }
        }
        None
    }

    pub fn stats(&self) -> &ReadStats {
        &self.stats
    }
}

impl<R: io::Read> Iterator for TraceReader<R> {
    type Item = OpEvent;

    fn next(&mut self) -> Option<OpEvent> {
        self.next_event()
    }
}

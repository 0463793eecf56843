//! Streamed CSV output of correlated latency samples
//!
//! One `item_key,time_offset_micros,latency_micros` line per sample, written
//! as soon as the pair is matched. No header row.

use crate::correlator::LatencySample;
use std::io::{self, Write};

/// Writer for latency sample lines
#[derive(Debug)]
pub struct SampleWriter<W: Write> {
    out: W,
}

impl<W: Write> SampleWriter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Escape CSV field (handle commas, quotes, newlines)
    fn escape_field(field: &str) -> std::borrow::Cow<'_, str> {
        if field.contains(',') || field.contains('"') || field.contains('\n') {
            format!("\"{}\"", field.replace('"', "\"\"")).into()
        } else {
            field.into()
        }
    }

    /// Write one sample line
    pub fn write_sample(&mut self, sample: &LatencySample) -> io::Result<()> {
        writeln!(
            self.out,
            "{},{},{}",
            Self::escape_field(&sample.item_key),
            sample.time_offset_micros,
            sample.latency_micros
        )
    }

    /// Flush and hand back the underlying writer
    pub fn finish(mut self) -> io::Result<W> {
        self.out.flush()?;
        Ok(self.out)
    }
}

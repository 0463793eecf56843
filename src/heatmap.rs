//! Grayscale heatmap rendering and PNG output
//!
//! One pixel per histogram cell. Time runs left to right, latency bottom to
//! top. Intensity falls linearly with count: the densest cell is black and
//! empty cells are white.

use crate::config::HeatmapConfig;
use crate::error::{HeatmapError, Result};
use crate::histogram::HistogramGrid;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// Rendered grayscale raster, row-major from the top
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeatmapImage {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl HeatmapImage {
    /// Blank image filled with `background`
    pub fn filled(width: u32, height: u32, background: u8) -> Self {
        Self {
            width,
            height,
            pixels: vec![background; width as usize * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Intensity at `(x, y)`, `y = 0` being the top row
    pub fn pixel(&self, x: u32, y: u32) -> Option<u8> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels
            .get(y as usize * self.width as usize + x as usize)
            .copied()
    }

    fn set(&mut self, x: u32, y: u32, value: u8) {
        if x < self.width && y < self.height {
            self.pixels[y as usize * self.width as usize + x as usize] = value;
        }
    }

    /// Expand to RGBA with equal channels and full opacity
    pub fn to_rgba(&self) -> Vec<u8> {
        self.pixels
            .iter()
            .flat_map(|&v| [v, v, v, u8::MAX])
            .collect()
    }

    /// Encode as an 8-bit RGBA PNG
    pub fn write_png<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let output_err = |source: png::EncodingError| HeatmapError::OutputWrite {
            path: path.to_path_buf(),
            source,
        };

        let file = File::create(path).map_err(|e| output_err(e.into()))?;
        let mut encoder = png::Encoder::new(BufWriter::new(file), self.width, self.height);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);

        let mut writer = encoder.write_header().map_err(output_err)?;
        writer
            .write_image_data(&self.to_rgba())
            .map_err(output_err)?;
        writer.finish().map_err(output_err)?;

        tracing::debug!(
            "Wrote {}x{} heatmap to {}",
            self.width,
            self.height,
            path.display()
        );
        Ok(())
    }
}

/// Intensity for a cell count normalized against the densest cell
pub fn intensity(count: u64, max_cell_count: u64, max_intensity: u8) -> u8 {
    if max_cell_count == 0 {
        return max_intensity;
    }
    let max = u64::from(max_intensity);
    let scaled = max * count.min(max_cell_count) / max_cell_count;
    (max - scaled) as u8
}

/// Rasterize a finished grid
///
/// Grid row `r` is drawn at pixel row `rows - 1 - r` so the lowest latency
/// bucket sits on the bottom edge.
pub fn render(grid: &HistogramGrid, config: &HeatmapConfig) -> HeatmapImage {
    let width = grid.columns() as u32;
    let height = grid.rows() as u32;
    let mut image = HeatmapImage::filled(width, height, config.max_intensity);

    if grid.max_cell_count() == 0 {
        return image;
    }

    for col in 0..grid.columns() {
        for row in 0..grid.rows() {
            let value = intensity(
                grid.cell(col, row),
                grid.max_cell_count(),
                config.max_intensity,
            );
            image.set(col as u32, height - 1 - row as u32, value);
        }
    }

    image
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::correlator::LatencySample;

    fn sample(offset: i64, latency: i64) -> LatencySample {
        LatencySample {
            item_key: "k".to_string(),
            time_offset_micros: offset,
            latency_micros: latency,
        }
    }

    fn config(rows: usize) -> HeatmapConfig {
        HeatmapConfig {
            row_count: rows,
            ..HeatmapConfig::default()
        }
    }

    #[test]
    fn test_intensity_normalization() {
        assert_eq!(intensity(0, 4, 255), 255);
        assert_eq!(intensity(4, 4, 255), 0);
        assert_eq!(intensity(2, 4, 255), 128);
        assert_eq!(intensity(0, 0, 255), 255);
    }

    #[test]
    fn test_intensity_monotonic() {
        let mut last = u8::MAX;
        for count in 0..=17 {
            let v = intensity(count, 17, 255);
            assert!(v <= last);
            last = v;
        }
    }

    #[test]
    fn test_render_orientation() {
        let cfg = config(4);
        let samples = vec![sample(0, 1), sample(0, 1), sample(1_000_000, 16)];
        let grid = HistogramGrid::build(&samples, 1, 16, &cfg);
        let image = render(&grid, &cfg);

        assert_eq!(image.width(), 2);
        assert_eq!(image.height(), 4);
        // lowest latency, densest cell: bottom-left, black
        assert_eq!(image.pixel(0, 3), Some(0));
        // max latency: top row of the second column
        assert_eq!(image.pixel(1, 0), Some(128));
        assert_eq!(image.pixel(0, 0), Some(255));
        assert_eq!(image.pixel(2, 0), None);
    }

    #[test]
    fn test_render_degenerate_is_all_white() {
        let cfg = config(8);
        let samples = vec![sample(0, 5), sample(3_000_000, 5)];
        let grid = HistogramGrid::build(&samples, 5, 5, &cfg);
        let image = render(&grid, &cfg);

        assert_eq!(image.width(), 4);
        assert_eq!(image.height(), 8);
        assert!(image.to_rgba().iter().all(|&v| v == 255));
    }

    #[test]
    fn test_rgba_expansion() {
        let image = HeatmapImage::filled(1, 1, 42);
        assert_eq!(image.to_rgba(), vec![42, 42, 42, 255]);
    }

    #[test]
    fn test_write_png_signature() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("heatmap.png");
        HeatmapImage::filled(3, 2, 255).write_png(&path).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
    }

    #[test]
    fn test_write_png_unwritable_path() {
        let err = HeatmapImage::filled(1, 1, 255)
            .write_png("/nonexistent/dir/heatmap.png")
            .unwrap_err();
        assert!(matches!(err, HeatmapError::OutputWrite { .. }));
    }
}

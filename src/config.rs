//! Heatmap configuration
//!
//! Defaults reproduce the classic layout: one-second columns, 100 log-scale
//! latency rows, 8-bit grayscale. Any field can be overridden from a TOML file.

use crate::error::{HeatmapError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Status code marking a successful operation in the trace
pub const STATUS_SUCCESS: i64 = 4;

/// Configuration for binning and rendering
///
/// # Example
/// ```
/// use latmap::config::HeatmapConfig;
///
/// let config = HeatmapConfig::default();
/// assert_eq!(config.column_width_micros, 1_000_000);
/// assert_eq!(config.row_count, 100);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeatmapConfig {
    /// Width of one time column in microseconds
    pub column_width_micros: i64,

    /// Number of logarithmic latency rows (image height)
    pub row_count: usize,

    /// Intensity of an empty cell; the densest cell renders at 0
    pub max_intensity: u8,

    /// Where the PNG heatmap is written
    pub output_path: PathBuf,

    /// Status code treated as success when filtering records
    pub success_status: i64,
}

impl Default for HeatmapConfig {
    fn default() -> Self {
        Self {
            column_width_micros: 1_000_000,
            row_count: 100,
            max_intensity: 255,
            output_path: PathBuf::from("heatmap.png"),
            success_status: STATUS_SUCCESS,
        }
    }
}

impl HeatmapConfig {
    /// Load configuration from a TOML file, filling missing fields with defaults
    ///
    /// # Example TOML
    /// ```toml
    /// column_width_micros = 500000
    /// row_count = 64
    /// output_path = "latency.png"
    /// ```
    pub fn from_toml<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| HeatmapError::ConfigLoad {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| HeatmapError::ConfigLoad {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Reject settings that would make the grid meaningless
    pub fn validate(&self) -> Result<()> {
        if self.column_width_micros <= 0 {
            return Err(HeatmapError::InvalidConfig(format!(
                "column_width_micros must be positive, got {}",
                self.column_width_micros
            )));
        }
        if self.row_count == 0 {
            return Err(HeatmapError::InvalidConfig(
                "row_count must be positive".to_string(),
            ));
        }
        if self.row_count > u32::MAX as usize {
            return Err(HeatmapError::InvalidConfig(format!(
                "row_count {} exceeds image height limit",
                self.row_count
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_config_default() {
        let config = HeatmapConfig::default();
        assert_eq!(config.max_intensity, 255);
        assert_eq!(config.success_status, 4);
        assert_eq!(config.output_path, PathBuf::from("heatmap.png"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_toml_partial_override() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "row_count = 32").unwrap();
        writeln!(file, "output_path = \"out.png\"").unwrap();

        let config = HeatmapConfig::from_toml(file.path()).unwrap();
        assert_eq!(config.row_count, 32);
        assert_eq!(config.output_path, PathBuf::from("out.png"));
        assert_eq!(config.column_width_micros, 1_000_000);
    }

    #[test]
    fn test_from_toml_rejects_zero_width() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "column_width_micros = 0").unwrap();

        let err = HeatmapConfig::from_toml(file.path()).unwrap_err();
        assert!(matches!(err, HeatmapError::InvalidConfig(_)));
    }

    #[test]
    fn test_from_toml_bad_syntax() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "row_count = = 3").unwrap();

        let err = HeatmapConfig::from_toml(file.path()).unwrap_err();
        assert!(matches!(err, HeatmapError::ConfigLoad { .. }));
    }

    #[test]
    fn test_from_toml_missing_file() {
        let err = HeatmapConfig::from_toml("/nonexistent/latmap.toml").unwrap_err();
        assert!(matches!(err, HeatmapError::ConfigLoad { .. }));
    }

    #[test]
    fn test_validate_zero_rows() {
        let config = HeatmapConfig {
            row_count: 0,
            ..HeatmapConfig::default()
        };
        assert!(config.validate().is_err());
    }
}

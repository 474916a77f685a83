//! Pipeline configuration loaded from config.json.
//!
//! If the config file doesn't exist, default values are used. The defaults
//! reproduce the extraction geometry and normalization constants the record
//! consumers were calibrated against, so override them with care.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Vertical band of the screenshot the username/comment text renders in,
/// measured in pixels up from the bottom edge.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct BandConfig {
    /// Distance from the bottom edge to the top of the band
    pub top_offset: u32,
    /// Distance from the bottom edge to the bottom of the band
    pub bottom_offset: u32,
}

impl Default for BandConfig {
    fn default() -> Self {
        Self {
            top_offset: 250,
            bottom_offset: 150,
        }
    }
}

/// Complete pipeline configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Region of the screenshot fed to OCR
    pub band: BandConfig,
    /// Contrast multiplier applied around the mean luminance (higher = more contrast)
    pub contrast_factor: f32,
    /// Uniform downscale divisor (higher = smaller raster, faster but less accurate OCR)
    pub downscale_factor: u32,
    /// Tesseract language code
    pub language: String,
    /// Tesseract page segmentation mode
    pub page_segmentation_mode: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            band: BandConfig::default(),
            contrast_factor: 1.2,
            downscale_factor: 2,
            language: "eng".to_string(),
            page_segmentation_mode: 6,
        }
    }
}

impl PipelineConfig {
    /// Load config from file, or return defaults if the file doesn't exist.
    pub fn load(config_path: &Path) -> Self {
        if config_path.exists() {
            match fs::read_to_string(config_path) {
                Ok(contents) => match serde_json::from_str(&contents) {
                    Ok(config) => {
                        crate::log(&format!("Config loaded from {}", config_path.display()));
                        return config;
                    }
                    Err(e) => {
                        crate::log(&format!(
                            "Failed to parse {}: {}. Using defaults.",
                            config_path.display(),
                            e
                        ));
                    }
                },
                Err(e) => {
                    crate::log(&format!(
                        "Failed to read {}: {}. Using defaults.",
                        config_path.display(),
                        e
                    ));
                }
            }
        }
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.band.top_offset, 250);
        assert_eq!(config.band.bottom_offset, 150);
        assert_eq!(config.contrast_factor, 1.2);
        assert_eq!(config.downscale_factor, 2);
        assert_eq!(config.language, "eng");
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = PipelineConfig::load(Path::new("does_not_exist.json"));
        assert_eq!(config.band.top_offset, 250);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"contrast_factor": 1.5}}"#).unwrap();

        let config = PipelineConfig::load(file.path());
        assert_eq!(config.contrast_factor, 1.5);
        // Unspecified fields fall back to defaults
        assert_eq!(config.band.top_offset, 250);
        assert_eq!(config.downscale_factor, 2);
    }

    #[test]
    fn test_band_override() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"band": {{"top_offset": 300, "bottom_offset": 100}}}}"#
        )
        .unwrap();

        let config = PipelineConfig::load(file.path());
        assert_eq!(config.band.top_offset, 300);
        assert_eq!(config.band.bottom_offset, 100);
    }
}

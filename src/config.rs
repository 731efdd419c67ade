//! Tunable constants of the crack detector.
//!
//! Every threshold the pipeline uses lives here with its default. A config can
//! be loaded from JSON; missing sections and fields fall back to the defaults.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::DetectionError;

/// Gaussian sigma equivalent to a 5x5 smoothing aperture.
pub const DEFAULT_BLUR_SIGMA: f32 = 1.1;

pub const DEFAULT_LOW_THRESHOLD: f32 = 40.0;
pub const DEFAULT_HIGH_THRESHOLD: f32 = 140.0;
pub const DEFAULT_DILATION_KERNEL: u32 = 3;
pub const DEFAULT_DILATION_ITERATIONS: u32 = 1;

pub const DEFAULT_TEXTURE_ENERGY_MIN: f64 = 100.0;
pub const DEFAULT_EDGE_DENSITY_MIN: f64 = 0.02;
pub const DEFAULT_MATERIAL_CANNY_LOW: f32 = 50.0;
pub const DEFAULT_MATERIAL_CANNY_HIGH: f32 = 150.0;

pub const DEFAULT_MIN_AREA: f64 = 500.0;
pub const DEFAULT_MAX_AREA: f64 = 10_000.0;

pub const DEFAULT_CONFIDENCE_SCALE: f64 = 6500.0;
pub const DEFAULT_CONFIDENCE_CAP: f64 = 99.9;
pub const DEFAULT_HEALTHY_LOW: f32 = 82.0;
pub const DEFAULT_HEALTHY_HIGH: f32 = 95.0;

/// Largest structuring element `imageproc::morphology::dilate` can express.
const MAX_DILATION_KERNEL: u32 = 2 * u8::MAX as u32 + 1;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    pub preprocess: PreprocessConfig,
    pub edges: EdgeConfig,
    pub material: MaterialConfig,
    pub contours: ContourConfig,
    pub confidence: ConfidenceConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessConfig {
    pub blur_sigma: f32,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            blur_sigma: DEFAULT_BLUR_SIGMA,
        }
    }
}

/// Main-pipeline edge extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EdgeConfig {
    pub low_threshold: f32,
    pub high_threshold: f32,
    /// Side of the square structuring element; must be odd.
    pub dilation_kernel: u32,
    pub dilation_iterations: u32,
}

impl Default for EdgeConfig {
    fn default() -> Self {
        Self {
            low_threshold: DEFAULT_LOW_THRESHOLD,
            high_threshold: DEFAULT_HIGH_THRESHOLD,
            dilation_kernel: DEFAULT_DILATION_KERNEL,
            dilation_iterations: DEFAULT_DILATION_ITERATIONS,
        }
    }
}

/// Stone / not-stone gate. Both cutoffs must be exceeded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaterialConfig {
    pub texture_energy_min: f64,
    pub edge_density_min: f64,
    pub canny_low: f32,
    pub canny_high: f32,
}

impl Default for MaterialConfig {
    fn default() -> Self {
        Self {
            texture_energy_min: DEFAULT_TEXTURE_ENERGY_MIN,
            edge_density_min: DEFAULT_EDGE_DENSITY_MIN,
            canny_low: DEFAULT_MATERIAL_CANNY_LOW,
            canny_high: DEFAULT_MATERIAL_CANNY_HIGH,
        }
    }
}

/// Accepted contour area band, exclusive on both ends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContourConfig {
    pub min_area: f64,
    pub max_area: f64,
}

impl Default for ContourConfig {
    fn default() -> Self {
        Self {
            min_area: DEFAULT_MIN_AREA,
            max_area: DEFAULT_MAX_AREA,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfidenceConfig {
    /// Converts the cracked fraction of the image into a score.
    pub scale: f64,
    pub cap: f64,
    /// Band the healthy-surface score is drawn from.
    pub healthy_low: f32,
    pub healthy_high: f32,
    /// Pins the healthy-surface score. `None` draws fresh randomness per call.
    pub seed: Option<u64>,
}

impl Default for ConfidenceConfig {
    fn default() -> Self {
        Self {
            scale: DEFAULT_CONFIDENCE_SCALE,
            cap: DEFAULT_CONFIDENCE_CAP,
            healthy_low: DEFAULT_HEALTHY_LOW,
            healthy_high: DEFAULT_HEALTHY_HIGH,
            seed: None,
        }
    }
}

impl DetectorConfig {
    /// Read a JSON config file and validate it.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: Self = serde_json::from_str(&data)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Pin the healthy-surface score to `seed`.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.confidence.seed = Some(seed);
        self
    }

    pub fn validate(&self) -> Result<(), DetectionError> {
        let sigma = self.preprocess.blur_sigma;
        if !(sigma.is_finite() && sigma > 0.0) {
            return invalid(format!("blur_sigma must be positive, got {sigma}"));
        }

        let edges = &self.edges;
        check_thresholds("edges", edges.low_threshold, edges.high_threshold)?;
        if edges.dilation_kernel == 0
            || edges.dilation_kernel % 2 == 0
            || edges.dilation_kernel > MAX_DILATION_KERNEL
        {
            return invalid(format!(
                "dilation_kernel must be odd and in 1..={MAX_DILATION_KERNEL}, got {}",
                edges.dilation_kernel
            ));
        }

        let material = &self.material;
        check_thresholds("material", material.canny_low, material.canny_high)?;
        if !(material.texture_energy_min.is_finite() && material.texture_energy_min >= 0.0) {
            return invalid(format!(
                "texture_energy_min must be non-negative, got {}",
                material.texture_energy_min
            ));
        }
        if !(0.0..=1.0).contains(&material.edge_density_min) {
            return invalid(format!(
                "edge_density_min must lie in [0, 1], got {}",
                material.edge_density_min
            ));
        }

        let contours = &self.contours;
        if !(contours.min_area >= 0.0 && contours.min_area < contours.max_area) {
            return invalid(format!(
                "area band must satisfy 0 <= min < max, got [{}, {})",
                contours.min_area, contours.max_area
            ));
        }

        let confidence = &self.confidence;
        if !(confidence.scale.is_finite() && confidence.scale > 0.0) {
            return invalid(format!("scale must be positive, got {}", confidence.scale));
        }
        if !(confidence.cap > 0.0 && confidence.cap <= 100.0) {
            return invalid(format!("cap must lie in (0, 100], got {}", confidence.cap));
        }
        if !(confidence.healthy_low >= 0.0
            && confidence.healthy_low < confidence.healthy_high
            && confidence.healthy_high <= 100.0)
        {
            return invalid(format!(
                "healthy band must satisfy 0 <= low < high <= 100, got [{}, {})",
                confidence.healthy_low, confidence.healthy_high
            ));
        }

        Ok(())
    }
}

fn check_thresholds(section: &str, low: f32, high: f32) -> Result<(), DetectionError> {
    if !(low.is_finite() && high.is_finite() && low >= 0.0 && low <= high) {
        return invalid(format!(
            "{section} thresholds must satisfy 0 <= low <= high, got {low}/{high}"
        ));
    }
    Ok(())
}

fn invalid(message: String) -> Result<(), DetectionError> {
    Err(DetectionError::InvalidConfig(message))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        DetectorConfig::default().validate().unwrap();
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config: DetectorConfig =
            serde_json::from_str(r#"{ "edges": { "low_threshold": 30.0 }, "confidence": { "seed": 7 } }"#)
                .unwrap();
        assert_eq!(config.edges.low_threshold, 30.0);
        assert_eq!(config.edges.high_threshold, DEFAULT_HIGH_THRESHOLD);
        assert_eq!(config.contours, ContourConfig::default());
        assert_eq!(config.confidence.seed, Some(7));
    }

    #[test]
    fn rejects_even_kernel() {
        let mut config = DetectorConfig::default();
        config.edges.dilation_kernel = 4;
        assert!(matches!(config.validate(), Err(DetectionError::InvalidConfig(_))));
    }

    #[test]
    fn rejects_inverted_area_band() {
        let mut config = DetectorConfig::default();
        config.contours.min_area = 10_000.0;
        config.contours.max_area = 500.0;
        assert!(matches!(config.validate(), Err(DetectionError::InvalidConfig(_))));
    }
}

pub mod confidence;
pub mod contours;
pub mod edges;
pub mod material;
pub mod preprocessing;

use image::{DynamicImage, GenericImageView, ImageFormat};
use std::io::Cursor;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

use crate::config::DetectorConfig;
use crate::error::DetectionError;
use crate::models::{DetectionResult, Material};
use crate::session::{SessionCache, SessionId};
use confidence::{ConfidenceEstimator, HealthyScore};

/// Crack detection orchestrator.
///
/// Runs grayscale and smoothing → material gate → edges → contours →
/// confidence, and remembers the last image of every session so it can be
/// re-analyzed with [`rescan`](Self::rescan). Safe to share between threads.
#[derive(Debug)]
pub struct CrackDetector {
    config: DetectorConfig,
    confidence: ConfidenceEstimator,
    sessions: SessionCache,
}

impl CrackDetector {
    pub fn new(config: DetectorConfig) -> Result<Self, DetectionError> {
        config.validate()?;
        Ok(Self {
            confidence: ConfidenceEstimator::from_config(&config.confidence),
            config,
            sessions: SessionCache::new(),
        })
    }

    /// Replace the score reported for crack-free stone surfaces
    pub fn with_healthy_score(mut self, healthy: impl HealthyScore + 'static) -> Self {
        self.confidence = self.confidence.with_healthy_score(healthy);
        self
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    pub fn sessions(&self) -> &SessionCache {
        &self.sessions
    }

    /// Analyze `image` and make it the session's last image
    pub fn analyze(
        &self,
        image: impl Into<Arc<DynamicImage>>,
        session: SessionId,
    ) -> Result<DetectionResult, DetectionError> {
        let image = image.into();
        ensure_not_empty(&image)?;

        if self.sessions.store(session, Arc::clone(&image)).is_some() {
            debug!(%session, "replaced cached image");
        }
        Ok(self.run(&image))
    }

    /// Decode `bytes` and [`analyze`](Self::analyze) the result
    pub fn analyze_bytes(
        &self,
        bytes: &[u8],
        session: SessionId,
    ) -> Result<DetectionResult, DetectionError> {
        let image = decode_image(bytes)?;
        self.analyze(image, session)
    }

    /// Re-run the pipeline on the session's last image
    pub fn rescan(&self, session: SessionId) -> Result<DetectionResult, DetectionError> {
        let image = self
            .sessions
            .load(&session)
            .ok_or(DetectionError::NoPriorSession(session))?;
        debug!(%session, "rescanning cached image");
        Ok(self.run(&image))
    }

    /// Drop the session's cached image
    pub fn forget(&self, session: &SessionId) -> bool {
        self.sessions.forget(session).is_some()
    }

    /// Run the pipeline without touching any session
    pub fn detect(&self, image: &DynamicImage) -> Result<DetectionResult, DetectionError> {
        ensure_not_empty(image)?;
        Ok(self.run(image))
    }

    fn run(&self, image: &DynamicImage) -> DetectionResult {
        let started = Instant::now();
        let (width, height) = image.dimensions();
        let image_area = f64::from(width) * f64::from(height);

        let pre = preprocessing::preprocess(image, &self.config.preprocess);
        let report = material::classify(&pre, &self.config.material);
        debug!(
            width,
            height,
            texture_energy = report.texture_energy,
            edge_density = report.edge_density,
            material = ?report.material,
            "classified material"
        );

        if report.material == Material::NotStone {
            return DetectionResult {
                material: Material::NotStone,
                crack_detected: false,
                crack_count: 0,
                confidence: 0.0,
                crack_boxes: Vec::new(),
                total_crack_area: 0.0,
                texture_energy: report.texture_energy,
                edge_density: report.edge_density,
                processing_time: started.elapsed(),
                annotated_image: image.clone(),
            };
        }

        let edge_map = edges::extract_edges(&pre.smoothed, &self.config.edges);
        let analysis = contours::analyze_contours(&edge_map, image, &self.config.contours);
        let confidence =
            self.confidence
                .estimate(analysis.crack_count, analysis.total_area, image_area);
        debug!(
            cracks = analysis.crack_count,
            total_area = analysis.total_area,
            confidence,
            "analyzed contours"
        );

        DetectionResult {
            material: Material::Stone,
            crack_detected: analysis.crack_count > 0,
            crack_count: analysis.crack_count,
            confidence,
            crack_boxes: analysis.boxes,
            total_crack_area: analysis.total_area,
            texture_energy: report.texture_energy,
            edge_density: report.edge_density,
            processing_time: started.elapsed(),
            annotated_image: analysis.annotated,
        }
    }
}

/// Decode an encoded raster image, rejecting empty ones
pub fn decode_image(bytes: &[u8]) -> Result<DynamicImage, DetectionError> {
    let image = image::load_from_memory(bytes).map_err(DetectionError::UnreadableImage)?;
    ensure_not_empty(&image)?;
    Ok(image)
}

/// Encode `image` as `format`. Alpha is dropped for formats that cannot carry it.
pub fn encode_image(image: &DynamicImage, format: ImageFormat) -> Result<Vec<u8>, DetectionError> {
    let mut buf = Cursor::new(Vec::new());
    let written = if format == ImageFormat::Jpeg && image.color().has_alpha() {
        DynamicImage::ImageRgb8(image.to_rgb8()).write_to(&mut buf, format)
    } else {
        image.write_to(&mut buf, format)
    };
    written.map_err(DetectionError::Encode)?;
    Ok(buf.into_inner())
}

fn ensure_not_empty(image: &DynamicImage) -> Result<(), DetectionError> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(DetectionError::EmptyImage { width, height });
    }
    Ok(())
}

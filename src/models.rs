use image::{DynamicImage, ImageFormat};
use imageproc::point::Point;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::detection::encode_image;
use crate::error::DetectionError;

/// Bounding box in the original image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    /// Last column covered by the box
    pub fn right(&self) -> u32 {
        self.x + self.width - 1
    }

    /// Last row covered by the box
    pub fn bottom(&self) -> u32 {
        self.y + self.height - 1
    }

    pub fn area(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }

    pub fn contains(&self, x: u32, y: u32) -> bool {
        x >= self.x && x <= self.right() && y >= self.y && y <= self.bottom()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Material {
    Stone,
    NotStone,
}

impl Material {
    pub fn is_stone(self) -> bool {
        self == Material::Stone
    }
}

/// Closed boundary traced from an edge map
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contour {
    points: Vec<Point<i32>>,
}

impl Contour {
    /// Build a contour from traced pixel coordinates. `None` when empty.
    pub fn new(points: Vec<Point<i32>>) -> Option<Self> {
        if points.is_empty() {
            None
        } else {
            Some(Self { points })
        }
    }

    pub fn points(&self) -> &[Point<i32>] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Enclosed polygon area (shoelace formula over pixel centres)
    pub fn area(&self) -> f64 {
        if self.points.len() < 3 {
            return 0.0;
        }

        let mut twice_area = 0i64;
        for (i, p) in self.points.iter().enumerate() {
            let q = self.points[(i + 1) % self.points.len()];
            twice_area += i64::from(p.x) * i64::from(q.y) - i64::from(q.x) * i64::from(p.y);
        }
        twice_area.abs() as f64 / 2.0
    }

    /// Smallest axis-aligned box containing every point
    pub fn bounding_rect(&self) -> BoundingBox {
        let first = self.points[0];
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
        for p in &self.points[1..] {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }

        // Traced points are pixel coordinates and never negative.
        BoundingBox {
            x: min_x.max(0) as u32,
            y: min_y.max(0) as u32,
            width: (max_x - min_x + 1) as u32,
            height: (max_y - min_y + 1) as u32,
        }
    }
}

/// Outcome of analyzing one image.
#[derive(Debug, Clone)]
pub struct DetectionResult {
    pub material: Material,
    pub crack_detected: bool,
    pub crack_count: usize,
    /// Score in `[0, 100]`; see [`crate::detection::confidence`].
    pub confidence: f32,
    pub crack_boxes: Vec<BoundingBox>,
    /// Summed enclosed area of the accepted contours, in px².
    pub total_crack_area: f64,
    pub texture_energy: f64,
    pub edge_density: f64,
    /// Wall time of the pipeline run. Ignored by `==`.
    pub processing_time: Duration,
    /// Copy of the input with crack boxes drawn on it; same dimensions.
    pub annotated_image: DynamicImage,
}

impl PartialEq for DetectionResult {
    fn eq(&self, other: &Self) -> bool {
        self.material == other.material
            && self.crack_detected == other.crack_detected
            && self.crack_count == other.crack_count
            && self.confidence.to_bits() == other.confidence.to_bits()
            && self.crack_boxes == other.crack_boxes
            && self.total_crack_area.to_bits() == other.total_crack_area.to_bits()
            && self.texture_energy.to_bits() == other.texture_energy.to_bits()
            && self.edge_density.to_bits() == other.edge_density.to_bits()
            && same_pixels(&self.annotated_image, &other.annotated_image)
    }
}

impl DetectionResult {
    /// Fields the presentation layer renders.
    pub fn summary(&self) -> DetectionSummary {
        DetectionSummary {
            material: self.material,
            crack_detected: self.crack_detected,
            crack_count: self.crack_count,
            confidence: self.confidence,
            processing_time_ms: self.processing_time.as_secs_f64() * 1000.0,
            crack_boxes: self.crack_boxes.clone(),
        }
    }

    /// Encode the annotated image in the caller's raster format.
    pub fn encode_annotated(&self, format: ImageFormat) -> Result<Vec<u8>, DetectionError> {
        encode_image(&self.annotated_image, format)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionSummary {
    pub material: Material,
    pub crack_detected: bool,
    pub crack_count: usize,
    pub confidence: f32,
    pub processing_time_ms: f64,
    pub crack_boxes: Vec<BoundingBox>,
}

/// Same dimensions, colour type and bytes
pub fn same_pixels(a: &DynamicImage, b: &DynamicImage) -> bool {
    a.width() == b.width()
        && a.height() == b.height()
        && a.color() == b.color()
        && a.as_bytes() == b.as_bytes()
}

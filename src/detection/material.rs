//! Decides whether an image shows a stone surface at all.
//!
//! Two signals:
//!
//! - texture energy: variance of the 4-neighbour Laplacian of the unsmoothed
//!   luma. Stone micro-texture gives a high value; flat or blurred subjects
//!   stay low.
//! - edge density: share of pixels a fixed Canny detector marks as edges on
//!   the smoothed luma, the same input the crack edges are found on.
//!
//! Both must exceed their cutoffs for the image to count as stone.

use image::GrayImage;
use serde::{Deserialize, Serialize};

use crate::config::MaterialConfig;
use crate::detection::edges::detect_edges;
use crate::detection::preprocessing::Preprocessed;
use crate::models::Material;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MaterialReport {
    pub material: Material,
    pub texture_energy: f64,
    pub edge_density: f64,
}

pub fn classify(pre: &Preprocessed, config: &MaterialConfig) -> MaterialReport {
    let texture_energy = laplacian_variance(&pre.luma);
    let edge_density = detect_edges(&pre.smoothed, config.canny_low, config.canny_high).density();

    let material = if texture_energy > config.texture_energy_min
        && edge_density > config.edge_density_min
    {
        Material::Stone
    } else {
        Material::NotStone
    };

    MaterialReport {
        material,
        texture_energy,
        edge_density,
    }
}

/// Population variance of the Laplacian response over every pixel.
///
/// Borders are mirrored without repeating the edge pixel (`dcb|abcd|cba`).
pub fn laplacian_variance(gray: &GrayImage) -> f64 {
    let (width, height) = gray.dimensions();
    let count = u64::from(width) * u64::from(height);
    if count == 0 {
        return 0.0;
    }

    let at = |x: i64, y: i64| -> f64 {
        let x = reflect101(x, i64::from(width));
        let y = reflect101(y, i64::from(height));
        f64::from(gray.get_pixel(x as u32, y as u32)[0])
    };

    let mut sum = 0.0;
    let mut sum_sq = 0.0;
    for y in 0..i64::from(height) {
        for x in 0..i64::from(width) {
            let response =
                at(x - 1, y) + at(x + 1, y) + at(x, y - 1) + at(x, y + 1) - 4.0 * at(x, y);
            sum += response;
            sum_sq += response * response;
        }
    }

    let n = count as f64;
    let mean = sum / n;
    (sum_sq / n - mean * mean).max(0.0)
}

fn reflect101(i: i64, len: i64) -> i64 {
    if len == 1 {
        return 0;
    }
    if i < 0 {
        -i
    } else if i >= len {
        2 * len - 2 - i
    } else {
        i
    }
}

//! Luma conversion and the one smoothing pass of the pipeline.
//!
//! Edge detection downstream does no blurring of its own, so `smoothed` is
//! the only low-pass the edge detectors ever see. Texture energy is measured
//! on the unsmoothed `luma`, where the micro-texture still lives.

use image::{DynamicImage, GrayImage};
use imageproc::filter::gaussian_blur_f32;

use crate::config::PreprocessConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preprocessed {
    /// Rec. 601 luma of the input
    pub luma: GrayImage,
    /// `luma` after Gaussian smoothing with `PreprocessConfig::blur_sigma`
    pub smoothed: GrayImage,
}

impl Preprocessed {
    pub fn dimensions(&self) -> (u32, u32) {
        self.luma.dimensions()
    }
}

pub fn preprocess(image: &DynamicImage, config: &PreprocessConfig) -> Preprocessed {
    let luma = image.to_luma8();
    let smoothed = gaussian_blur_f32(&luma, config.blur_sigma);
    Preprocessed { luma, smoothed }
}

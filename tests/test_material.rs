mod common;

use common::*;
use image::DynamicImage;
use stonecrack::config::{MaterialConfig, PreprocessConfig};
use stonecrack::detection::material::{MaterialReport, classify};
use stonecrack::detection::preprocessing::preprocess;

fn measure(img: &DynamicImage, config: &MaterialConfig) -> MaterialReport {
    classify(&preprocess(img, &PreprocessConfig::default()), config)
}

#[test]
fn uniform_gray_is_not_stone() {
    let report = measure(&uniform_image(200, 200, 128), &MaterialConfig::default());

    assert_eq!(report.material, Material::NotStone);
    assert_eq!(report.texture_energy, 0.0);
    assert_eq!(report.edge_density, 0.0);
}

#[test]
fn smooth_gradient_is_not_stone() {
    let report = measure(&gradient_image(800, 600), &MaterialConfig::default());

    assert_eq!(report.material, Material::NotStone);
    assert!(report.texture_energy <= 100.0, "energy {}", report.texture_energy);
}

#[test]
fn speckled_surface_is_stone() {
    let img = DynamicImage::ImageRgb8(speckled_surface(240, 240));
    let report = measure(&img, &MaterialConfig::default());

    assert_eq!(report.material, Material::Stone);
    assert!(report.texture_energy > 100.0, "energy {}", report.texture_energy);
    assert!(report.edge_density > 0.02, "density {}", report.edge_density);
}

#[test]
fn texture_without_edges_fails_the_gate() {
    // Plenty of curvature, but the Sobel response of a one-pixel checkerboard is flat.
    let report = measure(&fine_checkerboard(200, 200), &MaterialConfig::default());

    assert!(report.texture_energy > 100.0, "energy {}", report.texture_energy);
    assert!(report.edge_density <= 0.02, "density {}", report.edge_density);
    assert_eq!(report.material, Material::NotStone);
}

#[test]
fn edges_without_enough_texture_fail_the_gate() {
    let img = DynamicImage::ImageRgb8(speckled_surface(240, 240));
    let measured = measure(&img, &MaterialConfig::default());

    let config = MaterialConfig {
        texture_energy_min: measured.texture_energy + 1.0,
        ..MaterialConfig::default()
    };
    let report = measure(&img, &config);

    assert!(
        report.edge_density > config.edge_density_min,
        "density {}",
        report.edge_density
    );
    assert!(report.texture_energy <= config.texture_energy_min);
    assert_eq!(report.material, Material::NotStone);
}

#[test]
fn dense_edges_are_not_enough_for_a_strict_cutoff() {
    let img = DynamicImage::ImageRgb8(speckled_surface(240, 240));
    let strict = MaterialConfig {
        edge_density_min: 0.99,
        ..MaterialConfig::default()
    };
    let report = measure(&img, &strict);

    assert!(report.texture_energy > strict.texture_energy_min);
    assert_eq!(report.material, Material::NotStone);
}

#[test]
fn cutoffs_are_exclusive() {
    // Zero cutoffs still reject an image whose edge density is exactly zero.
    let zero = MaterialConfig {
        texture_energy_min: 0.0,
        edge_density_min: 0.0,
        ..MaterialConfig::default()
    };
    let report = measure(&fine_checkerboard(64, 64), &zero);

    assert!(report.texture_energy > 0.0);
    assert_eq!(report.edge_density, 0.0);
    assert_eq!(report.material, Material::NotStone);
}

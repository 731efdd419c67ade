use image::{DynamicImage, GrayImage, Luma, Rgb, RgbImage};
use std::io::Cursor;

use stonecrack::{CrackDetector, DetectorConfig};

/// Surface brightness of the synthetic stone
pub const SURFACE: u8 = 200;
/// Brightness of the texture specks
pub const SPECK: u8 = 40;
/// Brightness inside a drawn crack
pub const CRACK: u8 = 20;

const SPECK_SIZE: u32 = 4;
const SPECK_PITCH: u32 = 12;
/// Specks are cleared this far around a crack so they never touch it
const CLEARANCE: u32 = 12;

pub const TEST_SEED: u64 = 7;

/// Detector with default thresholds and a pinned healthy score
pub fn seeded_detector() -> CrackDetector {
    CrackDetector::new(DetectorConfig::default().with_seed(TEST_SEED))
        .expect("default config is valid")
}

/// Flat single-colour image
pub fn uniform_image(width: u32, height: u32, value: u8) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([value, value, value])))
}

/// Smooth horizontal/vertical colour ramp with no texture
pub fn gradient_image(width: u32, height: u32) -> DynamicImage {
    let img = RgbImage::from_fn(width, height, |x, y| {
        let r = (x * 255 / width) as u8;
        let g = (y * 255 / height) as u8;
        Rgb([r, g, 128])
    });
    DynamicImage::ImageRgb8(img)
}

/// One-pixel checkerboard: strong curvature but nothing a blurred edge detector keeps
pub fn fine_checkerboard(width: u32, height: u32) -> DynamicImage {
    let img = RgbImage::from_fn(width, height, |x, y| {
        let v = if (x + y) % 2 == 0 { 100 } else { 156 };
        Rgb([v, v, v])
    });
    DynamicImage::ImageRgb8(img)
}

/// Light surface covered in small dark specks on a regular grid.
///
/// Texture energy and edge density are well above the stone cutoffs while
/// every speck stays far below the crack area band.
pub fn speckled_surface(width: u32, height: u32) -> RgbImage {
    let mut img = RgbImage::from_pixel(width, height, Rgb([SURFACE, SURFACE, SURFACE]));
    let mut y0 = SPECK_PITCH / 2;
    while y0 + SPECK_SIZE < height {
        let mut x0 = SPECK_PITCH / 2;
        while x0 + SPECK_SIZE < width {
            fill(&mut img, x0, y0, SPECK_SIZE, SPECK_SIZE, SPECK);
            x0 += SPECK_PITCH;
        }
        y0 += SPECK_PITCH;
    }
    img
}

/// Paint a dark filled crack and clear the texture around it
pub fn add_crack(img: &mut RgbImage, x: u32, y: u32, width: u32, height: u32) {
    let cx = x.saturating_sub(CLEARANCE);
    let cy = y.saturating_sub(CLEARANCE);
    let cw = (x + width + CLEARANCE).min(img.width()) - cx;
    let ch = (y + height + CLEARANCE).min(img.height()) - cy;
    fill(img, cx, cy, cw, ch, SURFACE);
    fill(img, x, y, width, height, CRACK);
}

pub fn fill(img: &mut RgbImage, x: u32, y: u32, width: u32, height: u32, value: u8) {
    for yy in y..(y + height).min(img.height()) {
        for xx in x..(x + width).min(img.width()) {
            img.put_pixel(xx, yy, Rgb([value, value, value]));
        }
    }
}

/// Binary mask with a filled rectangle
pub fn mask_with_rect(width: u32, height: u32, rects: &[(u32, u32, u32, u32)]) -> GrayImage {
    let mut mask = GrayImage::new(width, height);
    for &(x, y, w, h) in rects {
        for yy in y..y + h {
            for xx in x..x + w {
                mask.put_pixel(xx, yy, Luma([255]));
            }
        }
    }
    mask
}

pub fn clear_rect(mask: &mut GrayImage, x: u32, y: u32, w: u32, h: u32) {
    for yy in y..y + h {
        for xx in x..x + w {
            mask.put_pixel(xx, yy, Luma([0]));
        }
    }
}

pub fn encode_png(img: &DynamicImage) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, image::ImageFormat::Png)
        .expect("Failed to encode test image");
    buf.into_inner()
}

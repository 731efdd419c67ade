use image::{GrayImage, Luma};
use imageproc::distance_transform::Norm;
use imageproc::gradients::{horizontal_sobel, vertical_sobel};
use imageproc::morphology::dilate;

use crate::config::EdgeConfig;

const EDGE: u8 = 255;

/// Binary edge image: every pixel is either 0 or 255.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeMap(GrayImage);

impl EdgeMap {
    /// Wrap a mask, treating any non-zero pixel as an edge.
    pub fn from_mask(mut mask: GrayImage) -> Self {
        for p in mask.pixels_mut() {
            if p[0] != 0 {
                *p = Luma([EDGE]);
            }
        }
        Self(mask)
    }

    pub fn width(&self) -> u32 {
        self.0.width()
    }

    pub fn height(&self) -> u32 {
        self.0.height()
    }

    pub fn is_edge(&self, x: u32, y: u32) -> bool {
        self.0.get_pixel(x, y)[0] != 0
    }

    pub fn edge_count(&self) -> usize {
        self.0.pixels().filter(|p| p[0] != 0).count()
    }

    /// Fraction of pixels that are edges; 0 for an empty map.
    pub fn density(&self) -> f64 {
        let total = u64::from(self.width()) * u64::from(self.height());
        if total == 0 {
            return 0.0;
        }
        self.edge_count() as f64 / total as f64
    }

    pub fn as_image(&self) -> &GrayImage {
        &self.0
    }

    pub fn into_image(self) -> GrayImage {
        self.0
    }
}

/// Canny edge detector on an already smoothed image.
///
/// Sobel gradients, non-maximum suppression along the quantized gradient
/// direction, then hysteresis: pixels at or above `high_threshold` seed edges
/// that grow through 8-connected pixels at or above `low_threshold`. No blur is
/// applied here. The one-pixel image border never carries edges.
pub fn detect_edges(img: &GrayImage, low_threshold: f32, high_threshold: f32) -> EdgeMap {
    let (width, height) = img.dimensions();
    let mut edges = GrayImage::new(width, height);
    if width < 3 || height < 3 {
        return EdgeMap(edges);
    }

    let gx = horizontal_sobel(img);
    let gy = vertical_sobel(img);
    let (w, h) = (width as usize, height as usize);

    let mut magnitude = vec![0f32; w * h];
    for (x, y, dx) in gx.enumerate_pixels() {
        let dx = f32::from(dx[0]);
        let dy = f32::from(gy.get_pixel(x, y)[0]);
        magnitude[y as usize * w + x as usize] = dx.hypot(dy);
    }

    let mut thinned = vec![0f32; w * h];
    for y in 1..h - 1 {
        for x in 1..w - 1 {
            let m = magnitude[y * w + x];
            if m < low_threshold {
                continue;
            }
            let dx = f32::from(gx.get_pixel(x as u32, y as u32)[0]);
            let dy = f32::from(gy.get_pixel(x as u32, y as u32)[0]);
            let (before, after) = match gradient_sector(dx, dy) {
                Sector::Horizontal => ((x - 1, y), (x + 1, y)),
                Sector::Falling => ((x - 1, y - 1), (x + 1, y + 1)),
                Sector::Vertical => ((x, y - 1), (x, y + 1)),
                Sector::Rising => ((x + 1, y - 1), (x - 1, y + 1)),
            };
            // Ties keep the first pixel of a plateau only.
            if m > magnitude[before.1 * w + before.0] && m >= magnitude[after.1 * w + after.0] {
                thinned[y * w + x] = m;
            }
        }
    }

    let mut stack: Vec<(usize, usize)> = Vec::new();
    for y in 1..h - 1 {
        for x in 1..w - 1 {
            if thinned[y * w + x] < high_threshold || edges.get_pixel(x as u32, y as u32)[0] != 0 {
                continue;
            }
            edges.put_pixel(x as u32, y as u32, Luma([EDGE]));
            stack.push((x, y));
            while let Some((cx, cy)) = stack.pop() {
                for ny in cy - 1..=cy + 1 {
                    for nx in cx - 1..=cx + 1 {
                        if thinned[ny * w + nx] >= low_threshold
                            && thinned[ny * w + nx] > 0.0
                            && edges.get_pixel(nx as u32, ny as u32)[0] == 0
                        {
                            edges.put_pixel(nx as u32, ny as u32, Luma([EDGE]));
                            stack.push((nx, ny));
                        }
                    }
                }
            }
        }
    }

    EdgeMap(edges)
}

enum Sector {
    Horizontal,
    Falling,
    Vertical,
    Rising,
}

/// Quantize the gradient direction (y pointing down) to one of four axes
fn gradient_sector(dx: f32, dy: f32) -> Sector {
    let mut angle = dy.atan2(dx).to_degrees();
    if angle < 0.0 {
        angle += 180.0;
    }
    if !(22.5..157.5).contains(&angle) {
        Sector::Horizontal
    } else if angle < 67.5 {
        Sector::Falling
    } else if angle < 112.5 {
        Sector::Vertical
    } else {
        Sector::Rising
    }
}

/// Grow edges with a square `kernel`x`kernel` element, `iterations` times
pub fn dilate_edges(edges: &EdgeMap, kernel: u32, iterations: u32) -> EdgeMap {
    // Chebyshev radius k covers a (2k+1)x(2k+1) square.
    let radius = u8::try_from(kernel / 2).unwrap_or(u8::MAX);
    if radius == 0 || iterations == 0 {
        return edges.clone();
    }

    let mut grown = dilate(edges.as_image(), Norm::LInf, radius);
    for _ in 1..iterations {
        grown = dilate(&grown, Norm::LInf, radius);
    }
    EdgeMap(grown)
}

/// Canny followed by gap-closing dilation, as configured
pub fn extract_edges(smoothed: &GrayImage, config: &EdgeConfig) -> EdgeMap {
    let raw = detect_edges(smoothed, config.low_threshold, config.high_threshold);
    dilate_edges(&raw, config.dilation_kernel, config.dilation_iterations)
}

use image::{DynamicImage, Rgb, Rgba};
use imageproc::contours::{BorderType, find_contours};
use imageproc::drawing::{Canvas, draw_hollow_rect_mut};
use imageproc::rect::Rect;

use crate::config::ContourConfig;
use crate::detection::edges::EdgeMap;
use crate::models::{BoundingBox, Contour};

/// Crack box colour (red)
pub const ANNOTATION_COLOR: [u8; 3] = [255, 0, 0];
/// Box outline width in pixels, drawn inwards from the bounding box
pub const ANNOTATION_THICKNESS: u32 = 2;

/// Cracks found in one edge map
#[derive(Debug, Clone)]
pub struct ContourAnalysis {
    pub contours: Vec<Contour>,
    pub boxes: Vec<BoundingBox>,
    pub crack_count: usize,
    pub total_area: f64,
    pub annotated: DynamicImage,
}

/// Trace outermost boundaries only; holes and regions nested in holes are dropped
pub fn find_external_contours(edges: &EdgeMap) -> Vec<Contour> {
    find_contours::<i32>(edges.as_image())
        .into_iter()
        .filter(|c| c.border_type == BorderType::Outer && c.parent.is_none())
        .filter_map(|c| Contour::new(c.points))
        .collect()
}

/// Keep contours whose area lies strictly inside the configured band and draw them
pub fn analyze_contours(
    edges: &EdgeMap,
    original: &DynamicImage,
    config: &ContourConfig,
) -> ContourAnalysis {
    let mut contours = Vec::new();
    let mut boxes = Vec::new();
    let mut total_area = 0.0;

    for contour in find_external_contours(edges) {
        let area = contour.area();
        if area > config.min_area && area < config.max_area {
            boxes.push(contour.bounding_rect());
            total_area += area;
            contours.push(contour);
        }
    }

    let annotated = if boxes.is_empty() {
        original.clone()
    } else {
        draw_boxes(original, &boxes)
    };

    ContourAnalysis {
        crack_count: contours.len(),
        contours,
        boxes,
        total_area,
        annotated,
    }
}

/// Copy of `original` with every box outlined; alpha is kept when present
pub fn draw_boxes(original: &DynamicImage, boxes: &[BoundingBox]) -> DynamicImage {
    let [r, g, b] = ANNOTATION_COLOR;
    if original.color().has_alpha() {
        let mut canvas = original.to_rgba8();
        for bbox in boxes {
            outline(&mut canvas, bbox, Rgba([r, g, b, 255]));
        }
        DynamicImage::ImageRgba8(canvas)
    } else {
        let mut canvas = original.to_rgb8();
        for bbox in boxes {
            outline(&mut canvas, bbox, Rgb([r, g, b]));
        }
        DynamicImage::ImageRgb8(canvas)
    }
}

fn outline<C: Canvas>(canvas: &mut C, bbox: &BoundingBox, color: C::Pixel) {
    for inset in 0..ANNOTATION_THICKNESS {
        if bbox.width <= 2 * inset || bbox.height <= 2 * inset {
            break;
        }
        let rect = Rect::at((bbox.x + inset) as i32, (bbox.y + inset) as i32)
            .of_size(bbox.width - 2 * inset, bbox.height - 2 * inset);
        draw_hollow_rect_mut(canvas, rect, color);
    }
}

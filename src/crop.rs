//! Cropping page rasters to detected regions.

use image::{imageops, RgbImage};

use crate::model::{BoundingBox, Detection};

/// A detection together with the raster it covers.
#[derive(Debug, Clone)]
pub struct Crop {
    pub detection: Detection,
    pub image: RgbImage,
}

/// Integer pixel window of a box inside an image, after clamping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelWindow {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl PixelWindow {
    /// Truncate `bbox` to integers and clamp it to a `width` x `height` image.
    ///
    /// The window is never smaller than 1x1 while the image is non-empty:
    /// a zero-area or fully out-of-range box collapses onto the clamped
    /// origin.
    pub fn clamp(bbox: &BoundingBox, width: u32, height: u32) -> Self {
        let (x, w) = clamp_axis(bbox.x_min, bbox.x_max, width);
        let (y, h) = clamp_axis(bbox.y_min, bbox.y_max, height);
        let window = Self {
            x,
            y,
            width: w,
            height: h,
        };

        let exact = bbox.x_min.trunc() == x as f32
            && bbox.y_min.trunc() == y as f32
            && bbox.x_max.trunc() == (x + w) as f32
            && bbox.y_max.trunc() == (y + h) as f32;
        if !exact {
            log::debug!(
                "Clamped box ({:.1}, {:.1}, {:.1}, {:.1}) to {:?} in {}x{} image",
                bbox.x_min,
                bbox.y_min,
                bbox.x_max,
                bbox.y_max,
                window,
                width,
                height
            );
        }
        window
    }
}

fn clamp_axis(min: f32, max: f32, limit: u32) -> (u32, u32) {
    if limit == 0 {
        return (0, 0);
    }
    let limit = i64::from(limit);
    let start = (min.trunc() as i64).clamp(0, limit - 1);
    let end = (max.trunc() as i64).clamp(0, limit);
    let end = if end <= start { start + 1 } else { end };
    (start as u32, (end - start) as u32)
}

/// Crop `image` to `bbox`, clamped to the image bounds.
pub fn crop_box(image: &RgbImage, bbox: &BoundingBox) -> RgbImage {
    let window = PixelWindow::clamp(bbox, image.width(), image.height());
    imageops::crop_imm(image, window.x, window.y, window.width, window.height).to_image()
}

/// Crop every detection whose label is in `labels`, in detection order.
///
/// `None` keeps every label. Each crop carries its own detection, so crops
/// and detections can never drift apart when some labels are filtered out.
pub fn crop_detections(
    image: &RgbImage,
    detections: &[Detection],
    labels: Option<&[String]>,
) -> Vec<Crop> {
    detections
        .iter()
        .filter(|d| labels.map_or(true, |keep| keep.iter().any(|l| *l == d.label)))
        .map(|d| Crop {
            detection: d.clone(),
            image: crop_box(image, &d.bbox),
        })
        .collect()
}

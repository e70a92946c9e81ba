//! Recognition engines behind narrow traits.
//!
//! Extractors own their engines and drive them one page at a time through
//! `&mut self`, so an engine never needs interior locking. Concrete
//! engines: [`Tesseract`] (OCR through the `tesseract` CLI) and, with the
//! `onnx` feature, `GroundingDino` and `PaddleLayout` on ONNX Runtime.

#[cfg(any(test, feature = "onnx"))]
mod decode;
mod ontology;
mod regions;
mod tesseract;

#[cfg(feature = "onnx")]
mod grounding_dino;
#[cfg(feature = "onnx")]
mod paddle_layout;
#[cfg(feature = "onnx")]
mod session;

pub use ontology::{DetectionThresholds, Ontology};
pub use regions::{RegionRecognizer, RegionRecognizerConfig};
pub use tesseract::{Tesseract, TesseractConfig};

#[cfg(feature = "onnx")]
pub use grounding_dino::{GroundingDino, GroundingDinoConfig};
#[cfg(feature = "onnx")]
pub use paddle_layout::{PaddleLayout, PaddleLayoutConfig};
#[cfg(feature = "onnx")]
pub use session::SessionOptions;

use image::RgbImage;

use crate::error::Result;
use crate::model::{Detection, LayoutRegion, OcrLine};

/// Optical character recognition on a raster.
pub trait OcrEngine {
    fn name(&self) -> &str;

    /// Recognize text lines in reading order. No text is an empty vector.
    fn recognize(&mut self, image: &RgbImage) -> Result<Vec<OcrLine>>;
}

/// Open-vocabulary object detection driven by natural-language prompts.
pub trait ZeroShotDetector {
    fn name(&self) -> &str;

    /// Detect regions matching the ontology's prompts. Zero detections is a
    /// valid result.
    fn detect(
        &mut self,
        image: &RgbImage,
        ontology: &Ontology,
        thresholds: &DetectionThresholds,
    ) -> Result<Vec<Detection>>;
}

/// Document layout analysis.
pub trait LayoutEngine {
    fn name(&self) -> &str;

    /// Find the page's regions in reading order, with their recognized
    /// content filled in.
    fn analyze(&mut self, image: &RgbImage) -> Result<Vec<LayoutRegion>>;
}

impl<T: OcrEngine + ?Sized> OcrEngine for Box<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn recognize(&mut self, image: &RgbImage) -> Result<Vec<OcrLine>> {
        (**self).recognize(image)
    }
}

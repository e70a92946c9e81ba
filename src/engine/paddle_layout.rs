//! PaddleDetection layout model on ONNX Runtime.
//!
//! Takes `image`, `im_shape` and `scale_factor` inputs and returns rows of
//! `[class, score, x1, y1, x2, y2]` in original image coordinates.

use std::path::Path;

use image::imageops::{self, FilterType};
use image::RgbImage;
use ndarray::Array2;
use ort::session::Session;

use super::decode::decode_layout_rows;
use super::session::{f32_value, load_session, normalized_chw, IMAGENET_MEAN, IMAGENET_STD};
use super::{LayoutEngine, OcrEngine, RegionRecognizer, RegionRecognizerConfig, SessionOptions};
use crate::error::{Error, Result};
use crate::model::LayoutRegion;
use crate::options::DEFAULT_DPI;

/// Layout model settings.
#[derive(Debug, Clone, PartialEq)]
pub struct PaddleLayoutConfig {
    pub session: SessionOptions,
    /// Class labels in model output order
    pub labels: Vec<String>,
    pub score_threshold: f32,
    /// Model input (width, height)
    pub input_size: (u32, u32),
    pub recognizer: RegionRecognizerConfig,
}

impl Default for PaddleLayoutConfig {
    fn default() -> Self {
        Self {
            session: SessionOptions::default(),
            labels: ["text", "title", "list", "table", "figure"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            score_threshold: 0.5,
            input_size: (608, 800),
            recognizer: RegionRecognizerConfig::for_dpi(DEFAULT_DPI),
        }
    }
}

/// Layout engine: region detection by the model, content by OCR.
pub struct PaddleLayout {
    session: Session,
    recognizer: RegionRecognizer,
    config: PaddleLayoutConfig,
}

impl std::fmt::Debug for PaddleLayout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaddleLayout")
            .field("session", &"<Session>")
            .field("ocr", &self.recognizer.ocr_name())
            .field("config", &self.config)
            .finish()
    }
}

impl PaddleLayout {
    pub fn new(
        model: impl AsRef<Path>,
        ocr: Box<dyn OcrEngine>,
        config: PaddleLayoutConfig,
    ) -> Result<Self> {
        if config.labels.is_empty() {
            return Err(Error::EngineInit("layout labels must not be empty".into()));
        }
        let session = load_session(model.as_ref(), &config.session)?;
        let recognizer = RegionRecognizer::with_config(ocr, config.recognizer.clone());
        Ok(Self {
            session,
            recognizer,
            config,
        })
    }
}

impl LayoutEngine for PaddleLayout {
    fn name(&self) -> &str {
        "paddle-layout"
    }

    fn analyze(&mut self, image: &RgbImage) -> Result<Vec<LayoutRegion>> {
        let (orig_w, orig_h) = image.dimensions();
        let (width, height) = self.config.input_size;
        let resized = imageops::resize(image, width, height, FilterType::Triangle);
        let pixels = normalized_chw(&resized, IMAGENET_MEAN, IMAGENET_STD);

        let im_shape = Array2::from_shape_vec((1, 2), vec![height as f32, width as f32])
            .map_err(|e| Error::Inference(e.to_string()))?;
        let scale_factor = Array2::from_shape_vec(
            (1, 2),
            vec![
                height as f32 / orig_h.max(1) as f32,
                width as f32 / orig_w.max(1) as f32,
            ],
        )
        .map_err(|e| Error::Inference(e.to_string()))?;

        let outputs = self.session.run(ort::inputs![
            "image" => f32_value(pixels)?,
            "im_shape" => f32_value(im_shape)?,
            "scale_factor" => f32_value(scale_factor)?,
        ])?;
        let (_, rows) = outputs[0].try_extract_tensor::<f32>()?;
        let rows = rows.to_vec();
        drop(outputs);

        let boxes: Vec<_> =
            decode_layout_rows(&rows, &self.config.labels, self.config.score_threshold)
                .into_iter()
                .map(|(kind, bbox, _)| (kind, bbox))
                .collect();
        log::debug!("paddle-layout: {} regions above threshold", boxes.len());

        self.recognizer.recognize(image, boxes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_recognizer_matches_raster_dpi() {
        let config = PaddleLayoutConfig::default();
        assert_eq!(config.recognizer, RegionRecognizerConfig::for_dpi(DEFAULT_DPI));
        assert_ne!(config.recognizer, RegionRecognizerConfig::default());
    }
}

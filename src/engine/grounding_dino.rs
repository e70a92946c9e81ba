//! Grounding DINO zero-shot detector on ONNX Runtime.
//!
//! Expects a Hugging Face style export with inputs `pixel_values`,
//! `input_ids`, `token_type_ids`, `attention_mask` and `pixel_mask`, and
//! outputs `logits` (queries x text tokens) and `pred_boxes` (normalized
//! center-size boxes).

use std::path::Path;

use image::imageops::{self, FilterType};
use image::RgbImage;
use ndarray::{Array2, Array3};
use ort::session::Session;
use tokenizers::Tokenizer;

use super::decode::{build_caption, decode_grounding, fit_size, prompt_token_masks, GroundingOutput};
use super::session::{f32_value, i64_value, load_session, normalized_chw, IMAGENET_MEAN, IMAGENET_STD};
use super::{DetectionThresholds, Ontology, SessionOptions, ZeroShotDetector};
use crate::error::{Error, Result};
use crate::model::Detection;

/// Grounding DINO settings.
#[derive(Debug, Clone, PartialEq)]
pub struct GroundingDinoConfig {
    pub session: SessionOptions,
    /// Target length of the shorter image side
    pub shortest_side: u32,
    /// Upper bound for the longer image side
    pub longest_side: u32,
    /// Maximum caption length in tokens
    pub max_text_len: usize,
}

impl Default for GroundingDinoConfig {
    fn default() -> Self {
        Self {
            session: SessionOptions::default(),
            shortest_side: 800,
            longest_side: 1333,
            max_text_len: 256,
        }
    }
}

/// Zero-shot detector backed by a Grounding DINO ONNX export.
pub struct GroundingDino {
    session: Session,
    tokenizer: Tokenizer,
    config: GroundingDinoConfig,
}

impl std::fmt::Debug for GroundingDino {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GroundingDino")
            .field("session", &"<Session>")
            .field("config", &self.config)
            .finish()
    }
}

impl GroundingDino {
    /// Load the model and its BERT tokenizer (`tokenizer.json`).
    pub fn new(
        model: impl AsRef<Path>,
        tokenizer: impl AsRef<Path>,
        config: GroundingDinoConfig,
    ) -> Result<Self> {
        let tokenizer_path = tokenizer.as_ref();
        if !tokenizer_path.exists() {
            return Err(Error::EngineUnavailable(format!(
                "tokenizer not found: {}",
                tokenizer_path.display()
            )));
        }
        let tokenizer = Tokenizer::from_file(tokenizer_path)
            .map_err(|e| Error::EngineInit(format!("tokenizer: {}", e)))?;
        let session = load_session(model.as_ref(), &config.session)?;

        Ok(Self {
            session,
            tokenizer,
            config,
        })
    }

    fn encode_caption(&self, caption: &str) -> Result<(Vec<i64>, Vec<i64>, Vec<i64>, Vec<(usize, usize)>)> {
        let encoding = self
            .tokenizer
            .encode(caption, true)
            .map_err(|e| Error::Inference(format!("tokenization failed: {}", e)))?;

        let len = encoding.get_ids().len().min(self.config.max_text_len);
        let widen = |v: &[u32]| v[..len].iter().map(|&x| i64::from(x)).collect::<Vec<i64>>();
        Ok((
            widen(encoding.get_ids()),
            widen(encoding.get_type_ids()),
            widen(encoding.get_attention_mask()),
            encoding.get_offsets()[..len].to_vec(),
        ))
    }
}

impl ZeroShotDetector for GroundingDino {
    fn name(&self) -> &str {
        "grounding-dino"
    }

    fn detect(
        &mut self,
        image: &RgbImage,
        ontology: &Ontology,
        thresholds: &DetectionThresholds,
    ) -> Result<Vec<Detection>> {
        let (caption, prompt_spans) = build_caption(ontology);
        let (ids, type_ids, attention, offsets) = self.encode_caption(&caption)?;
        let token_masks = prompt_token_masks(&offsets, &prompt_spans);
        let n = ids.len();

        let (width, height) = fit_size(
            image.width(),
            image.height(),
            self.config.shortest_side,
            self.config.longest_side,
        );
        let resized = imageops::resize(image, width, height, FilterType::Triangle);
        let pixels = normalized_chw(&resized, IMAGENET_MEAN, IMAGENET_STD);
        let pixel_mask = Array3::<i64>::ones((1, height as usize, width as usize));

        let shape_err = |e: ndarray::ShapeError| Error::Inference(e.to_string());
        let input_ids = Array2::from_shape_vec((1, n), ids).map_err(shape_err)?;
        let token_type_ids = Array2::from_shape_vec((1, n), type_ids).map_err(shape_err)?;
        let attention_mask = Array2::from_shape_vec((1, n), attention).map_err(shape_err)?;

        let outputs = self.session.run(ort::inputs![
            "pixel_values" => f32_value(pixels)?,
            "input_ids" => i64_value(input_ids)?,
            "token_type_ids" => i64_value(token_type_ids)?,
            "attention_mask" => i64_value(attention_mask)?,
            "pixel_mask" => i64_value(pixel_mask)?,
        ])?;

        let logits_value = outputs
            .get("logits")
            .ok_or_else(|| Error::Inference("model has no `logits` output".into()))?;
        let (shape, logits) = logits_value.try_extract_tensor::<f32>()?;
        let dims: Vec<usize> = shape.iter().map(|&d| d as usize).collect();
        if dims.len() != 3 {
            return Err(Error::Inference(format!(
                "expected 3D logits, got shape {:?}",
                dims
            )));
        }
        let logits = logits.to_vec();

        let boxes_value = outputs
            .get("pred_boxes")
            .ok_or_else(|| Error::Inference("model has no `pred_boxes` output".into()))?;
        let (_, boxes) = boxes_value.try_extract_tensor::<f32>()?;
        let boxes = boxes.to_vec();
        drop(outputs);

        let output = GroundingOutput {
            logits: &logits,
            boxes: &boxes,
            queries: dims[1],
            logit_len: dims[2],
        };
        let detections = decode_grounding(
            &output,
            &token_masks,
            ontology,
            thresholds,
            image.dimensions(),
        );
        log::debug!(
            "grounding-dino: {} of {} queries kept",
            detections.len(),
            dims[1]
        );
        Ok(detections)
    }
}

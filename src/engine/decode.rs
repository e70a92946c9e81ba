//! Model-independent pre- and post-processing for the ONNX engines.

use std::ops::Range;

use super::{DetectionThresholds, Ontology};
use crate::model::{BoundingBox, Detection, RegionKind};

/// Grounding caption for an ontology and the byte range of each prompt in it.
///
/// Prompts are lowercased, joined with ". " and terminated with ".".
pub fn build_caption(ontology: &Ontology) -> (String, Vec<Range<usize>>) {
    let mut caption = String::new();
    let mut spans = Vec::with_capacity(ontology.len());
    for (i, prompt) in ontology.prompts().enumerate() {
        if i > 0 {
            caption.push_str(". ");
        }
        let start = caption.len();
        caption.push_str(&prompt.to_lowercase());
        spans.push(start..caption.len());
    }
    caption.push('.');
    (caption, spans)
}

/// For every prompt, the indices of the tokens whose offsets fall inside it.
pub fn prompt_token_masks(offsets: &[(usize, usize)], spans: &[Range<usize>]) -> Vec<Vec<usize>> {
    spans
        .iter()
        .map(|span| {
            offsets
                .iter()
                .enumerate()
                .filter(|(_, (s, e))| e > s && *s >= span.start && *e <= span.end)
                .map(|(i, _)| i)
                .collect()
        })
        .collect()
}

/// Raw grounding model output for one image.
pub struct GroundingOutput<'a> {
    /// Token logits, `queries x logit_len`, row-major
    pub logits: &'a [f32],
    /// Normalized (cx, cy, w, h) boxes, `queries x 4`, row-major
    pub boxes: &'a [f32],
    pub queries: usize,
    pub logit_len: usize,
}

/// Turn grounding logits and boxes into detections in pixel coordinates.
///
/// A query is kept when its best token probability exceeds the box
/// threshold; its class is the prompt holding the highest token probability,
/// kept only above the text threshold.
pub fn decode_grounding(
    output: &GroundingOutput<'_>,
    token_masks: &[Vec<usize>],
    ontology: &Ontology,
    thresholds: &DetectionThresholds,
    image_size: (u32, u32),
) -> Vec<Detection> {
    let (width, height) = (image_size.0 as f32, image_size.1 as f32);
    let valid_tokens: usize = token_masks
        .iter()
        .flatten()
        .map(|&i| i + 1)
        .max()
        .unwrap_or(0)
        .min(output.logit_len);

    let mut detections = Vec::new();
    for q in 0..output.queries {
        let Some(row) = output.logits.get(q * output.logit_len..(q + 1) * output.logit_len) else {
            break;
        };
        let Some(b) = output.boxes.get(q * 4..q * 4 + 4) else {
            break;
        };
        let probs: Vec<f32> = row[..valid_tokens].iter().map(|&l| sigmoid(l)).collect();

        let score = probs.iter().copied().fold(0.0f32, f32::max);
        if score <= thresholds.box_threshold {
            continue;
        }

        let best = token_masks
            .iter()
            .enumerate()
            .map(|(class_id, mask)| {
                let p = mask
                    .iter()
                    .filter_map(|&t| probs.get(t))
                    .copied()
                    .fold(0.0f32, f32::max);
                (class_id, p)
            })
            .max_by(|a, b| a.1.total_cmp(&b.1));

        let Some((class_id, class_prob)) = best else {
            continue;
        };
        if class_prob <= thresholds.text_threshold {
            continue;
        }
        let Some(label) = ontology.label(class_id) else {
            continue;
        };

        let bbox = BoundingBox::from_center(b[0] * width, b[1] * height, b[2] * width, b[3] * height);
        detections.push(Detection::new(bbox, class_id, label, score));
    }

    detections
}

/// Decode PaddleDetection rows `[class, score, x1, y1, x2, y2]`.
pub fn decode_layout_rows(
    rows: &[f32],
    labels: &[String],
    score_threshold: f32,
) -> Vec<(RegionKind, BoundingBox, f32)> {
    rows.chunks_exact(6)
        .filter_map(|r| {
            let (class, score) = (r[0], r[1]);
            if score < score_threshold || class < 0.0 {
                return None;
            }
            let Some(label) = labels.get(class as usize) else {
                log::debug!("Layout class {} has no label", class);
                return None;
            };
            Some((
                RegionKind::from_label(label),
                BoundingBox::new(r[2], r[3], r[4], r[5]),
                score,
            ))
        })
        .collect()
}

/// Size that fits `(width, height)` so the shorter side becomes `short`
/// without the longer side exceeding `long`.
pub fn fit_size(width: u32, height: u32, short: u32, long: u32) -> (u32, u32) {
    let (w, h) = (width.max(1) as f32, height.max(1) as f32);
    let scale = (short as f32 / w.min(h)).min(long as f32 / w.max(h));
    (
        ((w * scale).round() as u32).max(1),
        ((h * scale).round() as u32).max(1),
    )
}

fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

//! Positioned text fragments.

use crate::model::OcrLine;

/// A run of text with its position.
///
/// Coordinates follow PDF user space: `x` grows to the right, `y` is the
/// baseline and grows upwards.
#[derive(Debug, Clone, PartialEq)]
pub struct TextSpan {
    pub text: String,
    /// Left edge
    pub x: f32,
    /// Baseline
    pub y: f32,
    pub width: f32,
    /// Font size in points (or line height in pixels for OCR text)
    pub font_size: f32,
}

impl TextSpan {
    pub fn new(text: impl Into<String>, x: f32, y: f32, width: f32, font_size: f32) -> Self {
        Self {
            text: text.into(),
            x,
            y,
            width,
            font_size,
        }
    }

    /// Right edge.
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    /// Convert OCR lines of a raster region into spans.
    ///
    /// Raster `y` grows downwards, so it is flipped against `page_height`.
    /// Words separated by a gap wider than `gap_factor` times the line height
    /// start a new span, which is what separates table cells on one line.
    pub fn from_ocr_lines(lines: &[OcrLine], page_height: f32, gap_factor: f32) -> Vec<TextSpan> {
        let mut spans = Vec::new();

        for line in lines {
            let height = line.bbox.height().max(1.0);
            let baseline = page_height - line.bbox.y_max;

            if line.words.is_empty() {
                if !line.text.trim().is_empty() {
                    spans.push(TextSpan::new(
                        line.text.trim(),
                        line.bbox.x_min,
                        baseline,
                        line.bbox.width(),
                        height,
                    ));
                }
                continue;
            }

            let mut current: Option<TextSpan> = None;
            for word in &line.words {
                let text = word.text.trim();
                if text.is_empty() {
                    continue;
                }
                match current.as_mut() {
                    Some(span) if word.bbox.x_min - span.right() <= height * gap_factor => {
                        span.text.push(' ');
                        span.text.push_str(text);
                        span.width = word.bbox.x_max - span.x;
                    }
                    _ => {
                        if let Some(done) = current.take() {
                            spans.push(done);
                        }
                        current = Some(TextSpan::new(
                            text,
                            word.bbox.x_min,
                            baseline,
                            word.bbox.width(),
                            height,
                        ));
                    }
                }
            }
            if let Some(done) = current {
                spans.push(done);
            }
        }

        spans
    }
}

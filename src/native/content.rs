//! Positioned text spans decoded from page content streams.

use std::collections::BTreeMap;

use lopdf::content::Content;
use lopdf::{Dictionary, Document as LopdfDocument, Object, ObjectId};

use crate::error::{Error, Result};
use crate::table::TextSpan;

/// TJ adjustments beyond this (thousandths of text space) read as a word gap.
const TJ_SPACE_THRESHOLD: f32 = 200.0;

/// Average glyph advance as a fraction of the font size, used for span widths.
const AVG_GLYPH_WIDTH: f32 = 0.5;

/// Decode every text-showing operator on a page into a [`TextSpan`].
///
/// Only the text matrix is tracked; the CTM is ignored, which is enough
/// for the axis-aligned text that table detection looks at.
pub fn extract_page_spans(doc: &LopdfDocument, page_id: ObjectId) -> Result<Vec<TextSpan>> {
    let fonts = doc.get_page_fonts(page_id)?;
    let content = doc.get_page_content(page_id)?;
    let content = Content::decode(&content).map_err(|e| Error::PdfParse(e.to_string()))?;

    let mut state = TextState::new(doc, &fonts);
    for op in &content.operations {
        state.apply(op.operator.as_str(), &op.operands);
    }

    log::debug!("Decoded {} text spans from page {:?}", state.spans.len(), page_id);
    Ok(state.spans)
}

struct TextState<'a> {
    doc: &'a LopdfDocument,
    fonts: &'a BTreeMap<Vec<u8>, &'a Dictionary>,
    font: Vec<u8>,
    font_size: f32,
    leading: f32,
    matrix: TextMatrix,
    in_text: bool,
    spans: Vec<TextSpan>,
}

impl<'a> TextState<'a> {
    fn new(doc: &'a LopdfDocument, fonts: &'a BTreeMap<Vec<u8>, &'a Dictionary>) -> Self {
        Self {
            doc,
            fonts,
            font: Vec::new(),
            font_size: 12.0,
            leading: 0.0,
            matrix: TextMatrix::default(),
            in_text: false,
            spans: Vec::new(),
        }
    }

    fn apply(&mut self, operator: &str, operands: &[Object]) {
        match operator {
            "BT" => {
                self.in_text = true;
                self.matrix = TextMatrix::default();
            }
            "ET" => self.in_text = false,
            "Tf" => {
                if let [Object::Name(name), size, ..] = operands {
                    self.font = name.clone();
                    self.font_size = number(size).unwrap_or(12.0);
                }
            }
            "TL" => {
                if let Some(l) = operands.first().and_then(number) {
                    self.leading = l;
                }
            }
            "Td" | "TD" => {
                if let [tx, ty, ..] = operands {
                    let ty = number(ty).unwrap_or(0.0);
                    if operator == "TD" {
                        self.leading = -ty;
                    }
                    self.matrix.translate(number(tx).unwrap_or(0.0), ty);
                }
            }
            "Tm" => {
                if operands.len() >= 6 {
                    let v: Vec<f32> = operands.iter().take(6).map(|o| number(o).unwrap_or(0.0)).collect();
                    self.matrix.set([v[0], v[1], v[2], v[3], v[4], v[5]]);
                }
            }
            "T*" => self.matrix.translate(0.0, -self.leading),
            "Tj" => {
                if let Some(Object::String(bytes, _)) = operands.first() {
                    let text = self.decode(bytes);
                    self.push_span(text);
                }
            }
            "TJ" => {
                if let Some(Object::Array(items)) = operands.first() {
                    let text = self.decode_array(items);
                    self.push_span(text);
                }
            }
            "'" | "\"" => {
                self.matrix.translate(0.0, -self.leading);
                let idx = if operator == "\"" { 2 } else { 0 };
                if let Some(Object::String(bytes, _)) = operands.get(idx) {
                    let text = self.decode(bytes);
                    self.push_span(text);
                }
            }
            _ => {}
        }
    }

    fn decode(&self, bytes: &[u8]) -> String {
        let encoding = self
            .fonts
            .get(&self.font)
            .and_then(|f| f.get_font_encoding(self.doc).ok());
        match encoding {
            Some(enc) => LopdfDocument::decode_text(&enc, bytes).unwrap_or_else(|_| decode_fallback(bytes)),
            None => decode_fallback(bytes),
        }
    }

    fn decode_array(&self, items: &[Object]) -> String {
        let mut combined = String::new();
        for item in items {
            match item {
                Object::String(bytes, _) => combined.push_str(&self.decode(bytes)),
                other => {
                    let gap = -number(other).unwrap_or(0.0);
                    if gap > TJ_SPACE_THRESHOLD
                        && !combined.is_empty()
                        && !combined.ends_with(char::is_whitespace)
                    {
                        combined.push(' ');
                    }
                }
            }
        }
        combined
    }

    fn push_span(&mut self, text: String) {
        if !self.in_text || text.trim().is_empty() {
            return;
        }
        let (x, y) = self.matrix.position();
        let size = self.font_size * self.matrix.scale();
        let width = text.chars().count() as f32 * size * AVG_GLYPH_WIDTH;
        self.spans.push(TextSpan::new(text, x, y, width, size));
    }
}

/// Text matrix for tracking position in a content stream.
#[derive(Debug, Clone, Copy)]
struct TextMatrix {
    m: [f32; 6],
    /// Start of the current line
    line: [f32; 6],
}

impl Default for TextMatrix {
    fn default() -> Self {
        let identity = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];
        Self {
            m: identity,
            line: identity,
        }
    }
}

impl TextMatrix {
    fn set(&mut self, m: [f32; 6]) {
        self.m = m;
        self.line = m;
    }

    /// Move to the start of the next line, offset from the current line start.
    fn translate(&mut self, tx: f32, ty: f32) {
        let [a, b, c, d, e, f] = self.line;
        self.line = [a, b, c, d, e + tx * a + ty * c, f + tx * b + ty * d];
        self.m = self.line;
    }

    fn position(&self) -> (f32, f32) {
        (self.m[4], self.m[5])
    }

    fn scale(&self) -> f32 {
        let [a, _, c, ..] = self.m;
        (a * a + c * c).sqrt()
    }
}

fn number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r as f32),
        _ => None,
    }
}

/// Decode text when the font gives no usable encoding.
fn decode_fallback(bytes: &[u8]) -> String {
    if let Some(utf16) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> = utf16
            .chunks_exact(2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}

//! Per-page intermediate results of the raster strategies.

use image::RgbImage;
use serde::{Deserialize, Serialize};

use super::BoundingBox;

/// A region proposed by a zero-shot detector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub bbox: BoundingBox,
    /// Position of the matched prompt in the ontology.
    pub class_id: usize,
    /// Short label of the matched prompt, e.g. "text".
    pub label: String,
    pub confidence: f32,
}

impl Detection {
    pub fn new(bbox: BoundingBox, class_id: usize, label: impl Into<String>, confidence: f32) -> Self {
        Self {
            bbox,
            class_id,
            label: label.into(),
            confidence,
        }
    }
}

/// A recognized word inside an OCR line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OcrWord {
    pub text: String,
    pub bbox: BoundingBox,
    pub confidence: f32,
}

/// A line of recognized text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OcrLine {
    pub text: String,
    pub bbox: BoundingBox,
    pub confidence: f32,
    pub words: Vec<OcrWord>,
}

impl OcrLine {
    /// Build a line from its words, joining them with single spaces.
    pub fn from_words(words: Vec<OcrWord>) -> Self {
        let text = words
            .iter()
            .map(|w| w.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        let bbox = words
            .iter()
            .map(|w| w.bbox)
            .reduce(|a, b| a.union(&b))
            .unwrap_or_default();
        let confidence = if words.is_empty() {
            0.0
        } else {
            words.iter().map(|w| w.confidence).sum::<f32>() / words.len() as f32
        };
        Self {
            text,
            bbox,
            confidence,
            words,
        }
    }

    /// A line with text only, e.g. from engines without word geometry.
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            bbox: BoundingBox::default(),
            confidence: 1.0,
            words: Vec::new(),
        }
    }
}

/// Category of a layout region.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegionKind {
    Text,
    Title,
    List,
    Table,
    Figure,
    Other(String),
}

impl RegionKind {
    /// Map a model label to a region kind.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "text" => RegionKind::Text,
            "title" => RegionKind::Title,
            "list" => RegionKind::List,
            "table" => RegionKind::Table,
            "figure" | "image" => RegionKind::Figure,
            other => RegionKind::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            RegionKind::Text => "text",
            RegionKind::Title => "title",
            RegionKind::List => "list",
            RegionKind::Table => "table",
            RegionKind::Figure => "figure",
            RegionKind::Other(label) => label,
        }
    }

    /// Whether the region's text belongs in the page text.
    pub fn contributes_text(&self) -> bool {
        matches!(self, RegionKind::Text | RegionKind::Title)
    }

    /// Whether the region should be sent through OCR.
    pub fn is_textual(&self) -> bool {
        matches!(
            self,
            RegionKind::Text | RegionKind::Title | RegionKind::List | RegionKind::Other(_)
        )
    }
}

impl std::fmt::Display for RegionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Recognized content of a layout region.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum RegionContent {
    Lines(Vec<OcrLine>),
    TableHtml(String),
    #[default]
    Empty,
}

/// A region found by a layout engine.
#[derive(Debug, Clone)]
pub struct LayoutRegion {
    pub kind: RegionKind,
    pub bbox: BoundingBox,
    pub content: RegionContent,
    /// Crop of the page raster covering the region.
    pub image: Option<RgbImage>,
}

impl LayoutRegion {
    pub fn new(kind: RegionKind, bbox: BoundingBox) -> Self {
        Self {
            kind,
            bbox,
            content: RegionContent::Empty,
            image: None,
        }
    }

    pub fn with_content(mut self, content: RegionContent) -> Self {
        self.content = content;
        self
    }

    pub fn with_image(mut self, image: RgbImage) -> Self {
        self.image = Some(image);
        self
    }

    /// Line texts of the region joined with single spaces.
    pub fn text(&self) -> String {
        match &self.content {
            RegionContent::Lines(lines) => lines
                .iter()
                .map(|l| l.text.as_str())
                .collect::<Vec<_>>()
                .join(" "),
            _ => String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word(text: &str, x: f32) -> OcrWord {
        OcrWord {
            text: text.to_string(),
            bbox: BoundingBox::new(x, 0.0, x + 10.0, 10.0),
            confidence: 0.9,
        }
    }

    #[test]
    fn test_line_from_words() {
        let line = OcrLine::from_words(vec![word("Hello", 0.0), word("World", 20.0)]);
        assert_eq!(line.text, "Hello World");
        assert_eq!(line.bbox, BoundingBox::new(0.0, 0.0, 30.0, 10.0));
        assert!((line.confidence - 0.9).abs() < 1e-6);
    }

    #[test]
    fn test_region_kind_labels() {
        assert_eq!(RegionKind::from_label("Title"), RegionKind::Title);
        assert_eq!(RegionKind::from_label("figure"), RegionKind::Figure);
        assert_eq!(
            RegionKind::from_label("equation"),
            RegionKind::Other("equation".into())
        );
        assert_eq!(RegionKind::Table.to_string(), "table");
    }

    #[test]
    fn test_text_policy() {
        assert!(RegionKind::Text.contributes_text());
        assert!(RegionKind::Title.contributes_text());
        assert!(!RegionKind::List.contributes_text());
        assert!(!RegionKind::Table.contributes_text());
        assert!(!RegionKind::Figure.is_textual());
    }

    #[test]
    fn test_region_text() {
        let region = LayoutRegion::new(RegionKind::Text, BoundingBox::default()).with_content(
            RegionContent::Lines(vec![OcrLine::plain("first"), OcrLine::plain("second")]),
        );
        assert_eq!(region.text(), "first second");

        let table = LayoutRegion::new(RegionKind::Table, BoundingBox::default())
            .with_content(RegionContent::TableHtml("<table></table>".into()));
        assert_eq!(table.text(), "");
    }
}

//! Page and document results.

use serde::{Deserialize, Serialize};

use super::ExtractedImage;

/// Everything extracted from one page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageResult {
    /// Zero-based page index.
    pub index: usize,
    pub text: String,
    pub images: Vec<ExtractedImage>,
    /// Tables as Markdown (native) or HTML (layout).
    pub tables: Vec<String>,
}

impl PageResult {
    /// An empty result for the given page.
    pub fn empty(index: usize) -> Self {
        Self {
            index,
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty() && self.images.is_empty() && self.tables.is_empty()
    }
}

/// Results for a whole document, one entry per page in page order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentResult {
    /// File name of the source PDF.
    pub source: String,
    /// Name of the extraction strategy.
    pub strategy: String,
    pub pages: Vec<PageResult>,
}

impl DocumentResult {
    /// Create a result with room for `page_count` pages.
    pub fn with_capacity(
        source: impl Into<String>,
        strategy: impl Into<String>,
        page_count: usize,
    ) -> Self {
        Self {
            source: source.into(),
            strategy: strategy.into(),
            pages: Vec::with_capacity(page_count),
        }
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn page(&self, index: usize) -> Option<&PageResult> {
        self.pages.get(index)
    }

    /// Page texts in page order.
    pub fn texts(&self) -> impl Iterator<Item = (usize, &str)> {
        self.pages.iter().map(|p| (p.index, p.text.as_str()))
    }

    /// Total number of extracted images.
    pub fn image_count(&self) -> usize {
        self.pages.iter().map(|p| p.images.len()).sum()
    }

    /// Total number of extracted tables.
    pub fn table_count(&self) -> usize {
        self.pages.iter().map(|p| p.tables.len()).sum()
    }
}

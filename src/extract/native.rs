//! Native strategy: read text, images and tables straight from the PDF.

use super::{PageExtractor, Strategy};
use crate::error::Result;
use crate::model::PageResult;
use crate::native::{extract_page_images, extract_page_spans};
use crate::options::ExtractOptions;
use crate::render::table_to_markdown;
use crate::source::PdfSource;
use crate::table::{TableDetector, TableDetectorConfig};

/// Extracts embedded content through lopdf; tables come out as Markdown.
#[derive(Debug, Clone, Default)]
pub struct NativeExtractor {
    detector: TableDetector,
}

impl NativeExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use custom table detection settings.
    pub fn with_table_config(config: TableDetectorConfig) -> Self {
        Self {
            detector: TableDetector::with_config(config),
        }
    }

    pub fn table_config(&self) -> &TableDetectorConfig {
        self.detector.config()
    }
}

impl PageExtractor for NativeExtractor {
    fn name(&self) -> &str {
        Strategy::Native.as_str()
    }

    fn extract_page(
        &mut self,
        source: &PdfSource,
        index: usize,
        _options: &ExtractOptions,
    ) -> Result<PageResult> {
        let doc = source.document();
        let page_number = source.page_number(index)?;
        let page_id = source.page_id(index)?;

        let mut page = PageResult::empty(index);
        page.text = doc.extract_text(&[page_number])?;

        let spans = extract_page_spans(doc, page_id)?;
        page.tables = self
            .detector
            .detect_tables(spans)
            .iter()
            .map(table_to_markdown)
            .collect();

        page.images = extract_page_images(doc, page_id)?;

        log::debug!(
            "Page {}: {} chars, {} tables, {} images",
            index,
            page.text.len(),
            page.tables.len(),
            page.images.len()
        );
        Ok(page)
    }
}

//! Layout strategy: a layout engine finds and recognizes regions on the
//! page raster; text, tables and crops are collected from its regions.

use image::RgbImage;

use super::{PageExtractor, Strategy};
use crate::engine::LayoutEngine;
use crate::error::Result;
use crate::model::{ExtractedImage, LayoutRegion, PageResult, RegionContent};
use crate::options::ExtractOptions;
use crate::source::{PageRasterizer, PdfSource};

/// Options for the layout strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LayoutOptions {
    /// Inserted between the text of consecutive text regions
    pub region_separator: String,
}

impl LayoutOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_region_separator(mut self, separator: impl Into<String>) -> Self {
        self.region_separator = separator.into();
        self
    }
}

/// Layout strategy built from a rasterizer and a layout engine.
pub struct LayoutExtractor {
    rasterizer: Box<dyn PageRasterizer>,
    engine: Box<dyn LayoutEngine>,
    options: LayoutOptions,
}

impl LayoutExtractor {
    pub fn new(rasterizer: Box<dyn PageRasterizer>, engine: Box<dyn LayoutEngine>) -> Self {
        Self::with_options(rasterizer, engine, LayoutOptions::default())
    }

    pub fn with_options(
        rasterizer: Box<dyn PageRasterizer>,
        engine: Box<dyn LayoutEngine>,
        options: LayoutOptions,
    ) -> Self {
        Self {
            rasterizer,
            engine,
            options,
        }
    }

    pub fn options(&self) -> &LayoutOptions {
        &self.options
    }

    /// Extract a page from an already rasterized image.
    pub fn extract_raster(&mut self, index: usize, raster: &RgbImage) -> Result<PageResult> {
        let regions = self.engine.analyze(raster)?;
        log::debug!(
            "Page {}: {} regions from {}",
            index,
            regions.len(),
            self.engine.name()
        );
        collect_regions(index, &regions, &self.options.region_separator)
    }
}

/// Fold a page's regions into a page result.
///
/// Only text and title regions contribute text; every table region
/// contributes its HTML; every region with a crop contributes an image.
fn collect_regions(index: usize, regions: &[LayoutRegion], separator: &str) -> Result<PageResult> {
    let mut page = PageResult::empty(index);
    let mut texts = Vec::new();

    for region in regions {
        if region.kind.contributes_text() {
            texts.push(region.text());
        }
        if let RegionContent::TableHtml(html) = &region.content {
            page.tables.push(html.clone());
        }
        if let Some(crop) = &region.image {
            page.images
                .push(ExtractedImage::jpeg_from_rgb(crop)?.with_label(region.kind.as_str()));
        }
    }

    page.text = texts.join(separator);
    Ok(page)
}

impl std::fmt::Debug for LayoutExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LayoutExtractor")
            .field("engine", &self.engine.name())
            .field("options", &self.options)
            .finish()
    }
}

impl PageExtractor for LayoutExtractor {
    fn name(&self) -> &str {
        Strategy::Layout.as_str()
    }

    fn extract_page(
        &mut self,
        source: &PdfSource,
        index: usize,
        options: &ExtractOptions,
    ) -> Result<PageResult> {
        let raster = self.rasterizer.rasterize_page(source, index, options.dpi)?;
        self.extract_raster(index, &raster)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BoundingBox, OcrLine, RegionKind};

    fn region(kind: RegionKind, content: RegionContent) -> LayoutRegion {
        LayoutRegion::new(kind, BoundingBox::new(0.0, 0.0, 10.0, 10.0))
            .with_content(content)
            .with_image(RgbImage::new(10, 10))
    }

    fn lines(texts: &[&str]) -> RegionContent {
        RegionContent::Lines(texts.iter().map(|t| OcrLine::plain(*t)).collect())
    }

    #[test]
    fn test_text_policy() {
        let regions = vec![
            region(RegionKind::Title, lines(&["Annual", "Report"])),
            region(RegionKind::List, lines(&["- skipped"])),
            region(RegionKind::Text, lines(&["Body text."])),
            region(RegionKind::Figure, RegionContent::Empty),
        ];

        let page = collect_regions(2, &regions, "").unwrap();
        assert_eq!(page.index, 2);
        assert_eq!(page.text, "Annual ReportBody text.");
        assert_eq!(page.images.len(), 4);
        assert_eq!(page.images[3].label.as_deref(), Some("figure"));

        let page = collect_regions(2, &regions, "\n").unwrap();
        assert_eq!(page.text, "Annual Report\nBody text.");
    }

    #[test]
    fn test_tables_in_region_order() {
        let regions = vec![
            region(RegionKind::Table, RegionContent::TableHtml("<table>1</table>".into())),
            region(RegionKind::Text, lines(&["between"])),
            region(RegionKind::Table, RegionContent::TableHtml("<table>2</table>".into())),
        ];

        let page = collect_regions(0, &regions, "").unwrap();
        assert_eq!(page.tables, vec!["<table>1</table>", "<table>2</table>"]);
        assert_eq!(page.text, "between");
    }

    #[test]
    fn test_no_regions() {
        let page = collect_regions(0, &[], "").unwrap();
        assert!(page.is_empty());
    }
}

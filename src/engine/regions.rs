//! Filling layout regions with recognized content.

use image::RgbImage;

use super::OcrEngine;
use crate::crop::crop_box;
use crate::error::Result;
use crate::model::{BoundingBox, LayoutRegion, OcrLine, RegionContent, RegionKind, Table, TableRow};
use crate::render::table_to_html;
use crate::table::{TableDetector, TableDetectorConfig, TextSpan};

/// Settings for turning raw layout boxes into recognized regions.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionRecognizerConfig {
    /// Table detection thresholds, in pixels of the page raster
    pub table: TableDetectorConfig,
    /// Word gap, as a multiple of the line height, that splits table cells
    pub cell_gap_factor: f32,
}

impl Default for RegionRecognizerConfig {
    fn default() -> Self {
        Self::for_dpi(72)
    }
}

impl RegionRecognizerConfig {
    /// Table thresholds scaled from points to pixels at `dpi`.
    pub fn for_dpi(dpi: u32) -> Self {
        Self {
            table: TableDetectorConfig::default().scaled(dpi as f32 / 72.0),
            cell_gap_factor: 1.0,
        }
    }
}

/// Crops layout boxes out of a page and recognizes their content.
///
/// Text-like regions are OCR'd, table regions are OCR'd and rebuilt into an
/// HTML table, figures carry no recognized content. Every region keeps its
/// crop.
pub struct RegionRecognizer {
    ocr: Box<dyn OcrEngine>,
    config: RegionRecognizerConfig,
}

impl RegionRecognizer {
    pub fn new(ocr: Box<dyn OcrEngine>) -> Self {
        Self::with_config(ocr, RegionRecognizerConfig::default())
    }

    pub fn with_config(ocr: Box<dyn OcrEngine>, config: RegionRecognizerConfig) -> Self {
        Self { ocr, config }
    }

    pub fn ocr_name(&self) -> &str {
        self.ocr.name()
    }

    /// Recognize `boxes` on `page`, returning regions top-to-bottom then
    /// left-to-right.
    pub fn recognize(
        &mut self,
        page: &RgbImage,
        mut boxes: Vec<(RegionKind, BoundingBox)>,
    ) -> Result<Vec<LayoutRegion>> {
        boxes.sort_by(|(_, a), (_, b)| {
            a.y_min
                .total_cmp(&b.y_min)
                .then(a.x_min.total_cmp(&b.x_min))
        });

        let mut regions = Vec::with_capacity(boxes.len());
        for (kind, bbox) in boxes {
            let crop = crop_box(page, &bbox);
            let content = match kind {
                RegionKind::Figure => RegionContent::Empty,
                RegionKind::Table => {
                    let lines = self.ocr.recognize(&crop)?;
                    RegionContent::TableHtml(self.table_html(&lines, crop.height()))
                }
                _ => RegionContent::Lines(self.ocr.recognize(&crop)?),
            };
            regions.push(
                LayoutRegion::new(kind, bbox)
                    .with_content(content)
                    .with_image(crop),
            );
        }

        Ok(regions)
    }

    /// Rebuild an OCR'd table region as HTML.
    ///
    /// Falls back to a single-column table with one row per line when no
    /// column structure is found.
    fn table_html(&self, lines: &[OcrLine], height: u32) -> String {
        let spans = TextSpan::from_ocr_lines(lines, height as f32, self.config.cell_gap_factor);
        let detector = TableDetector::with_config(self.config.table.clone());
        let tables = detector.detect_tables(spans);

        if tables.is_empty() {
            log::debug!("No column structure in table region, using one row per line");
            let mut table = Table::new();
            for line in lines.iter().filter(|l| !l.text.trim().is_empty()) {
                table.add_row(TableRow::from_strings([line.text.trim()]));
            }
            return table_to_html(&table);
        }

        tables.iter().map(table_to_html).collect()
    }
}

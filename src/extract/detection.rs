//! Zero-shot detection strategy: detect regions on the page raster, OCR the
//! text regions, keep every selected crop as an image.

use image::RgbImage;

use super::{PageExtractor, Strategy};
use crate::crop::{crop_detections, Crop};
use crate::engine::{DetectionThresholds, OcrEngine, Ontology, ZeroShotDetector};
use crate::error::Result;
use crate::model::{ExtractedImage, PageResult};
use crate::options::ExtractOptions;
use crate::source::{PageRasterizer, PdfSource};

/// Options for the detection strategy.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionOptions {
    /// Prompts and the labels they map to
    pub ontology: Ontology,

    pub thresholds: DetectionThresholds,

    /// Labels to crop (None = every label)
    pub labels: Option<Vec<String>>,

    /// Label whose crops are OCR'd for page text
    pub text_label: String,

    /// Inserted between the OCR text of consecutive text crops
    pub region_separator: String,
}

impl DetectionOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ontology(mut self, ontology: Ontology) -> Self {
        self.ontology = ontology;
        self
    }

    pub fn with_thresholds(mut self, thresholds: DetectionThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    /// Only crop detections with one of these labels.
    pub fn with_labels<S: Into<String>>(mut self, labels: impl IntoIterator<Item = S>) -> Self {
        self.labels = Some(labels.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_text_label(mut self, label: impl Into<String>) -> Self {
        self.text_label = label.into();
        self
    }

    pub fn with_region_separator(mut self, separator: impl Into<String>) -> Self {
        self.region_separator = separator.into();
        self
    }
}

impl Default for DetectionOptions {
    fn default() -> Self {
        Self {
            ontology: Ontology::default(),
            thresholds: DetectionThresholds::default(),
            labels: None,
            text_label: "text".to_string(),
            region_separator: String::new(),
        }
    }
}

/// Detection strategy built from a rasterizer, a zero-shot detector and an
/// OCR engine.
pub struct DetectionExtractor {
    rasterizer: Box<dyn PageRasterizer>,
    detector: Box<dyn ZeroShotDetector>,
    ocr: Box<dyn OcrEngine>,
    options: DetectionOptions,
}

impl DetectionExtractor {
    pub fn new(
        rasterizer: Box<dyn PageRasterizer>,
        detector: Box<dyn ZeroShotDetector>,
        ocr: Box<dyn OcrEngine>,
    ) -> Self {
        Self::with_options(rasterizer, detector, ocr, DetectionOptions::default())
    }

    pub fn with_options(
        rasterizer: Box<dyn PageRasterizer>,
        detector: Box<dyn ZeroShotDetector>,
        ocr: Box<dyn OcrEngine>,
        options: DetectionOptions,
    ) -> Self {
        Self {
            rasterizer,
            detector,
            ocr,
            options,
        }
    }

    pub fn options(&self) -> &DetectionOptions {
        &self.options
    }

    /// Extract a page from an already rasterized image.
    pub fn extract_raster(&mut self, index: usize, raster: &RgbImage) -> Result<PageResult> {
        let detections =
            self.detector
                .detect(raster, &self.options.ontology, &self.options.thresholds)?;
        log::debug!(
            "Page {}: {} detections from {}",
            index,
            detections.len(),
            self.detector.name()
        );

        let crops = crop_detections(raster, &detections, self.options.labels.as_deref());
        let mut page = PageResult::empty(index);
        let mut texts = Vec::new();

        for (i, crop) in crops.iter().enumerate() {
            if crop.detection.label == self.options.text_label {
                texts.push(self.crop_text(index, i, crop)?);
            }
            page.images.push(
                ExtractedImage::jpeg_from_rgb(&crop.image)?.with_label(crop.detection.label.as_str()),
            );
        }

        page.text = texts.join(&self.options.region_separator);
        Ok(page)
    }

    /// OCR one crop. A recoverable failure yields empty text.
    fn crop_text(&mut self, page: usize, region: usize, crop: &Crop) -> Result<String> {
        match self.ocr.recognize(&crop.image) {
            Ok(lines) => Ok(lines
                .iter()
                .map(|line| line.text.as_str())
                .collect::<Vec<_>>()
                .join(" ")),
            Err(e) if e.is_recoverable() => {
                log::info!("OCR failed on page {} region {}: {}", page, region, e);
                Ok(String::new())
            }
            Err(e) => Err(e),
        }
    }
}

impl std::fmt::Debug for DetectionExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DetectionExtractor")
            .field("detector", &self.detector.name())
            .field("ocr", &self.ocr.name())
            .field("options", &self.options)
            .finish()
    }
}

impl PageExtractor for DetectionExtractor {
    fn name(&self) -> &str {
        Strategy::Detect.as_str()
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

//! # pdf2data
//!
//! Extract text, images and tables from PDF documents with one of three
//! interchangeable strategies.
//!
//! ## Quick Start
//!
//! ```no_run
//! use pdf2data::extract_native;
//!
//! fn main() -> pdf2data::Result<()> {
//!     let result = extract_native("invoice.pdf")?;
//!     for (index, text) in result.texts() {
//!         println!("Page {}: {}", index, text);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Strategies
//!
//! - **detect**: a zero-shot detector finds text, figure and table regions
//!   on the rendered page; text regions are OCR'd
//! - **layout**: a layout model segments the rendered page; text regions are
//!   OCR'd and table regions rebuilt as HTML
//! - **native**: embedded text, images and Markdown tables read through lopdf
//!
//! The model-backed engines (`GroundingDino`, `PaddleLayout`) need the
//! `onnx` feature. OCR and rasterization shell out to `tesseract` and
//! `pdftoppm`.
//!
//! ```no_run
//! use pdf2data::{
//!     DetectionExtractor, ExtractOptions, Pdftoppm, Pipeline, Tesseract,
//!     ZeroShotDetector,
//! };
//!
//! # fn detector() -> Box<dyn ZeroShotDetector> { unimplemented!() }
//! let mut extractor = DetectionExtractor::new(
//!     Box::new(Pdftoppm::new()),
//!     detector(),
//!     Box::new(Tesseract::new()),
//! );
//! let options = ExtractOptions::new().with_dpi(300).save_images_to("out");
//! let result = Pipeline::new(options).run(&mut extractor, "paper.pdf")?;
//! println!("{}", result.to_json()?);
//! # Ok::<(), pdf2data::Error>(())
//! ```

pub mod crop;
pub mod detect;
pub mod engine;
pub mod error;
pub mod extract;
pub mod model;
pub mod native;
pub mod options;
pub mod persist;
pub mod pipeline;
pub mod render;
pub mod source;
pub mod table;

// Re-export commonly used types
pub use detect::{is_pdf, validate_source, PdfHeader};
pub use engine::{
    DetectionThresholds, LayoutEngine, OcrEngine, Ontology, RegionRecognizer,
    RegionRecognizerConfig, Tesseract, TesseractConfig, ZeroShotDetector,
};
pub use error::{Error, Result};
pub use extract::{
    DetectionExtractor, DetectionOptions, LayoutExtractor, LayoutOptions, NativeExtractor,
    PageExtractor, Strategy,
};
pub use model::{
    BoundingBox, Detection, DocumentResult, ExtractedImage, ImageFormat, LayoutRegion, OcrLine,
    OcrWord, PageResult, RegionContent, RegionKind, Table, TableCell, TableRow,
};
pub use options::{ErrorMode, ExtractOptions, DEFAULT_DPI};
pub use persist::ImageWriter;
pub use pipeline::{extract_file, extract_native, Pipeline};
pub use render::JsonFormat;
pub use source::{PageRasterizer, PdfSource, Pdftoppm};
pub use table::{TableDetector, TableDetectorConfig};

#[cfg(feature = "onnx")]
pub use engine::{GroundingDino, GroundingDinoConfig, PaddleLayout, PaddleLayoutConfig, SessionOptions};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_native_not_a_pdf() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut file, b"<!DOCTYPE html><html></html>").unwrap();
        let result = extract_native(file.path());
        assert!(matches!(result, Err(Error::UnknownFormat)));
    }

    #[test]
    fn test_extract_native_empty_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        assert!(matches!(
            extract_native(file.path()),
            Err(Error::UnknownFormat)
        ));
    }

    #[test]
    fn test_strategy_names_match_extractors() {
        assert_eq!(NativeExtractor::new().name(), Strategy::Native.as_str());
    }
}

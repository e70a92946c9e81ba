//! Page extraction strategies.
//!
//! Every strategy implements [`PageExtractor`]; the pipeline only ever sees
//! the trait, so switching strategy is a matter of constructing a different
//! extractor.

mod detection;
mod layout;
mod native;

pub use detection::{DetectionExtractor, DetectionOptions};
pub use layout::{LayoutExtractor, LayoutOptions};
pub use native::NativeExtractor;

use std::fmt;

use crate::error::Result;
use crate::model::PageResult;
use crate::options::ExtractOptions;
use crate::source::PdfSource;

/// Extracts the content of one page at a time.
pub trait PageExtractor {
    /// Strategy name recorded in the document result.
    fn name(&self) -> &str;

    /// Extract the page at zero-based `index`.
    ///
    /// The returned result must carry the same `index`.
    fn extract_page(
        &mut self,
        source: &PdfSource,
        index: usize,
        options: &ExtractOptions,
    ) -> Result<PageResult>;
}

impl<T: PageExtractor + ?Sized> PageExtractor for Box<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn extract_page(
        &mut self,
        source: &PdfSource,
        index: usize,
        options: &ExtractOptions,
    ) -> Result<PageResult> {
        (**self).extract_page(source, index, options)
    }
}

/// The available extraction strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    /// Zero-shot detection on page rasters, OCR on text crops
    Detect,
    /// Layout analysis on page rasters
    Layout,
    /// Embedded text, images and tables read through lopdf
    Native,
}

impl Strategy {
    pub const ALL: [Strategy; 3] = [Strategy::Detect, Strategy::Layout, Strategy::Native];

    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Detect => "detect",
            Strategy::Layout => "layout",
            Strategy::Native => "native",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

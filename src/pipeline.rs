//! Running an extractor over every page of a document.

use std::path::Path;

use crate::error::{Error, Result};
use crate::extract::{NativeExtractor, PageExtractor};
use crate::model::{DocumentResult, PageResult};
use crate::options::{ErrorMode, ExtractOptions};
use crate::persist::ImageWriter;
use crate::source::PdfSource;

/// Drives a [`PageExtractor`] over a document, one page at a time, in page
/// order.
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    options: ExtractOptions,
}

impl Pipeline {
    pub fn new(options: ExtractOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ExtractOptions {
        &self.options
    }

    /// Extract every page of the PDF at `path`.
    pub fn run<P: AsRef<Path>>(
        &self,
        extractor: &mut dyn PageExtractor,
        path: P,
    ) -> Result<DocumentResult> {
        self.run_with_progress(extractor, path, |_, _| {})
    }

    /// Like [`run`](Self::run), calling `on_page(done, total)` after each
    /// page.
    pub fn run_with_progress<P, F>(
        &self,
        extractor: &mut dyn PageExtractor,
        path: P,
        mut on_page: F,
    ) -> Result<DocumentResult>
    where
        P: AsRef<Path>,
        F: FnMut(usize, usize),
    {
        if self.options.save_images && self.options.output_dir.is_none() {
            return Err(Error::MissingOutputDir);
        }

        let source = PdfSource::open(path)?;
        let writer = match (&self.options.output_dir, self.options.save_images) {
            (Some(dir), true) => Some(ImageWriter::create(dir, source.file_stem())?),
            _ => None,
        };

        let total = source.page_count();
        let mut result = DocumentResult::with_capacity(source.file_name(), extractor.name(), total);

        for index in 0..total {
            let mut page = self.extract_page(extractor, &source, index)?;
            page.index = index;

            if let Some(writer) = &writer {
                writer.write_page(&page)?;
            }
            result.pages.push(page);
            on_page(index + 1, total);
        }

        debug_assert_eq!(result.page_count(), total);
        log::info!(
            "Extracted {} pages from {} with {}",
            total,
            result.source,
            result.strategy
        );
        Ok(result)
    }

    fn extract_page(
        &self,
        extractor: &mut dyn PageExtractor,
        source: &PdfSource,
        index: usize,
    ) -> Result<PageResult> {
        match extractor.extract_page(source, index, &self.options) {
            Ok(page) => Ok(page),
            Err(e) if e.is_recoverable() && self.options.error_mode == ErrorMode::Lenient => {
                log::warn!("Page {} degraded to an empty result: {}", index, e);
                Ok(PageResult::empty(index))
            }
            Err(e) => Err(e),
        }
    }
}

/// Extract every page of a PDF with the given extractor.
pub fn extract_file<P: AsRef<Path>>(
    path: P,
    extractor: &mut dyn PageExtractor,
    options: &ExtractOptions,
) -> Result<DocumentResult> {
    Pipeline::new(options.clone()).run(extractor, path)
}

/// Extract a PDF with the native strategy and default options.
pub fn extract_native<P: AsRef<Path>>(path: P) -> Result<DocumentResult> {
    let mut extractor = NativeExtractor::new();
    extract_file(path, &mut extractor, &ExtractOptions::default())
}

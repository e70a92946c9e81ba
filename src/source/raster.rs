//! Page rasterization.

use std::path::{Path, PathBuf};
use std::process::Command;

use image::RgbImage;
use tempfile::TempDir;

use super::PdfSource;
use crate::error::{Error, Result};

/// Renders single PDF pages to RGB rasters.
pub trait PageRasterizer {
    /// Render the page at zero-based `index` at `dpi` dots per inch.
    fn rasterize_page(&mut self, source: &PdfSource, index: usize, dpi: u32) -> Result<RgbImage>;
}

/// Rasterizer backed by poppler's `pdftoppm` binary.
///
/// Each call renders exactly one page into a scratch directory that is
/// removed when the call returns, so only one page raster is alive at a time.
#[derive(Debug, Clone)]
pub struct Pdftoppm {
    binary: PathBuf,
}

impl Pdftoppm {
    pub fn new() -> Self {
        Self {
            binary: PathBuf::from("pdftoppm"),
        }
    }

    /// Use a specific `pdftoppm` executable.
    pub fn with_binary(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    fn render(&self, pdf: &Path, page: u32, dpi: u32, out_dir: &Path) -> Result<PathBuf> {
        let page_str = page.to_string();
        let output = Command::new(&self.binary)
            .args(["-png", "-r", &dpi.to_string(), "-f", &page_str, "-l", &page_str])
            .arg(pdf)
            .arg(out_dir.join("page"))
            .output();

        match output {
            Ok(out) if out.status.success() => find_page_image(out_dir, page).ok_or_else(|| {
                Error::Rasterize(format!("pdftoppm produced no image for page {}", page))
            }),
            Ok(out) => Err(Error::Rasterize(format!(
                "pdftoppm failed on page {}: {}",
                page,
                String::from_utf8_lossy(&out.stderr).trim()
            ))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(Error::EngineUnavailable(
                format!("{} not found (install poppler-utils)", self.binary.display()),
            )),
            Err(e) => Err(Error::Io(e)),
        }
    }
}

impl Default for Pdftoppm {
    fn default() -> Self {
        Self::new()
    }
}

impl PageRasterizer for Pdftoppm {
    fn rasterize_page(&mut self, source: &PdfSource, index: usize, dpi: u32) -> Result<RgbImage> {
        let page = source.page_number(index)?;
        let scratch = TempDir::new()?;
        let png = self.render(source.path(), page, dpi, scratch.path())?;
        let image = image::open(&png)?.to_rgb8();
        log::debug!(
            "Rasterized page {} at {} dpi: {}x{}",
            page,
            dpi,
            image.width(),
            image.height()
        );
        Ok(image)
    }
}

/// pdftoppm pads the page number to the width of the document's page count.
fn find_page_image(dir: &Path, page: u32) -> Option<PathBuf> {
    (1..=6)
        .map(|digits| dir.join(format!("page-{:0width$}.png", page, width = digits)))
        .find(|path| path.exists())
}

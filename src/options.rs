//! Run options shared by every extraction strategy.

use std::path::PathBuf;

/// Default rasterization resolution for the raster strategies.
pub const DEFAULT_DPI: u32 = 500;

/// Options for one extraction run.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractOptions {
    /// Rasterization resolution (ignored by the native strategy)
    pub dpi: u32,

    /// Whether to write extracted images to `output_dir`
    pub save_images: bool,

    /// Directory for persisted images
    pub output_dir: Option<PathBuf>,

    /// Error handling mode for page-level failures
    pub error_mode: ErrorMode,
}

impl ExtractOptions {
    /// Create new options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the rasterization resolution.
    pub fn with_dpi(mut self, dpi: u32) -> Self {
        self.dpi = dpi.max(1);
        self
    }

    /// Persist every extracted image under `dir`.
    pub fn save_images_to(mut self, dir: impl Into<PathBuf>) -> Self {
        self.save_images = true;
        self.output_dir = Some(dir.into());
        self
    }

    /// Set the output directory without enabling persistence.
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    /// Enable or disable image persistence.
    pub fn with_save_images(mut self, save: bool) -> Self {
        self.save_images = save;
        self
    }

    /// Set error mode.
    pub fn with_error_mode(mut self, mode: ErrorMode) -> Self {
        self.error_mode = mode;
        self
    }

    /// Fail the run on the first page error.
    pub fn strict(mut self) -> Self {
        self.error_mode = ErrorMode::Strict;
        self
    }
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            dpi: DEFAULT_DPI,
            save_images: false,
            output_dir: None,
            error_mode: ErrorMode::Lenient,
        }
    }
}

/// Error handling mode for page-level failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorMode {
    /// Fail on any error
    Strict,
    /// Replace pages with recoverable errors by empty results and continue
    #[default]
    Lenient,
}

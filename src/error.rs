//! Error types for pdf2data.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for pdf2data operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while extracting content from a PDF.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The source PDF does not exist.
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// The file format is not recognized as PDF.
    #[error("Unknown file format: not a valid PDF")]
    UnknownFormat,

    /// The PDF version is not supported.
    #[error("Unsupported PDF version: {0}")]
    UnsupportedVersion(String),

    /// Error parsing PDF structure.
    #[error("PDF parsing error: {0}")]
    PdfParse(String),

    /// The PDF document is encrypted and requires a password.
    #[error("Document is encrypted")]
    Encrypted,

    /// Page index is out of range.
    #[error("Page {0} is out of range (document has {1} pages)")]
    PageOutOfRange(usize, usize),

    /// Rendering a page to a raster image failed.
    #[error("Rasterization error: {0}")]
    Rasterize(String),

    /// An external engine (binary or model) is not available.
    #[error("Engine not available: {0}")]
    EngineUnavailable(String),

    /// An engine could not be constructed (model load, tokenizer, session).
    #[error("Engine initialization failed: {0}")]
    EngineInit(String),

    /// Model inference failed on a page or region.
    #[error("Inference error: {0}")]
    Inference(String),

    /// OCR failed on an image.
    #[error("OCR error: {0}")]
    Ocr(String),

    /// Image decoding or encoding failed.
    #[error("Image error: {0}")]
    ImageDecode(String),

    /// The output directory could not be created.
    #[error("Cannot create output directory {}: {source}", path.display())]
    OutputDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Image persistence was requested without an output directory.
    #[error("Saving images requires an output directory")]
    MissingOutputDir,

    /// Error serializing results.
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Whether the error only affects the current page or region.
    ///
    /// Recoverable errors degrade to empty results in lenient mode;
    /// everything else aborts the run.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::Inference(_) | Error::Ocr(_) | Error::ImageDecode(_)
        )
    }
}

impl From<lopdf::Error> for Error {
    fn from(err: lopdf::Error) -> Self {
        match err {
            lopdf::Error::IO(e) => Error::Io(e),
            lopdf::Error::Decryption(_) => Error::Encrypted,
            _ => Error::PdfParse(err.to_string()),
        }
    }
}

impl From<image::ImageError> for Error {
    fn from(err: image::ImageError) -> Self {
        match err {
            image::ImageError::IoError(e) => Error::Io(e),
            _ => Error::ImageDecode(err.to_string()),
        }
    }
}

#[cfg(feature = "onnx")]
impl From<ort::Error> for Error {
    fn from(err: ort::Error) -> Self {
        Error::Inference(err.to_string())
    }
}

//! Encoded images produced by the extractors.

use std::io::Cursor;

use image::{DynamicImage, RgbImage};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Encoding of an extracted image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Jpeg,
    Png,
    /// JPEG 2000 code stream as stored in the PDF.
    Jpx,
    /// Any other encoding, identified by its file extension.
    Other(String),
}

impl ImageFormat {
    /// File extension used when persisting the image.
    pub fn extension(&self) -> &str {
        match self {
            ImageFormat::Jpeg => "jpg",
            ImageFormat::Png => "png",
            ImageFormat::Jpx => "jpx",
            ImageFormat::Other(ext) => ext,
        }
    }
}

/// An image extracted from a page, owning its encoded bytes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedImage {
    /// Encoded image bytes. Not serialized.
    #[serde(skip)]
    pub data: Vec<u8>,
    pub format: ImageFormat,
    pub width: u32,
    pub height: u32,
    /// Detection or region label the image was cropped for.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// PDF object number of the image XObject.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xref: Option<u32>,
}

impl ExtractedImage {
    /// Wrap already-encoded bytes.
    pub fn new(data: Vec<u8>, format: ImageFormat, width: u32, height: u32) -> Self {
        Self {
            data,
            format,
            width,
            height,
            label: None,
            xref: None,
        }
    }

    /// Encode an RGB raster as JPEG.
    pub fn jpeg_from_rgb(image: &RgbImage) -> Result<Self> {
        let (width, height) = image.dimensions();
        let data = encode(image, image::ImageFormat::Jpeg)?;
        Ok(Self::new(data, ImageFormat::Jpeg, width, height))
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_xref(mut self, xref: u32) -> Self {
        self.xref = Some(xref);
        self
    }

    /// File extension for this image's encoding.
    pub fn extension(&self) -> &str {
        self.format.extension()
    }
}

fn encode(image: &RgbImage, format: image::ImageFormat) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    DynamicImage::ImageRgb8(image.clone()).write_to(&mut Cursor::new(&mut buf), format)?;
    Ok(buf)
}

//! Shared fixtures: PDFs generated with lopdf and mock engines.

#![allow(dead_code)]

use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

use image::{Rgb, RgbImage};
use lopdf::{dictionary, Document, Object, ObjectId, Stream};

use pdf2data::{
    Detection, DetectionThresholds, Error, LayoutEngine, LayoutRegion, OcrEngine, OcrLine,
    Ontology, PageRasterizer, PdfSource, Result, ZeroShotDetector,
};

/// One page: raw content stream plus image XObjects by resource name.
///
/// `forms` are Form XObjects, each drawing its own named images.
pub struct PageSpec {
    pub content: String,
    pub images: Vec<(&'static str, Stream)>,
    pub forms: Vec<(&'static str, Vec<(&'static str, Stream)>)>,
}

impl PageSpec {
    pub fn blank() -> Self {
        Self::text("")
    }

    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            images: Vec::new(),
            forms: Vec::new(),
        }
    }

    pub fn with_image(mut self, name: &'static str, stream: Stream) -> Self {
        self.images.push((name, stream));
        self
    }

    pub fn with_form(mut self, name: &'static str, images: Vec<(&'static str, Stream)>) -> Self {
        self.forms.push((name, images));
        self
    }
}

/// Write a letter-sized PDF with a Helvetica `/F1` font on every page.
pub fn write_pdf(path: &Path, pages: Vec<PageSpec>) {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });

    let mut kids = Vec::new();
    for page in pages {
        let content_id = doc.add_object(Stream::new(dictionary! {}, page.content.into_bytes()));
        let mut xobjects = lopdf::Dictionary::new();
        for (name, stream) in page.images {
            let image_id = doc.add_object(stream);
            xobjects.set(name, image_id);
        }
        for (name, images) in page.forms {
            let mut inner = lopdf::Dictionary::new();
            let mut draw = String::new();
            for (image_name, stream) in images {
                inner.set(image_name, doc.add_object(stream));
                draw.push_str(&format!("q 100 0 0 100 0 0 cm /{} Do Q\n", image_name));
            }
            let form_id = doc.add_object(Stream::new(
                dictionary! {
                    "Type" => "XObject",
                    "Subtype" => "Form",
                    "BBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
                    "Resources" => dictionary! { "XObject" => inner },
                },
                draw.into_bytes(),
            ));
            xobjects.set(name, form_id);
        }
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
            "XObject" => xobjects,
        });
        let page_id: ObjectId = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        });
        kids.push(Object::from(page_id));
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.save(path).unwrap();
}

pub fn write_blank_pdf(path: &Path, pages: usize) {
    write_pdf(path, (0..pages).map(|_| PageSpec::blank()).collect());
}

/// A `BT ... ET` block showing `text` at (x, y) in 12pt Helvetica.
pub fn show_text(x: f32, y: f32, text: &str) -> String {
    format!("BT /F1 12 Tf {} {} Td ({}) Tj ET\n", x, y, text)
}

/// The invoice page: a heading and a two-column price table.
pub fn invoice_content() -> String {
    let mut content = show_text(72.0, 700.0, "Invoice #123");
    for (y, left, right) in [
        (600.0, "Item", "Price"),
        (585.0, "Widget", "10.00"),
        (570.0, "Gadget", "25.00"),
    ] {
        content.push_str(&show_text(100.0, y, left));
        content.push_str(&show_text(250.0, y, right));
    }
    content
}

/// Uncompressed 8-bit RGB image XObject.
pub fn rgb_image_stream(width: u32, height: u32) -> Stream {
    let samples = vec![200u8; (width * height * 3) as usize];
    Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => width as i64,
            "Height" => height as i64,
            "BitsPerComponent" => 8,
            "ColorSpace" => "DeviceRGB",
        },
        samples,
    )
}

/// JPEG image XObject holding a real encoded JPEG.
pub fn jpeg_image_stream(width: u32, height: u32) -> (Stream, Vec<u8>) {
    let raster = RgbImage::from_pixel(width, height, Rgb([10, 120, 200]));
    let mut bytes = Vec::new();
    image::DynamicImage::ImageRgb8(raster)
        .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Jpeg)
        .unwrap();
    let stream = Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => width as i64,
            "Height" => height as i64,
            "BitsPerComponent" => 8,
            "ColorSpace" => "DeviceRGB",
            "Filter" => "DCTDecode",
        },
        bytes.clone(),
    );
    (stream, bytes)
}

/// Rasterizer returning a white page of fixed size.
///
/// Every call is recorded as (index, dpi) in the shared `calls` log.
pub struct WhitePages {
    pub width: u32,
    pub height: u32,
    pub calls: Rc<RefCell<Vec<(usize, u32)>>>,
}

impl WhitePages {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            calls: Rc::default(),
        }
    }
}

impl PageRasterizer for WhitePages {
    fn rasterize_page(&mut self, source: &PdfSource, index: usize, dpi: u32) -> Result<RgbImage> {
        source.page_id(index)?;
        self.calls.borrow_mut().push((index, dpi));
        Ok(RgbImage::from_pixel(self.width, self.height, Rgb([255, 255, 255])))
    }
}

/// Detector returning the same detections on every page.
pub struct FixedDetector(pub Vec<Detection>);

impl ZeroShotDetector for FixedDetector {
    fn name(&self) -> &str {
        "fixed"
    }

    fn detect(
        &mut self,
        _image: &RgbImage,
        _ontology: &Ontology,
        _thresholds: &DetectionThresholds,
    ) -> Result<Vec<Detection>> {
        Ok(self.0.clone())
    }
}

/// Detector failing with an inference error on the listed pages.
pub struct FlakyDetector {
    pub fail_on: Vec<usize>,
    pub page: usize,
    pub detections: Vec<Detection>,
}

impl ZeroShotDetector for FlakyDetector {
    fn name(&self) -> &str {
        "flaky"
    }

    fn detect(
        &mut self,
        _image: &RgbImage,
        _ontology: &Ontology,
        _thresholds: &DetectionThresholds,
    ) -> Result<Vec<Detection>> {
        let page = self.page;
        self.page += 1;
        if self.fail_on.contains(&page) {
            return Err(Error::Inference(format!("model failed on page {}", page)));
        }
        Ok(self.detections.clone())
    }
}

/// OCR engine reading the same lines from every image.
pub struct FixedOcr(pub Vec<&'static str>);

impl OcrEngine for FixedOcr {
    fn name(&self) -> &str {
        "fixed-ocr"
    }

    fn recognize(&mut self, _image: &RgbImage) -> Result<Vec<OcrLine>> {
        Ok(self.0.iter().map(|t| OcrLine::plain(*t)).collect())
    }
}

/// Layout engine returning canned regions with crops of the page.
pub struct FixedLayout(pub Vec<LayoutRegion>);

impl LayoutEngine for FixedLayout {
    fn name(&self) -> &str {
        "fixed-layout"
    }

    fn analyze(&mut self, _image: &RgbImage) -> Result<Vec<LayoutRegion>> {
        Ok(self.0.clone())
    }
}

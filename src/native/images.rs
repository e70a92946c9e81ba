//! Embedded image XObjects.

use std::collections::BTreeSet;
use std::io::Cursor;

use image::{DynamicImage, GrayImage, RgbImage};
use lopdf::{Dictionary, Document as LopdfDocument, Object, ObjectId, Stream};

use crate::error::{Error, Result};
use crate::model::{ExtractedImage, ImageFormat};

/// Extract every image XObject a page draws, directly or through forms.
///
/// Images come back in resource order, identified by their object number.
/// Form XObjects are walked depth-first and each object is visited once.
/// DCT and JPX streams keep their stored bytes; Gray, RGB, CMYK and indexed
/// samples at 1, 2, 4, 8 or 16 bits are re-encoded as PNG. Anything else
/// is skipped.
pub fn extract_page_images(doc: &LopdfDocument, page_id: ObjectId) -> Result<Vec<ExtractedImage>> {
    let Some(resources) = page_resources(doc, page_id)? else {
        return Ok(Vec::new());
    };

    let mut images = Vec::new();
    let mut visited = BTreeSet::new();
    collect_images(doc, resources, &mut visited, &mut images);
    Ok(images)
}

fn collect_images(
    doc: &LopdfDocument,
    resources: &Dictionary,
    visited: &mut BTreeSet<ObjectId>,
    images: &mut Vec<ExtractedImage>,
) {
    let Some(xobjects) = resources
        .get(b"XObject")
        .ok()
        .and_then(|o| resolve_dict(doc, o))
    else {
        return;
    };

    for (name, obj) in xobjects.iter() {
        let Ok(id) = obj.as_reference() else {
            continue;
        };
        if !visited.insert(id) {
            continue;
        }
        let Ok(Object::Stream(stream)) = doc.get_object(id) else {
            continue;
        };
        match subtype(&stream.dict) {
            Some(b"Image") => match decode_image(doc, stream) {
                Ok(image) => images.push(image.with_xref(id.0)),
                Err(e) => log::debug!(
                    "Skipping image /{} ({} {}): {}",
                    String::from_utf8_lossy(name),
                    id.0,
                    id.1,
                    e
                ),
            },
            Some(b"Form") => {
                if let Some(inner) = stream
                    .dict
                    .get(b"Resources")
                    .ok()
                    .and_then(|o| resolve_dict(doc, o))
                {
                    collect_images(doc, inner, visited, images);
                }
            }
            _ => {}
        }
    }
}

/// Resources of a page, following the inherited `/Parent` chain.
fn page_resources(doc: &LopdfDocument, page_id: ObjectId) -> Result<Option<&Dictionary>> {
    let mut node = doc.get_dictionary(page_id)?;
    loop {
        if let Some(res) = node.get(b"Resources").ok().and_then(|o| resolve_dict(doc, o)) {
            return Ok(Some(res));
        }
        match node.get(b"Parent").and_then(Object::as_reference) {
            Ok(parent) => node = doc.get_dictionary(parent)?,
            Err(_) => return Ok(None),
        }
    }
}

fn resolve<'a>(doc: &'a LopdfDocument, obj: &'a Object) -> Option<&'a Object> {
    match obj {
        Object::Reference(id) => doc.get_object(*id).ok(),
        other => Some(other),
    }
}

fn resolve_dict<'a>(doc: &'a LopdfDocument, obj: &'a Object) -> Option<&'a Dictionary> {
    match resolve(doc, obj)? {
        Object::Dictionary(d) => Some(d),
        Object::Stream(s) => Some(&s.dict),
        _ => None,
    }
}

fn subtype(dict: &Dictionary) -> Option<&[u8]> {
    dict.get(b"Subtype").and_then(Object::as_name).ok()
}

fn filters(dict: &Dictionary) -> Vec<Vec<u8>> {
    match dict.get(b"Filter") {
        Ok(Object::Name(n)) => vec![n.clone()],
        Ok(Object::Array(arr)) => arr
            .iter()
            .filter_map(|o| o.as_name().ok().map(|n| n.to_vec()))
            .collect(),
        _ => Vec::new(),
    }
}

fn dimension(dict: &Dictionary, key: &[u8]) -> Option<u32> {
    dict.get(key)
        .ok()
        .and_then(|o| o.as_i64().ok())
        .and_then(|v| u32::try_from(v).ok())
}

fn decode_image(doc: &LopdfDocument, stream: &Stream) -> Result<ExtractedImage> {
    let dict = &stream.dict;
    let width = dimension(dict, b"Width").unwrap_or(0);
    let height = dimension(dict, b"Height").unwrap_or(0);
    let filters = filters(dict);

    match filters.last().map(Vec::as_slice) {
        Some(b"DCTDecode") if filters.len() == 1 => Ok(ExtractedImage::new(
            stream.content.clone(),
            ImageFormat::Jpeg,
            width,
            height,
        )),
        Some(b"JPXDecode") if filters.len() == 1 => Ok(ExtractedImage::new(
            stream.content.clone(),
            ImageFormat::Jpx,
            width,
            height,
        )),
        None => encode_samples(doc, dict, &stream.content, width, height),
        Some(b"FlateDecode") | Some(b"LZWDecode") => {
            let samples = stream.decompressed_content()?;
            encode_samples(doc, dict, &samples, width, height)
        }
        Some(other) => Err(Error::ImageDecode(format!(
            "unsupported filter {}",
            String::from_utf8_lossy(other)
        ))),
    }
}

/// Colour spaces whose samples can be turned into Gray or RGB pixels.
#[derive(Debug, Clone, PartialEq)]
enum ColorSpace {
    Gray,
    Rgb,
    Cmyk,
    /// Palette of base-space colours, one entry per index up to `hival`.
    Indexed { base: Box<ColorSpace>, lookup: Vec<u8> },
}

impl ColorSpace {
    fn components(&self) -> usize {
        match self {
            ColorSpace::Gray | ColorSpace::Indexed { .. } => 1,
            ColorSpace::Rgb => 3,
            ColorSpace::Cmyk => 4,
        }
    }

    fn from_components(n: usize) -> Option<Self> {
        match n {
            1 => Some(ColorSpace::Gray),
            3 => Some(ColorSpace::Rgb),
            4 => Some(ColorSpace::Cmyk),
            _ => None,
        }
    }

    fn parse(doc: &LopdfDocument, obj: &Object) -> Option<Self> {
        match resolve(doc, obj)? {
            Object::Name(name) => match name.as_slice() {
                b"DeviceGray" | b"CalGray" | b"G" => Some(ColorSpace::Gray),
                b"DeviceRGB" | b"CalRGB" | b"RGB" => Some(ColorSpace::Rgb),
                b"DeviceCMYK" | b"CMYK" => Some(ColorSpace::Cmyk),
                _ => None,
            },
            Object::Array(arr) => {
                let family = arr.first()?.as_name().ok()?;
                match family {
                    b"Indexed" | b"I" => {
                        let base = ColorSpace::parse(doc, arr.get(1)?)?;
                        if matches!(base, ColorSpace::Indexed { .. }) {
                            return None;
                        }
                        let hival = resolve(doc, arr.get(2)?)?.as_i64().ok()?;
                        let entries = usize::try_from(hival).ok()? + 1;
                        let mut lookup = match resolve(doc, arr.get(3)?)? {
                            Object::String(bytes, _) => bytes.clone(),
                            Object::Stream(s) => s
                                .decompressed_content()
                                .unwrap_or_else(|_| s.content.clone()),
                            _ => return None,
                        };
                        lookup.resize(entries * base.components(), 0);
                        Some(ColorSpace::Indexed {
                            base: Box::new(base),
                            lookup,
                        })
                    }
                    b"ICCBased" => {
                        let n = resolve_dict(doc, arr.get(1)?)?
                            .get(b"N")
                            .ok()?
                            .as_i64()
                            .ok()?;
                        ColorSpace::from_components(usize::try_from(n).ok()?)
                    }
                    b"CalGray" => Some(ColorSpace::Gray),
                    b"CalRGB" => Some(ColorSpace::Rgb),
                    _ => None,
                }
            }
            _ => None,
        }
    }
}

/// Re-encode raw samples as PNG.
///
/// Without a recognised colour space, 8-bit samples fall back to inferring
/// the component count from the buffer length.
fn encode_samples(
    doc: &LopdfDocument,
    dict: &Dictionary,
    samples: &[u8],
    width: u32,
    height: u32,
) -> Result<ExtractedImage> {
    let pixels = width as usize * height as usize;
    if pixels == 0 {
        return Err(Error::ImageDecode("empty image".to_string()));
    }

    let stencil = dict
        .get(b"ImageMask")
        .and_then(Object::as_bool)
        .unwrap_or(false);
    let bits = if stencil {
        1
    } else {
        dict.get(b"BitsPerComponent")
            .ok()
            .and_then(|o| o.as_i64().ok())
            .unwrap_or(8)
    };
    let bits = match bits {
        1 | 2 | 4 | 8 | 16 => bits as u32,
        other => {
            return Err(Error::ImageDecode(format!(
                "{} bits per component",
                other
            )))
        }
    };

    let declared = dict
        .get(b"ColorSpace")
        .ok()
        .and_then(|o| ColorSpace::parse(doc, o));
    let space = match declared {
        Some(space) => space,
        None if stencil => ColorSpace::Gray,
        None if bits == 8 => {
            let n = samples.len() / pixels;
            ColorSpace::from_components(n).ok_or_else(|| {
                Error::ImageDecode(format!(
                    "cannot infer color layout ({} bytes per pixel)",
                    n
                ))
            })?
        }
        None => return Err(Error::ImageDecode("unknown color space".to_string())),
    };

    let values = unpack_samples(
        samples,
        width as usize * space.components(),
        height as usize,
        bits,
    )?;

    let image = match space {
        ColorSpace::Indexed { base, lookup } => {
            let n = base.components();
            let colors: Vec<u8> = values
                .iter()
                .flat_map(|&i| {
                    let at = i as usize * n;
                    lookup.get(at..at + n).unwrap_or(&[]).to_vec()
                })
                .collect();
            if colors.len() != pixels * n {
                return Err(Error::ImageDecode("palette index out of range".to_string()));
            }
            to_dynamic(&base, colors, width, height)
        }
        space => to_dynamic(&space, scale_to_8bit(values, bits), width, height),
    }
    .ok_or_else(|| Error::ImageDecode("sample buffer too small".to_string()))?;

    let mut data = Vec::new();
    image.write_to(&mut Cursor::new(&mut data), image::ImageFormat::Png)?;
    Ok(ExtractedImage::new(data, ImageFormat::Png, width, height))
}

fn to_dynamic(space: &ColorSpace, samples: Vec<u8>, width: u32, height: u32) -> Option<DynamicImage> {
    match space {
        ColorSpace::Gray => GrayImage::from_raw(width, height, samples).map(DynamicImage::ImageLuma8),
        ColorSpace::Rgb => RgbImage::from_raw(width, height, samples).map(DynamicImage::ImageRgb8),
        ColorSpace::Cmyk => {
            RgbImage::from_raw(width, height, cmyk_to_rgb(&samples)).map(DynamicImage::ImageRgb8)
        }
        ColorSpace::Indexed { .. } => None,
    }
}

/// Split packed rows into one value per sample.
///
/// Rows start on a byte boundary. Sub-byte samples come back unscaled,
/// 16-bit samples keep their high byte.
fn unpack_samples(data: &[u8], row_len: usize, rows: usize, bits: u32) -> Result<Vec<u8>> {
    let row_bytes = (row_len * bits as usize).div_ceil(8);
    if data.len() < row_bytes * rows {
        return Err(Error::ImageDecode("sample buffer too small".to_string()));
    }

    let mut out = Vec::with_capacity(row_len * rows);
    for row in data.chunks(row_bytes).take(rows) {
        match bits {
            8 => out.extend_from_slice(&row[..row_len]),
            16 => out.extend(row.chunks_exact(2).take(row_len).map(|p| p[0])),
            _ => {
                let per_byte = (8 / bits) as usize;
                let mask = (1u8 << bits) - 1;
                for i in 0..row_len {
                    let shift = 8 - bits * (i % per_byte + 1) as u32;
                    out.push((row[i / per_byte] >> shift) & mask);
                }
            }
        }
    }
    Ok(out)
}

fn scale_to_8bit(values: Vec<u8>, bits: u32) -> Vec<u8> {
    if bits >= 8 {
        return values;
    }
    let max = (1u32 << bits) - 1;
    values
        .into_iter()
        .map(|v| (v as u32 * 255 / max) as u8)
        .collect()
}

fn cmyk_to_rgb(samples: &[u8]) -> Vec<u8> {
    samples
        .chunks_exact(4)
        .flat_map(|px| {
            let k = 255 - px[3] as u32;
            [
                ((255 - px[0] as u32) * k / 255) as u8,
                ((255 - px[1] as u32) * k / 255) as u8,
                ((255 - px[2] as u32) * k / 255) as u8,
            ]
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::dictionary;

    fn image_stream(filter: Option<&str>, width: i64, height: i64, content: Vec<u8>) -> Stream {
        let mut dict = dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => width,
            "Height" => height,
            "BitsPerComponent" => 8,
            "ColorSpace" => "DeviceRGB",
        };
        if let Some(f) = filter {
            dict.set("Filter", Object::Name(f.as_bytes().to_vec()));
        }
        Stream::new(dict, content)
    }

    #[test]
    fn test_dct_bytes_kept() {
        let stream = image_stream(Some("DCTDecode"), 4, 2, vec![0xFF, 0xD8, 0xFF, 0xD9]);
        let image = decode_image(&LopdfDocument::new(), &stream).unwrap();
        assert_eq!(image.format, ImageFormat::Jpeg);
        assert_eq!(image.data, vec![0xFF, 0xD8, 0xFF, 0xD9]);
        assert_eq!((image.width, image.height), (4, 2));
    }

    #[test]
    fn test_raw_rgb_becomes_png() {
        let stream = image_stream(None, 2, 2, vec![255; 12]);
        let image = decode_image(&LopdfDocument::new(), &stream).unwrap();
        assert_eq!(image.format, ImageFormat::Png);

        let decoded = image::load_from_memory(&image.data).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (2, 2));
    }

    #[test]
    fn test_unsupported_filter() {
        let stream = image_stream(Some("CCITTFaxDecode"), 2, 2, vec![0; 4]);
        assert!(matches!(decode_image(&LopdfDocument::new(), &stream), Err(Error::ImageDecode(_))));
    }

    fn decode_png(image: &ExtractedImage) -> DynamicImage {
        assert_eq!(image.format, ImageFormat::Png);
        image::load_from_memory(&image.data).unwrap()
    }

    #[test]
    fn test_indexed_rgb_palette() {
        let mut stream = image_stream(None, 2, 2, vec![0, 1, 1, 0]);
        stream.dict.set(
            "ColorSpace",
            vec![
                Object::Name(b"Indexed".to_vec()),
                Object::Name(b"DeviceRGB".to_vec()),
                Object::Integer(1),
                Object::string_literal(vec![0x00, 0x00, 0x00, 0xFF, 0xFF, 0xFF]),
            ],
        );

        let image = decode_image(&LopdfDocument::new(), &stream).unwrap();
        let rgb = decode_png(&image).to_rgb8();
        assert_eq!(rgb.get_pixel(0, 0).0, [0, 0, 0]);
        assert_eq!(rgb.get_pixel(1, 0).0, [255, 255, 255]);
        assert_eq!(rgb.get_pixel(0, 1).0, [255, 255, 255]);
        assert_eq!(rgb.get_pixel(1, 1).0, [0, 0, 0]);
    }

    #[test]
    fn test_indexed_lookup_by_reference() {
        let mut doc = LopdfDocument::new();
        let lookup = doc.add_object(Stream::new(dictionary! {}, vec![10, 20, 30, 40, 50, 60]));
        let mut stream = image_stream(None, 2, 1, vec![1, 0]);
        stream.dict.set(
            "ColorSpace",
            vec![
                Object::Name(b"Indexed".to_vec()),
                Object::Name(b"DeviceRGB".to_vec()),
                Object::Integer(1),
                Object::Reference(lookup),
            ],
        );

        let rgb = decode_png(&decode_image(&doc, &stream).unwrap()).to_rgb8();
        assert_eq!(rgb.get_pixel(0, 0).0, [40, 50, 60]);
        assert_eq!(rgb.get_pixel(1, 0).0, [10, 20, 30]);
    }

    #[test]
    fn test_one_bit_gray_rows_are_padded() {
        // 3 pixels per row, each row padded to a full byte.
        let mut stream = image_stream(None, 3, 2, vec![0b1010_0000, 0b0100_0000]);
        stream.dict.set("BitsPerComponent", 1);
        stream.dict.set("ColorSpace", "DeviceGray");

        let gray = decode_png(&decode_image(&LopdfDocument::new(), &stream).unwrap()).to_luma8();
        assert_eq!(gray.as_raw(), &vec![255, 0, 255, 0, 255, 0]);
    }

    #[test]
    fn test_stencil_mask_defaults_to_one_bit() {
        let mut stream = image_stream(None, 8, 1, vec![0b1111_0000]);
        stream.dict.remove(b"BitsPerComponent");
        stream.dict.remove(b"ColorSpace");
        stream.dict.set("ImageMask", true);

        let gray = decode_png(&decode_image(&LopdfDocument::new(), &stream).unwrap()).to_luma8();
        assert_eq!(gray.as_raw(), &vec![255, 255, 255, 255, 0, 0, 0, 0]);
    }

    #[test]
    fn test_four_bit_samples_scale() {
        assert_eq!(unpack_samples(&[0xF0, 0x8F], 3, 1, 4).unwrap(), vec![15, 0, 8]);
        assert_eq!(scale_to_8bit(vec![15, 0, 5], 4), vec![255, 0, 85]);
    }

    #[test]
    fn test_short_buffer_rejected() {
        let mut stream = image_stream(None, 16, 2, vec![0xFF]);
        stream.dict.set("BitsPerComponent", 1);
        stream.dict.set("ColorSpace", "DeviceGray");
        assert!(matches!(
            decode_image(&LopdfDocument::new(), &stream),
            Err(Error::ImageDecode(_))
        ));
    }

    #[test]
    fn test_form_images_found_once() {
        let mut doc = LopdfDocument::with_version("1.5");
        let image_id = doc.add_object(image_stream(Some("DCTDecode"), 4, 2, vec![0xFF, 0xD8, 0xFF, 0xD9]));
        let form_id = doc.new_object_id();
        // The form lists itself and the image: each object is visited once.
        doc.objects.insert(
            form_id,
            Object::Stream(Stream::new(
                dictionary! {
                    "Type" => "XObject",
                    "Subtype" => "Form",
                    "BBox" => vec![0.into(), 0.into(), 10.into(), 10.into()],
                    "Resources" => dictionary! {
                        "XObject" => dictionary! { "Fm1" => form_id, "Im1" => image_id },
                    },
                },
                b"/Im1 Do".to_vec(),
            )),
        );
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Resources" => dictionary! {
                "XObject" => dictionary! { "Fm1" => form_id, "Im2" => image_id },
            },
        });

        let images = extract_page_images(&doc, page_id).unwrap();
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].xref, Some(image_id.0));
    }

    #[test]
    fn test_cmyk_conversion() {
        assert_eq!(cmyk_to_rgb(&[0, 0, 0, 0]), vec![255, 255, 255]);
        assert_eq!(cmyk_to_rgb(&[0, 0, 0, 255]), vec![0, 0, 0]);
        assert_eq!(cmyk_to_rgb(&[255, 0, 0, 0]), vec![0, 255, 255]);
    }
}

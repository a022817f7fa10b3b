//! Raster image XObjects of each PDF page, re-encoded for OCR.

use std::collections::HashSet;
use std::io::Cursor;

use image::{GrayImage, ImageFormat, RgbImage};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};

use crate::error::CorpusError;
use crate::ocr::{ImageBlob, ImageKind};

/// Resource inheritance and nested forms deeper than this are ignored.
const MAX_DEPTH: usize = 16;

/// Images of every page, in page order, that exceed both minimum dimensions.
///
/// Images that cannot be decoded are logged and left out.
///
/// # Errors
///
/// Returns an error if `data` is not a readable PDF.
pub(crate) fn page_images(
    data: &[u8],
    min_width: u32,
    min_height: u32,
) -> Result<Vec<Vec<ImageBlob>>, CorpusError> {
    let doc = Document::load_mem(data).map_err(|e| CorpusError::Pdf(e.to_string()))?;
    let mut pages = Vec::new();

    for (number, page_id) in doc.get_pages() {
        let mut ids = Vec::new();
        if let Some(resources) = page_resources(&doc, page_id) {
            collect_image_ids(&doc, resources, 0, &mut HashSet::new(), &mut ids);
        }

        let mut blobs = Vec::new();
        for id in ids {
            let Ok(stream) = doc.get_object(id).and_then(Object::as_stream) else {
                continue;
            };
            let (Some(width), Some(height)) = (
                dimension(&doc, &stream.dict, b"Width"),
                dimension(&doc, &stream.dict, b"Height"),
            ) else {
                continue;
            };
            if width <= min_width || height <= min_height {
                continue;
            }
            match decode_image(&doc, stream, width, height) {
                Ok(Some(blob)) => blobs.push(blob),
                Ok(None) => {
                    tracing::debug!(page = number, ?id, "unsupported image encoding, skipped");
                }
                Err(e) => tracing::warn!(page = number, ?id, "error decoding image: {e}"),
            }
        }
        pages.push(blobs);
    }

    Ok(pages)
}

fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> Option<&'a Object> {
    match obj {
        Object::Reference(id) => doc.get_object(*id).ok(),
        other => Some(other),
    }
}

fn dict_entry<'a>(doc: &'a Document, dict: &'a Dictionary, key: &[u8]) -> Option<&'a Object> {
    resolve(doc, dict.get(key).ok()?)
}

/// The page's `/Resources`, following `/Parent` for inherited entries.
fn page_resources(doc: &Document, page_id: ObjectId) -> Option<&Dictionary> {
    let mut node = doc.get_dictionary(page_id).ok()?;
    for _ in 0..MAX_DEPTH {
        if let Some(resources) = dict_entry(doc, node, b"Resources") {
            return resources.as_dict().ok();
        }
        let parent = node.get(b"Parent").ok()?.as_reference().ok()?;
        node = doc.get_dictionary(parent).ok()?;
    }
    None
}

fn collect_image_ids(
    doc: &Document,
    resources: &Dictionary,
    depth: usize,
    seen: &mut HashSet<ObjectId>,
    out: &mut Vec<ObjectId>,
) {
    let Some(xobjects) = dict_entry(doc, resources, b"XObject").and_then(|o| o.as_dict().ok())
    else {
        return;
    };

    for (_, obj) in xobjects.iter() {
        let Ok(id) = obj.as_reference() else {
            continue;
        };
        if !seen.insert(id) {
            continue;
        }
        let Ok(stream) = doc.get_object(id).and_then(Object::as_stream) else {
            continue;
        };
        match stream.dict.get(b"Subtype").and_then(Object::as_name) {
            Ok(b"Image") => out.push(id),
            Ok(b"Form") if depth < MAX_DEPTH => {
                if let Some(inner) =
                    dict_entry(doc, &stream.dict, b"Resources").and_then(|o| o.as_dict().ok())
                {
                    collect_image_ids(doc, inner, depth + 1, seen, out);
                }
            }
            _ => {}
        }
    }
}

fn dimension(doc: &Document, dict: &Dictionary, key: &[u8]) -> Option<u32> {
    let value = dict_entry(doc, dict, key)?.as_i64().ok()?;
    u32::try_from(value).ok()
}

fn filter_names(doc: &Document, dict: &Dictionary) -> Vec<Vec<u8>> {
    match dict_entry(doc, dict, b"Filter") {
        Some(Object::Name(name)) => vec![name.clone()],
        Some(Object::Array(items)) => items
            .iter()
            .filter_map(|o| resolve(doc, o)?.as_name().ok().map(<[u8]>::to_vec))
            .collect(),
        _ => Vec::new(),
    }
}

fn device_components(name: &[u8]) -> Option<u8> {
    match name {
        b"DeviceGray" | b"G" | b"CalGray" => Some(1),
        b"DeviceRGB" | b"RGB" | b"CalRGB" => Some(3),
        b"DeviceCMYK" | b"CMYK" => Some(4),
        _ => None,
    }
}

/// Number of color components, for the color spaces that map to plain rasters.
fn color_components(doc: &Document, dict: &Dictionary) -> Option<u8> {
    match dict_entry(doc, dict, b"ColorSpace")? {
        Object::Name(name) => device_components(name),
        Object::Array(items) => {
            let family = resolve(doc, items.first()?)?.as_name().ok()?;
            match family {
                b"ICCBased" => {
                    let profile = resolve(doc, items.get(1)?)?.as_stream().ok()?;
                    let n = dict_entry(doc, &profile.dict, b"N")?.as_i64().ok()?;
                    u8::try_from(n).ok().filter(|n| matches!(n, 1 | 3 | 4))
                }
                other => device_components(other),
            }
        }
        _ => None,
    }
}

/// Turn an image stream into something the OCR engine can read.
///
/// JPEG and JPEG 2000 data is passed through as is. Uncompressed or
/// Flate-compressed 8-bit Gray/RGB/CMYK rasters are re-encoded as PNG.
/// Anything else yields `Ok(None)`.
fn decode_image(
    doc: &Document,
    stream: &Stream,
    width: u32,
    height: u32,
) -> Result<Option<ImageBlob>, CorpusError> {
    let filters = filter_names(doc, &stream.dict);

    let passthrough = match filters.as_slice() {
        [only] if only.as_slice() == b"DCTDecode" => Some(ImageKind::Jpeg),
        [only] if only.as_slice() == b"JPXDecode" => Some(ImageKind::Jpeg2000),
        _ => None,
    };
    if let Some(kind) = passthrough {
        return Ok(Some(ImageBlob {
            kind,
            width,
            height,
            bytes: stream.content.clone(),
        }));
    }

    if !filters.iter().all(|f| f.as_slice() == b"FlateDecode") {
        return Ok(None);
    }
    let bits = dict_entry(doc, &stream.dict, b"BitsPerComponent")
        .and_then(|o| o.as_i64().ok())
        .unwrap_or(8);
    if bits != 8 {
        return Ok(None);
    }
    let Some(components) = color_components(doc, &stream.dict) else {
        return Ok(None);
    };

    let raw = if filters.is_empty() {
        stream.content.clone()
    } else {
        stream
            .decompressed_content()
            .map_err(|e| CorpusError::Image(e.to_string()))?
    };
    encode_png(raw, width, height, components).map(Some)
}

fn encode_png(
    mut raw: Vec<u8>,
    width: u32,
    height: u32,
    components: u8,
) -> Result<ImageBlob, CorpusError> {
    let needed = u64::from(width) * u64::from(height) * u64::from(components);
    let needed = usize::try_from(needed)
        .map_err(|_| CorpusError::Image(format!("image too large: {width}x{height}")))?;
    if raw.len() < needed {
        return Err(CorpusError::Image(format!(
            "raster data too short: {} < {needed} bytes",
            raw.len()
        )));
    }
    raw.truncate(needed);

    let mut out = Cursor::new(Vec::new());
    let written = match components {
        1 => GrayImage::from_raw(width, height, raw).map(|img| img.write_to(&mut out, ImageFormat::Png)),
        3 => RgbImage::from_raw(width, height, raw).map(|img| img.write_to(&mut out, ImageFormat::Png)),
        4 => RgbImage::from_raw(width, height, cmyk_to_rgb(&raw))
            .map(|img| img.write_to(&mut out, ImageFormat::Png)),
        _ => None,
    };
    match written {
        Some(Ok(())) => Ok(ImageBlob {
            kind: ImageKind::Png,
            width,
            height,
            bytes: out.into_inner(),
        }),
        Some(Err(e)) => Err(CorpusError::Image(e.to_string())),
        None => Err(CorpusError::Image(format!(
            "cannot build a {components}-component {width}x{height} raster"
        ))),
    }
}

fn cmyk_to_rgb(cmyk: &[u8]) -> Vec<u8> {
    cmyk.chunks_exact(4)
        .flat_map(|px| {
            let k = 255 - u16::from(px[3]);
            [px[0], px[1], px[2]]
                .map(|c| u8::try_from((255 - u16::from(c)) * k / 255).unwrap_or(u8::MAX))
        })
        .collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use lopdf::dictionary;

    use super::*;

    pub(crate) struct TestImage {
        pub width: u32,
        pub height: u32,
        pub color_space: &'static str,
        pub components: u8,
    }

    impl TestImage {
        pub(crate) fn gray(width: u32, height: u32) -> Self {
            Self {
                width,
                height,
                color_space: "DeviceGray",
                components: 1,
            }
        }
    }

    /// Build a PDF with one page per entry, each page carrying the given
    /// uncompressed images. Resources sit on the page tree root so that
    /// lookups have to follow `/Parent`.
    pub(crate) fn build_pdf(pages: &[Vec<TestImage>]) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let mut xobjects = Dictionary::new();
        let mut kids = Vec::new();
        let mut image_no = 0;
        for page_images in pages {
            let mut content = Vec::new();
            for img in page_images {
                let len = usize::try_from(img.width * img.height).unwrap()
                    * usize::from(img.components);
                let stream = Stream::new(
                    dictionary! {
                        "Type" => "XObject",
                        "Subtype" => "Image",
                        "Width" => i64::from(img.width),
                        "Height" => i64::from(img.height),
                        "ColorSpace" => img.color_space,
                        "BitsPerComponent" => 8,
                    },
                    vec![128u8; len],
                );
                let id = doc.add_object(stream);
                let name = format!("Im{image_no}");
                image_no += 1;
                content.extend_from_slice(format!("q 1 0 0 1 0 0 cm /{name} Do Q\n").as_bytes());
                xobjects.set(name, id);
            }
            let content_id = doc.add_object(Stream::new(dictionary! {}, content));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(Object::Reference(page_id));
        }

        let count = i64::try_from(kids.len()).unwrap();
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
                "Resources" => dictionary! { "XObject" => xobjects },
                "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut buf = Vec::new();
        doc.save_to(&mut buf).unwrap();
        buf
    }

    #[test]
    fn small_images_are_filtered_out() {
        let pdf = build_pdf(&[vec![
            TestImage::gray(600, 600),
            TestImage::gray(500, 900),
            TestImage::gray(900, 40),
        ]]);
        let pages = page_images(&pdf, 500, 500).unwrap();
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].len(), 1);
        assert_eq!((pages[0][0].width, pages[0][0].height), (600, 600));
        assert_eq!(pages[0][0].kind, ImageKind::Png);
    }

    #[test]
    fn gray_raster_is_reencoded_as_png() {
        let pdf = build_pdf(&[vec![TestImage::gray(8, 4)]]);
        let pages = page_images(&pdf, 0, 0).unwrap();
        let blob = &pages[0][0];
        let decoded = image::load_from_memory(&blob.bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (8, 4));
    }

    #[test]
    fn cmyk_raster_becomes_rgb() {
        let pdf = build_pdf(&[vec![TestImage {
            width: 3,
            height: 2,
            color_space: "DeviceCMYK",
            components: 4,
        }]]);
        let pages = page_images(&pdf, 0, 0).unwrap();
        let decoded = image::load_from_memory(&pages[0][0].bytes).unwrap();
        assert_eq!(decoded.color(), image::ColorType::Rgb8);
    }

    #[test]
    fn pages_without_images_are_kept_in_order() {
        let pdf = build_pdf(&[vec![], vec![TestImage::gray(10, 10)]]);
        let pages = page_images(&pdf, 5, 5).unwrap();
        assert_eq!(pages.len(), 2);
        assert!(pages[0].is_empty());
        assert_eq!(pages[1].len(), 1);
    }

    #[test]
    fn not_a_pdf_is_an_error() {
        assert!(matches!(
            page_images(b"plain text", 0, 0),
            Err(CorpusError::Pdf(_))
        ));
    }

    #[test]
    fn short_raster_is_rejected() {
        let err = encode_png(vec![0; 10], 4, 4, 1).unwrap_err();
        assert!(err.to_string().contains("too short"));
    }

    #[test]
    fn cmyk_conversion() {
        assert_eq!(cmyk_to_rgb(&[0, 0, 0, 0]), vec![255, 255, 255]);
        assert_eq!(cmyk_to_rgb(&[0, 0, 0, 255]), vec![0, 0, 0]);
        assert_eq!(cmyk_to_rgb(&[255, 0, 0, 0]), vec![0, 255, 255]);
    }

    #[test]
    fn color_space_names() {
        assert_eq!(device_components(b"DeviceGray"), Some(1));
        assert_eq!(device_components(b"DeviceRGB"), Some(3));
        assert_eq!(device_components(b"DeviceCMYK"), Some(4));
        assert_eq!(device_components(b"Indexed"), None);
    }
}

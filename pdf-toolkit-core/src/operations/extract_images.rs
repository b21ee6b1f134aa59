//! PDF image extraction functionality
//!
//! Image XObjects are collected page by page from the `/XObject` resources,
//! descending into form XObjects. JPEG and JPEG 2000 payloads are handed
//! out as stored; raw samples are converted to PNG.

use super::OperationResult;
use crate::objects::{Dictionary, Object, ObjectId, Stream};
use crate::parser::filters::{decode_stream, decode_to_bytes, CodecError, NativeCodec};
use crate::Document;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder};
use std::collections::HashSet;

/// Options for image extraction
#[derive(Debug, Clone)]
pub struct ExtractImagesOptions {
    /// Images narrower or shorter than this are skipped
    pub min_size: Option<u32>,
    /// Emit an image object shared by several pages only once, for the
    /// first page that uses it. With `false` every use is emitted, so a
    /// logo on ten pages yields ten images each carrying its own
    /// `page_index`. Defaults to `true`.
    pub deduplicate: bool,
}

impl Default for ExtractImagesOptions {
    fn default() -> Self {
        Self {
            min_size: None,
            deduplicate: true,
        }
    }
}

impl ExtractImagesOptions {
    pub fn with_min_size(mut self, min_size: u32) -> Self {
        self.min_size = Some(min_size);
        self
    }

    pub fn with_deduplicate(mut self, deduplicate: bool) -> Self {
        self.deduplicate = deduplicate;
        self
    }
}

/// Container format of an extracted image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Jpeg,
    Jpeg2000,
    Png,
}

impl ImageFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "jpg",
            ImageFormat::Jpeg2000 => "jp2",
            ImageFormat::Png => "png",
        }
    }
}

/// An image pulled out of a document
#[derive(Debug, Clone)]
pub struct ExtractedImage {
    /// Sequential number across the document, starting at 1
    pub index: usize,
    /// Page the image was first found on (0-based)
    pub page_index: usize,
    pub object_id: ObjectId,
    pub width: u32,
    pub height: u32,
    pub format: ImageFormat,
    pub data: Vec<u8>,
}

impl ExtractedImage {
    pub fn extension(&self) -> &'static str {
        self.format.extension()
    }

    /// `image_{index}.{extension}`
    pub fn file_name(&self) -> String {
        format!("image_{}.{}", self.index, self.extension())
    }
}

/// Image extractor
pub struct ImageExtractor<'a> {
    document: &'a Document,
    options: ExtractImagesOptions,
    /// Image objects already emitted
    seen: HashSet<ObjectId>,
    next_index: usize,
}

impl<'a> ImageExtractor<'a> {
    pub fn new(document: &'a Document, options: ExtractImagesOptions) -> Self {
        Self {
            document,
            options,
            seen: HashSet::new(),
            next_index: 1,
        }
    }

    /// Extract all images from the document
    pub fn extract_all(&mut self) -> OperationResult<Vec<ExtractedImage>> {
        let mut extracted = Vec::new();
        for page_index in 0..self.document.page_count() {
            extracted.extend(self.extract_from_page(page_index)?);
        }
        tracing::debug!("Extracted {} images", extracted.len());
        Ok(extracted)
    }

    /// Extract images from a specific page
    pub fn extract_from_page(&mut self, page_index: usize) -> OperationResult<Vec<ExtractedImage>> {
        let document = self.document;
        let mut extracted = Vec::new();
        let Some(&page_id) = document.page_ids().get(page_index) else {
            return Ok(extracted);
        };

        if let Some(resources) = document.page_resources(page_id) {
            let mut forms = HashSet::new();
            self.collect_from_resources(resources, page_index, &mut forms, &mut extracted);
        }
        Ok(extracted)
    }

    fn collect_from_resources(
        &mut self,
        resources: &'a Dictionary,
        page_index: usize,
        forms: &mut HashSet<ObjectId>,
        extracted: &mut Vec<ExtractedImage>,
    ) {
        let document = self.document;
        let Some(xobjects) = document.resolve_dict(resources, "XObject") else {
            return;
        };

        for (name, value) in xobjects.iter() {
            let Object::Reference(id) = value else {
                tracing::warn!("Ignoring direct XObject /{}", name);
                continue;
            };
            let Some(stream) = document.get(*id).and_then(Object::as_stream) else {
                continue;
            };

            match stream.dict.get_name("Subtype") {
                Some("Image") => {
                    if let Some(image) = self.process_image(*id, stream, page_index) {
                        extracted.push(image);
                    }
                }
                Some("Form") => {
                    if !forms.insert(*id) {
                        continue;
                    }
                    if let Some(form_resources) = document.resolve_dict(&stream.dict, "Resources") {
                        self.collect_from_resources(form_resources, page_index, forms, extracted);
                    }
                }
                _ => {}
            }
        }
    }

    fn process_image(
        &mut self,
        id: ObjectId,
        stream: &Stream,
        page_index: usize,
    ) -> Option<ExtractedImage> {
        if self.options.deduplicate && self.seen.contains(&id) {
            return None;
        }

        let width = dimension(&stream.dict, "Width");
        let height = dimension(&stream.dict, "Height");
        if let Some(min_size) = self.options.min_size {
            if width < min_size || height < min_size {
                return None;
            }
        }

        let (format, data) = match self.encode_image(stream, width, height) {
            Ok(encoded) => encoded,
            Err(e) => {
                tracing::warn!("Skipping image {}: {}", id, e);
                return None;
            }
        };

        self.seen.insert(id);
        let index = self.next_index;
        self.next_index += 1;

        Some(ExtractedImage {
            index,
            page_index,
            object_id: id,
            width,
            height,
            format,
            data,
        })
    }

    fn encode_image(
        &self,
        stream: &Stream,
        width: u32,
        height: u32,
    ) -> Result<(ImageFormat, Vec<u8>), CodecError> {
        let decoded = decode_stream(stream)?;
        match decoded.native {
            Some(NativeCodec::Jpeg) => Ok((ImageFormat::Jpeg, decoded.data)),
            Some(NativeCodec::Jpeg2000) => Ok((ImageFormat::Jpeg2000, decoded.data)),
            Some(other) => Err(CodecError::UnsupportedImage(format!("{other:?} payload"))),
            None => {
                let png = encode_png(self.document, &stream.dict, &decoded.data, width, height)?;
                Ok((ImageFormat::Png, png))
            }
        }
    }
}

/// Extract every image of `document`
pub fn extract_images_from_document(
    document: &Document,
    options: ExtractImagesOptions,
) -> OperationResult<Vec<ExtractedImage>> {
    ImageExtractor::new(document, options).extract_all()
}

fn dimension(dict: &Dictionary, key: &str) -> u32 {
    dict.get_integer(key)
        .and_then(|value| u32::try_from(value).ok())
        .unwrap_or(0)
}

/// Color space of raw image samples
#[derive(Debug, Clone, PartialEq)]
enum SampleSpace {
    Gray,
    Rgb,
    Cmyk,
    /// Palette entries already converted to RGB
    Indexed(Vec<[u8; 3]>),
}

impl SampleSpace {
    fn components(&self) -> usize {
        match self {
            SampleSpace::Gray | SampleSpace::Indexed(_) => 1,
            SampleSpace::Rgb => 3,
            SampleSpace::Cmyk => 4,
        }
    }
}

fn parse_color_space(doc: &Document, object: &Object) -> Result<SampleSpace, CodecError> {
    match doc.resolve(object) {
        Object::Name(name) => match name.as_str() {
            "DeviceGray" | "CalGray" | "G" => Ok(SampleSpace::Gray),
            "DeviceRGB" | "CalRGB" | "RGB" => Ok(SampleSpace::Rgb),
            "DeviceCMYK" | "CMYK" => Ok(SampleSpace::Cmyk),
            other => Err(CodecError::UnsupportedImage(format!("color space {other}"))),
        },
        Object::Array(items) => {
            let family = items.first().and_then(Object::as_name).unwrap_or_default();
            match family {
                "CalGray" => Ok(SampleSpace::Gray),
                "CalRGB" => Ok(SampleSpace::Rgb),
                "ICCBased" => {
                    let components = items
                        .get(1)
                        .map(|profile| doc.resolve(profile))
                        .and_then(Object::as_stream)
                        .and_then(|profile| profile.dict.get_integer("N"));
                    match components {
                        Some(1) => Ok(SampleSpace::Gray),
                        Some(3) => Ok(SampleSpace::Rgb),
                        Some(4) => Ok(SampleSpace::Cmyk),
                        other => Err(CodecError::UnsupportedImage(format!(
                            "ICCBased with /N {other:?}"
                        ))),
                    }
                }
                "Indexed" | "I" => parse_indexed(doc, items),
                other => Err(CodecError::UnsupportedImage(format!("color space {other}"))),
            }
        }
        other => Err(CodecError::UnsupportedImage(format!(
            "color space of type {}",
            other.type_name()
        ))),
    }
}

/// `[/Indexed base hival lookup]`
fn parse_indexed(doc: &Document, items: &[Object]) -> Result<SampleSpace, CodecError> {
    let [_, base, hival, lookup] = items else {
        return Err(CodecError::UnsupportedImage(
            "Indexed color space needs four entries".to_string(),
        ));
    };

    let base = parse_color_space(doc, base)?;
    if matches!(base, SampleSpace::Indexed(_)) {
        return Err(CodecError::UnsupportedImage(
            "Indexed base cannot be Indexed".to_string(),
        ));
    }
    let hival = doc
        .resolve(hival)
        .as_integer()
        .filter(|value| (0..=255).contains(value))
        .ok_or_else(|| CodecError::UnsupportedImage("Indexed hival".to_string()))?
        as usize;

    let table = match doc.resolve(lookup) {
        Object::String(bytes) => bytes.clone(),
        Object::Stream(stream) => decode_to_bytes(stream)?,
        other => {
            return Err(CodecError::UnsupportedImage(format!(
                "Indexed lookup of type {}",
                other.type_name()
            )))
        }
    };

    let components = base.components();
    let palette = (0..=hival)
        .map(|entry| {
            let start = entry * components;
            let mut color = [0u8; 4];
            for (slot, byte) in color.iter_mut().zip(table.iter().skip(start).take(components)) {
                *slot = *byte;
            }
            to_rgb(&base, &color[..components])
        })
        .collect();
    Ok(SampleSpace::Indexed(palette))
}

fn to_rgb(space: &SampleSpace, samples: &[u8]) -> [u8; 3] {
    match (space, samples) {
        (SampleSpace::Gray, [g, ..]) => [*g, *g, *g],
        (SampleSpace::Rgb, [r, g, b, ..]) => [*r, *g, *b],
        (SampleSpace::Cmyk, [c, m, y, k]) => {
            let channel = |value: u8| {
                ((255 - u32::from(value)) * (255 - u32::from(*k)) / 255) as u8
            };
            [channel(*c), channel(*m), channel(*y)]
        }
        _ => [0, 0, 0],
    }
}

/// Unpack `rows` rows of `per_row` samples of `bits` each; rows start on a
/// byte boundary.
fn unpack_samples(
    data: &[u8],
    bits: usize,
    per_row: usize,
    rows: usize,
) -> Result<Vec<u16>, CodecError> {
    let too_large = || {
        CodecError::UnsupportedImage(format!(
            "{per_row} x {rows} samples of {bits} bits exceed {} bytes of data",
            data.len()
        ))
    };
    let row_bytes = per_row
        .checked_mul(bits)
        .map(|row_bits| row_bits.div_ceil(8))
        .ok_or_else(too_large)?;
    let expected = row_bytes.checked_mul(rows).ok_or_else(too_large)?;
    if data.len() < expected {
        return Err(CodecError::UnsupportedImage(format!(
            "{} bytes of samples, expected {}",
            data.len(),
            expected
        )));
    }
    if row_bytes == 0 {
        return Ok(Vec::new());
    }

    // Bounded by the data length checked above
    let mut samples = Vec::with_capacity(per_row * rows);
    for row in data.chunks_exact(row_bytes).take(rows) {
        match bits {
            8 => samples.extend(row.iter().map(|&b| u16::from(b))),
            16 => samples.extend(
                row.chunks_exact(2)
                    .map(|pair| u16::from_be_bytes([pair[0], pair[1]])),
            ),
            _ => {
                let mask = (1u16 << bits) - 1;
                for i in 0..per_row {
                    let bit = i * bits;
                    let shift = 8 - bits - bit % 8;
                    samples.push((u16::from(row[bit / 8]) >> shift) & mask);
                }
            }
        }
    }
    Ok(samples)
}

fn scale_to_u8(value: u16, bits: usize) -> u8 {
    match bits {
        1 => (value * 255) as u8,
        2 => (value * 85) as u8,
        4 => (value * 17) as u8,
        16 => (value >> 8) as u8,
        _ => value as u8,
    }
}

/// Encode raw image samples as an 8-bit gray or RGB PNG
fn encode_png(
    doc: &Document,
    dict: &Dictionary,
    data: &[u8],
    width: u32,
    height: u32,
) -> Result<Vec<u8>, CodecError> {
    if width == 0 || height == 0 {
        return Err(CodecError::UnsupportedImage("zero-sized image".to_string()));
    }

    let image_mask = matches!(dict.get("ImageMask"), Some(Object::Boolean(true)));
    let (space, bits) = if image_mask {
        (SampleSpace::Gray, 1)
    } else {
        let space = dict
            .get("ColorSpace")
            .ok_or_else(|| CodecError::UnsupportedImage("missing /ColorSpace".to_string()))
            .and_then(|object| parse_color_space(doc, object))?;
        let bits = dict.get_integer("BitsPerComponent").unwrap_or(8);
        (space, bits as usize)
    };

    if !matches!(bits, 1 | 2 | 4 | 8 | 16) {
        return Err(CodecError::UnsupportedImage(format!(
            "{bits} bits per component"
        )));
    }
    if matches!(space, SampleSpace::Indexed(_)) && bits == 16 {
        return Err(CodecError::UnsupportedImage(
            "16-bit Indexed samples".to_string(),
        ));
    }

    let components = space.components();
    let per_row = (width as usize).checked_mul(components).ok_or_else(|| {
        CodecError::UnsupportedImage(format!("{width} pixels of {components} components"))
    })?;
    let samples = unpack_samples(data, bits, per_row, height as usize)?;

    let (pixels, color_type): (Vec<u8>, ExtendedColorType) = match &space {
        SampleSpace::Gray => (
            samples.iter().map(|&s| scale_to_u8(s, bits)).collect(),
            ExtendedColorType::L8,
        ),
        SampleSpace::Rgb => (
            samples.iter().map(|&s| scale_to_u8(s, bits)).collect(),
            ExtendedColorType::Rgb8,
        ),
        SampleSpace::Cmyk => {
            let scaled: Vec<u8> = samples.iter().map(|&s| scale_to_u8(s, bits)).collect();
            (
                scaled
                    .chunks_exact(4)
                    .flat_map(|cmyk| to_rgb(&space, cmyk))
                    .collect(),
                ExtendedColorType::Rgb8,
            )
        }
        SampleSpace::Indexed(palette) => (
            samples
                .iter()
                .flat_map(|&s| palette.get(s as usize).copied().unwrap_or([0, 0, 0]))
                .collect(),
            ExtendedColorType::Rgb8,
        ),
    };

    let mut png = Vec::new();
    PngEncoder::new(&mut png)
        .write_image(&pixels, width, height, color_type)
        .map_err(|e| CodecError::UnsupportedImage(e.to_string()))?;
    Ok(png)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const PNG_SIGNATURE: &[u8] = b"\x89PNG\r\n\x1a\n";

    fn image_stream(entries: &[(&str, Object)], data: &[u8]) -> Stream {
        let mut dict = Dictionary::new();
        dict.set("Type", Object::Name("XObject".to_string()));
        dict.set("Subtype", Object::Name("Image".to_string()));
        for (key, value) in entries {
            dict.set(*key, value.clone());
        }
        let mut stream = Stream::new(dict, Vec::new());
        stream.set_data(data.to_vec());
        stream
    }

    /// One page whose resources name each image as /Im1, /Im2, ...
    fn document_with_images(images: Vec<Stream>) -> (Document, Vec<ObjectId>) {
        let mut doc = Document::new();
        let ids: Vec<ObjectId> = images.into_iter().map(|s| doc.add_object(s)).collect();

        let mut xobjects = Dictionary::new();
        for (i, id) in ids.iter().enumerate() {
            xobjects.set(format!("Im{}", i + 1), *id);
        }
        let mut resources = Dictionary::new();
        resources.set("XObject", xobjects);

        let mut page = Dictionary::new();
        page.set("Type", Object::Name("Page".to_string()));
        page.set("Resources", resources);
        let page_id = doc.add_object(page);
        doc.append_page(page_id).unwrap();
        (doc, ids)
    }

    fn name(value: &str) -> Object {
        Object::Name(value.to_string())
    }

    #[test]
    fn test_extract_options_default() {
        let options = ExtractImagesOptions::default();
        assert_eq!(options.min_size, None);
        assert!(options.deduplicate);
    }

    #[test]
    fn test_jpeg_passthrough() {
        let jpeg = [0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0xFF, 0xD9];
        let stream = image_stream(
            &[
                ("Width", 1.into()),
                ("Height", 1.into()),
                ("Filter", name("DCTDecode")),
            ],
            &jpeg,
        );
        let (doc, _) = document_with_images(vec![stream]);

        let images = extract_images_from_document(&doc, ExtractImagesOptions::default()).unwrap();
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].file_name(), "image_1.jpg");
        assert_eq!(images[0].data, jpeg);
    }

    #[test]
    fn test_jpx_extension() {
        let stream = image_stream(
            &[
                ("Width", 1.into()),
                ("Height", 1.into()),
                ("Filter", name("JPXDecode")),
            ],
            b"\x00\x00\x00\x0CjP  ",
        );
        let (doc, _) = document_with_images(vec![stream]);
        let images = extract_images_from_document(&doc, ExtractImagesOptions::default()).unwrap();
        assert_eq!(images[0].extension(), "jp2");
    }

    #[test]
    fn test_raw_rgb_becomes_png() {
        let stream = image_stream(
            &[
                ("Width", 2.into()),
                ("Height", 1.into()),
                ("ColorSpace", name("DeviceRGB")),
                ("BitsPerComponent", 8.into()),
            ],
            &[255, 0, 0, 0, 0, 255],
        );
        let (doc, _) = document_with_images(vec![stream]);
        let images = extract_images_from_document(&doc, ExtractImagesOptions::default()).unwrap();

        assert_eq!(images[0].file_name(), "image_1.png");
        assert!(images[0].data.starts_with(PNG_SIGNATURE));
        assert_eq!((images[0].width, images[0].height), (2, 1));
    }

    #[test]
    fn test_sequential_names_and_unsupported_skipped() {
        let gray = image_stream(
            &[
                ("Width", 8.into()),
                ("Height", 1.into()),
                ("ColorSpace", name("DeviceGray")),
                ("BitsPerComponent", 1.into()),
            ],
            &[0b1010_1010],
        );
        let jbig2 = image_stream(
            &[
                ("Width", 1.into()),
                ("Height", 1.into()),
                ("Filter", name("JBIG2Decode")),
            ],
            &[0],
        );
        let jpeg = image_stream(
            &[
                ("Width", 1.into()),
                ("Height", 1.into()),
                ("Filter", name("DCTDecode")),
            ],
            &[0xFF, 0xD8],
        );
        let (doc, _) = document_with_images(vec![gray, jbig2, jpeg]);

        let names: Vec<String> = extract_images_from_document(&doc, ExtractImagesOptions::default())
            .unwrap()
            .iter()
            .map(ExtractedImage::file_name)
            .collect();
        assert_eq!(names, vec!["image_1.png", "image_2.jpg"]);
    }

    #[test]
    fn test_truncated_samples_skipped() {
        let stream = image_stream(
            &[
                ("Width", 4.into()),
                ("Height", 4.into()),
                ("ColorSpace", name("DeviceRGB")),
                ("BitsPerComponent", 8.into()),
            ],
            &[1, 2, 3],
        );
        let (doc, _) = document_with_images(vec![stream]);
        let images = extract_images_from_document(&doc, ExtractImagesOptions::default()).unwrap();
        assert!(images.is_empty());
    }

    #[test]
    fn test_huge_dimensions_skipped() {
        let huge = image_stream(
            &[
                ("Width", Object::Integer(4_294_967_295)),
                ("Height", Object::Integer(4_294_967_295)),
                ("ColorSpace", name("DeviceCMYK")),
                ("BitsPerComponent", 16.into()),
            ],
            &[0; 16],
        );
        let small = image_stream(
            &[
                ("Width", 1.into()),
                ("Height", 1.into()),
                ("ColorSpace", name("DeviceGray")),
                ("BitsPerComponent", 8.into()),
            ],
            &[128],
        );
        let (doc, _) = document_with_images(vec![huge, small]);

        let images = extract_images_from_document(&doc, ExtractImagesOptions::default()).unwrap();
        assert_eq!(images.len(), 1);
        assert_eq!((images[0].width, images[0].height), (1, 1));
    }

    #[test]
    fn test_unpack_rejects_overflowing_layout() {
        assert!(unpack_samples(&[0; 8], 16, usize::MAX / 2, 2).is_err());
        assert!(unpack_samples(&[0; 8], 8, 4, usize::MAX).is_err());
    }

    #[test]
    fn test_shared_image_emitted_once() {
        let stream = image_stream(
            &[
                ("Width", 1.into()),
                ("Height", 1.into()),
                ("Filter", name("DCTDecode")),
            ],
            &[0xFF, 0xD8],
        );
        let (mut doc, ids) = document_with_images(vec![stream]);

        let mut xobjects = Dictionary::new();
        xobjects.set("Shared", ids[0]);
        let mut resources = Dictionary::new();
        resources.set("XObject", xobjects);
        let mut page = Dictionary::new();
        page.set("Type", name("Page"));
        page.set("Resources", resources);
        let second = doc.add_object(page);
        doc.append_page(second).unwrap();

        let images = extract_images_from_document(&doc, ExtractImagesOptions::default()).unwrap();
        assert_eq!(images.len(), 1);

        let options = ExtractImagesOptions::default().with_deduplicate(false);
        let images = extract_images_from_document(&doc, options).unwrap();
        assert_eq!(images.len(), 2);
        assert_eq!(images[1].page_index, 1);
    }

    #[test]
    fn test_images_inside_form_xobject() {
        let mut doc = Document::new();
        let image = doc.add_object(image_stream(
            &[
                ("Width", 1.into()),
                ("Height", 1.into()),
                ("Filter", name("DCTDecode")),
            ],
            &[0xFF, 0xD8],
        ));

        let mut inner = Dictionary::new();
        inner.set("Img", image);
        let mut form_resources = Dictionary::new();
        form_resources.set("XObject", inner);
        let mut form_dict = Dictionary::new();
        form_dict.set("Subtype", name("Form"));
        form_dict.set("Resources", form_resources);
        let form = doc.add_object(Stream::new(form_dict, b"/Img Do".to_vec()));

        let mut outer = Dictionary::new();
        outer.set("Fm1", form);
        let mut resources = Dictionary::new();
        resources.set("XObject", outer);
        let mut page = Dictionary::new();
        page.set("Type", name("Page"));
        page.set("Resources", resources);
        let page_id = doc.add_object(page);
        doc.append_page(page_id).unwrap();

        let images = extract_images_from_document(&doc, ExtractImagesOptions::default()).unwrap();
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].object_id, image);
    }

    #[test]
    fn test_min_size_filter() {
        let stream = image_stream(
            &[
                ("Width", 2.into()),
                ("Height", 2.into()),
                ("Filter", name("DCTDecode")),
            ],
            &[0xFF, 0xD8],
        );
        let (doc, _) = document_with_images(vec![stream]);
        let options = ExtractImagesOptions::default().with_min_size(10);
        assert!(extract_images_from_document(&doc, options).unwrap().is_empty());
    }

    #[test]
    fn test_indexed_palette() {
        let mut doc = Document::new();
        let space = Object::Array(vec![
            name("Indexed"),
            name("DeviceRGB"),
            1.into(),
            Object::String(vec![255, 0, 0, 0, 0, 255]),
        ]);
        assert_eq!(
            parse_color_space(&doc, &space).unwrap(),
            SampleSpace::Indexed(vec![[255, 0, 0], [0, 0, 255]])
        );

        let mut profile = Dictionary::new();
        profile.set("N", 4i64);
        let profile_id = doc.add_object(Stream::new(profile, Vec::new()));
        let icc = Object::Array(vec![name("ICCBased"), Object::Reference(profile_id)]);
        assert_eq!(parse_color_space(&doc, &icc).unwrap(), SampleSpace::Cmyk);
    }

    #[test]
    fn test_unpack_sub_byte_samples() {
        // Rows are byte aligned: 3 two-bit samples then padding
        let samples = unpack_samples(&[0b1101_1000, 0b0001_1100], 2, 3, 2).unwrap();
        assert_eq!(samples, vec![3, 1, 2, 0, 1, 3]);
        assert_eq!(scale_to_u8(3, 2), 255);
        assert_eq!(scale_to_u8(0xABCD, 16), 0xAB);
    }

    #[test]
    fn test_cmyk_conversion() {
        assert_eq!(to_rgb(&SampleSpace::Cmyk, &[0, 0, 0, 0]), [255, 255, 255]);
        assert_eq!(to_rgb(&SampleSpace::Cmyk, &[0, 0, 0, 255]), [0, 0, 0]);
        assert_eq!(to_rgb(&SampleSpace::Cmyk, &[255, 0, 0, 0]), [0, 255, 255]);
    }
}

//! Font decoding for text extraction
//!
//! Turns the bytes of a text-showing operator into Unicode text and glyph
//! advances, using the font's `/ToUnicode` CMap first and its encoding
//! (with `/Differences`) second. Widths come from `/Widths` for simple fonts
//! and from the descendant font's `/W` array for composite fonts.

use super::cmap::CMap;
use super::encoding::{glyph_name_to_unicode, TextEncoding};
use crate::objects::{Dictionary, Object};
use crate::parser::filters::decode_to_bytes;
use crate::Document;
use std::collections::HashMap;

/// Advance used when a font carries no width information, in thousandths
/// of text space
const DEFAULT_GLYPH_WIDTH: f64 = 500.0;

/// One decoded character code
#[derive(Debug, Clone, PartialEq)]
pub struct Glyph {
    pub text: String,
    /// Horizontal advance in thousandths of text space
    pub width: f64,
    /// Single-byte code 32, which word spacing applies to
    pub is_space: bool,
}

#[derive(Debug, Clone)]
enum GlyphWidths {
    Simple {
        first_char: u32,
        widths: Vec<f64>,
        missing: f64,
    },
    Composite {
        default: f64,
        widths: HashMap<u32, f64>,
    },
}

impl GlyphWidths {
    fn width(&self, code: u32) -> f64 {
        match self {
            GlyphWidths::Simple {
                first_char,
                widths,
                missing,
            } => code
                .checked_sub(*first_char)
                .and_then(|offset| widths.get(offset as usize))
                .copied()
                .unwrap_or(*missing),
            GlyphWidths::Composite { default, widths } => {
                widths.get(&code).copied().unwrap_or(*default)
            }
        }
    }
}

/// Decoder for one font resource
#[derive(Debug, Clone)]
pub struct FontDecoder {
    two_byte: bool,
    to_unicode: Option<CMap>,
    encoding: TextEncoding,
    differences: HashMap<u8, String>,
    widths: GlyphWidths,
}

impl Default for FontDecoder {
    /// WinAnsi single-byte codes with a uniform advance, used when a font
    /// resource is missing
    fn default() -> Self {
        Self {
            two_byte: false,
            to_unicode: None,
            encoding: TextEncoding::default(),
            differences: HashMap::new(),
            widths: GlyphWidths::Simple {
                first_char: 0,
                widths: Vec::new(),
                missing: DEFAULT_GLYPH_WIDTH,
            },
        }
    }
}

impl FontDecoder {
    /// Build a decoder from a font dictionary
    pub fn from_font(document: &Document, font: &Dictionary) -> Self {
        let subtype = font.get_name("Subtype").unwrap_or("Type1");
        let two_byte = subtype == "Type0";

        let to_unicode = font
            .get("ToUnicode")
            .map(|object| document.resolve(object))
            .and_then(Object::as_stream)
            .and_then(|stream| match decode_to_bytes(stream) {
                Ok(data) => Some(CMap::parse(&data)),
                Err(e) => {
                    tracing::warn!("Ignoring unreadable /ToUnicode CMap: {}", e);
                    None
                }
            });

        let mut encoding = TextEncoding::default();
        let mut differences = HashMap::new();
        match font.get("Encoding").map(|object| document.resolve(object)) {
            Some(Object::Name(name)) => {
                encoding = TextEncoding::from_name(name).unwrap_or_default();
            }
            Some(Object::Dictionary(dict)) => {
                if let Some(base) = dict.get_name("BaseEncoding") {
                    encoding = TextEncoding::from_name(base).unwrap_or_default();
                }
                if let Some(Object::Array(items)) =
                    dict.get("Differences").map(|object| document.resolve(object))
                {
                    differences = parse_differences(items);
                }
            }
            _ => {}
        }

        let widths = if two_byte {
            composite_widths(document, font)
        } else {
            simple_widths(document, font, subtype == "Type3")
        };

        Self {
            two_byte,
            to_unicode,
            encoding,
            differences,
            widths,
        }
    }

    /// Split `bytes` into character codes and decode each one
    pub fn glyphs(&self, bytes: &[u8]) -> Vec<Glyph> {
        let default_len = if self.two_byte { 2 } else { 1 };
        let mut glyphs = Vec::new();
        let mut i = 0;

        while i < bytes.len() {
            let len = match &self.to_unicode {
                Some(cmap) if self.two_byte => cmap.code_length(&bytes[i..], default_len),
                _ => default_len.min(bytes.len() - i),
            };
            let code = &bytes[i..i + len];
            let value = code.iter().fold(0u32, |acc, &b| (acc << 8) | u32::from(b));

            glyphs.push(Glyph {
                text: self.code_text(code, value),
                width: self.widths.width(value),
                is_space: len == 1 && code[0] == b' ',
            });
            i += len;
        }

        glyphs
    }

    /// Decoded text of `bytes`
    pub fn decode(&self, bytes: &[u8]) -> String {
        self.glyphs(bytes).into_iter().map(|glyph| glyph.text).collect()
    }

    fn code_text(&self, code: &[u8], value: u32) -> String {
        if let Some(text) = self.to_unicode.as_ref().and_then(|cmap| cmap.lookup(code)) {
            return text;
        }
        if self.two_byte {
            return char::from_u32(value)
                .filter(|ch| !ch.is_control())
                .unwrap_or('\u{FFFD}')
                .to_string();
        }
        match self.differences.get(&code[0]) {
            Some(text) => text.clone(),
            None => self.encoding.decode_byte(code[0]).to_string(),
        }
    }
}

/// Decoders for the `/Font` entries of one resource dictionary, keyed by
/// resource name
#[derive(Debug, Clone, Default)]
pub struct FontSet {
    fonts: HashMap<String, FontDecoder>,
    fallback: FontDecoder,
}

impl FontSet {
    pub fn from_resources(document: &Document, resources: Option<&Dictionary>) -> Self {
        let mut set = Self::default();
        let Some(fonts) = resources.and_then(|res| document.resolve_dict(res, "Font")) else {
            return set;
        };

        for (name, object) in fonts.iter() {
            match document.resolve(object).as_dict() {
                Some(font) => {
                    set.fonts
                        .insert(name.clone(), FontDecoder::from_font(document, font));
                }
                None => tracing::debug!("Font resource /{} is not a dictionary", name),
            }
        }
        set
    }

    pub fn insert(&mut self, name: impl Into<String>, decoder: FontDecoder) {
        self.fonts.insert(name.into(), decoder);
    }

    /// Decoder for a font resource name; unknown names get the fallback
    pub fn get(&self, name: &str) -> &FontDecoder {
        self.fonts.get(name).unwrap_or(&self.fallback)
    }

    pub fn len(&self) -> usize {
        self.fonts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fonts.is_empty()
    }
}

fn parse_differences(items: &[Object]) -> HashMap<u8, String> {
    let mut differences = HashMap::new();
    let mut code: Option<i64> = None;

    for item in items {
        match item {
            Object::Integer(start) => code = Some(*start),
            Object::Name(name) => {
                if let Some(current) = code {
                    if let (Ok(byte), Some(text)) = (u8::try_from(current), glyph_name_to_unicode(name))
                    {
                        differences.insert(byte, text);
                    }
                    code = Some(current + 1);
                }
            }
            _ => {}
        }
    }

    differences
}

fn simple_widths(document: &Document, font: &Dictionary, type3: bool) -> GlyphWidths {
    let missing = font
        .get("FontDescriptor")
        .map(|object| document.resolve(object))
        .and_then(Object::as_dict)
        .and_then(|descriptor| descriptor.get("MissingWidth"))
        .and_then(Object::as_real)
        .filter(|width| *width > 0.0)
        .unwrap_or(DEFAULT_GLYPH_WIDTH);

    // Type 3 widths are in glyph space
    let scale = if type3 {
        font.get("FontMatrix")
            .map(|object| document.resolve(object))
            .and_then(Object::as_array)
            .and_then(|matrix| matrix.first())
            .and_then(Object::as_real)
            .map_or(1.0, |a| a * 1000.0)
    } else {
        1.0
    };

    let widths = font
        .get("Widths")
        .map(|object| document.resolve(object))
        .and_then(Object::as_array)
        .map(|items| {
            items
                .iter()
                .map(|w| document.resolve(w).as_real().map_or(missing, |w| w * scale))
                .collect()
        })
        .unwrap_or_default();

    GlyphWidths::Simple {
        first_char: font
            .get_integer("FirstChar")
            .and_then(|first| u32::try_from(first).ok())
            .unwrap_or(0),
        widths,
        missing,
    }
}

/// `/DW` and `/W` of the first descendant font. `/W` mixes
/// `c [w1 w2 ...]` and `c_first c_last w` entries.
fn composite_widths(document: &Document, font: &Dictionary) -> GlyphWidths {
    let descendant = font
        .get("DescendantFonts")
        .map(|object| document.resolve(object))
        .and_then(Object::as_array)
        .and_then(|fonts| fonts.first())
        .map(|object| document.resolve(object))
        .and_then(Object::as_dict);

    let Some(descendant) = descendant else {
        return GlyphWidths::Composite {
            default: 1000.0,
            widths: HashMap::new(),
        };
    };

    let default = descendant
        .get("DW")
        .and_then(Object::as_real)
        .unwrap_or(1000.0);
    let mut widths = HashMap::new();

    if let Some(Object::Array(items)) = descendant.get("W").map(|object| document.resolve(object)) {
        let mut i = 0;
        while i < items.len() {
            let Some(first) = items[i].as_integer() else {
                break;
            };
            match items.get(i + 1).map(|object| document.resolve(object)) {
                Some(Object::Array(list)) => {
                    for (offset, width) in list.iter().enumerate() {
                        if let Some(width) = width.as_real() {
                            widths.insert(first as u32 + offset as u32, width);
                        }
                    }
                    i += 2;
                }
                Some(Object::Integer(last)) => {
                    let width = items.get(i + 2).and_then(Object::as_real).unwrap_or(default);
                    // Bounded so a corrupt range cannot allocate without limit
                    let last = (*last).min(first + 0xFFFF);
                    for code in first..=last {
                        widths.insert(code as u32, width);
                    }
                    i += 3;
                }
                _ => break,
            }
        }
    }

    GlyphWidths::Composite { default, widths }
}

//! Single-byte text encodings
//!
//! Decoding tables for the base encodings of simple fonts (ISO 32000-1
//! Annex D) and for PDF text strings.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextEncoding {
    StandardEncoding,
    MacRomanEncoding,
    #[default]
    WinAnsiEncoding,
    PdfDocEncoding,
}

impl TextEncoding {
    /// Encoding named by a font's `/Encoding` or `/BaseEncoding` entry
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "StandardEncoding" => Some(TextEncoding::StandardEncoding),
            "MacRomanEncoding" => Some(TextEncoding::MacRomanEncoding),
            "WinAnsiEncoding" => Some(TextEncoding::WinAnsiEncoding),
            "PDFDocEncoding" => Some(TextEncoding::PdfDocEncoding),
            _ => None,
        }
    }

    pub fn decode(&self, data: &[u8]) -> String {
        data.iter().map(|&byte| self.decode_byte(byte)).collect()
    }

    /// Character for one code. Undefined codes map to `?`.
    pub fn decode_byte(&self, byte: u8) -> char {
        match self {
            TextEncoding::WinAnsiEncoding => win_ansi(byte),
            TextEncoding::MacRomanEncoding => match byte {
                0x00..=0x7F => byte as char,
                _ => MAC_ROMAN_HIGH[usize::from(byte - 0x80)],
            },
            TextEncoding::StandardEncoding => standard(byte),
            TextEncoding::PdfDocEncoding => pdf_doc(byte),
        }
    }
}

/// Decode a PDF text string: UTF-16BE or UTF-8 when a byte order mark is
/// present, PDFDocEncoding otherwise
pub fn decode_text_string(data: &[u8]) -> String {
    if let Some(utf16) = data.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> = utf16
            .chunks(2)
            .map(|pair| u16::from_be_bytes([pair[0], *pair.get(1).unwrap_or(&0)]))
            .collect();
        return String::from_utf16_lossy(&units);
    }
    if let Some(utf8) = data.strip_prefix(&[0xEF, 0xBB, 0xBF]) {
        return String::from_utf8_lossy(utf8).into_owned();
    }
    TextEncoding::PdfDocEncoding.decode(data)
}

/// Unicode value of a glyph name from an encoding's `/Differences`.
/// Covers `uniXXXX`, `uXXXX[XX]`, single-character names and the common
/// Latin glyph names.
pub fn glyph_name_to_unicode(name: &str) -> Option<String> {
    if let Some(hex) = name.strip_prefix("uni") {
        if hex.len() >= 4 && hex.len() % 4 == 0 {
            let units: Option<Vec<u16>> = hex
                .as_bytes()
                .chunks(4)
                .map(|chunk| {
                    std::str::from_utf8(chunk)
                        .ok()
                        .and_then(|s| u16::from_str_radix(s, 16).ok())
                })
                .collect();
            return units.map(|units| String::from_utf16_lossy(&units));
        }
    }
    if let Some(hex) = name.strip_prefix('u') {
        if (4..=6).contains(&hex.len()) {
            if let Some(ch) = u32::from_str_radix(hex, 16).ok().and_then(char::from_u32) {
                return Some(ch.to_string());
            }
        }
    }

    let mut chars = name.chars();
    if let (Some(ch), None) = (chars.next(), chars.next()) {
        if ch.is_ascii_alphabetic() {
            return Some(ch.to_string());
        }
    }

    // Suffixed variants such as "a.sc" or "one.oldstyle"
    let base = name.split(['.', '_']).next().unwrap_or(name);
    if base != name && !base.is_empty() {
        return glyph_name_to_unicode(base);
    }

    let ch = match name {
        "space" | "nbspace" => ' ',
        "exclam" => '!',
        "quotedbl" => '"',
        "numbersign" => '#',
        "dollar" => '$',
        "percent" => '%',
        "ampersand" => '&',
        "quotesingle" => '\'',
        "parenleft" => '(',
        "parenright" => ')',
        "asterisk" => '*',
        "plus" => '+',
        "comma" => ',',
        "hyphen" | "minus" => '-',
        "period" => '.',
        "slash" => '/',
        "zero" => '0',
        "one" => '1',
        "two" => '2',
        "three" => '3',
        "four" => '4',
        "five" => '5',
        "six" => '6',
        "seven" => '7',
        "eight" => '8',
        "nine" => '9',
        "colon" => ':',
        "semicolon" => ';',
        "less" => '<',
        "equal" => '=',
        "greater" => '>',
        "question" => '?',
        "at" => '@',
        "bracketleft" => '[',
        "backslash" => '\\',
        "bracketright" => ']',
        "asciicircum" => '^',
        "underscore" => '_',
        "grave" => '`',
        "braceleft" => '{',
        "bar" => '|',
        "braceright" => '}',
        "asciitilde" => '~',
        "quoteleft" => '\u{2018}',
        "quoteright" => '\u{2019}',
        "quotedblleft" => '\u{201C}',
        "quotedblright" => '\u{201D}',
        "endash" => '\u{2013}',
        "emdash" => '\u{2014}',
        "bullet" => '\u{2022}',
        "ellipsis" => '\u{2026}',
        "dagger" => '\u{2020}',
        "daggerdbl" => '\u{2021}',
        "degree" => '\u{00B0}',
        "section" => '\u{00A7}',
        "paragraph" => '\u{00B6}',
        "copyright" => '\u{00A9}',
        "registered" => '\u{00AE}',
        "trademark" => '\u{2122}',
        "Euro" => '\u{20AC}',
        "sterling" => '\u{00A3}',
        "yen" => '\u{00A5}',
        "cent" => '\u{00A2}',
        "multiply" => '\u{00D7}',
        "divide" => '\u{00F7}',
        "plusminus" => '\u{00B1}',
        "germandbls" => '\u{00DF}',
        "eacute" => '\u{00E9}',
        "egrave" => '\u{00E8}',
        "aacute" => '\u{00E1}',
        "agrave" => '\u{00E0}',
        "adieresis" => '\u{00E4}',
        "odieresis" => '\u{00F6}',
        "udieresis" => '\u{00FC}',
        "Adieresis" => '\u{00C4}',
        "Odieresis" => '\u{00D6}',
        "Udieresis" => '\u{00DC}',
        "ccedilla" => '\u{00E7}',
        "ntilde" => '\u{00F1}',
        "dotlessi" => '\u{0131}',
        "fi" => return Some("fi".to_string()),
        "fl" => return Some("fl".to_string()),
        "ff" => return Some("ff".to_string()),
        "ffi" => return Some("ffi".to_string()),
        "ffl" => return Some("ffl".to_string()),
        _ => return None,
    };
    Some(ch.to_string())
}

fn win_ansi(byte: u8) -> char {
    match byte {
        0x00..=0x7F => byte as char,
        0x80 => '\u{20AC}', // Euro sign
        0x82 => '\u{201A}', // Single low quotation mark
        0x83 => '\u{0192}', // Latin small letter f with hook
        0x84 => '\u{201E}', // Double low quotation mark
        0x85 => '\u{2026}', // Horizontal ellipsis
        0x86 => '\u{2020}', // Dagger
        0x87 => '\u{2021}', // Double dagger
        0x88 => '\u{02C6}', // Circumflex accent
        0x89 => '\u{2030}', // Per mille sign
        0x8A => '\u{0160}', // Latin capital letter S with caron
        0x8B => '\u{2039}', // Single left angle quotation mark
        0x8C => '\u{0152}', // Latin capital ligature OE
        0x8E => '\u{017D}', // Latin capital letter Z with caron
        0x91 => '\u{2018}', // Left single quotation mark
        0x92 => '\u{2019}', // Right single quotation mark
        0x93 => '\u{201C}', // Left double quotation mark
        0x94 => '\u{201D}', // Right double quotation mark
        0x95 => '\u{2022}', // Bullet
        0x96 => '\u{2013}', // En dash
        0x97 => '\u{2014}', // Em dash
        0x98 => '\u{02DC}', // Small tilde
        0x99 => '\u{2122}', // Trade mark sign
        0x9A => '\u{0161}', // Latin small letter s with caron
        0x9B => '\u{203A}', // Single right angle quotation mark
        0x9C => '\u{0153}', // Latin small ligature oe
        0x9E => '\u{017E}', // Latin small letter z with caron
        0x9F => '\u{0178}', // Latin capital letter Y with diaeresis
        // Latin-1 range that overlaps with Windows-1252
        0xA0..=0xFF => char::from(byte),
        // Undefined bytes
        _ => '?',
    }
}

fn standard(byte: u8) -> char {
    match byte {
        0x27 => '\u{2019}',
        0x60 => '\u{2018}',
        0x20..=0x7E => byte as char,
        0xA1 => '\u{00A1}',
        0xA2 => '\u{00A2}',
        0xA3 => '\u{00A3}',
        0xA4 => '\u{2044}',
        0xA5 => '\u{00A5}',
        0xA6 => '\u{0192}',
        0xA7 => '\u{00A7}',
        0xA8 => '\u{00A4}',
        0xA9 => '\'',
        0xAA => '\u{201C}',
        0xAB => '\u{00AB}',
        0xAC => '\u{2039}',
        0xAD => '\u{203A}',
        0xAE => '\u{FB01}',
        0xAF => '\u{FB02}',
        0xB1 => '\u{2013}',
        0xB2 => '\u{2020}',
        0xB3 => '\u{2021}',
        0xB4 => '\u{00B7}',
        0xB6 => '\u{00B6}',
        0xB7 => '\u{2022}',
        0xB8 => '\u{201A}',
        0xB9 => '\u{201E}',
        0xBA => '\u{201D}',
        0xBB => '\u{00BB}',
        0xBC => '\u{2026}',
        0xBD => '\u{2030}',
        0xBF => '\u{00BF}',
        0xC1 => '`',
        0xC2 => '\u{00B4}',
        0xC3 => '\u{02C6}',
        0xC4 => '\u{02DC}',
        0xC5 => '\u{00AF}',
        0xC6 => '\u{02D8}',
        0xC7 => '\u{02D9}',
        0xC8 => '\u{00A8}',
        0xCA => '\u{02DA}',
        0xCB => '\u{00B8}',
        0xCD => '\u{02DD}',
        0xCE => '\u{02DB}',
        0xCF => '\u{02C7}',
        0xD0 => '\u{2014}',
        0xE1 => '\u{00C6}',
        0xE3 => '\u{00AA}',
        0xE8 => '\u{0141}',
        0xE9 => '\u{00D8}',
        0xEA => '\u{0152}',
        0xEB => '\u{00BA}',
        0xF1 => '\u{00E6}',
        0xF5 => '\u{0131}',
        0xF8 => '\u{0142}',
        0xF9 => '\u{00F8}',
        0xFA => '\u{0153}',
        0xFB => '\u{00DF}',
        _ => '?',
    }
}

fn pdf_doc(byte: u8) -> char {
    match byte {
        0x80 => '\u{2022}',
        0x81 => '\u{2020}',
        0x82 => '\u{2021}',
        0x83 => '\u{2026}',
        0x84 => '\u{2014}',
        0x85 => '\u{2013}',
        0x86 => '\u{0192}',
        0x87 => '\u{2044}',
        0x88 => '\u{2039}',
        0x89 => '\u{203A}',
        0x8A => '\u{2212}',
        0x8B => '\u{2030}',
        0x8C => '\u{201E}',
        0x8D => '\u{201C}',
        0x8E => '\u{201D}',
        0x8F => '\u{2018}',
        0x90 => '\u{2019}',
        0x91 => '\u{201A}',
        0x92 => '\u{2122}',
        0x93 => '\u{FB01}',
        0x94 => '\u{FB02}',
        0x95 => '\u{0141}',
        0x96 => '\u{0152}',
        0x97 => '\u{0160}',
        0x98 => '\u{0178}',
        0x99 => '\u{017D}',
        0x9A => '\u{0131}',
        0x9B => '\u{0142}',
        0x9C => '\u{0153}',
        0x9D => '\u{0161}',
        0x9E => '\u{017E}',
        0x9F => '?',
        0xA0 => '\u{20AC}',
        _ => char::from(byte),
    }
}

#[rustfmt::skip]
const MAC_ROMAN_HIGH: [char; 128] = [
    'Ä', 'Å', 'Ç', 'É', 'Ñ', 'Ö', 'Ü', 'á', 'à', 'â', 'ä', 'ã', 'å', 'ç', 'é', 'è',
    'ê', 'ë', 'í', 'ì', 'î', 'ï', 'ñ', 'ó', 'ò', 'ô', 'ö', 'õ', 'ú', 'ù', 'û', 'ü',
    '†', '°', '¢', '£', '§', '•', '¶', 'ß', '®', '©', '™', '´', '¨', '≠', 'Æ', 'Ø',
    '∞', '±', '≤', '≥', '¥', 'µ', '∂', '∑', '∏', 'π', '∫', 'ª', 'º', 'Ω', 'æ', 'ø',
    '¿', '¡', '¬', '√', 'ƒ', '≈', '∆', '«', '»', '…', '\u{00A0}', 'À', 'Ã', 'Õ', 'Œ', 'œ',
    '–', '—', '“', '”', '‘', '’', '÷', '◊', 'ÿ', 'Ÿ', '⁄', '€', '‹', '›', 'ﬁ', 'ﬂ',
    '‡', '·', '‚', '„', '‰', 'Â', 'Ê', 'Á', 'Ë', 'È', 'Í', 'Î', 'Ï', 'Ì', 'Ó', 'Ô',
    '\u{F8FF}', 'Ò', 'Ú', 'Û', 'Ù', 'ı', 'ˆ', '˜', '¯', '˘', '˙', '˚', '¸', '˝', '˛', 'ˇ',
];

//! ToUnicode CMap support for text extraction
//!
//! Implements the subset of ISO 32000-1 Section 9.10.3 needed to turn
//! character codes into Unicode: code space ranges, `bfchar` and `bfrange`
//! (both the offset and the array form).

use std::collections::HashMap;

/// Character code range from `begincodespacerange`
#[derive(Debug, Clone, PartialEq)]
pub struct CodeRange {
    pub start: Vec<u8>,
    pub end: Vec<u8>,
}

impl CodeRange {
    /// Check if a code is within this range
    pub fn contains(&self, code: &[u8]) -> bool {
        if code.len() != self.start.len() || code.len() != self.end.len() {
            return false;
        }

        code.iter()
            .zip(self.start.iter().zip(&self.end))
            .all(|(byte, (low, high))| low <= byte && byte <= high)
    }
}

/// `bfrange` entry mapping consecutive codes to consecutive values
#[derive(Debug, Clone, PartialEq)]
struct RangeMapping {
    start: u32,
    end: u32,
    code_len: usize,
    /// UTF-16BE of the first code's value
    dst_start: Vec<u8>,
}

/// Parsed ToUnicode CMap
#[derive(Debug, Clone, Default)]
pub struct CMap {
    pub codespace_ranges: Vec<CodeRange>,
    single_mappings: HashMap<Vec<u8>, String>,
    ranges: Vec<RangeMapping>,
}

#[derive(Debug, Clone, PartialEq)]
enum CMapToken {
    Hex(Vec<u8>),
    ArrayStart,
    ArrayEnd,
    Word(String),
}

impl CMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a ToUnicode CMap stream. Entries that cannot be read are
    /// skipped.
    pub fn parse(data: &[u8]) -> Self {
        let mut cmap = Self::new();
        let tokens = tokenize(data);
        let mut i = 0;

        while i < tokens.len() {
            match &tokens[i] {
                CMapToken::Word(word) if word == "begincodespacerange" => {
                    i += 1;
                    while let (Some(CMapToken::Hex(start)), Some(CMapToken::Hex(end))) =
                        (tokens.get(i), tokens.get(i + 1))
                    {
                        cmap.codespace_ranges.push(CodeRange {
                            start: start.clone(),
                            end: end.clone(),
                        });
                        i += 2;
                    }
                }
                CMapToken::Word(word) if word == "beginbfchar" => {
                    i += 1;
                    while let (Some(CMapToken::Hex(src)), Some(CMapToken::Hex(dst))) =
                        (tokens.get(i), tokens.get(i + 1))
                    {
                        cmap.single_mappings.insert(src.clone(), utf16_be(dst));
                        i += 2;
                    }
                }
                CMapToken::Word(word) if word == "beginbfrange" => {
                    i += 1;
                    while let (Some(CMapToken::Hex(start)), Some(CMapToken::Hex(end))) =
                        (tokens.get(i), tokens.get(i + 1))
                    {
                        i += 2;
                        match tokens.get(i) {
                            Some(CMapToken::Hex(dst)) => {
                                cmap.ranges.push(RangeMapping {
                                    start: code_value(start),
                                    end: code_value(end),
                                    code_len: start.len(),
                                    dst_start: dst.clone(),
                                });
                                i += 1;
                            }
                            Some(CMapToken::ArrayStart) => {
                                i += 1;
                                let mut code = code_value(start);
                                while let Some(CMapToken::Hex(dst)) = tokens.get(i) {
                                    cmap.single_mappings
                                        .insert(code_bytes(code, start.len()), utf16_be(dst));
                                    code += 1;
                                    i += 1;
                                }
                                if tokens.get(i) == Some(&CMapToken::ArrayEnd) {
                                    i += 1;
                                }
                            }
                            _ => break,
                        }
                    }
                }
                _ => i += 1,
            }
        }

        cmap
    }

    /// Length of the code starting at `bytes`, from the code space ranges.
    /// Without ranges, `default_len` is used.
    pub fn code_length(&self, bytes: &[u8], default_len: usize) -> usize {
        if self.codespace_ranges.is_empty() {
            return default_len.min(bytes.len()).max(1);
        }
        (1..=4)
            .filter(|&len| len <= bytes.len())
            .find(|&len| {
                self.codespace_ranges
                    .iter()
                    .any(|range| range.contains(&bytes[..len]))
            })
            .unwrap_or(1)
    }

    /// Unicode text for one character code
    pub fn lookup(&self, code: &[u8]) -> Option<String> {
        if let Some(text) = self.single_mappings.get(code) {
            return Some(text.clone());
        }

        let value = code_value(code);
        let range = self.ranges.iter().find(|range| {
            range.code_len == code.len() && range.start <= value && value <= range.end
        })?;

        let mut units: Vec<u16> = range
            .dst_start
            .chunks(2)
            .map(|pair| u16::from_be_bytes([pair[0], *pair.get(1).unwrap_or(&0)]))
            .collect();
        let last = units.last_mut()?;
        *last = last.wrapping_add((value - range.start) as u16);
        Some(String::from_utf16_lossy(&units))
    }
}

fn code_value(code: &[u8]) -> u32 {
    code.iter().fold(0, |acc, &byte| (acc << 8) | u32::from(byte))
}

fn code_bytes(value: u32, len: usize) -> Vec<u8> {
    value.to_be_bytes()[4 - len.min(4)..].to_vec()
}

fn utf16_be(bytes: &[u8]) -> String {
    let units: Vec<u16> = bytes
        .chunks(2)
        .map(|pair| u16::from_be_bytes([pair[0], *pair.get(1).unwrap_or(&0)]))
        .collect();
    String::from_utf16_lossy(&units)
}

fn tokenize(data: &[u8]) -> Vec<CMapToken> {
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < data.len() {
        match data[i] {
            b'%' => {
                while i < data.len() && data[i] != b'\n' && data[i] != b'\r' {
                    i += 1;
                }
            }
            b'<' if data.get(i + 1) == Some(&b'<') => i += 2,
            b'>' if data.get(i + 1) == Some(&b'>') => i += 2,
            b'<' => {
                let start = i + 1;
                let end = data[start..]
                    .iter()
                    .position(|&b| b == b'>')
                    .map_or(data.len(), |pos| start + pos);
                let digits: Vec<u8> = data[start..end]
                    .iter()
                    .filter(|b| b.is_ascii_hexdigit())
                    .copied()
                    .collect();
                let bytes = digits
                    .chunks(2)
                    .map(|pair| {
                        let high = hex_value(pair[0]);
                        let low = pair.get(1).map_or(0, |&b| hex_value(b));
                        (high << 4) | low
                    })
                    .collect();
                tokens.push(CMapToken::Hex(bytes));
                i = end + 1;
            }
            b'[' => {
                tokens.push(CMapToken::ArrayStart);
                i += 1;
            }
            b']' => {
                tokens.push(CMapToken::ArrayEnd);
                i += 1;
            }
            b if b.is_ascii_whitespace() => i += 1,
            _ => {
                let start = i;
                while i < data.len()
                    && !data[i].is_ascii_whitespace()
                    && !matches!(data[i], b'<' | b'>' | b'[' | b']' | b'%')
                {
                    i += 1;
                }
                if i == start {
                    i += 1;
                    continue;
                }
                tokens.push(CMapToken::Word(
                    String::from_utf8_lossy(&data[start..i]).into_owned(),
                ));
            }
        }
    }

    tokens
}

fn hex_value(digit: u8) -> u8 {
    match digit {
        b'0'..=b'9' => digit - b'0',
        b'a'..=b'f' => digit - b'a' + 10,
        b'A'..=b'F' => digit - b'A' + 10,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SAMPLE: &[u8] = b"/CIDInit /ProcSet findresource begin
12 dict begin
begincmap
/CMapName /Adobe-Identity-UCS def
1 begincodespacerange
<0000> <FFFF>
endcodespacerange
2 beginbfchar
<0003> <0020> <0011> <0041>
endbfchar
2 beginbfrange
<0024> <0026> <0061>
<0030> <0031> [<00480065> <0058>]
endbfrange
endcmap";

    #[test]
    fn test_bfchar_lookup() {
        let cmap = CMap::parse(SAMPLE);
        assert_eq!(cmap.lookup(&[0x00, 0x03]).as_deref(), Some(" "));
        assert_eq!(cmap.lookup(&[0x00, 0x11]).as_deref(), Some("A"));
    }

    #[test]
    fn test_bfrange_offset_and_array() {
        let cmap = CMap::parse(SAMPLE);
        assert_eq!(cmap.lookup(&[0x00, 0x25]).as_deref(), Some("b"));
        assert_eq!(cmap.lookup(&[0x00, 0x30]).as_deref(), Some("He"));
        assert_eq!(cmap.lookup(&[0x00, 0x31]).as_deref(), Some("X"));
        assert_eq!(cmap.lookup(&[0x00, 0x27]), None);
    }

    #[test]
    fn test_code_length_from_codespace() {
        let cmap = CMap::parse(SAMPLE);
        assert_eq!(cmap.code_length(&[0x00, 0x11, 0x00], 1), 2);

        let empty = CMap::new();
        assert_eq!(empty.code_length(&[0x41, 0x42], 1), 1);
        assert_eq!(empty.code_length(&[0x41], 2), 1);
    }

    #[test]
    fn test_code_range_contains() {
        let range = CodeRange {
            start: vec![0x81, 0x40],
            end: vec![0x9F, 0xFC],
        };
        assert!(range.contains(&[0x81, 0x40]));
        assert!(!range.contains(&[0x81, 0x30]));
        assert!(!range.contains(&[0x81]));
    }
}

//! PDF Cross-Reference Parser
//!
//! Parses classic xref tables (ISO 32000-1 Section 7.5.4) and cross-reference
//! streams (Section 7.5.8), following `/Prev` links and the `/XRefStm` entry of
//! hybrid files.

use super::filters::decode_to_bytes;
use super::lexer::{rfind_bytes, Lexer, Token};
use super::objects::{parse_indirect_object, parse_object};
use super::{ParseError, ParseResult};
use crate::objects::{Dictionary, Object};
use std::collections::{BTreeMap, HashSet};

/// `startxref` must sit near the end of the file
const STARTXREF_SEARCH_WINDOW: usize = 1024;

/// Cross-reference entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XRefEntry {
    /// Free-listed object number
    Free,
    /// Object stored at a byte offset
    InUse { offset: usize, generation: u16 },
    /// Object stored inside an object stream
    Compressed { stream_number: u32, index: u32 },
}

/// Merged cross-reference data of the whole chain
#[derive(Debug, Clone, Default)]
pub struct XRefTable {
    entries: BTreeMap<u32, XRefEntry>,
    trailer: Dictionary,
}

impl XRefTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_entry(&self, number: u32) -> Option<&XRefEntry> {
        self.entries.get(&number)
    }

    /// Add an entry unless a newer section already defined this number
    pub fn add_entry_if_absent(&mut self, number: u32, entry: XRefEntry) {
        self.entries.entry(number).or_insert(entry);
    }

    /// Add an entry, replacing any existing one
    pub fn set_entry(&mut self, number: u32, entry: XRefEntry) {
        self.entries.insert(number, entry);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&u32, &XRefEntry)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn trailer(&self) -> &Dictionary {
        &self.trailer
    }

    pub fn set_trailer(&mut self, trailer: Dictionary) {
        self.trailer = trailer;
    }

    /// Keys of an older trailer only fill gaps left by newer ones
    fn merge_trailer(&mut self, older: Dictionary) {
        for (key, value) in older {
            if matches!(key.as_str(), "Prev" | "XRefStm") {
                continue;
            }
            if !self.trailer.contains_key(&key) {
                self.trailer.set(key, value);
            }
        }
    }

    /// Parse the whole chain starting from the `startxref` offset.
    ///
    /// `base` is the header offset; offsets that do not land on a section are
    /// retried shifted by it.
    pub fn parse(data: &[u8], base: usize) -> ParseResult<Self> {
        let start = find_startxref(data)?;
        let mut table = XRefTable::new();
        let mut visited = HashSet::new();
        let mut next = Some(start);

        while let Some(offset) = next.take() {
            if !visited.insert(offset) {
                tracing::warn!("Cross-reference /Prev loop at offset {}", offset);
                break;
            }

            let section = parse_section(data, offset)
                .or_else(|err| match base {
                    0 => Err(err),
                    _ => parse_section(data, offset + base),
                })?;
            tracing::debug!(
                "Cross-reference section at {}: {} entries",
                offset,
                section.entries.len()
            );

            // Hybrid files: the stream describes the objects the table lists as free
            if let Some(stm_offset) = section.trailer.get_integer("XRefStm") {
                match usize::try_from(stm_offset).map(|o| parse_section(data, o)) {
                    Ok(Ok(stream_section)) => {
                        for (number, entry) in stream_section.entries {
                            table.add_entry_if_absent(number, entry);
                        }
                    }
                    _ => tracing::warn!("Ignoring unreadable /XRefStm at {}", stm_offset),
                }
            }

            next = section
                .trailer
                .get_integer("Prev")
                .and_then(|prev| usize::try_from(prev).ok());

            for (number, entry) in section.entries {
                table.add_entry_if_absent(number, entry);
            }
            table.merge_trailer(section.trailer);
        }

        if !table.trailer.contains_key("Root") {
            return Err(ParseError::BrokenXref("trailer has no /Root".to_string()));
        }

        Ok(table)
    }
}

/// One section of the chain before merging
struct Section {
    entries: Vec<(u32, XRefEntry)>,
    trailer: Dictionary,
}

/// Locate and read the `startxref` offset
pub fn find_startxref(data: &[u8]) -> ParseResult<usize> {
    let window_start = data.len().saturating_sub(STARTXREF_SEARCH_WINDOW);
    let position = rfind_bytes(&data[window_start..], b"startxref")
        .map(|p| window_start + p)
        .ok_or_else(|| ParseError::BrokenXref("startxref not found".to_string()))?;

    let mut lexer = Lexer::at(data, position);
    lexer.next_token()?;
    match lexer.next_token()? {
        Token::Integer(offset) if offset >= 0 && (offset as usize) < data.len() => {
            Ok(offset as usize)
        }
        other => Err(ParseError::BrokenXref(format!(
            "invalid startxref offset: {other:?}"
        ))),
    }
}

fn parse_section(data: &[u8], offset: usize) -> ParseResult<Section> {
    if offset >= data.len() {
        return Err(ParseError::BrokenXref(format!("offset {offset} past end of file")));
    }

    let mut lexer = Lexer::at(data, offset);
    match lexer.peek_token() {
        Ok(Token::Keyword(word)) if word == "xref" => {
            lexer.next_token()?;
            parse_classic_table(&mut lexer)
        }
        Ok(Token::Integer(_)) => parse_xref_stream(data, offset),
        other => Err(ParseError::BrokenXref(format!(
            "no cross-reference section at {offset}: {other:?}"
        ))),
    }
}

fn parse_classic_table(lexer: &mut Lexer<'_>) -> ParseResult<Section> {
    let mut entries = Vec::new();

    loop {
        match lexer.next_token()? {
            Token::Keyword(word) if word == "trailer" => break,
            Token::Integer(first) => {
                let count = match lexer.next_token()? {
                    Token::Integer(count) if count >= 0 => count,
                    other => {
                        return Err(ParseError::BrokenXref(format!(
                            "bad subsection header: {other:?}"
                        )))
                    }
                };
                for i in 0..count {
                    let number = u32::try_from(first + i)
                        .map_err(|_| ParseError::BrokenXref("object number overflow".into()))?;
                    entries.push((number, parse_table_entry(lexer)?));
                }
            }
            other => {
                return Err(ParseError::BrokenXref(format!(
                    "unexpected token in xref table: {other:?}"
                )))
            }
        }
    }

    let trailer = match parse_object(lexer)? {
        Object::Dictionary(dict) => dict,
        _ => return Err(ParseError::InvalidTrailer),
    };

    Ok(Section { entries, trailer })
}

/// `oooooooooo ggggg n` (line endings vary in the wild, so read tokens)
fn parse_table_entry(lexer: &mut Lexer<'_>) -> ParseResult<XRefEntry> {
    let offset = lexer.next_token()?;
    let generation = lexer.next_token()?;
    let kind = lexer.next_token()?;

    match (offset, generation, kind) {
        (Token::Integer(offset), Token::Integer(generation), Token::Keyword(kind)) => {
            match kind.as_str() {
                "n" => Ok(XRefEntry::InUse {
                    offset: usize::try_from(offset)
                        .map_err(|_| ParseError::BrokenXref("negative offset".into()))?,
                    generation: generation.clamp(0, i64::from(u16::MAX)) as u16,
                }),
                "f" => Ok(XRefEntry::Free),
                other => Err(ParseError::BrokenXref(format!("bad entry type '{other}'"))),
            }
        }
        entry => Err(ParseError::BrokenXref(format!("bad xref entry: {entry:?}"))),
    }
}

fn parse_xref_stream(data: &[u8], offset: usize) -> ParseResult<Section> {
    let (id, object) = parse_indirect_object(data, offset, &|_| None, true)?;
    let stream = match object {
        Object::Stream(stream) if stream.dict.has_type("XRef") => stream,
        _ => {
            return Err(ParseError::BrokenXref(format!(
                "object {id} is not a cross-reference stream"
            )))
        }
    };

    let widths: Vec<usize> = stream
        .dict
        .get("W")
        .and_then(Object::as_array)
        .map(|w| {
            w.iter()
                .map(|v| v.as_integer().unwrap_or(0).clamp(0, 8) as usize)
                .collect()
        })
        .filter(|w: &Vec<usize>| w.len() == 3)
        .ok_or_else(|| ParseError::MissingKey("W".to_string()))?;

    let size = stream.dict.get_integer("Size").unwrap_or(0);
    let index: Vec<i64> = match stream.dict.get("Index").and_then(Object::as_array) {
        Some(items) => items.iter().filter_map(Object::as_integer).collect(),
        None => vec![0, size],
    };

    let decoded = decode_to_bytes(&stream)?;
    let row_width: usize = widths.iter().sum();
    if row_width == 0 {
        return Err(ParseError::BrokenXref("zero-width xref stream rows".into()));
    }

    let mut rows = decoded.chunks_exact(row_width);
    let mut entries = Vec::new();
    for pair in index.chunks(2) {
        let (first, count) = match pair {
            [first, count] => (*first, *count),
            _ => break,
        };
        for i in 0..count.max(0) {
            let Some(row) = rows.next() else { break };
            let number = match u32::try_from(first + i) {
                Ok(number) => number,
                Err(_) => continue,
            };

            let (f1, rest) = row.split_at(widths[0]);
            let (f2, f3) = rest.split_at(widths[1]);
            // A zero-width type field defaults to type 1
            let kind = if widths[0] == 0 { 1 } else { read_field(f1) };
            let entry = match kind {
                0 => XRefEntry::Free,
                1 => XRefEntry::InUse {
                    offset: read_field(f2) as usize,
                    generation: read_field(f3).min(u64::from(u16::MAX)) as u16,
                },
                2 => XRefEntry::Compressed {
                    stream_number: read_field(f2) as u32,
                    index: read_field(f3) as u32,
                },
                // Unknown types are references to the null object
                _ => continue,
            };
            entries.push((number, entry));
        }
    }

    let mut trailer = stream.dict;
    for key in ["Length", "Filter", "DecodeParms", "W", "Index", "Type"] {
        trailer.remove(key);
    }

    Ok(Section { entries, trailer })
}

fn read_field(bytes: &[u8]) -> u64 {
    bytes.iter().fold(0u64, |acc, &b| (acc << 8) | u64::from(b))
}

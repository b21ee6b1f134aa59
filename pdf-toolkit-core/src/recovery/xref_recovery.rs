//! XRef recovery for damaged PDF files
//!
//! Rebuilds the cross-reference table by scanning the whole file for
//! `N G obj` headers. The last definition of an object number wins, matching
//! how incremental updates append newer versions.

use crate::objects::Object;
use crate::parser::lexer::{find_bytes, is_delimiter, is_whitespace, Lexer};
use crate::parser::objects::parse_object;
use crate::parser::xref::{XRefEntry, XRefTable};

/// Recovery statistics
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RecoveryStats {
    /// Number of object headers found
    pub objects_found: usize,
    /// Headers superseded by a later definition of the same number
    pub duplicates: usize,
    /// Whether a trailer dictionary was found
    pub trailer_found: bool,
}

/// XRef recovery engine
#[derive(Debug, Default)]
pub struct XRefRecovery {
    stats: RecoveryStats,
}

impl XRefRecovery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> &RecoveryStats {
        &self.stats
    }

    /// Scan `data` and build a cross-reference table from what is found.
    ///
    /// The returned trailer may lack `/Root`; the reader then looks for the
    /// catalog among the loaded objects.
    pub fn rebuild(&mut self, data: &[u8]) -> XRefTable {
        let mut table = XRefTable::new();

        for (number, generation, offset) in scan_object_headers(data) {
            self.stats.objects_found += 1;
            if table.get_entry(number).is_some() {
                self.stats.duplicates += 1;
            }
            table.set_entry(number, XRefEntry::InUse { offset, generation });
        }

        if let Some(trailer) = find_trailer(data) {
            self.stats.trailer_found = true;
            table.set_trailer(trailer);
        }

        tracing::debug!(
            "Recovered {} object headers ({} duplicates), trailer found: {}",
            self.stats.objects_found,
            self.stats.duplicates,
            self.stats.trailer_found
        );

        table
    }
}

/// All `N G obj` headers in file order as `(number, generation, offset)`
fn scan_object_headers(data: &[u8]) -> Vec<(u32, u16, usize)> {
    let mut headers = Vec::new();
    let mut pos = 0;

    while let Some(found) = find_bytes(&data[pos..], b"obj") {
        let keyword = pos + found;
        pos = keyword + 3;

        // Reject "endobj" and words that merely contain "obj"
        let followed_ok = data
            .get(keyword + 3)
            .map_or(true, |&b| is_whitespace(b) || is_delimiter(b));
        let preceded_ok = keyword > 0 && is_whitespace(data[keyword - 1]);
        if !followed_ok || !preceded_ok {
            continue;
        }

        if let Some(header) = parse_header_backwards(data, keyword) {
            headers.push(header);
        }
    }

    headers
}

/// Read `N G` right before the `obj` keyword at `keyword`
fn parse_header_backwards(data: &[u8], keyword: usize) -> Option<(u32, u16, usize)> {
    let (generation, gen_start) = read_number_backwards(data, keyword)?;
    let (number, num_start) = read_number_backwards(data, gen_start)?;

    // The object number must start a token
    if num_start > 0 && !is_whitespace(data[num_start - 1]) && !is_delimiter(data[num_start - 1]) {
        return None;
    }

    Some((
        u32::try_from(number).ok()?,
        u16::try_from(generation).ok()?,
        num_start,
    ))
}

/// Digits ending just before `end`, skipping whitespace first
fn read_number_backwards(data: &[u8], end: usize) -> Option<(u64, usize)> {
    let mut digits_end = end;
    while digits_end > 0 && is_whitespace(data[digits_end - 1]) {
        digits_end -= 1;
    }
    if digits_end == end {
        return None;
    }

    let mut start = digits_end;
    while start > 0 && data[start - 1].is_ascii_digit() && digits_end - start < 10 {
        start -= 1;
    }
    if start == digits_end {
        return None;
    }

    let text = std::str::from_utf8(&data[start..digits_end]).ok()?;
    Some((text.parse().ok()?, start))
}

/// Merge every `trailer` dictionary in the file, later ones taking precedence
fn find_trailer(data: &[u8]) -> Option<crate::objects::Dictionary> {
    let mut merged: Option<crate::objects::Dictionary> = None;
    let mut pos = 0;

    while let Some(found) = find_bytes(&data[pos..], b"trailer") {
        let start = pos + found + b"trailer".len();
        pos = start;

        let mut lexer = Lexer::at(data, start);
        if let Ok(Object::Dictionary(dict)) = parse_object(&mut lexer) {
            let combined = merged.get_or_insert_with(Default::default);
            for (key, value) in dict {
                if key != "Prev" {
                    combined.set(key, value);
                }
            }
        }
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objects::ObjectId;

    #[test]
    fn test_scan_object_headers() {
        let data = b"%PDF-1.4\n1 0 obj\n<< >>\nendobj\n12 3 obj (x) endobj\nnotobj 5 0 objx";
        let headers = scan_object_headers(data);
        assert_eq!(headers, vec![(1, 0, 9), (12, 3, 30)]);
    }

    #[test]
    fn test_rebuild_last_definition_wins() {
        let data = b"%PDF-1.4\n1 0 obj\n(old)\nendobj\n1 0 obj\n(new)\nendobj\n\
                     trailer\n<< /Root 1 0 R /Size 2 >>\n";
        let mut recovery = XRefRecovery::new();
        let table = recovery.rebuild(data);

        assert_eq!(
            table.get_entry(1),
            Some(&XRefEntry::InUse {
                offset: 30,
                generation: 0
            })
        );
        assert_eq!(recovery.stats().objects_found, 2);
        assert_eq!(recovery.stats().duplicates, 1);
        assert!(recovery.stats().trailer_found);
        assert_eq!(
            table.trailer().get_reference("Root"),
            Some(ObjectId::new(1, 0))
        );
    }

    #[test]
    fn test_rebuild_without_trailer() {
        let data = b"%PDF-1.4\n3 0 obj\n<< /Type /Catalog >>\nendobj\n";
        let mut recovery = XRefRecovery::new();
        let table = recovery.rebuild(data);
        assert_eq!(table.len(), 1);
        assert!(table.trailer().is_empty());
        assert!(!recovery.stats().trailer_found);
    }
}

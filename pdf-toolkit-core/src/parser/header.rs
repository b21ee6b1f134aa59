//! PDF header parsing (`%PDF-M.m`)

use super::lexer::find_bytes;
use super::{ParseError, ParseResult};
use std::fmt;

/// Producers sometimes prepend junk; the header must appear this early.
const HEADER_SEARCH_WINDOW: usize = 1024;

/// PDF version from the file header
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct PdfVersion {
    pub major: u8,
    pub minor: u8,
}

impl PdfVersion {
    pub fn new(major: u8, minor: u8) -> Self {
        Self { major, minor }
    }
}

impl Default for PdfVersion {
    fn default() -> Self {
        Self::new(1, 7)
    }
}

impl fmt::Display for PdfVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Parsed header: version plus the offset of `%PDF-`.
///
/// Cross-reference offsets are relative to that position when junk precedes
/// the header.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PdfHeader {
    pub version: PdfVersion,
    pub offset: usize,
}

impl PdfHeader {
    pub fn parse(data: &[u8]) -> ParseResult<Self> {
        let window = &data[..data.len().min(HEADER_SEARCH_WINDOW)];
        let offset = find_bytes(window, b"%PDF-").ok_or(ParseError::MalformedHeader)?;

        let rest = &data[offset + 5..];
        let version_len = rest
            .iter()
            .take_while(|b| b.is_ascii_digit() || **b == b'.')
            .count();
        let text = std::str::from_utf8(&rest[..version_len])
            .map_err(|_| ParseError::MalformedHeader)?;

        let (major, minor) = text.split_once('.').ok_or(ParseError::MalformedHeader)?;
        let major: u8 = major.parse().map_err(|_| ParseError::MalformedHeader)?;
        let minor: u8 = minor.parse().map_err(|_| ParseError::MalformedHeader)?;

        if !(1..=2).contains(&major) {
            return Err(ParseError::UnsupportedVersion(text.to_string()));
        }

        Ok(Self {
            version: PdfVersion::new(major, minor),
            offset,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_header_versions() {
        let header = PdfHeader::parse(b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n").unwrap();
        assert_eq!(header.version, PdfVersion::new(1, 4));
        assert_eq!(header.offset, 0);

        let header = PdfHeader::parse(b"%PDF-2.0\r\n").unwrap();
        assert_eq!(header.version.to_string(), "2.0");
    }

    #[test]
    fn test_parse_header_with_leading_junk() {
        let header = PdfHeader::parse(b"garbage\n%PDF-1.7\n").unwrap();
        assert_eq!(header.offset, 8);
        assert_eq!(header.version, PdfVersion::new(1, 7));
    }

    #[test]
    fn test_malformed_headers() {
        assert!(matches!(
            PdfHeader::parse(b"not a pdf"),
            Err(ParseError::MalformedHeader)
        ));
        assert!(matches!(
            PdfHeader::parse(b"%PDF-x.y"),
            Err(ParseError::MalformedHeader)
        ));
        assert!(matches!(PdfHeader::parse(b""), Err(ParseError::MalformedHeader)));
    }

    #[test]
    fn test_unsupported_version() {
        assert!(matches!(
            PdfHeader::parse(b"%PDF-3.0\n"),
            Err(ParseError::UnsupportedVersion(v)) if v == "3.0"
        ));
    }
}

//! # pdf-toolkit
//!
//! A pure Rust PDF toolkit: pull tables and images out of documents, split
//! them into pages, merge them, and apply or remove password protection.
//!
//! ## Features
//!
//! - **PDF Parsing**: Cross-reference tables and streams, object streams,
//!   incremental updates and recovery of damaged cross-reference data
//! - **Table Extraction**: Rows and cells rebuilt from positioned text and
//!   ruling lines
//! - **Image Extraction**: JPEG and JPEG 2000 passthrough, raw samples as PNG
//! - **Page Operations**: Split into single pages and merge documents
//! - **Encryption**: Standard security handler, RC4 40/128-bit, AES-128 and
//!   AES-256
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf_toolkit::{extract_tables, merge_pdfs, protect, split_pages, unprotect, Result};
//!
//! # fn main() -> Result<()> {
//! let bytes = std::fs::read("report.pdf")?;
//!
//! // Tables as rows of cell strings
//! for row in extract_tables(&bytes)? {
//!     println!("{}", row.cells.join(" | "));
//! }
//!
//! // One document per page, then back together
//! let pages = split_pages(&bytes)?;
//! let merged = merge_pdfs(&pages)?;
//!
//! // Password protection
//! let locked = protect(&merged, "secret")?;
//! let unlocked = unprotect(&locked, "secret")?;
//! # let _ = unlocked;
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`parser`] - Bytes to [`Document`]: lexer, cross-reference data, page tree,
//!   stream filters and content stream operators
//! - [`objects`] - In-memory object model
//! - [`operations`] - Page selection, split, merge, protection, image extraction
//! - [`text`] - Positioned text extraction and table reconstruction
//! - [`encryption`] - Standard security handler
//! - [`writer`] - Serialization back to bytes

pub mod document;
pub mod encryption;
pub mod error;
pub mod objects;
pub mod operations;
pub mod parser;
pub mod recovery;
pub mod text;
pub mod writer;

#[cfg(test)]
pub(crate) mod test_support;

pub use document::{Document, Encryption};
pub use encryption::{AuthError, EncryptionAlgorithm, Permissions};
pub use error::{PdfError, Result};
pub use objects::{Dictionary, Object, ObjectId, Stream};
pub use operations::{ExtractImagesOptions, ExtractedImage, ImageFormat, ProtectOptions};
pub use parser::header::PdfVersion;
pub use parser::{CodecError, ParseError, ParseOptions};
pub use text::{TableOptions, TableReconstructor, TableRow};

/// Current version of pdf-toolkit
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Rows of every table in the document, page by page, with one blank row
/// between tables
pub fn extract_tables(pdf_bytes: &[u8]) -> Result<Vec<TableRow>> {
    extract_tables_with_options(pdf_bytes, ParseOptions::default(), TableOptions::default())
}

/// [`extract_tables`] with explicit parse and reconstruction options
pub fn extract_tables_with_options(
    pdf_bytes: &[u8],
    parse_options: ParseOptions,
    table_options: TableOptions,
) -> Result<Vec<TableRow>> {
    let document = Document::load_with_options(pdf_bytes, parse_options)?;
    let rows = TableReconstructor::new(table_options).reconstruct_document(&document)?;
    Ok(rows)
}

/// Images of every page, numbered from 1 in page order. Images that
/// cannot be decoded are skipped.
pub fn extract_images(pdf_bytes: &[u8]) -> Result<Vec<ExtractedImage>> {
    extract_images_with_options(
        pdf_bytes,
        ParseOptions::default(),
        ExtractImagesOptions::default(),
    )
}

/// [`extract_images`] with explicit parse and extraction options
pub fn extract_images_with_options(
    pdf_bytes: &[u8],
    parse_options: ParseOptions,
    options: ExtractImagesOptions,
) -> Result<Vec<ExtractedImage>> {
    let document = Document::load_with_options(pdf_bytes, parse_options)?;
    let images = operations::extract_images_from_document(&document, options)?;
    Ok(images)
}

/// One serialized single-page document per page, in page order
pub fn split_pages(pdf_bytes: &[u8]) -> Result<Vec<Vec<u8>>> {
    split_pages_with_options(pdf_bytes, ParseOptions::default())
}

pub fn split_pages_with_options(
    pdf_bytes: &[u8],
    parse_options: ParseOptions,
) -> Result<Vec<Vec<u8>>> {
    let document = Document::load_with_options(pdf_bytes, parse_options)?;
    operations::split_document(&document)?
        .iter()
        .map(Document::save_to_bytes)
        .collect()
}

/// Pages of all inputs, in input order, as one document
pub fn merge_pdfs<B: AsRef<[u8]>>(inputs: &[B]) -> Result<Vec<u8>> {
    let documents = inputs
        .iter()
        .map(|bytes| Document::load(bytes.as_ref()))
        .collect::<std::result::Result<Vec<_>, _>>()?;
    operations::merge_documents(&documents)?.save_to_bytes()
}

/// Encrypt with `password` as the user password, RC4 128-bit and all
/// permissions. Already encrypted input is rejected.
pub fn protect(pdf_bytes: &[u8], password: &str) -> Result<Vec<u8>> {
    protect_with_options(pdf_bytes, password, &ProtectOptions::default())
}

pub fn protect_with_options(
    pdf_bytes: &[u8],
    password: &str,
    options: &ProtectOptions,
) -> Result<Vec<u8>> {
    // Encrypted input opened with the same password fails as already
    // encrypted rather than as a wrong password
    let document =
        Document::load_with_options(pdf_bytes, ParseOptions::default().with_password(password))?;
    operations::add_encryption(&document, password, options)?.save_to_bytes()
}

/// Decrypt with `password`, which may be the user or the owner password.
/// Fails with [`AuthError::WrongPassword`] when it opens neither.
pub fn unprotect(pdf_bytes: &[u8], password: &str) -> Result<Vec<u8>> {
    let document =
        Document::load_with_options(pdf_bytes, ParseOptions::default().with_password(password))?;
    operations::remove_encryption(&document, password)?.save_to_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{document_with_contents, page_text_marker, sample_document};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_version_info() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_extract_tables_entry_point() {
        let bytes = document_with_contents(&[
            "BT /F1 10 Tf 72 700 Td (Item) Tj 100 0 Td (Qty) Tj 0 -14 Td (7) Tj -100 0 Td (Bolt) Tj ET",
        ])
        .save_to_bytes()
        .unwrap();

        let rows = extract_tables(&bytes).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].cells, vec!["Item", "Qty"]);
        assert_eq!(rows[1].cells, vec!["Bolt", "7"]);
        assert!(rows[0].is_header());
        assert!(rows[1].is_header());
    }

    #[test]
    fn test_split_then_merge() {
        let bytes = sample_document("Doc", 3).save_to_bytes().unwrap();
        let pages = split_pages(&bytes).unwrap();
        assert_eq!(pages.len(), 3);

        let merged = Document::load(&merge_pdfs(&pages).unwrap()).unwrap();
        assert_eq!(merged.page_count(), 3);
        for index in 0..3 {
            assert_eq!(page_text_marker(&merged, index), format!("Page {}", index + 1));
        }
    }

    #[test]
    fn test_protect_unprotect() {
        let bytes = sample_document("Doc", 1).save_to_bytes().unwrap();
        let locked = protect(&bytes, "pw").unwrap();

        let error = unprotect(&locked, "wrong").unwrap_err();
        assert!(error.is_wrong_password());

        let again = protect(&locked, "pw").unwrap_err();
        assert!(matches!(
            again,
            PdfError::Operation(operations::OperationError::AlreadyEncrypted)
        ));

        let unlocked = Document::load(&unprotect(&locked, "pw").unwrap()).unwrap();
        assert!(!unlocked.is_encrypted());
        assert_eq!(page_text_marker(&unlocked, 0), "Page 1");
    }

    #[test]
    fn test_merge_rejects_empty_input() {
        let inputs: [Vec<u8>; 0] = [];
        assert!(matches!(
            merge_pdfs(&inputs),
            Err(PdfError::Operation(operations::OperationError::EmptyInput))
        ));
    }
}

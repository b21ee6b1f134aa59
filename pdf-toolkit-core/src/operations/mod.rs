//! PDF operations module
//!
//! High-level operations over parsed documents: page selection, splitting,
//! merging, applying and removing password protection, and image
//! extraction. Every operation reads a [`Document`](crate::Document) and
//! builds a new one; the source is never modified.

pub mod extract_images;
pub mod merge;
pub mod page_extraction;
pub mod protect;
pub mod split;

pub use extract_images::{
    extract_images_from_document, ExtractImagesOptions, ExtractedImage, ImageExtractor, ImageFormat,
};
pub use merge::{merge_documents, MergeOptions, PdfMerger};
pub use page_extraction::{select_pages, PageExtractionOptions, PageExtractor};
pub use protect::{add_encryption, remove_encryption, ProtectOptions};
pub use split::{split_document, PdfSplitter};

use crate::encryption::AuthError;
use crate::parser::{CodecError, ParseError};

/// Result type for operations
pub type OperationResult<T> = Result<T, OperationError>;

/// Operation-specific errors
#[derive(Debug, thiserror::Error)]
pub enum OperationError {
    /// Page index out of bounds
    #[error("Page index {0} out of bounds (document has {1} pages)")]
    PageIndexOutOfBounds(usize, usize),

    /// No pages to process
    #[error("No pages to process")]
    NoPagesToProcess,

    /// Protecting a document that already carries encryption
    #[error("Document is already encrypted")]
    AlreadyEncrypted,

    /// No input documents
    #[error("No input documents")]
    EmptyInput,

    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Auth(#[from] AuthError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_error_variants() {
        let errors = vec![
            OperationError::PageIndexOutOfBounds(5, 3),
            OperationError::NoPagesToProcess,
            OperationError::AlreadyEncrypted,
            OperationError::EmptyInput,
            OperationError::Parse(ParseError::MalformedHeader),
            OperationError::Auth(AuthError::WrongPassword),
        ];

        for error in errors {
            let message = error.to_string();
            assert!(!message.is_empty());
        }
    }

    #[test]
    fn test_page_index_message() {
        assert_eq!(
            OperationError::PageIndexOutOfBounds(5, 3).to_string(),
            "Page index 5 out of bounds (document has 3 pages)"
        );
    }
}

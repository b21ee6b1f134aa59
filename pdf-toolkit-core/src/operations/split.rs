//! PDF splitting functionality
//!
//! Splits a document into single-page documents.

use super::page_extraction::{PageExtractionOptions, PageExtractor};
use super::{OperationError, OperationResult};
use crate::Document;

/// PDF splitter
pub struct PdfSplitter<'a> {
    extractor: PageExtractor<'a>,
    total_pages: usize,
}

impl<'a> PdfSplitter<'a> {
    pub fn new(source: &'a Document) -> Self {
        Self::with_options(source, PageExtractionOptions::default())
    }

    pub fn with_options(source: &'a Document, options: PageExtractionOptions) -> Self {
        Self {
            extractor: PageExtractor::with_options(source, options),
            total_pages: source.page_count(),
        }
    }

    /// One document per source page, in page order
    pub fn split(&self) -> OperationResult<Vec<Document>> {
        if self.total_pages == 0 {
            return Err(OperationError::NoPagesToProcess);
        }

        (0..self.total_pages)
            .map(|index| self.extractor.extract_page(index))
            .collect()
    }
}

/// Split `doc` into single-page documents
pub fn split_document(doc: &Document) -> OperationResult<Vec<Document>> {
    PdfSplitter::new(doc).split()
}

//! PDF merging functionality
//!
//! Concatenates the pages of several documents into one. Each input is
//! copied through its own object map, so no objects are shared between
//! inputs in the result.

use super::page_extraction::{ObjectCopier, PageExtractionOptions};
use super::{OperationError, OperationResult};
use crate::Document;

/// Options for PDF merging
#[derive(Debug, Clone)]
pub struct MergeOptions {
    /// Copy the `/Info` dictionary of the first input
    pub preserve_metadata: bool,
    /// Whether to keep `/Annots` on merged pages
    pub preserve_annotations: bool,
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self {
            preserve_metadata: true,
            preserve_annotations: true,
        }
    }
}

/// PDF merger
pub struct PdfMerger<'a> {
    inputs: Vec<&'a Document>,
    options: MergeOptions,
}

impl<'a> PdfMerger<'a> {
    pub fn new(options: MergeOptions) -> Self {
        Self {
            inputs: Vec::new(),
            options,
        }
    }

    /// Add an input document to merge
    pub fn add_input(&mut self, input: &'a Document) {
        self.inputs.push(input);
    }

    /// Add multiple input documents
    pub fn add_inputs(&mut self, inputs: impl IntoIterator<Item = &'a Document>) {
        self.inputs.extend(inputs);
    }

    /// Merge all inputs into a single document, pages in input order
    pub fn merge(&self) -> OperationResult<Document> {
        if self.inputs.is_empty() {
            return Err(OperationError::EmptyInput);
        }

        let extraction = PageExtractionOptions {
            preserve_metadata: self.options.preserve_metadata,
            preserve_annotations: self.options.preserve_annotations,
        };

        let mut output = Document::new();
        if let Some(version) = self.inputs.iter().map(|doc| doc.version()).max() {
            output.set_version(version);
        }

        for (input_idx, input) in self.inputs.iter().enumerate() {
            let mut copier = ObjectCopier::new(input, input.page_ids(), &extraction);
            copier.append_pages(&mut output)?;

            if input_idx == 0 && self.options.preserve_metadata {
                copier.copy_info(&mut output);
            }

            tracing::debug!(
                "Merged input {} ({} pages, {} objects)",
                input_idx,
                input.page_count(),
                copier.copied_count()
            );
        }

        Ok(output)
    }
}

/// Merge `docs` in order into one document
pub fn merge_documents(docs: &[Document]) -> OperationResult<Document> {
    let mut merger = PdfMerger::new(MergeOptions::default());
    merger.add_inputs(docs);
    merger.merge()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objects::Object;
    use crate::test_support::{page_text_marker, sample_document};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_merge_ordering() {
        let a = sample_document("A", 2);
        let b = sample_document("B", 1);

        let merged = merge_documents(&[a, b]).unwrap();
        assert_eq!(merged.page_count(), 3);
        assert_eq!(page_text_marker(&merged, 0), "Page 1");
        assert_eq!(page_text_marker(&merged, 1), "Page 2");
        assert_eq!(page_text_marker(&merged, 2), "Page 1");
    }

    #[test]
    fn test_merge_empty_input() {
        assert!(matches!(
            merge_documents(&[]),
            Err(OperationError::EmptyInput)
        ));
    }

    #[test]
    fn test_merge_keeps_first_metadata() {
        let merged = merge_documents(&[sample_document("First", 1), sample_document("Second", 1)])
            .unwrap();
        assert_eq!(
            merged.info().and_then(|info| info.get("Title")),
            Some(&Object::String(b"First".to_vec()))
        );
    }

    #[test]
    fn test_merge_does_not_share_objects_between_inputs() {
        let a = sample_document("A", 1);
        let b = sample_document("B", 1);
        let merged = merge_documents(&[a, b]).unwrap();

        let fonts = merged
            .objects()
            .values()
            .filter(|object| object.as_dict().is_some_and(|dict| dict.has_type("Font")))
            .count();
        assert_eq!(fonts, 2);
    }

    #[test]
    fn test_merge_output_reloads() {
        let merged = merge_documents(&[sample_document("A", 2), sample_document("B", 2)]).unwrap();
        let bytes = merged.save_to_bytes().unwrap();
        let reloaded = Document::load(&bytes).unwrap();

        assert_eq!(reloaded.page_count(), 4);
        assert_eq!(page_text_marker(&reloaded, 3), "Page 2");
    }
}

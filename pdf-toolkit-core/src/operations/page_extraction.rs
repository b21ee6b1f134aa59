//! Page extraction functionality
//!
//! Builds a new document from a selection of pages of a source document.
//! Pages are copied together with everything they reference (content
//! streams, fonts, images, annotations), each object at most once, into a
//! fresh object numbering.

use super::{OperationError, OperationResult};
use crate::objects::{Dictionary, Object, ObjectId, Stream};
use crate::parser::page_tree::{inherited_attribute, INHERITABLE_KEYS};
use crate::Document;
use std::collections::{HashMap, HashSet};

/// Options for page extraction
#[derive(Debug, Clone)]
pub struct PageExtractionOptions {
    /// Whether to copy the source's `/Info` dictionary
    pub preserve_metadata: bool,
    /// Whether to keep `/Annots` on copied pages
    pub preserve_annotations: bool,
}

impl Default for PageExtractionOptions {
    fn default() -> Self {
        Self {
            preserve_metadata: true,
            preserve_annotations: true,
        }
    }
}

/// Page extractor for building documents from pages of a source document
pub struct PageExtractor<'a> {
    source: &'a Document,
    options: PageExtractionOptions,
}

impl<'a> PageExtractor<'a> {
    pub fn new(source: &'a Document) -> Self {
        Self {
            source,
            options: PageExtractionOptions::default(),
        }
    }

    pub fn with_options(source: &'a Document, options: PageExtractionOptions) -> Self {
        Self { source, options }
    }

    /// Extract a single page to a new document
    pub fn extract_page(&self, page_index: usize) -> OperationResult<Document> {
        self.extract_pages(&[page_index])
    }

    /// Extract pages, in the given order, to a new document
    pub fn extract_pages(&self, page_indices: &[usize]) -> OperationResult<Document> {
        let total_pages = self.source.page_count();

        // Validate all indices first
        for &idx in page_indices {
            if idx >= total_pages {
                return Err(OperationError::PageIndexOutOfBounds(idx, total_pages));
            }
        }

        if page_indices.is_empty() {
            return Err(OperationError::NoPagesToProcess);
        }

        let page_ids: Vec<ObjectId> = page_indices
            .iter()
            .map(|&idx| self.source.page_ids()[idx])
            .collect();

        let mut doc = Document::new();
        doc.set_version(self.source.version());

        let mut copier = ObjectCopier::new(self.source, &page_ids, &self.options);
        copier.append_pages(&mut doc)?;
        if self.options.preserve_metadata {
            copier.copy_info(&mut doc);
        }

        tracing::debug!(
            "Extracted {} pages ({} objects copied)",
            page_ids.len(),
            copier.copied_count()
        );
        Ok(doc)
    }
}

/// Build a document holding the pages at `indices` (0-based) of `doc`
pub fn select_pages(doc: &Document, indices: &[usize]) -> OperationResult<Document> {
    PageExtractor::new(doc).extract_pages(indices)
}

/// Reachability copy of objects from one source document into a
/// destination document.
///
/// Each source object is copied at most once; the `source id ->
/// destination id` entry is recorded when the reference is first seen and
/// the object is queued, so reference chains of any length and cycles
/// terminate without recursion. Page tree nodes are never followed: a
/// reference to a page outside the selection becomes null.
pub(crate) struct ObjectCopier<'a> {
    source: &'a Document,
    selection: Vec<ObjectId>,
    selected: HashSet<ObjectId>,
    preserve_annotations: bool,
    id_map: HashMap<ObjectId, ObjectId>,
    pending: Vec<(ObjectId, ObjectId)>,
}

impl<'a> ObjectCopier<'a> {
    pub(crate) fn new(
        source: &'a Document,
        selection: &[ObjectId],
        options: &PageExtractionOptions,
    ) -> Self {
        Self {
            source,
            selection: selection.to_vec(),
            selected: selection.iter().copied().collect(),
            preserve_annotations: options.preserve_annotations,
            id_map: HashMap::new(),
            pending: Vec::new(),
        }
    }

    pub(crate) fn copied_count(&self) -> usize {
        self.id_map.len()
    }

    /// Copy the selected pages and append them to `dest`'s page tree in
    /// selection order. A page selected twice is appended as two page
    /// objects sharing their resources.
    pub(crate) fn append_pages(&mut self, dest: &mut Document) -> OperationResult<()> {
        let mut appended = HashSet::new();
        for page_id in self.selection.clone() {
            let mut new_id = self.enqueue(dest, page_id);
            self.drain(dest);
            if !appended.insert(new_id) {
                let duplicate = dest.get(new_id).cloned().unwrap_or(Object::Null);
                new_id = dest.add_object(duplicate);
            }
            dest.append_page(new_id)?;
        }
        Ok(())
    }

    /// Copy the source's `/Info` dictionary into `dest`'s trailer
    pub(crate) fn copy_info(&mut self, dest: &mut Document) {
        let Some(info) = self.source.trailer().get("Info") else {
            return;
        };
        let copied = self.copy_value(dest, info);
        self.drain(dest);
        match copied {
            Object::Reference(id) => dest.trailer_mut().set("Info", id),
            Object::Dictionary(dict) => {
                let id = dest.add_object(dict);
                dest.trailer_mut().set("Info", id);
            }
            _ => tracing::warn!("Ignoring /Info that is not a dictionary"),
        }
    }

    /// Reserve a destination id for `source_id` and queue its copy
    fn enqueue(&mut self, dest: &mut Document, source_id: ObjectId) -> ObjectId {
        if let Some(&existing) = self.id_map.get(&source_id) {
            return existing;
        }
        let new_id = ObjectId::new(dest.max_object_number() + 1, 0);
        dest.set_object(new_id, Object::Null);
        self.id_map.insert(source_id, new_id);
        self.pending.push((source_id, new_id));
        new_id
    }

    fn drain(&mut self, dest: &mut Document) {
        while let Some((source_id, new_id)) = self.pending.pop() {
            let copied = if self.selected.contains(&source_id) {
                self.copy_page(dest, source_id)
            } else {
                match self.source.get(source_id) {
                    Some(object) => self.copy_value(dest, object),
                    None => Object::Null,
                }
            };
            dest.set_object(new_id, copied);
        }
    }

    /// Copy one page, materializing inherited attributes on it. `/Parent`
    /// is left for [`Document::append_page`] to set.
    fn copy_page(&mut self, dest: &mut Document, page_id: ObjectId) -> Object {
        let Some(source_page) = self.source.get(page_id).and_then(Object::as_dict) else {
            return Object::Null;
        };

        let mut page = Dictionary::new();
        for (key, value) in source_page.iter() {
            match key.as_str() {
                "Parent" => continue,
                "Annots" if !self.preserve_annotations => continue,
                _ => {
                    let copied = self.copy_value(dest, value);
                    page.set(key.clone(), copied);
                }
            }
        }

        for key in INHERITABLE_KEYS {
            if page.contains_key(key) {
                continue;
            }
            if let Some(value) = inherited_attribute(self.source.objects(), page_id, key) {
                let copied = self.copy_value(dest, value);
                page.set(key, copied);
            }
        }

        Object::Dictionary(page)
    }

    fn copy_reference(&mut self, dest: &mut Document, id: ObjectId) -> Object {
        if let Some(&mapped) = self.id_map.get(&id) {
            return Object::Reference(mapped);
        }

        let Some(object) = self.source.get(id) else {
            tracing::warn!("Dropping reference to missing object {}", id);
            return Object::Null;
        };

        if let Some(dict) = object.as_dict() {
            if dict.has_type("Page") && !self.selected.contains(&id) {
                return Object::Null;
            }
            if dict.has_type("Pages") || dict.has_type("Catalog") {
                return Object::Null;
            }
        }

        Object::Reference(self.enqueue(dest, id))
    }

    fn copy_value(&mut self, dest: &mut Document, object: &Object) -> Object {
        match object {
            Object::Reference(id) => self.copy_reference(dest, *id),
            Object::Array(items) => Object::Array(
                items
                    .iter()
                    .map(|item| self.copy_value(dest, item))
                    .collect(),
            ),
            Object::Dictionary(dict) => Object::Dictionary(self.copy_dict(dest, dict)),
            Object::Stream(stream) => Object::Stream(Stream::new(
                self.copy_dict(dest, &stream.dict),
                stream.data.clone(),
            )),
            direct => direct.clone(),
        }
    }

    fn copy_dict(&mut self, dest: &mut Document, dict: &Dictionary) -> Dictionary {
        dict.iter()
            .map(|(key, value)| (key.clone(), self.copy_value(dest, value)))
            .collect()
    }
}

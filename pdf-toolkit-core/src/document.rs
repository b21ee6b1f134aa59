//! In-memory PDF document
//!
//! A [`Document`] is an arena of indirect objects keyed by [`ObjectId`]. All
//! cross-references are plain [`Object::Reference`] values looked up in that
//! arena, so the cyclic object graph of a PDF never needs shared ownership.

use crate::encryption::{EncryptionKey, EncryptionState};
use crate::error::Result;
use crate::objects::{Dictionary, Object, ObjectId};
use crate::parser::filters::decode_to_bytes;
use crate::parser::header::PdfVersion;
use crate::parser::page_tree::inherited_attribute;
use crate::parser::{ParseError, ParseOptions, ParseResult, PdfReader};
use crate::writer::PdfWriter;
use std::collections::BTreeMap;

/// Reference chains longer than this resolve to null
const MAX_RESOLVE_DEPTH: usize = 32;

/// Security handler state of an encrypted document: the encryption
/// dictionary and the authenticated file key
#[derive(Debug, Clone)]
pub struct Encryption {
    pub state: EncryptionState,
    pub key: EncryptionKey,
}

#[derive(Debug, Clone)]
pub struct Document {
    version: PdfVersion,
    objects: BTreeMap<ObjectId, Object>,
    trailer: Dictionary,
    pages: Vec<ObjectId>,
    encryption: Option<Encryption>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Empty document: a catalog (object 1) and a page tree root with no
    /// kids (object 2)
    pub fn new() -> Self {
        let catalog_id = ObjectId::new(1, 0);
        let pages_id = ObjectId::new(2, 0);

        let mut catalog = Dictionary::new();
        catalog.set("Type", Object::Name("Catalog".to_string()));
        catalog.set("Pages", pages_id);

        let mut pages = Dictionary::new();
        pages.set("Type", Object::Name("Pages".to_string()));
        pages.set("Kids", Object::Array(Vec::new()));
        pages.set("Count", 0i64);

        let mut objects = BTreeMap::new();
        objects.insert(catalog_id, Object::Dictionary(catalog));
        objects.insert(pages_id, Object::Dictionary(pages));

        let mut trailer = Dictionary::new();
        trailer.set("Root", catalog_id);

        Self {
            version: PdfVersion::default(),
            objects,
            trailer,
            pages: Vec::new(),
            encryption: None,
        }
    }

    pub(crate) fn from_parts(
        version: PdfVersion,
        objects: BTreeMap<ObjectId, Object>,
        trailer: Dictionary,
        pages: Vec<ObjectId>,
        encryption: Option<Encryption>,
    ) -> Self {
        Self {
            version,
            objects,
            trailer,
            pages,
            encryption,
        }
    }

    /// Parse a document with default options (empty password, lenient
    /// stream lengths, cross-reference recovery)
    pub fn load(data: &[u8]) -> ParseResult<Self> {
        Self::load_with_options(data, ParseOptions::default())
    }

    pub fn load_with_options(data: &[u8], options: ParseOptions) -> ParseResult<Self> {
        PdfReader::new(data, options).parse()
    }

    /// Serialize the document. An encrypted document is written encrypted.
    pub fn save_to_bytes(&self) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        PdfWriter::new_with_writer(&mut buffer).write_document(self)?;
        Ok(buffer)
    }

    pub fn version(&self) -> PdfVersion {
        self.version
    }

    pub fn set_version(&mut self, version: PdfVersion) {
        self.version = version;
    }

    pub fn objects(&self) -> &BTreeMap<ObjectId, Object> {
        &self.objects
    }

    pub fn get(&self, id: ObjectId) -> Option<&Object> {
        self.objects.get(&id)
    }

    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut Object> {
        self.objects.get_mut(&id)
    }

    /// Like [`Document::get`], failing with a dangling-reference error
    pub fn get_required(&self, id: ObjectId) -> ParseResult<&Object> {
        self.objects.get(&id).ok_or_else(|| ParseError::dangling(id))
    }

    /// Follow references until a direct object. Missing targets and overly
    /// long chains resolve to null.
    pub fn resolve<'a>(&'a self, object: &'a Object) -> &'a Object {
        let mut current = object;
        for _ in 0..MAX_RESOLVE_DEPTH {
            match current {
                Object::Reference(id) => match self.objects.get(id) {
                    Some(target) => current = target,
                    None => return &Object::Null,
                },
                direct => return direct,
            }
        }
        &Object::Null
    }

    /// Resolve `key` of `dict` to a direct dictionary
    pub fn resolve_dict<'a>(&'a self, dict: &'a Dictionary, key: &str) -> Option<&'a Dictionary> {
        dict.get(key).map(|value| self.resolve(value)).and_then(Object::as_dict)
    }

    /// Insert an object under a fresh id
    pub fn add_object(&mut self, object: impl Into<Object>) -> ObjectId {
        let id = ObjectId::new(self.max_object_number() + 1, 0);
        self.objects.insert(id, object.into());
        id
    }

    pub fn set_object(&mut self, id: ObjectId, object: impl Into<Object>) {
        self.objects.insert(id, object.into());
    }

    pub fn max_object_number(&self) -> u32 {
        self.objects
            .last_key_value()
            .map_or(0, |(id, _)| id.number())
    }

    pub fn trailer(&self) -> &Dictionary {
        &self.trailer
    }

    pub fn trailer_mut(&mut self) -> &mut Dictionary {
        &mut self.trailer
    }

    pub fn catalog_id(&self) -> Option<ObjectId> {
        self.trailer.get_reference("Root")
    }

    pub fn catalog(&self) -> Option<&Dictionary> {
        self.get(self.catalog_id()?)?.as_dict()
    }

    /// Document information dictionary
    pub fn info(&self) -> Option<&Dictionary> {
        self.trailer
            .get("Info")
            .map(|info| self.resolve(info))
            .and_then(Object::as_dict)
    }

    /// Root of the page tree
    pub fn pages_root_id(&self) -> Option<ObjectId> {
        self.catalog()?.get_reference("Pages")
    }

    /// Page object ids in document order
    pub fn page_ids(&self) -> &[ObjectId] {
        &self.pages
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn page(&self, index: usize) -> Option<&Dictionary> {
        self.get(*self.pages.get(index)?)?.as_dict()
    }

    /// Append an existing page object to the page tree root
    pub fn append_page(&mut self, page_id: ObjectId) -> ParseResult<()> {
        let pages_id = self
            .pages_root_id()
            .ok_or_else(|| ParseError::MissingKey("Pages".to_string()))?;
        let count = self.pages.len() as i64 + 1;

        let root = self
            .objects
            .get_mut(&pages_id)
            .and_then(Object::as_dict_mut)
            .ok_or_else(|| ParseError::dangling(pages_id))?;
        match root.get_mut("Kids") {
            Some(Object::Array(kids)) => kids.push(Object::Reference(page_id)),
            _ => root.set("Kids", Object::Array(vec![Object::Reference(page_id)])),
        }
        root.set("Count", count);

        if let Some(page) = self.objects.get_mut(&page_id).and_then(Object::as_dict_mut) {
            page.set("Parent", pages_id);
        }
        self.pages.push(page_id);
        Ok(())
    }

    /// Page attribute, inherited from ancestors for `/Resources`,
    /// `/MediaBox`, `/CropBox` and `/Rotate`, with references resolved
    pub fn page_attribute(&self, page_id: ObjectId, key: &str) -> Option<&Object> {
        inherited_attribute(&self.objects, page_id, key).map(|value| self.resolve(value))
    }

    pub fn page_resources(&self, page_id: ObjectId) -> Option<&Dictionary> {
        self.page_attribute(page_id, "Resources")?.as_dict()
    }

    /// Decoded page content: every `/Contents` stream concatenated in order,
    /// separated by a newline.
    ///
    /// A content stream that cannot be decoded fails the whole page.
    pub fn page_contents(&self, page_id: ObjectId) -> ParseResult<Vec<u8>> {
        let page = self
            .get_required(page_id)?
            .as_dict()
            .ok_or_else(|| ParseError::syntax(0, format!("Page {page_id} is not a dictionary")))?;

        let refs: Vec<&Object> = match page.get("Contents") {
            None => return Ok(Vec::new()),
            Some(contents) => match self.resolve(contents) {
                Object::Array(items) => items.iter().collect(),
                _ => vec![contents],
            },
        };

        let mut content = Vec::new();
        for item in refs {
            let stream = match item {
                Object::Reference(id) => self.get_required(*id)?.as_stream(),
                direct => direct.as_stream(),
            }
            .ok_or_else(|| {
                ParseError::syntax(0, format!("Page {page_id} has a non-stream /Contents entry"))
            })?;

            content.extend_from_slice(&decode_to_bytes(stream)?);
            content.push(b'\n');
        }
        Ok(content)
    }

    pub fn is_encrypted(&self) -> bool {
        self.encryption.is_some()
    }

    pub fn encryption(&self) -> Option<&Encryption> {
        self.encryption.as_ref()
    }

    pub(crate) fn set_encryption(&mut self, encryption: Option<Encryption>) {
        self.encryption = encryption;
    }
}

//! High-level PDF Reader API
//!
//! Turns a byte buffer into a [`Document`]: header, cross-reference chain
//! (or a rebuilt table when the chain is broken), every indirect object,
//! decryption and the page order.

use super::header::PdfHeader;
use super::object_stream::ObjectStream;
use super::objects::parse_indirect_object;
use super::page_tree::collect_pages;
use super::xref::{XRefEntry, XRefTable};
use super::{ParseError, ParseResult};
use crate::document::{Document, Encryption};
use crate::encryption::{authenticate, EncryptionState, ObjectEncryptor};
use crate::objects::{Dictionary, Object, ObjectId};
use crate::recovery::XRefRecovery;
use std::collections::{BTreeMap, HashSet};

/// Parsing options
#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// Password for encrypted documents; the empty user password is tried
    /// when unset
    pub password: Option<String>,
    /// Recover stream payloads with a missing or wrong `/Length` by scanning
    /// for `endstream`
    pub lenient_streams: bool,
    /// Rebuild the cross-reference table by scanning the file when the
    /// chain cannot be read
    pub recover_xref: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self::lenient()
    }
}

impl ParseOptions {
    /// Tolerate bad stream lengths and broken cross-reference data
    pub fn lenient() -> Self {
        Self {
            password: None,
            lenient_streams: true,
            recover_xref: true,
        }
    }

    /// Fail on the first structural problem
    pub fn strict() -> Self {
        Self {
            password: None,
            lenient_streams: false,
            recover_xref: false,
        }
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    pub fn with_lenient_streams(mut self, lenient: bool) -> Self {
        self.lenient_streams = lenient;
        self
    }

    pub fn with_recover_xref(mut self, recover: bool) -> Self {
        self.recover_xref = recover;
        self
    }
}

/// Objects and trailer loaded through one cross-reference table
struct Loaded {
    xref: XRefTable,
    objects: BTreeMap<ObjectId, Object>,
    trailer: Dictionary,
}

/// High-level PDF reader over an in-memory buffer
pub struct PdfReader<'a> {
    data: &'a [u8],
    options: ParseOptions,
}

impl<'a> PdfReader<'a> {
    pub fn new(data: &'a [u8], options: ParseOptions) -> Self {
        Self { data, options }
    }

    /// Get parsing options
    pub fn options(&self) -> &ParseOptions {
        &self.options
    }

    /// Parse the whole document
    pub fn parse(&self) -> ParseResult<Document> {
        let header = PdfHeader::parse(self.data)?;
        tracing::debug!(
            "PDF {} header at offset {}",
            header.version,
            header.offset
        );

        let loaded = match self.load_from_xref(&header) {
            Ok(loaded) => loaded,
            Err(err) if self.options.recover_xref && is_recoverable(&err) => {
                tracing::warn!("Cross-reference data unusable ({}), scanning file", err);
                self.load_from_recovery().ok_or(match err {
                    ParseError::BrokenXref(_) => err,
                    other => ParseError::BrokenXref(other.to_string()),
                })?
            }
            Err(err) => return Err(err),
        };

        let Loaded {
            xref,
            mut objects,
            mut trailer,
        } = loaded;

        let encryption = self.decrypt(&mut objects, &mut trailer)?;
        inline_filter_entries(&mut objects);
        expand_object_streams(&mut objects, &xref);
        inline_filter_entries(&mut objects);

        // Cross-reference and object streams are container formats, not content
        objects.retain(|_, object| {
            !object
                .as_stream()
                .is_some_and(|s| s.dict.has_type("XRef") || s.dict.has_type("ObjStm"))
        });

        if trailer.get_reference("Root").is_none() {
            let catalog = find_catalog(&objects).ok_or_else(|| {
                ParseError::BrokenXref("no document catalog found".to_string())
            })?;
            tracing::warn!("Trailer has no /Root, using catalog {}", catalog);
            trailer.set("Root", catalog);
        }

        validate_references(&objects, &trailer)?;

        let root = trailer
            .get_reference("Root")
            .ok_or_else(|| ParseError::MissingKey("Root".to_string()))?;
        let pages_root = objects
            .get(&root)
            .and_then(Object::as_dict)
            .and_then(|catalog| catalog.get_reference("Pages"))
            .ok_or_else(|| ParseError::MissingKey("Pages".to_string()))?;
        let pages = collect_pages(&objects, pages_root)?;

        tracing::debug!(
            "Loaded {} objects, {} pages{}",
            objects.len(),
            pages.len(),
            if encryption.is_some() { ", encrypted" } else { "" }
        );

        Ok(Document::from_parts(
            header.version,
            objects,
            trailer,
            pages,
            encryption,
        ))
    }

    fn load_from_xref(&self, header: &PdfHeader) -> ParseResult<Loaded> {
        let xref = XRefTable::parse(self.data, header.offset)?;
        let mut objects = BTreeMap::new();

        for (&number, entry) in xref.iter() {
            let XRefEntry::InUse { offset, generation } = *entry else {
                continue;
            };
            if number == 0 {
                continue;
            }

            let (id, object) = self.parse_object_at(&xref, offset, header.offset)?;
            if id != ObjectId::new(number, generation) {
                return Err(ParseError::BrokenXref(format!(
                    "offset {offset} holds object {id}, expected {number} {generation} R"
                )));
            }
            objects.insert(id, object);
        }

        let trailer = xref.trailer().clone();
        Ok(Loaded {
            xref,
            objects,
            trailer,
        })
    }

    /// Parse the object at `offset`, retrying shifted by the header offset
    fn parse_object_at(
        &self,
        xref: &XRefTable,
        offset: usize,
        base: usize,
    ) -> ParseResult<(ObjectId, Object)> {
        let resolve_length = |id: ObjectId| resolve_direct_length(self.data, xref, id);
        let lenient = self.options.lenient_streams;

        parse_indirect_object(self.data, offset, &resolve_length, lenient).or_else(|err| {
            if base > 0 {
                parse_indirect_object(self.data, offset + base, &resolve_length, lenient)
            } else {
                Err(err)
            }
        })
    }

    fn load_from_recovery(&self) -> Option<Loaded> {
        let mut recovery = XRefRecovery::new();
        let xref = recovery.rebuild(self.data);
        let mut objects = BTreeMap::new();

        for (&number, entry) in xref.iter() {
            let XRefEntry::InUse { offset, .. } = *entry else {
                continue;
            };
            // Recovery trusts the scanned headers; the stream scan covers /Length
            match self.parse_object_at(&xref, offset, 0) {
                Ok((id, object)) if id.number() == number => {
                    objects.insert(id, object);
                }
                Ok((id, _)) => tracing::warn!("Recovered header {} does not match", id),
                Err(err) => tracing::warn!("Skipping unreadable object {}: {}", number, err),
            }
        }

        if objects.is_empty() {
            return None;
        }
        let trailer = xref.trailer().clone();
        Some(Loaded {
            xref,
            objects,
            trailer,
        })
    }

    /// Authenticate and decrypt every object when the trailer has `/Encrypt`.
    ///
    /// The encryption dictionary leaves the arena and the trailer; the
    /// returned state and key travel with the document instead.
    fn decrypt(
        &self,
        objects: &mut BTreeMap<ObjectId, Object>,
        trailer: &mut Dictionary,
    ) -> ParseResult<Option<Encryption>> {
        let Some(encrypt) = trailer.get("Encrypt").cloned() else {
            return Ok(None);
        };

        let (encrypt_id, encrypt_dict) = match encrypt {
            Object::Reference(id) => {
                let dict = objects
                    .remove(&id)
                    .ok_or_else(|| ParseError::dangling(id))?
                    .as_dict()
                    .cloned()
                    .ok_or_else(|| {
                        ParseError::UnsupportedEncryption("/Encrypt is not a dictionary".to_string())
                    })?;
                (Some(id), dict)
            }
            Object::Dictionary(dict) => (None, dict),
            other => {
                return Err(ParseError::UnsupportedEncryption(format!(
                    "/Encrypt is a {}",
                    other.type_name()
                )))
            }
        };

        let file_id = trailer
            .get("ID")
            .and_then(Object::as_array)
            .and_then(|ids| ids.first())
            .and_then(Object::as_string)
            .unwrap_or_default();
        let state = EncryptionState::from_dict(&encrypt_dict, file_id)?;

        let password = self.options.password.as_deref().unwrap_or("");
        let key = authenticate(&state, password.as_bytes())?;
        tracing::debug!(
            "Decrypting with security handler revision {}",
            state.revision.number()
        );

        let encryptor = ObjectEncryptor::new(&key, &state);
        for (id, object) in objects.iter_mut() {
            if Some(*id) != encrypt_id {
                encryptor.decrypt(*id, object)?;
            }
        }

        trailer.remove("Encrypt");
        Ok(Some(Encryption { state, key }))
    }
}

fn is_recoverable(err: &ParseError) -> bool {
    !matches!(
        err,
        ParseError::MalformedHeader
            | ParseError::UnsupportedVersion(_)
            | ParseError::Auth(_)
            | ParseError::UnsupportedEncryption(_)
    )
}

/// Resolve an indirect `/Length` by parsing its target directly
fn resolve_direct_length(data: &[u8], xref: &XRefTable, id: ObjectId) -> Option<i64> {
    match xref.get_entry(id.number())? {
        XRefEntry::InUse { offset, .. } => {
            let (_, object) = parse_indirect_object(data, *offset, &|_| None, false).ok()?;
            object.as_integer()
        }
        _ => None,
    }
}

/// Load objects stored in object streams.
///
/// Objects listed as compressed in the cross-reference table come from the
/// stream it names. Objects no table mentions (recovered files) are taken
/// from whichever stream holds them, unless an object of that number
/// already exists.
fn expand_object_streams(objects: &mut BTreeMap<ObjectId, Object>, xref: &XRefTable) {
    let stream_ids: Vec<ObjectId> = objects
        .iter()
        .filter(|(_, object)| object.as_stream().is_some_and(|s| s.dict.has_type("ObjStm")))
        .map(|(id, _)| *id)
        .collect();

    let present: HashSet<u32> = objects.keys().map(ObjectId::number).collect();

    for stream_id in stream_ids {
        let Some(stream) = objects.get(&stream_id).and_then(Object::as_stream) else {
            continue;
        };
        let object_stream = match ObjectStream::parse(stream) {
            Ok(object_stream) => object_stream,
            Err(err) => {
                tracing::warn!("Skipping unreadable object stream {}: {}", stream_id, err);
                continue;
            }
        };

        for entry in object_stream.objects() {
            let (id, object) = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    tracing::warn!("Bad object in object stream {}: {}", stream_id, err);
                    continue;
                }
            };

            let wanted = match xref.get_entry(id.number()) {
                Some(XRefEntry::Compressed { stream_number, .. }) => {
                    *stream_number == stream_id.number()
                }
                Some(_) => false,
                None => !present.contains(&id.number()),
            };
            if wanted {
                objects.entry(id).or_insert(object);
            }
        }
    }
}

/// Replace indirect `/Filter`, `/DecodeParms` and `/DP` values of streams,
/// and indirect elements of their arrays, with the objects they name.
/// References to missing objects stay in place.
fn inline_filter_entries(objects: &mut BTreeMap<ObjectId, Object>) {
    let resolve = |item: &Object| match item {
        Object::Reference(id) => objects.get(id).cloned().unwrap_or_else(|| item.clone()),
        other => other.clone(),
    };

    let mut updates = Vec::new();
    for (id, object) in objects.iter() {
        let Some(stream) = object.as_stream() else {
            continue;
        };
        for key in ["Filter", "DecodeParms", "DP"] {
            let Some(value) = stream.dict.get(key) else {
                continue;
            };
            let inlined = match value {
                Object::Reference(_) => match resolve(value) {
                    Object::Array(items) => Object::Array(items.iter().map(resolve).collect()),
                    other => other,
                },
                Object::Array(items) if items.iter().any(|item| item.as_reference().is_some()) => {
                    Object::Array(items.iter().map(resolve).collect())
                }
                _ => continue,
            };
            updates.push((*id, key, inlined));
        }
    }

    for (id, key, value) in updates {
        if let Some(Object::Stream(stream)) = objects.get_mut(&id) {
            stream.dict.set(key, value);
        }
    }
}

/// First `/Type /Catalog` dictionary with a page tree
fn find_catalog(objects: &BTreeMap<ObjectId, Object>) -> Option<ObjectId> {
    objects
        .iter()
        .find(|(_, object)| {
            object
                .as_dict()
                .is_some_and(|dict| dict.has_type("Catalog") && dict.contains_key("Pages"))
        })
        .map(|(id, _)| *id)
}

/// Every reference reachable from the trailer must name an object of the
/// arena
fn validate_references(
    objects: &BTreeMap<ObjectId, Object>,
    trailer: &Dictionary,
) -> ParseResult<()> {
    let mut visited = HashSet::new();
    let mut pending = Vec::new();
    Object::Dictionary(trailer.clone()).for_each_reference(&mut |id| pending.push(id));

    while let Some(id) = pending.pop() {
        if !visited.insert(id) {
            continue;
        }
        let object = objects.get(&id).ok_or_else(|| ParseError::dangling(id))?;
        object.for_each_reference(&mut |child| {
            if !visited.contains(&child) {
                pending.push(child);
            }
        });
    }
    Ok(())
}
